//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Sievedit.
//
// Sievedit is free  software: you can redistribute it and/or  modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Sievedit is distributed in the hope  that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Sievedit. If not, see <http://www.gnu.org/licenses/>.

//! The document: a tree of nodes parsed from a script.
//!
//! Nodes are owned by the document and addressed by `NodeId`. Each node
//! knows its parent; containers know their children. Nodes are freed as
//! soon as they are removed from the tree. Nodes which were created but
//! never attached, or which were detached by other means, stay around until
//! `compact()` is called.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

mod access;
mod node;
mod tree;

pub use self::node::{Body, Node, NodeId};

use crate::grammar::atoms::Structure;
use crate::grammar::capabilities::{Capabilities, Requirements};
use crate::grammar::cursor::Cursor;
use crate::grammar::group::Group;
use crate::grammar::{Descriptor, Grammar, Kind};
use crate::sieve::blocks;
use crate::support::error::Error;

/// A position in the id sequence. Every node created after the mark was
/// taken has an id at or above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Mark(u64);

/// Convert every line ending to CRLF.
///
/// Lone CRs and lone LFs are each treated as a line break. This includes
/// those in multi-line strings and comments.
pub fn normalize_line_endings(script: &str) -> String {
    script
        .replace("\r\n", "\r")
        .replace('\n', "\r")
        .replace('\r', "\r\n")
}

#[derive(Debug)]
pub struct Document {
    grammar: Arc<Grammar>,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    root: NodeId,
}

impl Document {
    /// Create an empty document using `grammar`.
    pub fn new(grammar: Arc<Grammar>) -> Result<Self, Error> {
        let mut doc = Document {
            grammar,
            nodes: BTreeMap::new(),
            next_id: 0,
            root: NodeId(0),
        };
        let ix = doc.grammar.lookup(blocks::ROOT)?;
        doc.root = doc.instantiate(ix, None, None)?;
        Ok(doc)
    }

    pub fn grammar(&self) -> Arc<Grammar> {
        Arc::clone(&self.grammar)
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.grammar.capabilities()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The block of `require` statements at the start of the script.
    pub fn imports(&self) -> NodeId {
        match self.nodes.get(&self.root).map(|n| &n.body) {
            Some(&Body::Root(ref root)) => root.imports,
            _ => self.root,
        }
    }

    /// The top-level block of commands.
    pub fn body(&self) -> NodeId {
        match self.nodes.get(&self.root).map(|n| &n.body) {
            Some(&Body::Root(ref root)) => root.body,
            _ => self.root,
        }
    }

    /// The number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, Error> {
        self.nodes.get(&id).ok_or(Error::NoSuchNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, Error> {
        self.nodes.get_mut(&id).ok_or(Error::NoSuchNode(id))
    }

    pub fn descriptor(&self, id: NodeId) -> Result<&Descriptor, Error> {
        let ix = self.node(id)?.descriptor;
        Ok(self.grammar.descriptor(ix))
    }

    /// The name of the rule `id` was built from, e.g. `action/fileinto`.
    pub fn name(&self, id: NodeId) -> Result<&str, Error> {
        Ok(&self.descriptor(id)?.name)
    }

    /// The class of the rule `id` was built from, e.g. `action`.
    pub fn class(&self, id: NodeId) -> Result<&str, Error> {
        Ok(&self.descriptor(id)?.class)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, Error> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, Error> {
        Ok(self.node(id)?.body.children())
    }

    /// Replace the document's content with `script`.
    ///
    /// Line endings are normalised first. The whole script must be
    /// consumed, and every capability named by a `require` must be
    /// supported. On failure, the document is unchanged.
    pub fn parse_script(&mut self, script: &str) -> Result<(), Error> {
        let script = normalize_line_endings(script);
        let mark = self.mark();
        match self.parse_root(&script) {
            Ok(root) => {
                let old = std::mem::replace(&mut self.root, root);
                self.free(old);
                debug!("Parsed script into {} nodes", self.nodes.len());
                Ok(())
            }
            Err(e) => {
                self.discard_from(mark);
                Err(e)
            }
        }
    }

    fn parse_root(&mut self, script: &str) -> Result<NodeId, Error> {
        let mut cursor = Cursor::new(script);
        let ix = self.grammar.lookup(blocks::ROOT)?;
        let root = self.instantiate(ix, None, Some(&mut cursor))?;
        if !cursor.at_end() {
            return Err(Error::Unparsed(cursor.snippet()));
        }

        blocks::check_imports(self, root)?;
        Ok(root)
    }

    /// Write the whole script out.
    ///
    /// Before writing, a `require` statement is added for every capability
    /// the script uses but does not yet require.
    pub fn serialize_script(&mut self) -> Result<String, Error> {
        let needed = self.required_capabilities()?;
        let present = blocks::imported_capabilities(self, self.root)?;
        for name in needed {
            if !present.contains(&name) {
                info!("Adding require for {}", name);
                blocks::add_require(self, &name)?;
            }
        }

        self.to_script(self.root)
    }

    /// The script text of the subtree rooted at `id`.
    pub fn to_script(&self, id: NodeId) -> Result<String, Error> {
        let node = self.node(id)?;
        let mut out = String::new();
        node.body.write_to(self, &mut out);
        Ok(out)
    }

    pub(crate) fn write(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.nodes.get(&id) {
            node.body.write_to(self, out);
        }
    }

    /// The capabilities the commands of the script need, in the order they
    /// are first used.
    pub fn required_capabilities(&self) -> Result<Vec<String>, Error> {
        let mut acc = Requirements::new(self.capabilities());
        self.require_capabilities(self.body(), &mut acc)?;
        Ok(acc.into_names())
    }

    /// Add the requirements of `id` and its subtree to `acc`.
    pub fn require_capabilities(
        &self,
        id: NodeId,
        acc: &mut Requirements<'_>,
    ) -> Result<(), Error> {
        let node = self.node(id)?;
        acc.require(&self.grammar.descriptor(node.descriptor).requires)?;
        node.body.require(self, acc)
    }

    /// Whether `id` is a group standing for its default value, which is
    /// written as nothing at all.
    pub(crate) fn is_default_node(&self, id: NodeId) -> bool {
        match self.nodes.get(&id).map(|n| &n.body) {
            Some(&Body::Group(ref group)) => group.is_default(),
            _ => false,
        }
    }

    /// Create a node from the rule named `name`.
    ///
    /// If `source` is given, it is parsed and must be consumed entirely;
    /// otherwise the node gets the rule's default content. The new node has
    /// no parent; use `append()` to place it in the tree.
    pub fn create_by_name(
        &mut self,
        name: &str,
        source: Option<&str>,
    ) -> Result<NodeId, Error> {
        self.create_named(name, None, source)
    }

    /// Parse `source` as whichever rule of `classes` matches it.
    ///
    /// The new node has no parent; use `append()` to place it in the tree.
    pub fn create_by_class(
        &mut self,
        classes: &[&str],
        source: &str,
    ) -> Result<NodeId, Error> {
        self.parse_class_text(classes, None, source)
    }

    pub(crate) fn create_named(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        source: Option<&str>,
    ) -> Result<NodeId, Error> {
        let ix = self.capable(name)?;
        match source {
            None => self.instantiate(ix, parent, None),
            Some(source) => {
                let mut cursor = Cursor::new(source);
                let id = self.instantiate(ix, parent, Some(&mut cursor))?;
                self.expect_end(&cursor, id)?;
                Ok(id)
            }
        }
    }

    pub(crate) fn parse_named(
        &mut self,
        name: &str,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<NodeId, Error> {
        let ix = self.capable(name)?;
        self.instantiate(ix, Some(parent), Some(cursor))
    }

    pub(crate) fn parse_class<S: AsRef<str>>(
        &mut self,
        classes: &[S],
        parent: Option<NodeId>,
        cursor: &mut Cursor<'_>,
    ) -> Result<NodeId, Error> {
        match self.grammar.resolve(classes, cursor) {
            Some(ix) => self.instantiate(ix, parent, Some(cursor)),
            None => {
                let classes =
                    classes.iter().map(AsRef::as_ref).collect::<Vec<_>>();
                debug!("Nothing of {:?} matches", classes);
                Err(Error::UnknownElement {
                    classes: classes.join(", "),
                    found: cursor.snippet(),
                })
            }
        }
    }

    pub(crate) fn parse_class_text<S: AsRef<str>>(
        &mut self,
        classes: &[S],
        parent: Option<NodeId>,
        source: &str,
    ) -> Result<NodeId, Error> {
        let mut cursor = Cursor::new(source);
        let id = self.parse_class(classes, parent, &mut cursor)?;
        self.expect_end(&cursor, id)?;
        Ok(id)
    }

    fn expect_end(&mut self, cursor: &Cursor<'_>, id: NodeId) -> Result<(), Error> {
        if cursor.at_end() {
            Ok(())
        } else {
            self.free(id);
            Err(Error::Unparsed(cursor.snippet()))
        }
    }

    fn capable(&self, name: &str) -> Result<usize, Error> {
        let ix = self.grammar.lookup(name)?;
        if self.grammar.is_capable(ix) {
            Ok(ix)
        } else {
            Err(Error::Unsupported(format!(
                "{} requires {}",
                name,
                self.grammar.descriptor(ix).requires
            )))
        }
    }

    /// Build a node from the descriptor at `ix`, parsing it from `cursor` if
    /// given.
    ///
    /// On failure, every node created in the attempt is discarded and the
    /// cursor is left where it was.
    pub(crate) fn instantiate(
        &mut self,
        ix: usize,
        parent: Option<NodeId>,
        cursor: Option<&mut Cursor<'_>>,
    ) -> Result<NodeId, Error> {
        let grammar = Arc::clone(&self.grammar);
        let descriptor = grammar.descriptor(ix);
        let id = self.allocate();
        let mark = Mark(id.0);

        let result = match cursor {
            Some(cursor) => {
                let start = cursor.position();
                let result = self.parse_body(descriptor, id, cursor);
                if result.is_err() {
                    cursor.rewind(start);
                }
                result
            }
            None => self.create_body(descriptor, id),
        };

        match result {
            Ok(body) => {
                self.nodes.insert(
                    id,
                    Node {
                        descriptor: ix,
                        parent,
                        body,
                    },
                );
                Ok(id)
            }
            Err(e) => {
                self.discard_from(mark);
                Err(e)
            }
        }
    }

    fn parse_body(
        &mut self,
        descriptor: &Descriptor,
        id: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Body, Error> {
        match descriptor.kind {
            Kind::Structure(ref rule) => {
                Structure::parse(rule, self, id, cursor).map(Body::Structure)
            }
            Kind::Group(ref rule) => {
                Group::parse(rule, self, id, cursor).map(Body::Group)
            }
            Kind::Native { parse, .. } => parse(self, id, cursor),
        }
    }

    fn create_body(
        &mut self,
        descriptor: &Descriptor,
        id: NodeId,
    ) -> Result<Body, Error> {
        match descriptor.kind {
            Kind::Structure(ref rule) => {
                Structure::create(rule, self, id).map(Body::Structure)
            }
            Kind::Group(ref rule) => {
                Group::create(rule, self, id).map(Body::Group)
            }
            Kind::Native { create, .. } => create(self, id),
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark(self.next_id)
    }

    /// Drop every node created since `mark` was taken.
    pub(crate) fn discard_from(&mut self, mark: Mark) {
        let discarded = self.nodes.split_off(&NodeId(mark.0));
        if !discarded.is_empty() {
            debug!("Discarded {} speculative nodes", discarded.len());
        }
    }

    /// Free `id` and everything it owns.
    pub(crate) fn free(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.body.children());
            }
        }
    }

    /// Free every node not reachable from the root.
    ///
    /// Returns the number of nodes freed.
    pub fn compact(&mut self) -> usize {
        let mut reachable = std::collections::BTreeSet::new();
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.get(&id) {
                if reachable.insert(id) {
                    pending.extend(node.body.children());
                }
            }
        }

        let before = self.nodes.len();
        self.nodes.retain(|id, _| reachable.contains(id));
        let freed = before - self.nodes.len();
        if freed > 0 {
            debug!("Compaction freed {} nodes", freed);
        }
        freed
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn document(capabilities: &[&str]) -> Document {
        crate::init_test_log();
        let capabilities = capabilities.iter().copied().collect::<Capabilities>();
        Document::new(Arc::new(crate::sieve::grammar(capabilities))).unwrap()
    }

    #[test]
    fn new_document_is_empty() {
        let mut doc = document(&[]);
        assert_eq!("", doc.serialize_script().unwrap());
        assert!(doc.children(doc.imports()).unwrap().is_empty());
        assert!(doc.children(doc.body()).unwrap().is_empty());
        assert_eq!(Some(doc.root()), doc.parent(doc.body()).unwrap());
        assert_eq!(None, doc.parent(doc.root()).unwrap());
    }

    #[test]
    fn line_ending_normalisation() {
        assert_eq!("a\r\nb\r\nc\r\n\r\n", normalize_line_endings("a\rb\nc\r\n\n"));
        assert_eq!("\r\n\r\n", normalize_line_endings("\n\r"));
        assert_eq!("", normalize_line_endings(""));
    }

    #[test]
    fn create_by_class_parses_text() {
        let mut doc = document(&[]);
        doc.parse_script("keep;\r\n").unwrap();
        let before = doc.len();

        assert!(doc
            .create_by_class(&["action"], "frobnicate;")
            .unwrap_err()
            .is_unknown_element());
        assert_eq!(before, doc.len());

        let stop = doc.create_by_class(&["action"], "stop;").unwrap();
        assert_eq!("action/stop", doc.name(stop).unwrap());
        assert_eq!(None, doc.parent(stop).unwrap());
        let body = doc.body();
        doc.append(body, stop, None).unwrap();
        assert_eq!("keep;\r\nstop;", doc.serialize_script().unwrap());
    }

    #[test]
    fn parse_replaces_previous_content() {
        let mut doc = document(&[]);
        doc.parse_script("keep;\r\nstop;\r\n").unwrap();
        let old_body = doc.body();
        doc.parse_script("discard;\r\n").unwrap();
        assert!(!doc.contains(old_body));
        assert_eq!(0, doc.compact());
        assert_eq!("discard;\r\n", doc.serialize_script().unwrap());
    }

    const FRAGMENTS: &[&str] = &[
        "keep;\n",
        "discard;\r\n",
        "  stop;  # done\n",
        "/* a\r\n   comment */\r\n",
        "\r\n",
        "if true {\n  keep;\n}\n",
        "if not exists \"X\" {\r\n} else {\r\n  discard;\r\n}\r\n",
        "if anyof (true, false) { stop; }\n",
        "redirect \"a@b.c\";\n",
        "if size :under 10K {\n} elsif header :contains \"Subject\" \"x\" \
         {\n}\n",
        "if header [\"To\", \"Cc\"] text:\r\nfoo\r\n.\r\n {\r\n}\r\n",
    ];

    proptest! {
        #[test]
        fn normalisation_is_idempotent(text in "[a\r\n]*") {
            let once = normalize_line_endings(&text);
            prop_assert_eq!(&once, &normalize_line_endings(&once));
            prop_assert!(!once.replace("\r\n", "").contains(&['\r', '\n'][..]));
        }

        #[test]
        fn scripts_round_trip(
            fragments in prop::collection::vec(
                prop::sample::select(FRAGMENTS.to_vec()), 0..8)
        ) {
            let script = fragments.concat();
            let mut doc = document(&[]);
            doc.parse_script(&script).unwrap();
            let text = doc.serialize_script().unwrap();
            prop_assert_eq!(normalize_line_endings(&script), text.clone());

            doc.parse_script(&text).unwrap();
            prop_assert_eq!(text, doc.serialize_script().unwrap());
        }
    }
}
