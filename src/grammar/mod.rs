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

//! The grammar registry.
//!
//! A `Grammar` is the set of every rule that can appear in a script, bound
//! to the capabilities of one server. Rules are registered as `Descriptor`s,
//! indexed both by name (e.g. `action/fileinto`) and by class (e.g.
//! `action`). Parsing at a position where any of several classes is allowed
//! is done by `resolve()`, which finds the first descriptor which is capable
//! and whose probe accepts the input.
//!
//! Within a class, descriptors are tried by descending priority, then in
//! registration order. Keyword probes respect word boundaries, so rules
//! whose keywords merely share a prefix (`metadata` and `metadataexists`)
//! never compete; only rules for the very same keyword need a priority to
//! be told apart.
//!
//! Descriptors whose requirement is not met by the capability set are
//! invisible to `probe` and `resolve`. This means that using an extension
//! the server lacks produces an "unknown element" error, the same as
//! entirely unknown syntax.

use std::collections::HashMap;
use std::fmt;

use log::debug;

pub mod atoms;
pub mod capabilities;
pub mod cursor;
pub mod group;
pub mod lex;
#[macro_use]
pub mod rule;

use self::capabilities::{Capabilities, Requirement};
use self::cursor::Cursor;
use self::lex::Whitespace;
use self::rule::{GroupRule, Property, Rule};
use crate::dom::{Body, Document, NodeId};
use crate::support::error::Error;

/// Parses a node body for a native rule. The `NodeId` is the id reserved
/// for the node being parsed, for use as the parent of any children.
pub type ParseFn =
    fn(&mut Document, NodeId, &mut Cursor<'_>) -> Result<Body, Error>;
/// Creates the body of a new node of a native rule.
pub type CreateFn = fn(&mut Document, NodeId) -> Result<Body, Error>;
/// Decides whether a native rule matches at the cursor.
pub type ProbeFn = fn(&Cursor<'_>, &Grammar) -> bool;

/// How a descriptor decides whether it matches the input.
#[derive(Clone)]
pub enum Matcher {
    /// A keyword, after optional whitespace.
    Keyword(String),
    /// Any capable descriptor of the given classes.
    Class(Vec<String>),
    Native(ProbeFn),
}

/// What a descriptor builds.
#[derive(Clone)]
pub enum Kind {
    Structure(Rule),
    Group(GroupRule),
    Native { parse: ParseFn, create: CreateFn },
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Matcher::Keyword(ref token) => write!(f, "Keyword({:?})", token),
            Matcher::Class(ref classes) => write!(f, "Class({:?})", classes),
            Matcher::Native(_) => write!(f, "Native"),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Kind::Structure(ref rule) => write!(f, "Structure({:?})", rule),
            Kind::Group(ref rule) => write!(f, "Group({:?})", rule),
            Kind::Native { .. } => write!(f, "Native"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Descriptor {
    pub name: String,
    pub class: String,
    pub priority: i32,
    pub requires: Requirement,
    pub matcher: Matcher,
    pub kind: Kind,
}

impl Descriptor {
    pub fn native(
        name: &str,
        class: &str,
        probe: ProbeFn,
        parse: ParseFn,
        create: CreateFn,
    ) -> Self {
        Descriptor {
            name: name.to_owned(),
            class: class.to_owned(),
            priority: 0,
            requires: Requirement::None,
            matcher: Matcher::Native(probe),
            kind: Kind::Native { parse, create },
        }
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }
}

impl From<Rule> for Descriptor {
    fn from(rule: Rule) -> Self {
        Descriptor {
            name: rule.node.clone(),
            class: rule.class.clone(),
            priority: rule.priority,
            requires: rule.requires.clone(),
            matcher: Matcher::Keyword(rule.token.clone()),
            kind: Kind::Structure(rule),
        }
    }
}

impl From<GroupRule> for Descriptor {
    fn from(rule: GroupRule) -> Self {
        let matcher = match rule.token {
            Some(ref token) => Matcher::Keyword(token.clone()),
            None => Matcher::Class(rule.items.clone()),
        };
        Descriptor {
            name: rule.node.clone(),
            class: rule.class.clone(),
            priority: rule.priority,
            requires: rule.requires.clone(),
            matcher,
            kind: Kind::Group(rule),
        }
    }
}

/// Whether `token` is the next keyword after optional whitespace.
pub fn probe_keyword(cursor: &Cursor<'_>, token: &str) -> bool {
    let mut cursor = *cursor;
    Whitespace::parse(&mut cursor, false).is_ok()
        && cursor.starts_with_keyword(token)
}

/// Collects descriptors before they are bound to a capability set.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    descriptors: Vec<Descriptor>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`. A later descriptor with the same name replaces
    /// an earlier one.
    pub fn register(&mut self, descriptor: Descriptor) {
        match self
            .descriptors
            .iter_mut()
            .find(|d| d.name == descriptor.name)
        {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
    }

    pub fn add(&mut self, rule: Rule) {
        self.register(rule.into());
    }

    pub fn add_group(&mut self, rule: GroupRule) {
        self.register(rule.into());
    }

    /// Merge `property` into the rule named `node`.
    ///
    /// See `Rule::extend()`.
    pub fn extend(&mut self, node: &str, property: Property) {
        let rule = self
            .descriptors
            .iter_mut()
            .filter(|d| d.name == node)
            .find_map(|d| match d.kind {
                Kind::Structure(ref mut rule) => Some(rule),
                _ => None,
            });

        match rule {
            Some(rule) => rule.extend(property),
            None => log::warn!("Cannot extend unknown rule {}", node),
        }
    }

    pub fn build(self, capabilities: Capabilities) -> Grammar {
        let mut by_name = HashMap::new();
        let mut by_class: HashMap<String, Vec<usize>> = HashMap::new();

        for (ix, descriptor) in self.descriptors.iter().enumerate() {
            by_name.insert(descriptor.name.clone(), ix);
            by_class
                .entry(descriptor.class.clone())
                .or_default()
                .push(ix);
        }

        for candidates in by_class.values_mut() {
            // Stable, so registration order breaks ties
            candidates.sort_by_key(|&ix| -self.descriptors[ix].priority);
        }

        debug!(
            "Built grammar with {} rules in {} classes for {} capabilities",
            self.descriptors.len(),
            by_class.len(),
            capabilities.len()
        );

        Grammar {
            descriptors: self.descriptors,
            by_name,
            by_class,
            capabilities,
        }
    }
}

#[derive(Debug)]
pub struct Grammar {
    descriptors: Vec<Descriptor>,
    by_name: HashMap<String, usize>,
    by_class: HashMap<String, Vec<usize>>,
    capabilities: Capabilities,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn descriptor(&self, ix: usize) -> &Descriptor {
        &self.descriptors[ix]
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Find the index of the descriptor named `name`.
    pub fn lookup(&self, name: &str) -> Result<usize, Error> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownName(name.to_owned()))
    }

    pub fn is_capable(&self, ix: usize) -> bool {
        self.descriptors[ix].requires.is_satisfied(&self.capabilities)
    }

    /// Whether the rule named `name` exists and is capable.
    pub fn supports_name(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .map_or(false, |&ix| self.is_capable(ix))
    }

    /// Whether any rule in `classes` is capable.
    pub fn supports_class<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        self.candidates(classes).next().is_some()
    }

    /// Whether the descriptor at `ix` matches at the cursor, regardless of
    /// capabilities.
    pub fn probe(&self, ix: usize, cursor: &Cursor<'_>) -> bool {
        match self.descriptors[ix].matcher {
            Matcher::Keyword(ref token) => probe_keyword(cursor, token),
            Matcher::Class(ref classes) => {
                self.resolve(classes, cursor).is_some()
            }
            Matcher::Native(probe) => probe(cursor, self),
        }
    }

    /// Whether the rule named `name` is capable and matches at the cursor.
    pub fn probe_name(&self, name: &str, cursor: &Cursor<'_>) -> bool {
        !cursor.at_end()
            && self.by_name.get(name).map_or(false, |&ix| {
                self.is_capable(ix) && self.probe(ix, cursor)
            })
    }

    /// Whether any capable rule of `classes` matches at the cursor.
    pub fn probe_class<S: AsRef<str>>(
        &self,
        classes: &[S],
        cursor: &Cursor<'_>,
    ) -> bool {
        self.resolve(classes, cursor).is_some()
    }

    /// Find the first capable descriptor in `classes` which matches at the
    /// cursor.
    pub fn resolve<S: AsRef<str>>(
        &self,
        classes: &[S],
        cursor: &Cursor<'_>,
    ) -> Option<usize> {
        if cursor.at_end() {
            return None;
        }

        self.candidates(classes).find(|&ix| self.probe(ix, cursor))
    }

    /// Capable descriptors of `classes`, in the order they are tried.
    fn candidates<'a, S: AsRef<str>>(
        &'a self,
        classes: &'a [S],
    ) -> impl Iterator<Item = usize> + 'a {
        classes
            .iter()
            .filter_map(move |class| self.by_class.get(class.as_ref()))
            .flat_map(|candidates| candidates.iter().copied())
            .filter(move |&ix| self.is_capable(ix))
    }

    /// Every capability name any rule refers to.
    pub fn known_capabilities(&self) -> Vec<&str> {
        let mut requirements = Vec::<&Requirement>::new();
        for descriptor in &self.descriptors {
            requirements.push(&descriptor.requires);
            if let Kind::Structure(ref rule) = descriptor.kind {
                for property in &rule.properties {
                    requirements.push(&property.requires);
                    requirements.extend(property.elements.iter().map(|s| &s.requires));
                }
            }
        }

        let mut names: Vec<&str> = requirements
            .into_iter()
            .flat_map(|r| r.names().iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grammar::rule::Rule;

    fn test_grammar(caps: &[&str]) -> Grammar {
        let mut builder = Grammar::builder();
        builder.add(Rule::test("test/metadata", "metadata").requires("mboxmetadata"));
        builder.add(
            Rule::test("test/metadataexists", "metadataexists")
                .requires("mboxmetadata"),
        );
        builder.add(Rule::test("test/plain", "thing"));
        builder.add(Rule::test("test/refined", "thing").priority(10).requires("refine"));
        builder.add(Rule::test("test/late", "thing"));
        builder.build(caps.iter().copied().collect())
    }

    #[test]
    fn resolve_respects_capabilities() {
        let g = test_grammar(&[]);
        let c = Cursor::new("metadata \"INBOX\"");
        assert_eq!(None, g.resolve(&["test"], &c));
        assert!(!g.probe_name("test/metadata", &c));
        assert!(!g.supports_name("test/metadata"));
        assert!(g.supports_class(&["test"]));
        assert!(!g.supports_class(&["action"]));

        let g = test_grammar(&["mboxmetadata"]);
        assert_eq!(Some(g.lookup("test/metadata").unwrap()), g.resolve(&["test"], &c));
        let c = Cursor::new("  metadataexists \"INBOX\"");
        assert_eq!(
            Some(g.lookup("test/metadataexists").unwrap()),
            g.resolve(&["test"], &c)
        );
        assert!(g.probe_class(&["test"], &c));
        assert_eq!(0, c.position());
    }

    #[test]
    fn priority_then_registration_order() {
        let g = test_grammar(&[]);
        let c = Cursor::new("thing");
        assert_eq!(Some(g.lookup("test/plain").unwrap()), g.resolve(&["test"], &c));

        let g = test_grammar(&["refine"]);
        assert_eq!(
            Some(g.lookup("test/refined").unwrap()),
            g.resolve(&["test"], &c)
        );
    }

    #[test]
    fn nothing_matches_at_end() {
        let g = test_grammar(&["mboxmetadata"]);
        let c = Cursor::new("");
        assert_eq!(None, g.resolve(&["test"], &c));
        assert!(!g.probe_name("test/plain", &c));
        assert_matches!(Err(Error::UnknownName(..)), g.lookup("test/nope"));
    }

    #[test]
    fn extend_and_known_capabilities() {
        let mut builder = Grammar::builder();
        builder.add(Rule::action("action/fileinto", "fileinto").requires("fileinto"));
        builder.extend(
            "action/fileinto",
            Property::tags("tags", vec![rule::slot("copy", "tag/copy").requires("copy")]),
        );
        builder.extend(
            "action/fileinto",
            Property::tags("tags", vec![rule::slot("create", "tag/create")]),
        );
        builder.extend("action/nonexistent", Property::tags("tags", vec![]));
        let g = builder.build(Capabilities::new());

        match g.descriptor(g.lookup("action/fileinto").unwrap()).kind {
            Kind::Structure(ref rule) => {
                assert_eq!(1, rule.properties.len());
                assert_eq!(2, rule.properties[0].elements.len());
            }
            ref k => panic!("Unexpected kind: {:?}", k),
        }
        assert_eq!(vec!["copy", "fileinto"], g.known_capabilities());
    }
}
