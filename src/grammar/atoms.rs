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

//! The building blocks of declarative rules.
//!
//! A `Structure` is the node body produced from a `Rule`. It is a sequence of
//! atoms: the rule's keyword as a `Literal`, one atom per property block, and
//! for commands a terminating `;` literal. Each atom knows how to parse
//! itself, how to write itself back out, and which child nodes count
//! towards the capabilities the structure requires.
//!
//! Parsing proceeds strictly in the order the properties are declared. The
//! only backtracking is for dependent blocks: if a dependent block parses
//! successfully but the block right after it then fails, the dependent block
//! is assumed to have taken a value belonging to the next block, and is
//! disabled so that the next block can be parsed again from the same
//! position.

use log::debug;

use super::capabilities::{Requirement, Requirements};
use super::cursor::Cursor;
use super::lex::Whitespace;
use super::rule::{Property, PropertyKind, Rule, Slot, Trailing};
use crate::dom::{Document, NodeId};
use crate::support::error::Error;

/// A fixed token, along with the whitespace around it.
///
/// The token is stored as it was spelled in the input, since keywords are
/// case-insensitive but must be written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    pub leading: Whitespace,
    token: String,
    pub trailing: Whitespace,
}

impl Literal {
    pub fn new(token: &str, trailing: Trailing) -> Self {
        Literal {
            leading: Whitespace::new(),
            token: token.to_owned(),
            trailing: match trailing {
                Trailing::None => Whitespace::new(),
                Trailing::Line => Whitespace::line_break(),
                Trailing::Required => Whitespace::space(),
            },
        }
    }

    pub fn parse(
        cursor: &mut Cursor<'_>,
        token: &str,
        trailing: Trailing,
    ) -> Result<Self, Error> {
        let start = cursor.position();
        let result = Self::parse_inner(cursor, token, trailing);
        if result.is_err() {
            cursor.rewind(start);
        }
        result
    }

    fn parse_inner(
        cursor: &mut Cursor<'_>,
        token: &str,
        trailing: Trailing,
    ) -> Result<Self, Error> {
        let leading = Whitespace::parse(cursor, false)?;
        let token = cursor.match_keyword(token)?.to_owned();
        let trailing = match trailing {
            Trailing::None => Whitespace::new(),
            Trailing::Line => Whitespace::parse(cursor, true)?,
            Trailing::Required => {
                if !Whitespace::probe(cursor) {
                    return Err(cursor.syntax_error("whitespace"));
                }
                Whitespace::parse(cursor, false)?
            }
        };

        Ok(Literal {
            leading,
            token,
            trailing,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Replace the token, keeping the surrounding whitespace.
    pub fn respell(&mut self, token: &str) {
        self.token = token.to_owned();
    }

    pub fn write_to(&self, out: &mut String) {
        self.leading.write_to(out);
        out.push_str(&self.token);
        self.trailing.write_to(out);
    }
}

/// A value in a positional slot, preceded by its whitespace.
#[derive(Clone, Debug)]
pub struct Field {
    pub id: String,
    pub whitespace: Whitespace,
    pub node: NodeId,
}

/// An ordered list of fields, all of which must be present.
#[derive(Clone, Debug, Default)]
pub struct Fields(pub Vec<Field>);

impl Fields {
    fn parse(
        slots: &[Slot],
        doc: &mut Document,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        let mut fields = Vec::with_capacity(slots.len());
        for slot in slots {
            let whitespace = Whitespace::parse(cursor, false)?;
            let node = doc.parse_named(&slot.ty, parent, cursor)?;
            fields.push(Field {
                id: slot.id.clone(),
                whitespace,
                node,
            });
        }
        Ok(Fields(fields))
    }

    fn create(
        slots: &[Slot],
        doc: &mut Document,
        parent: NodeId,
    ) -> Result<Self, Error> {
        let mut fields = Vec::with_capacity(slots.len());
        for slot in slots {
            let node =
                doc.create_named(&slot.ty, Some(parent), slot.value.as_deref())?;
            fields.push(Field {
                id: slot.id.clone(),
                whitespace: Whitespace::space(),
                node,
            });
        }
        Ok(Fields(fields))
    }

    fn write_to(&self, doc: &Document, out: &mut String) {
        for field in &self.0 {
            field.whitespace.write_to(out);
            doc.write(field.node, out);
        }
    }
}

/// A list of fields which may be absent as a whole.
#[derive(Clone, Debug)]
pub struct Dependent {
    pub id: String,
    pub fields: Fields,
    pub enabled: bool,
    /// Needed by the script whenever the fields are enabled.
    pub requires: Requirement,
}

impl Dependent {
    fn parse(
        property: &Property,
        doc: &mut Document,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        if !property.requires.is_satisfied(doc.capabilities()) {
            return Self::create(property, doc, parent);
        }

        let start = cursor.position();
        let mark = doc.mark();
        match Fields::parse(&property.elements, doc, parent, cursor) {
            Ok(fields) => Ok(Dependent {
                id: property.id.clone(),
                fields,
                enabled: true,
                requires: property.requires.clone(),
            }),
            Err(e) => {
                debug!("Dependent '{}' not present: {}", property.id, e);
                cursor.rewind(start);
                doc.discard_from(mark);
                Self::create(property, doc, parent)
            }
        }
    }

    fn create(
        property: &Property,
        doc: &mut Document,
        parent: NodeId,
    ) -> Result<Self, Error> {
        Ok(Dependent {
            id: property.id.clone(),
            fields: Fields::create(&property.elements, doc, parent)?,
            enabled: false,
            requires: property.requires.clone(),
        })
    }
}

/// One candidate of a tag set.
#[derive(Clone, Debug)]
pub struct Tag {
    pub id: String,
    pub ty: String,
    pub whitespace: Whitespace,
    /// The tag's node, if it was parsed or has been created since.
    pub node: Option<NodeId>,
}

/// A set of optional tags in any order.
#[derive(Clone, Debug, Default)]
pub struct TagSet {
    pub tags: Vec<Tag>,
    /// Indices into `tags` of the tags which are present, in the order they
    /// appeared.
    pub seen: Vec<usize>,
    /// The whitespace after the last tag which was present in the input.
    pub tail: Option<Whitespace>,
}

impl TagSet {
    fn candidates(property: &Property, doc: &Document) -> Vec<Tag> {
        let grammar = doc.grammar();
        property
            .elements
            .iter()
            .filter(|slot| {
                slot.requires.is_satisfied(grammar.capabilities())
                    && grammar.supports_name(&slot.ty)
            })
            .map(|slot| Tag {
                id: slot.id.clone(),
                ty: slot.ty.clone(),
                whitespace: Whitespace::space(),
                node: None,
            })
            .collect()
    }

    fn parse(
        property: &Property,
        doc: &mut Document,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        let grammar = doc.grammar();
        let mut tags = Self::candidates(property, doc);
        let mut seen = Vec::<usize>::new();
        let start = cursor.position();

        let tail = loop {
            let whitespace = Whitespace::parse(cursor, false)?;
            let hit = (0..tags.len()).find(|&ix| {
                !seen.contains(&ix) && grammar.probe_name(&tags[ix].ty, cursor)
            });

            match hit {
                Some(ix) => {
                    let node = doc.parse_named(&tags[ix].ty, parent, cursor)?;
                    tags[ix].whitespace = whitespace;
                    tags[ix].node = Some(node);
                    seen.push(ix);
                }
                None if seen.is_empty() => {
                    // Leave the whitespace for whatever follows
                    cursor.rewind(start);
                    break None;
                }
                None => break Some(whitespace),
            }
        };

        Ok(TagSet { tags, seen, tail })
    }

    fn create(property: &Property, doc: &Document) -> Self {
        TagSet {
            tags: Self::candidates(property, doc),
            seen: Vec::new(),
            tail: None,
        }
    }

    /// The indices of the tags which are written out, in order.
    fn emitted(&self, doc: &Document) -> Vec<usize> {
        let mut emitted = self
            .seen
            .iter()
            .copied()
            .filter(|&ix| {
                self.tags[ix].node.map_or(false, |n| !doc.is_default_node(n))
            })
            .collect::<Vec<_>>();
        for (ix, tag) in self.tags.iter().enumerate() {
            if self.seen.contains(&ix) {
                continue;
            }

            if let Some(node) = tag.node {
                if !doc.is_default_node(node) {
                    emitted.push(ix);
                }
            }
        }
        emitted
    }

    fn write_to(&self, doc: &Document, out: &mut String) {
        for ix in self.emitted(doc) {
            let tag = &self.tags[ix];
            if let Some(node) = tag.node {
                tag.whitespace.write_to(out);
                doc.write(node, out);
            }
        }

        if let Some(ref tail) = self.tail {
            tail.write_to(out);
        }
    }

    pub fn find(&self, id: &str) -> Option<usize> {
        self.tags.iter().position(|t| t.id == id)
    }
}

#[derive(Clone, Debug)]
pub enum Atom {
    Literal(Literal),
    Mandatory(Fields),
    Dependent(Dependent),
    Optional(TagSet),
}

impl Atom {
    fn parse(
        property: &Property,
        doc: &mut Document,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        Ok(match property.kind {
            PropertyKind::Tags => {
                Atom::Optional(TagSet::parse(property, doc, parent, cursor)?)
            }
            PropertyKind::Parameters => Atom::Mandatory(Fields::parse(
                &property.elements,
                doc,
                parent,
                cursor,
            )?),
            PropertyKind::Dependent => Atom::Dependent(Dependent::parse(
                property, doc, parent, cursor,
            )?),
        })
    }

    fn create(
        property: &Property,
        doc: &mut Document,
        parent: NodeId,
    ) -> Result<Self, Error> {
        Ok(match property.kind {
            PropertyKind::Tags => Atom::Optional(TagSet::create(property, doc)),
            PropertyKind::Parameters => Atom::Mandatory(Fields::create(
                &property.elements,
                doc,
                parent,
            )?),
            PropertyKind::Dependent => {
                Atom::Dependent(Dependent::create(property, doc, parent)?)
            }
        })
    }

    fn write_to(&self, doc: &Document, out: &mut String) {
        match *self {
            Atom::Literal(ref literal) => literal.write_to(out),
            Atom::Mandatory(ref fields) => fields.write_to(doc, out),
            Atom::Dependent(ref dependent) => {
                if dependent.enabled {
                    dependent.fields.write_to(doc, out);
                }
            }
            Atom::Optional(ref tags) => tags.write_to(doc, out),
        }
    }

    /// Child nodes which contribute to the output.
    fn emitted_children(&self, doc: &Document, dst: &mut Vec<NodeId>) {
        match *self {
            Atom::Literal(_) => (),
            Atom::Mandatory(ref fields) => {
                dst.extend(fields.0.iter().map(|f| f.node))
            }
            Atom::Dependent(ref dependent) => {
                if dependent.enabled {
                    dst.extend(dependent.fields.0.iter().map(|f| f.node));
                }
            }
            Atom::Optional(ref tags) => dst.extend(
                tags.emitted(doc)
                    .into_iter()
                    .filter_map(|ix| tags.tags[ix].node),
            ),
        }
    }

    fn children(&self, dst: &mut Vec<NodeId>) {
        match *self {
            Atom::Literal(_) => (),
            Atom::Mandatory(ref fields) => {
                dst.extend(fields.0.iter().map(|f| f.node))
            }
            Atom::Dependent(ref dependent) => {
                dst.extend(dependent.fields.0.iter().map(|f| f.node))
            }
            Atom::Optional(ref tags) => {
                dst.extend(tags.tags.iter().filter_map(|t| t.node))
            }
        }
    }
}

/// The body of a node built from a declarative `Rule`.
#[derive(Clone, Debug)]
pub struct Structure {
    pub atoms: Vec<Atom>,
}

impl Structure {
    pub(crate) fn parse(
        rule: &Rule,
        doc: &mut Document,
        id: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        let mut atoms = Vec::with_capacity(rule.properties.len() + 2);
        atoms.push(Atom::Literal(Literal::parse(
            cursor,
            &rule.token,
            Trailing::None,
        )?));

        // Where the cursor and document were before the last property, if
        // that was a dependent block which took a value
        let mut checkpoint = None;
        for (ix, property) in rule.properties.iter().enumerate() {
            let before = (cursor.position(), doc.mark());
            let atom = match Atom::parse(property, doc, id, cursor) {
                Ok(atom) => atom,
                Err(e) => {
                    let (pos, mark) = match checkpoint.take() {
                        Some(checkpoint) => checkpoint,
                        None => return Err(e),
                    };

                    debug!(
                        "Rolling back '{}' of {} to parse '{}': {}",
                        rule.properties[ix - 1].id,
                        rule.node,
                        property.id,
                        e
                    );
                    cursor.rewind(pos);
                    doc.discard_from(mark);
                    atoms.pop();
                    atoms.push(Atom::Dependent(Dependent::create(
                        &rule.properties[ix - 1],
                        doc,
                        id,
                    )?));
                    Atom::parse(property, doc, id, cursor)?
                }
            };

            checkpoint = match atom {
                Atom::Dependent(ref d) if d.enabled => Some(before),
                _ => None,
            };
            atoms.push(atom);
        }

        if rule.terminated {
            atoms.push(Atom::Literal(Literal::parse(cursor, ";", Trailing::Line)?));
        }

        Ok(Structure { atoms })
    }

    pub(crate) fn create(
        rule: &Rule,
        doc: &mut Document,
        id: NodeId,
    ) -> Result<Self, Error> {
        let mut atoms = Vec::with_capacity(rule.properties.len() + 2);
        atoms.push(Atom::Literal(Literal::new(&rule.token, Trailing::None)));
        for property in &rule.properties {
            atoms.push(Atom::create(property, doc, id)?);
        }
        if rule.terminated {
            atoms.push(Atom::Literal(Literal::new(";", Trailing::Line)));
        }

        Ok(Structure { atoms })
    }

    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        for atom in &self.atoms {
            atom.write_to(doc, out);
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        for atom in &self.atoms {
            atom.children(&mut children);
        }
        children
    }

    pub(crate) fn require(
        &self,
        doc: &Document,
        acc: &mut Requirements<'_>,
    ) -> Result<(), Error> {
        let mut children = Vec::new();
        for atom in &self.atoms {
            if let Atom::Dependent(ref dependent) = *atom {
                if dependent.enabled {
                    acc.require(&dependent.requires)?;
                }
            }
            atom.emitted_children(doc, &mut children);
        }
        for child in children {
            doc.require_capabilities(child, acc)?;
        }
        Ok(())
    }

    /// The keyword of the structure as spelled in the script.
    pub fn keyword(&self) -> Option<&str> {
        match self.atoms.first() {
            Some(&Atom::Literal(ref literal)) => Some(literal.token()),
            _ => None,
        }
    }

    /// The node in the field or tag named `id`, if any.
    pub fn field(&self, id: &str) -> Option<NodeId> {
        self.atoms.iter().find_map(|atom| match *atom {
            Atom::Mandatory(ref fields) => {
                fields.0.iter().find(|f| f.id == id).map(|f| f.node)
            }
            Atom::Dependent(ref dependent) => dependent
                .fields
                .0
                .iter()
                .find(|f| f.id == id)
                .map(|f| f.node),
            Atom::Optional(ref tags) => {
                tags.find(id).and_then(|ix| tags.tags[ix].node)
            }
            Atom::Literal(_) => None,
        })
    }

    /// The tag set containing a tag named `id` and the tag's index.
    pub fn tag_set_mut(&mut self, id: &str) -> Option<(&mut TagSet, usize)> {
        self.atoms.iter_mut().find_map(|atom| match *atom {
            Atom::Optional(ref mut tags) => {
                tags.find(id).map(move |ix| (tags, ix))
            }
            _ => None,
        })
    }

    pub fn tag_set(&self, id: &str) -> Option<(&TagSet, usize)> {
        self.atoms.iter().find_map(|atom| match *atom {
            Atom::Optional(ref tags) => tags.find(id).map(|ix| (tags, ix)),
            _ => None,
        })
    }

    pub fn dependent_mut(&mut self, id: &str) -> Option<&mut Dependent> {
        self.atoms.iter_mut().find_map(|atom| match *atom {
            Atom::Dependent(ref mut d) if d.id == id => Some(d),
            _ => None,
        })
    }

    pub fn dependent(&self, id: &str) -> Option<&Dependent> {
        self.atoms.iter().find_map(|atom| match *atom {
            Atom::Dependent(ref d) if d.id == id => Some(d),
            _ => None,
        })
    }
}
