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

use std::fmt;

use super::Document;
use crate::grammar::atoms::Structure;
use crate::grammar::capabilities::Requirements;
use crate::grammar::group::Group;
use crate::grammar::lex::Whitespace;
use crate::sieve::blocks::{Block, Root};
use crate::sieve::conditions::{Condition, ElseBranch, IfBranch};
use crate::sieve::operators::{Junction, Not};
use crate::sieve::strings::{Number, SieveString, StringList};
use crate::support::error::Error;

/// Identifies a node within its document.
///
/// Ids are allocated in increasing order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    /// Index of the grammar descriptor this node was built from.
    pub(crate) descriptor: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: Body,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

/// The kind-specific content of a node.
#[derive(Clone, Debug)]
pub enum Body {
    Whitespace(Whitespace),
    String(SieveString),
    StringList(StringList),
    Number(Number),
    Structure(Structure),
    Group(Group),
    Root(Root),
    Block(Block),
    Condition(Condition),
    If(IfBranch),
    Else(ElseBranch),
    Not(Not),
    Junction(Junction),
}

impl Body {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        match *self {
            Body::Whitespace(ref ws) => ws.write_to(out),
            Body::String(ref s) => s.write_to(out),
            Body::StringList(ref l) => l.write_to(out),
            Body::Number(ref n) => n.write_to(out),
            Body::Structure(ref s) => s.write_to(doc, out),
            Body::Group(ref g) => g.write_to(doc, out),
            Body::Root(ref r) => r.write_to(doc, out),
            Body::Block(ref b) => b.write_to(doc, out),
            Body::Condition(ref c) => c.write_to(doc, out),
            Body::If(ref b) => b.write_to(doc, out),
            Body::Else(ref b) => b.write_to(doc, out),
            Body::Not(ref n) => n.write_to(doc, out),
            Body::Junction(ref j) => j.write_to(doc, out),
        }
    }

    /// Every node owned by this one.
    pub(crate) fn children(&self) -> Vec<NodeId> {
        match *self {
            Body::Whitespace(_)
            | Body::String(_)
            | Body::StringList(_)
            | Body::Number(_) => Vec::new(),
            Body::Structure(ref s) => s.children(),
            Body::Group(ref g) => g.children(),
            Body::Root(ref r) => vec![r.imports, r.body],
            Body::Block(ref b) => b.children.clone(),
            Body::Condition(ref c) => c.branches.clone(),
            Body::If(ref b) => {
                b.test.iter().chain(&b.block.children).copied().collect()
            }
            Body::Else(ref b) => b.block.children.clone(),
            Body::Not(ref n) => n.test.into_iter().collect(),
            Body::Junction(ref j) => j.tests().collect(),
        }
    }

    /// Add the requirements of every child which is part of the output to
    /// `acc`.
    pub(crate) fn require(
        &self,
        doc: &Document,
        acc: &mut Requirements<'_>,
    ) -> Result<(), Error> {
        if let Body::Structure(ref s) = *self {
            return s.require(doc, acc);
        }

        // Everything else writes all of its children
        for child in self.children() {
            doc.require_capabilities(child, acc)?;
        }
        Ok(())
    }

    /// The ordered list of statements this node contains, if it is a
    /// statement container.
    pub(crate) fn statements_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match *self {
            Body::Block(ref mut b) => Some(&mut b.children),
            Body::If(ref mut b) => Some(&mut b.block.children),
            Body::Else(ref mut b) => Some(&mut b.block.children),
            _ => None,
        }
    }

    pub(crate) fn statements(&self) -> Option<&[NodeId]> {
        match *self {
            Body::Block(ref b) => Some(&b.children),
            Body::If(ref b) => Some(&b.block.children),
            Body::Else(ref b) => Some(&b.block.children),
            _ => None,
        }
    }
}
