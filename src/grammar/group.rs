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

//! Groups: a choice of exactly one alternative.
//!
//! A group node holds at most one "current" node, which is one of the rules
//! of the group's item classes. What it means for there to be no current
//! node depends on the group's `Policy`:
//!
//! - `Mandatory`: this never happens after parsing; a new group is seeded
//!   by parsing the seed text.
//! - `Implicit`: the group has no value and the server decides.
//! - `Explicit`: the group stands for its default alternative.
//!
//! In all cases, a group without a current node writes nothing and reports
//! itself as default. Setting an explicit group's value to the text of its
//! default clears the current node rather than storing a redundant copy.
//! A default which was spelled out in the input is kept as the current
//! node, so that it is written back.

use std::sync::Arc;

use super::atoms::Literal;
use super::cursor::Cursor;
use super::rule::{GroupRule, Policy, Trailing};
use super::Grammar;
use crate::dom::{Document, NodeId};
use crate::support::error::Error;

#[derive(Clone, Debug)]
pub struct Group {
    /// The group keyword (e.g. `:comparator`) and its trailing whitespace.
    pub prefix: Option<Literal>,
    pub current: Option<NodeId>,
}

fn unknown(rule: &GroupRule, cursor: &Cursor<'_>) -> Error {
    Error::UnknownElement {
        classes: rule.items.join(", "),
        found: cursor.snippet(),
    }
}

impl Group {
    pub(crate) fn parse(
        rule: &GroupRule,
        doc: &mut Document,
        id: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        let grammar: Arc<Grammar> = doc.grammar();
        let prefix = match rule.token {
            Some(ref token) => {
                Some(Literal::parse(cursor, token, Trailing::Required)?)
            }
            None => None,
        };

        match grammar.resolve(&rule.items, cursor) {
            Some(ix) => {
                let current = doc.instantiate(ix, Some(id), Some(cursor))?;
                Ok(Group {
                    prefix,
                    current: Some(current),
                })
            }

            None => match rule.policy {
                Policy::Implicit | Policy::Explicit(_) if prefix.is_none() => {
                    Ok(Group {
                        prefix: None,
                        current: None,
                    })
                }
                _ => Err(unknown(rule, cursor)),
            },
        }
    }

    pub(crate) fn create(
        rule: &GroupRule,
        doc: &mut Document,
        id: NodeId,
    ) -> Result<Self, Error> {
        let current = match rule.policy {
            Policy::Mandatory(ref seed) => {
                Some(doc.parse_class_text(&rule.items, Some(id), seed)?)
            }
            Policy::Implicit | Policy::Explicit(_) => None,
        };

        Ok(Group {
            prefix: rule
                .token
                .as_ref()
                .map(|t| Literal::new(t, Trailing::Required)),
            current,
        })
    }

    pub fn is_default(&self) -> bool {
        self.current.is_none()
    }

    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        if let Some(current) = self.current {
            if let Some(ref prefix) = self.prefix {
                prefix.write_to(out);
            }
            doc.write(current, out);
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeId> {
        self.current.into_iter().collect()
    }
}
