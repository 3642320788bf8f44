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

//! Typed access to the content of individual nodes.

use super::{Body, Document, NodeId};
use crate::grammar::atoms::{Literal, Structure};
use crate::grammar::group::Group;
use crate::grammar::rule::{GroupRule, Policy, Trailing};
use crate::grammar::Kind;
use crate::support::error::Error;

impl Document {
    fn structure(&self, node: NodeId) -> Result<&Structure, Error> {
        match self.node(node)?.body {
            Body::Structure(ref s) => Ok(s),
            _ => Err(Error::WrongKind(node)),
        }
    }

    fn structure_mut(
        &mut self,
        node: NodeId,
    ) -> Result<&mut Structure, Error> {
        match self.node_mut(node)?.body {
            Body::Structure(ref mut s) => Ok(s),
            _ => Err(Error::WrongKind(node)),
        }
    }

    fn no_such_property(node: NodeId, property: &str) -> Error {
        Error::NoSuchProperty {
            node,
            property: property.to_owned(),
        }
    }

    /// The node in the field or tag `id` of the structure `node`.
    ///
    /// Fails if there is no such field, or if it is a tag that is absent.
    pub fn field(&self, node: NodeId, id: &str) -> Result<NodeId, Error> {
        self.structure(node)?
            .field(id)
            .ok_or_else(|| Self::no_such_property(node, id))
    }

    /// Whether the tag `id` of `node` is written out.
    pub fn is_tag_enabled(
        &self,
        node: NodeId,
        id: &str,
    ) -> Result<bool, Error> {
        let (tags, ix) = self
            .structure(node)?
            .tag_set(id)
            .ok_or_else(|| Self::no_such_property(node, id))?;
        Ok(tags.tags[ix]
            .node
            .map_or(false, |tag| !self.is_default_node(tag)))
    }

    /// Make the tag `id` of `node` present, creating it with its default
    /// content if needed. Returns the tag's node.
    pub fn enable_tag(
        &mut self,
        node: NodeId,
        id: &str,
    ) -> Result<NodeId, Error> {
        let (ty, existing) = {
            let (tags, ix) = self
                .structure(node)?
                .tag_set(id)
                .ok_or_else(|| Self::no_such_property(node, id))?;
            (tags.tags[ix].ty.clone(), tags.tags[ix].node)
        };

        let tag = match existing {
            Some(tag) => tag,
            None => self.create_named(&ty, Some(node), None)?,
        };

        if let Some((tags, ix)) = self.structure_mut(node)?.tag_set_mut(id) {
            tags.tags[ix].node = Some(tag);
            if !tags.seen.contains(&ix) {
                tags.seen.push(ix);
            }
        }
        Ok(tag)
    }

    /// Remove the tag `id` from `node`, freeing its content.
    pub fn disable_tag(
        &mut self,
        node: NodeId,
        id: &str,
    ) -> Result<(), Error> {
        let old = {
            let (tags, ix) = self
                .structure_mut(node)?
                .tag_set_mut(id)
                .ok_or_else(|| Self::no_such_property(node, id))?;
            tags.seen.retain(|&s| s != ix);
            tags.tags[ix].node.take()
        };

        if let Some(old) = old {
            self.free(old);
        }
        Ok(())
    }

    /// The text of the tag `id` of `node`.
    ///
    /// A group tag yields its resolved value, which is its default if it is
    /// absent. Other tags yield their text if present.
    pub fn tag_value(
        &self,
        node: NodeId,
        id: &str,
    ) -> Result<Option<String>, Error> {
        let (tags, ix) = self
            .structure(node)?
            .tag_set(id)
            .ok_or_else(|| Self::no_such_property(node, id))?;
        let tag = &tags.tags[ix];

        match tag.node {
            Some(tag) if self.group_rule_of(tag).is_ok() => self.group_value(tag),
            Some(tag) => self.to_script(tag).map(Some),
            None => {
                let grammar = self.grammar();
                let ix = grammar.lookup(&tag.ty)?;
                Ok(match grammar.descriptor(ix).kind {
                    Kind::Group(ref rule) => {
                        rule.default_value().map(str::to_owned)
                    }
                    _ => None,
                })
            }
        }
    }

    /// Set the group tag `id` of `node` to the alternative `text`.
    ///
    /// Setting an explicit group to its default removes the tag.
    pub fn set_tag_value(
        &mut self,
        node: NodeId,
        id: &str,
        text: &str,
    ) -> Result<(), Error> {
        let tag = self.enable_tag(node, id)?;
        self.set_group_value(tag, text)?;
        if self.is_default_node(tag) {
            if let Some((tags, ix)) = self.structure_mut(node)?.tag_set_mut(id)
            {
                tags.seen.retain(|&s| s != ix);
            }
        }
        Ok(())
    }

    pub fn is_dependent_enabled(
        &self,
        node: NodeId,
        id: &str,
    ) -> Result<bool, Error> {
        self.structure(node)?
            .dependent(id)
            .map(|d| d.enabled)
            .ok_or_else(|| Self::no_such_property(node, id))
    }

    /// Turn the dependent block `id` of `node` on or off.
    ///
    /// Turning it on requires the block's capabilities.
    pub fn set_dependent_enabled(
        &mut self,
        node: NodeId,
        id: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        if enabled {
            let grammar = self.grammar();
            let descriptor = grammar.descriptor(self.node(node)?.descriptor);
            if let Kind::Structure(ref rule) = descriptor.kind {
                if let Some(property) =
                    rule.properties.iter().find(|p| p.id == id)
                {
                    if !property.requires.is_satisfied(grammar.capabilities()) {
                        return Err(Error::Unsupported(format!(
                            "{} of {} requires {}",
                            id, descriptor.name, property.requires
                        )));
                    }
                }
            }
        }

        self.structure_mut(node)?
            .dependent_mut(id)
            .ok_or_else(|| Self::no_such_property(node, id))?
            .enabled = enabled;
        Ok(())
    }

    fn group(&self, group: NodeId) -> Result<&Group, Error> {
        match self.node(group)?.body {
            Body::Group(ref g) => Ok(g),
            _ => Err(Error::WrongKind(group)),
        }
    }

    fn group_rule_of(&self, group: NodeId) -> Result<GroupRule, Error> {
        match self.descriptor(group)?.kind {
            Kind::Group(ref rule) => Ok(rule.clone()),
            _ => Err(Error::WrongKind(group)),
        }
    }

    /// Whether the group `group` stands for its default.
    pub fn is_default(&self, group: NodeId) -> Result<bool, Error> {
        self.group(group).map(Group::is_default)
    }

    /// The text of the current alternative of `group`, or the default of an
    /// explicit group which has none.
    pub fn group_value(&self, group: NodeId) -> Result<Option<String>, Error> {
        match self.group(group)?.current {
            Some(current) => self.to_script(current).map(Some),
            None => Ok(self
                .group_rule_of(group)?
                .default_value()
                .map(str::to_owned)),
        }
    }

    /// Make `text` the current alternative of `group`.
    ///
    /// For explicit groups, the default text clears the current alternative
    /// instead.
    pub fn set_group_value(
        &mut self,
        group: NodeId,
        text: &str,
    ) -> Result<(), Error> {
        let rule = self.group_rule_of(group)?;
        let new = match rule.policy {
            Policy::Explicit(ref default) if default == text => None,
            _ => Some(self.parse_class_text(&rule.items, Some(group), text)?),
        };

        let old = match self.node_mut(group)?.body {
            Body::Group(ref mut g) => {
                if g.prefix.is_none() {
                    g.prefix = rule
                        .token
                        .as_ref()
                        .map(|t| Literal::new(t, Trailing::Required));
                }
                std::mem::replace(&mut g.current, new)
            }
            _ => return Err(Error::WrongKind(group)),
        };

        if let Some(old) = old {
            self.free(old);
        }
        Ok(())
    }

    /// The value of the string node `id`.
    pub fn string_value(&self, id: NodeId) -> Result<String, Error> {
        match self.node(id)?.body {
            Body::String(ref s) => Ok(s.value()),
            _ => Err(Error::WrongKind(id)),
        }
    }

    pub fn set_string_value(
        &mut self,
        id: NodeId,
        value: &str,
    ) -> Result<(), Error> {
        match self.node_mut(id)?.body {
            Body::String(ref mut s) => {
                s.set_value(value);
                Ok(())
            }
            _ => Err(Error::WrongKind(id)),
        }
    }

    /// The values of the string list node `id`.
    pub fn string_list(&self, id: NodeId) -> Result<Vec<String>, Error> {
        match self.node(id)?.body {
            Body::StringList(ref l) => Ok(l.values()),
            _ => Err(Error::WrongKind(id)),
        }
    }

    pub fn set_string_list<S: AsRef<str>>(
        &mut self,
        id: NodeId,
        values: &[S],
    ) -> Result<(), Error> {
        match self.node_mut(id)?.body {
            Body::StringList(ref mut l) => {
                l.set_values(values);
                Ok(())
            }
            _ => Err(Error::WrongKind(id)),
        }
    }

    /// Add `value` to the string list `id` unless it is already there.
    pub fn string_list_append(
        &mut self,
        id: NodeId,
        value: &str,
    ) -> Result<(), Error> {
        let mut values = self.string_list(id)?;
        if !values.iter().any(|v| v == value) {
            values.push(value.to_owned());
            self.set_string_list(id, &values)?;
        }
        Ok(())
    }

    /// Remove every occurrence of `value` from the string list `id`.
    pub fn string_list_remove(
        &mut self,
        id: NodeId,
        value: &str,
    ) -> Result<(), Error> {
        let mut values = self.string_list(id)?;
        let len = values.len();
        values.retain(|v| v != value);
        if values.len() != len {
            self.set_string_list(id, &values)?;
        }
        Ok(())
    }

    pub fn string_list_contains(
        &self,
        id: NodeId,
        value: &str,
    ) -> Result<bool, Error> {
        Ok(self.string_list(id)?.iter().any(|v| v == value))
    }

    /// The value of the number node `id`, with its quantifier applied.
    pub fn number_value(&self, id: NodeId) -> Result<u64, Error> {
        match self.node(id)?.body {
            Body::Number(ref n) => n.value(),
            _ => Err(Error::WrongKind(id)),
        }
    }

    pub fn set_number(
        &mut self,
        id: NodeId,
        value: u64,
        unit: Option<char>,
    ) -> Result<(), Error> {
        match self.node_mut(id)?.body {
            Body::Number(ref mut n) => n.set(value, unit),
            _ => Err(Error::WrongKind(id)),
        }
    }
}
