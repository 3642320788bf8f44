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

//! Structural edits: moving nodes between containers and removing them.
//!
//! Statement blocks, the branch list of a condition and the test list of
//! `allof`/`anyof` are list containers; any node of a compatible class can
//! be appended to them. The test of an `if` or `not` is a single slot, set
//! with `set_test()`. Nodes bound into the fields and tags of a structure
//! are not moved by these operations.

use log::debug;

use super::{Body, Document, NodeId};
use crate::sieve::{ACTION, CONDITION, IMPORT, TEST, WHITESPACE};
use crate::support::error::Error;

impl Document {
    /// Append `node` to the list container `container`.
    ///
    /// If `before` is given, `node` is inserted in front of that child of
    /// `container`, otherwise at the end. A node which already sits in a
    /// list container is moved out of it first; a node bound anywhere else
    /// fails with `AlreadyAttached`.
    pub fn append(
        &mut self,
        container: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), Error> {
        if node == self.root {
            return Err(Error::RootImmovable);
        }

        self.node(node)?;
        self.check_compatible(container, node, before)?;
        if let Some(sibling) = before {
            if self.parent(sibling)? != Some(container) || sibling == node {
                return Err(Error::NotAChild {
                    parent: container,
                    child: sibling,
                });
            }
        }

        let mut ancestor = Some(container);
        while let Some(id) = ancestor {
            if id == node {
                return Err(Error::CyclicAppend(node));
            }
            ancestor = self.parent(id)?;
        }

        let old_parent = self.parent(node)?;
        if let Some(old_parent) = old_parent {
            if !self.detach_listed(old_parent, node)? {
                return Err(Error::AlreadyAttached(node));
            }
        }

        self.insert(container, node, before)?;
        self.node_mut(node)?.parent = Some(container);

        if let Some(old_parent) = old_parent.filter(|&p| p != container) {
            self.settle(old_parent)?;
        }
        self.settle(container)?;
        Ok(())
    }

    fn check_compatible(
        &self,
        container: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), Error> {
        let class = self.class(node)?;
        let compatible = match self.node(container)?.body {
            Body::Block(_) if container == self.imports() => {
                IMPORT == class || WHITESPACE == class
            }
            Body::Block(_) | Body::If(_) | Body::Else(_) => {
                [ACTION, CONDITION, WHITESPACE].contains(&class)
            }
            Body::Condition(ref condition) => {
                match self.node(node)?.body {
                    Body::If(_) => true,
                    // Only one else, and only at the end
                    Body::Else(_) => {
                        before.is_none()
                            && condition
                                .branches
                                .iter()
                                .filter(|&&b| b != node)
                                .all(|&b| !self.is_else(b))
                    }
                    _ => false,
                }
            }
            Body::Junction(_) => TEST == class,
            _ => return Err(Error::NotAContainer(container)),
        };

        if compatible {
            Ok(())
        } else {
            Err(Error::Incompatible {
                parent: container,
                child: node,
            })
        }
    }

    fn is_else(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(&id).map(|n| &n.body), Some(&Body::Else(_)))
    }

    fn insert(
        &mut self,
        container: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), Error> {
        let node_is_else = self.is_else(node);
        let last_is_else = match self.node(container)?.body {
            Body::Condition(ref condition) => condition
                .branches
                .last()
                .map_or(false, |&b| self.is_else(b)),
            _ => false,
        };

        let body = &mut self.node_mut(container)?.body;
        if let Body::Junction(ref mut junction) = *body {
            let ix = before
                .and_then(|b| junction.position(b))
                .unwrap_or_else(|| junction.len());
            junction.insert(ix, node);
            return Ok(());
        }

        let list = match *body {
            Body::Condition(ref mut condition) => &mut condition.branches,
            ref mut body => body
                .statements_mut()
                .ok_or(Error::NotAContainer(container))?,
        };

        let ix = match before {
            Some(sibling) => list
                .iter()
                .position(|&c| c == sibling)
                .unwrap_or_else(|| list.len()),
            // New branches go in front of a trailing else
            None if last_is_else && !node_is_else => list.len() - 1,
            None => list.len(),
        };
        list.insert(ix, node);
        Ok(())
    }

    /// Remove `child` from a list container, returning whether it was in one.
    fn detach_listed(
        &mut self,
        container: NodeId,
        child: NodeId,
    ) -> Result<bool, Error> {
        let body = &mut self.node_mut(container)?.body;
        let found = match *body {
            Body::Condition(ref mut condition) => {
                remove_item(&mut condition.branches, child)
            }
            Body::Junction(ref mut junction) => junction.remove(child),
            ref mut body => match body.statements_mut() {
                Some(list) => remove_item(list, child),
                None => false,
            },
        };

        if found {
            self.node_mut(child)?.parent = None;
        }
        Ok(found)
    }

    /// Detach `child` from `container` by whatever means it is held.
    fn detach(
        &mut self,
        container: NodeId,
        child: NodeId,
        cascade: bool,
    ) -> Result<(), Error> {
        if self.detach_listed(container, child)? {
            return Ok(());
        }

        let body = &mut self.node_mut(container)?.body;
        let slot = match *body {
            Body::If(ref mut branch) => &mut branch.test,
            Body::Not(ref mut not) => &mut not.test,
            _ => return Err(Error::NotAContainer(container)),
        };

        if *slot != Some(child) {
            return Err(Error::NotAChild {
                parent: container,
                child,
            });
        }
        // A branch or negation without a test cannot be written out
        if !cascade {
            return Err(Error::RequiresCascade(child));
        }
        *slot = None;
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Remove the direct child `child` of `container` and free it.
    ///
    /// With `cascade`, a container left empty is removed from its own
    /// parent in turn, up to but not including `stop` or the root. A
    /// condition left without branches is always removed; one whose first
    /// branch is now an `else` is replaced by the statements of that `else`.
    ///
    /// Returns the outermost node which was removed.
    pub fn remove_child(
        &mut self,
        container: NodeId,
        child: NodeId,
        mut cascade: bool,
        stop: Option<NodeId>,
    ) -> Result<NodeId, Error> {
        if self.parent(child)? != Some(container) {
            return Err(Error::NotAChild {
                parent: container,
                child,
            });
        }

        let (mut container, mut child) = (container, child);
        loop {
            self.detach(container, child, cascade)?;
            self.free(child);
            debug!("Removed {} from {}", child, container);

            if Some(container) == stop {
                cascade = false;
            }

            let dissolve = self.settle(container)?;
            let next = match self.parent(container)? {
                Some(parent)
                    if dissolve
                        || (cascade && self.is_empty_container(container)) =>
                {
                    parent
                }
                _ => return Ok(child),
            };

            child = container;
            container = next;
        }
    }

    /// Remove `node` from its parent.
    ///
    /// See `remove_child()`.
    pub fn remove(
        &mut self,
        node: NodeId,
        cascade: bool,
        stop: Option<NodeId>,
    ) -> Result<NodeId, Error> {
        if node == self.root {
            return Err(Error::RootImmovable);
        }

        let parent = self.parent(node)?.ok_or(Error::Detached(node))?;
        self.remove_child(parent, node, cascade, stop)
    }

    /// Replace the test of the `if` or `not` node `owner` with `test`.
    ///
    /// `test` must not be attached anywhere. The old test is freed.
    pub fn set_test(&mut self, owner: NodeId, test: NodeId) -> Result<(), Error> {
        if self.parent(test)?.is_some() || test == self.root {
            return Err(Error::AlreadyAttached(test));
        }
        if TEST != self.class(test)? {
            return Err(Error::Incompatible {
                parent: owner,
                child: test,
            });
        }

        let mut ancestor = Some(owner);
        while let Some(id) = ancestor {
            if id == test {
                return Err(Error::CyclicAppend(test));
            }
            ancestor = self.parent(id)?;
        }

        let body = &mut self.node_mut(owner)?.body;
        let slot = match *body {
            Body::If(ref mut branch) => &mut branch.test,
            Body::Not(ref mut not) => &mut not.test,
            _ => return Err(Error::NotAContainer(owner)),
        };

        let old = std::mem::replace(slot, Some(test));
        self.node_mut(test)?.parent = Some(owner);
        if let Some(old) = old {
            self.free(old);
        }
        Ok(())
    }

    /// Whether `id` would be removed by a cascade passing through it.
    fn is_empty_container(&self, id: NodeId) -> bool {
        let body = match self.nodes.get(&id) {
            Some(node) => &node.body,
            None => return false,
        };

        match *body {
            Body::If(ref branch) => branch.test.is_none(),
            Body::Else(ref branch) => branch
                .block
                .children
                .iter()
                .all(|&c| self.class(c).map_or(true, |c| WHITESPACE == c)),
            Body::Condition(ref condition) => condition.branches.is_empty(),
            Body::Not(ref not) => not.test.is_none(),
            Body::Junction(ref junction) => 0 == junction.len(),
            _ => false,
        }
    }

    /// Restore the invariants of a condition after its branches changed.
    ///
    /// Returns whether the condition must be removed from its parent.
    fn settle(&mut self, id: NodeId) -> Result<bool, Error> {
        let branches = match self.node(id)?.body {
            Body::Condition(ref condition) => condition.branches.clone(),
            _ => return Ok(false),
        };

        let first = match branches.first() {
            Some(&first) => first,
            None => return Ok(true),
        };

        if self.is_else(first) {
            self.hoist_else(id, first)?;
            return Ok(true);
        }

        for (ix, &branch) in branches.iter().enumerate() {
            if let Body::If(ref mut branch) = self.node_mut(branch)?.body {
                branch.respell(if 0 == ix { "if" } else { "elsif" });
            }
        }
        Ok(false)
    }

    /// Move the statements of the `else` branch `branch` of `condition` in
    /// front of the condition and drop the branch.
    fn hoist_else(
        &mut self,
        condition: NodeId,
        branch: NodeId,
    ) -> Result<(), Error> {
        let statements = match self.node(branch)?.body {
            Body::Else(ref branch) => branch.block.children.clone(),
            _ => return Ok(()),
        };

        if let Some(parent) = self.parent(condition)? {
            debug!(
                "Hoisting {} statements of else {} into {}",
                statements.len(),
                branch,
                parent
            );
            for statement in statements {
                self.detach_listed(branch, statement)?;
                self.insert(parent, statement, Some(condition))?;
                self.node_mut(statement)?.parent = Some(parent);
            }
        }

        self.detach_listed(condition, branch)?;
        self.free(branch);
        Ok(())
    }
}

fn remove_item(list: &mut Vec<NodeId>, item: NodeId) -> bool {
    match list.iter().position(|&c| c == item) {
        Some(ix) => {
            list.remove(ix);
            true
        }
        None => false,
    }
}
