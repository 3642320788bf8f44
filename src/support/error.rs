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

use std::io;

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{expected} expected at \"{found}\"")]
    Syntax { expected: String, found: String },
    #[error("Unknown or incompatible element ({classes}) at \"{found}\"")]
    UnknownElement { classes: String, found: String },
    #[error("Unknown element at \"{0}\"")]
    Unparsed(String),
    #[error("No grammar rule named '{0}'")]
    UnknownName(String),
    #[error("Capability not supported: {0}")]
    Unsupported(String),
    #[error("Unknown capability string \"{0}\"")]
    UnknownCapability(String),
    #[error("Invalid capability name \"{0}\"")]
    InvalidCapabilityName(String),
    #[error("No such node: {0}")]
    NoSuchNode(NodeId),
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("Node {0} has no parent")]
    Detached(NodeId),
    #[error("Node {0} is bound to a fixed position of its parent")]
    AlreadyAttached(NodeId),
    #[error("Node {0} cannot contain other nodes")]
    NotAContainer(NodeId),
    #[error("Node {child} cannot be placed in {parent}")]
    Incompatible { parent: NodeId, child: NodeId },
    #[error("Node {0} cannot be moved into its own subtree")]
    CyclicAppend(NodeId),
    #[error("Removing the test of {0} requires a cascading removal")]
    RequiresCascade(NodeId),
    #[error("The document root cannot be moved or removed")]
    RootImmovable,
    #[error("Node {node} has no property '{property}'")]
    NoSuchProperty { node: NodeId, property: String },
    #[error("Node {0} does not hold a value of the requested kind")]
    WrongKind(NodeId),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error means the input did not have the expected shape.
    pub fn is_syntax(&self) -> bool {
        matches!(*self, Error::Syntax { .. })
    }

    /// Whether this error means no capable grammar rule matched the input.
    ///
    /// This is also what a construct whose capability is missing results
    /// in, since such rules are never considered while parsing.
    pub fn is_unknown_element(&self) -> bool {
        matches!(*self, Error::UnknownElement { .. } | Error::Unparsed(..))
    }

    /// Whether this error was caused by an invalid edit of the node tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            *self,
            Error::NoSuchNode(..)
                | Error::NotAChild { .. }
                | Error::Detached(..)
                | Error::AlreadyAttached(..)
                | Error::NotAContainer(..)
                | Error::Incompatible { .. }
                | Error::CyclicAppend(..)
                | Error::RequiresCascade(..)
                | Error::RootImmovable
                | Error::NoSuchProperty { .. }
                | Error::WrongKind(..)
        )
    }
}
