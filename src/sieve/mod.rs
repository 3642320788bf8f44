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

//! The rules of the Sieve language.
//!
//! The structural elements (strings, blocks, conditions and the logical
//! operators) are native rules with hand-written parsers. Everything else,
//! from `keep` to `vacation`, is declared as data in the RFC and extension
//! modules.

use crate::grammar::capabilities::Capabilities;
use crate::grammar::{Grammar, GrammarBuilder};

pub mod blocks;
pub mod conditions;
pub mod extensions;
pub mod operators;
pub mod rfc5228;
pub mod strings;

/// The class of commands in a block.
pub const ACTION: &str = "action";
/// The class of `if` statements.
pub const CONDITION: &str = "condition";
/// The class of `require` statements.
pub const IMPORT: &str = "import";
/// The class of tests in conditions and logical operators.
pub const TEST: &str = "test";
/// The class of free-standing whitespace and comments.
pub const WHITESPACE: &str = "whitespace";

/// Add every rule of the language and all known extensions to `builder`.
pub fn register(builder: &mut GrammarBuilder) {
    strings::register(builder);
    blocks::register(builder);
    conditions::register(builder);
    operators::register(builder);
    rfc5228::register(builder);
    extensions::register(builder);
}

/// Build the complete grammar for a server with `capabilities`.
pub fn grammar(capabilities: Capabilities) -> Grammar {
    let mut builder = Grammar::builder();
    register(&mut builder);
    builder.build(capabilities)
}
