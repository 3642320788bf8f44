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

//! RFC 5229 `variables`.
//!
//! Modifiers of the same precedence exclude each other, so each
//! precedence level is a group.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::{STRING, STRING_LIST};

pub fn register(builder: &mut GrammarBuilder) {
    builder.add_group(
        GroupRule::implicit("modifier/case", &["modifier/case/"])
            .requires("variables"),
    );
    keywords! {
        builder, "modifier/case/", Requirement::from("variables");
        "modifier/lower" => ":lower",
        "modifier/upper" => ":upper",
    }
    builder.add_group(
        GroupRule::implicit("modifier/first", &["modifier/first/"])
            .requires("variables"),
    );
    keywords! {
        builder, "modifier/first/", Requirement::from("variables");
        "modifier/lowerfirst" => ":lowerfirst",
        "modifier/upperfirst" => ":upperfirst",
    }
    keywords! {
        builder, "modifier/", Requirement::from("variables");
        "modifier/quotewildcard" => ":quotewildcard",
        "modifier/length" => ":length",
    }

    builder.add(
        Rule::action("action/set", "set")
            .requires("variables")
            .tags(vec![
                slot("case", "modifier/case"),
                slot("first", "modifier/first"),
                slot("quotewildcard", "modifier/quotewildcard"),
                slot("length", "modifier/length"),
            ])
            .parameters(vec![
                slot("name", STRING).value("\"variable\""),
                slot("value", STRING).value("\"\""),
            ]),
    );

    builder.add(
        Rule::test("test/string", "string")
            .requires("variables")
            .tags(comparison_tags())
            .parameters(vec![
                slot("source", STRING_LIST).value("\"${variable}\""),
                slot("keys", STRING_LIST).value("\"\""),
            ]),
    );
}
