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

//! RFC 6609 `include`, `global` and `return`.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::strings::{STRING, STRING_LIST};

pub fn register(builder: &mut GrammarBuilder) {
    builder.add_group(
        GroupRule::explicit(
            "include-location",
            &["include-location/"],
            ":personal",
        )
        .requires("include"),
    );
    keywords! {
        builder, "include-location/", Requirement::from("include");
        "include-location/personal" => ":personal",
        "include-location/global" => ":global",
    }
    keywords! {
        builder, "include/", Requirement::from("include");
        "include/once" => ":once",
        "include/optional" => ":optional",
    }

    builder.add(
        Rule::action("action/include", "include")
            .requires("include")
            .tags(vec![
                slot("location", "include-location"),
                slot("once", "include/once"),
                slot("optional", "include/optional"),
            ])
            .parameters(vec![slot("script", STRING).value("\"script\"")]),
    );
    builder.add(
        Rule::action("action/global", "global")
            .requires(Requirement::all(&["include", "variables"]))
            .parameters(vec![slot("variables", STRING_LIST).value("\"\"")]),
    );
    builder.add(Rule::action("action/return", "return").requires("include"));
}
