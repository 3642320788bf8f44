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

//! RFC 5173 `body`.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::STRING_LIST;

pub fn register(builder: &mut GrammarBuilder) {
    let mut tags = vec![slot("transform", "body-transform")];
    tags.extend(comparison_tags());

    builder.add(
        Rule::test("test/body", "body")
            .requires("body")
            .tags(tags)
            .parameters(vec![slot("keys", STRING_LIST).value("\"\"")]),
    );

    builder.add_group(
        GroupRule::explicit("body-transform", &["body-transform/"], ":text")
            .requires("body"),
    );
    keywords! {
        builder, "body-transform/", Requirement::from("body");
        "body-transform/raw" => ":raw",
        "body-transform/text" => ":text",
    }
    builder.add(
        Rule::tag("body-transform/content", "body-transform/", ":content")
            .requires("body")
            .parameters(vec![slot("content-types", STRING_LIST).value("\"text\"")]),
    );
}
