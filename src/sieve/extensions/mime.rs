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

//! RFC 5703 MIME part tests.
//!
//! Only the tags on `header`, `address` and `exists` are supported; the
//! `foreverypart` loop and its relatives are not.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Property, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::strings::STRING_LIST;

pub fn register(builder: &mut GrammarBuilder) {
    keywords! {
        builder, "mime/", Requirement::from("mime");
        "tag/mime" => ":mime",
        "tag/anychild" => ":anychild",
    }

    builder.add_group(
        GroupRule::implicit("mime-opts", &["mime-opts/"]).requires("mime"),
    );
    keywords! {
        builder, "mime-opts/", Requirement::from("mime");
        "mime-opts/type" => ":type",
        "mime-opts/subtype" => ":subtype",
        "mime-opts/contenttype" => ":contenttype",
    }
    builder.add(
        Rule::tag("mime-opts/param", "mime-opts/", ":param")
            .requires("mime")
            .parameters(vec![slot("params", STRING_LIST).value("\"charset\"")]),
    );

    for &node in &["test/header", "test/address", "test/exists"] {
        builder.extend(
            node,
            Property::tags(
                "tags",
                vec![
                    slot("mime", "tag/mime"),
                    slot("anychild", "tag/anychild"),
                    slot("mime-opts", "mime-opts"),
                ],
            ),
        );
    }
}
