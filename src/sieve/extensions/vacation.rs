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

//! RFC 5230 `vacation` and RFC 6131 `vacation-seconds`.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::strings::{NUMBER, STRING, STRING_LIST};

const VACATION: &[&str] = &["vacation", "vacation-seconds"];

pub fn register(builder: &mut GrammarBuilder) {
    builder.add_group(
        GroupRule::implicit("vacation-interval", &["vacation-interval/"])
            .requires(Requirement::any(VACATION)),
    );
    builder.add(
        Rule::tag("vacation-interval/days", "vacation-interval/", ":days")
            .requires(Requirement::any(VACATION))
            .parameters(vec![slot("days", NUMBER).value("7")]),
    );
    builder.add(
        Rule::tag(
            "vacation-interval/seconds",
            "vacation-interval/",
            ":seconds",
        )
        .requires("vacation-seconds")
        .parameters(vec![slot("seconds", NUMBER).value("1800")]),
    );

    for &(node, token, ty, value) in &[
        ("vacation/subject", ":subject", STRING, "\"Out of office\""),
        ("vacation/from", ":from", STRING, "\"me@example.com\""),
        (
            "vacation/addresses",
            ":addresses",
            STRING_LIST,
            "\"me@example.com\"",
        ),
        ("vacation/handle", ":handle", STRING, "\"\""),
    ] {
        builder.add(
            Rule::tag(node, "vacation/", token)
                .requires(Requirement::any(VACATION))
                .parameters(vec![slot("value", ty).value(value)]),
        );
    }
    keywords! {
        builder, "vacation/", Requirement::any(VACATION);
        "vacation/mime" => ":mime",
    }

    builder.add(
        Rule::action("action/vacation", "vacation")
            .requires(Requirement::any(VACATION))
            .tags(vec![
                slot("interval", "vacation-interval"),
                slot("subject", "vacation/subject"),
                slot("from", "vacation/from"),
                slot("addresses", "vacation/addresses"),
                slot("mime", "vacation/mime"),
                slot("handle", "vacation/handle"),
            ])
            .parameters(vec![slot("reason", STRING).value("\"I am away\"")]),
    );
}
