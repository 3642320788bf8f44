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

//! RFC 5232 `imap4flags`.
//!
//! The flag actions and `hasflag` take an optional variable name before the
//! flag list, which is only recognised together with `variables`. Since
//! both are strings, a lone string is the flag list.

use crate::grammar::rule::{slot, Property, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::{STRING, STRING_LIST};

pub fn register(builder: &mut GrammarBuilder) {
    for &(node, token) in &[
        ("action/setflag", "setflag"),
        ("action/addflag", "addflag"),
        ("action/removeflag", "removeflag"),
    ] {
        builder.add(
            Rule::action(node, token)
                .requires("imap4flags")
                .dependent(
                    slot("variablename", STRING).value("\"\""),
                    "variables",
                )
                .parameters(vec![
                    slot("flags", STRING_LIST).value("\"\\\\Flagged\"")
                ]),
        );
    }

    builder.add(
        Rule::test("test/hasflag", "hasflag")
            .requires("imap4flags")
            .tags(comparison_tags())
            .dependent(slot("variables", STRING_LIST).value("\"\""), "variables")
            .parameters(vec![
                slot("flags", STRING_LIST).value("\"\\\\Flagged\"")
            ]),
    );

    builder.add(
        Rule::tag("tag/flags", "flags/", ":flags")
            .requires("imap4flags")
            .parameters(vec![
                slot("flags", STRING_LIST).value("\"\\\\Flagged\"")
            ]),
    );
    for &node in &["action/keep", "action/fileinto"] {
        builder.extend(
            node,
            Property::tags("tags", vec![slot("flags", "tag/flags")]),
        );
    }
}
