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

//! RFC 5260 `date` and `currentdate`.

use crate::grammar::rule::{slot, GroupRule, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::{STRING, STRING_LIST};

pub fn register(builder: &mut GrammarBuilder) {
    // Without a zone, the server uses its own
    builder.add_group(GroupRule::implicit("zone", &["zone/"]).requires("date"));
    builder.add(
        Rule::tag("zone/zone", "zone/", ":zone")
            .requires("date")
            .parameters(vec![slot("time-zone", STRING).value("\"+0100\"")]),
    );
    builder.add(
        Rule::tag("zone/originalzone", "zone/", ":originalzone")
            .requires("date"),
    );

    let mut tags = vec![slot("zone", "zone")];
    tags.extend(comparison_tags());

    builder.add(
        Rule::test("test/date", "date")
            .requires("date")
            .tags(tags.clone())
            .parameters(vec![
                slot("header", STRING).value("\"date\""),
                slot("datepart", STRING).value("\"date\""),
                slot("keys", STRING_LIST).value("\"2020-01-01\""),
            ]),
    );
    builder.add(
        Rule::test("test/currentdate", "currentdate")
            .requires("date")
            .tags(tags)
            .parameters(vec![
                slot("datepart", STRING).value("\"date\""),
                slot("keys", STRING_LIST).value("\"2020-01-01\""),
            ]),
    );
}
