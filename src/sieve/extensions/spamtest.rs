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

//! RFC 5235 `spamtest`, `spamtestplus` and `virustest`.
//!
//! `spamtestplus` replaces the plain `spamtest` rule with one that also
//! accepts `:percent`.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, Rule, Slot};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::STRING;

fn value() -> Vec<Slot> {
    vec![slot("value", STRING).value("\"5\"")]
}

pub fn register(builder: &mut GrammarBuilder) {
    builder.add(
        Rule::test("test/spamtest", "spamtest")
            .requires("spamtest")
            .tags(comparison_tags())
            .parameters(value()),
    );

    keywords! {
        builder, "spamtest/", Requirement::from("spamtestplus");
        "spamtest/percent" => ":percent",
    }
    let mut tags = vec![slot("percent", "spamtest/percent")];
    tags.extend(comparison_tags());
    builder.add(
        Rule::test("test/spamtestplus", "spamtest")
            .requires("spamtestplus")
            .priority(1)
            .tags(tags)
            .parameters(value()),
    );

    builder.add(
        Rule::test("test/virustest", "virustest")
            .requires("virustest")
            .tags(comparison_tags())
            .parameters(value()),
    );
}
