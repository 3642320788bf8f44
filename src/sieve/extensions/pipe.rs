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

//! The Dovecot `vnd.dovecot.pipe`, `vnd.dovecot.filter` and
//! `vnd.dovecot.execute` extensions.
//!
//! Each takes a program name optionally followed by its arguments.

use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule, Slot};
use crate::grammar::GrammarBuilder;
use crate::sieve::strings::{STRING, STRING_LIST};

use super::copy::COPY;

const PIPE: &str = "vnd.dovecot.pipe";
const FILTER: &str = "vnd.dovecot.filter";
const EXECUTE: &str = "vnd.dovecot.execute";

fn program() -> Vec<Slot> {
    vec![slot("program", STRING).value("\"example\"")]
}

fn arguments() -> Slot {
    slot("arguments", STRING_LIST).value("\"\"")
}

pub fn register(builder: &mut GrammarBuilder) {
    keywords! {
        builder, "pipe/", Requirement::from(PIPE);
        "pipe/try" => ":try",
    }
    builder.add(
        Rule::action("action/pipe", "pipe")
            .requires(PIPE)
            .tags(vec![slot("copy", COPY), slot("try", "pipe/try")])
            .parameters(program())
            .dependent(arguments(), PIPE),
    );

    builder.add(
        Rule::action("action/filter", "filter")
            .requires(FILTER)
            .parameters(program())
            .dependent(arguments(), FILTER),
    );
    builder.add(
        Rule::test("test/filter", "filter")
            .requires(FILTER)
            .parameters(program())
            .dependent(arguments(), FILTER),
    );

    builder.add_group(
        GroupRule::implicit("execute-input", &["execute-input/"])
            .requires(EXECUTE),
    );
    builder.add(
        Rule::tag("execute-input/input", "execute-input/", ":input")
            .requires(EXECUTE)
            .parameters(vec![slot("input", STRING).value("\"\"")]),
    );
    keywords! {
        builder, "execute-input/", Requirement::from(EXECUTE);
        "execute-input/pipe" => ":pipe",
    }
    builder.add(
        Rule::tag("execute/output", "execute/", ":output")
            .requires(Requirement::all(&[EXECUTE, "variables"]))
            .parameters(vec![slot("variable", STRING).value("\"output\"")]),
    );

    let tags = vec![
        slot("input", "execute-input"),
        slot("output", "execute/output"),
    ];
    builder.add(
        Rule::action("action/execute", "execute")
            .requires(EXECUTE)
            .tags(tags.clone())
            .parameters(program())
            .dependent(arguments(), EXECUTE),
    );
    builder.add(
        Rule::test("test/execute", "execute")
            .requires(EXECUTE)
            .tags(tags)
            .parameters(program())
            .dependent(arguments(), EXECUTE),
    );
}
