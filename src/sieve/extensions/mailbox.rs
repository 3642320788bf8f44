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

//! RFC 5490 `mailbox`, `mboxmetadata` and `servermetadata`.

use crate::grammar::rule::{slot, Property, Rule};
use crate::grammar::GrammarBuilder;
use crate::sieve::rfc5228::comparison_tags;
use crate::sieve::strings::{STRING, STRING_LIST};

pub fn register(builder: &mut GrammarBuilder) {
    builder.add(
        Rule::tag("tag/create", "create/", ":create").requires("mailbox"),
    );
    builder.extend(
        "action/fileinto",
        Property::tags("tags", vec![slot("create", "tag/create")]),
    );

    builder.add(
        Rule::test("test/mailboxexists", "mailboxexists")
            .requires("mailbox")
            .parameters(vec![slot("mailboxes", STRING_LIST).value("\"INBOX\"")]),
    );

    builder.add(
        Rule::test("test/metadata", "metadata")
            .requires("mboxmetadata")
            .tags(comparison_tags())
            .parameters(vec![
                slot("mailbox", STRING).value("\"INBOX\""),
                slot("annotation", STRING).value("\"\""),
                slot("keys", STRING_LIST).value("\"\""),
            ]),
    );
    builder.add(
        Rule::test("test/metadataexists", "metadataexists")
            .requires("mboxmetadata")
            .parameters(vec![
                slot("mailbox", STRING).value("\"INBOX\""),
                slot("annotations", STRING_LIST).value("\"\""),
            ]),
    );

    builder.add(
        Rule::test("test/servermetadata", "servermetadata")
            .requires("servermetadata")
            .tags(comparison_tags())
            .parameters(vec![
                slot("annotation", STRING).value("\"\""),
                slot("keys", STRING_LIST).value("\"\""),
            ]),
    );
    builder.add(
        Rule::test("test/servermetadataexists", "servermetadataexists")
            .requires("servermetadata")
            .parameters(vec![
                slot("annotations", STRING_LIST).value("\"\"")
            ]),
    );
}
