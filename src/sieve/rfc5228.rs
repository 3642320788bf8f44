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

//! The commands and tests of the base language.

use super::blocks::REQUIRE;
use super::strings::{NUMBER, STRING, STRING_LIST};
use super::IMPORT;
use crate::grammar::capabilities::Requirement;
use crate::grammar::rule::{slot, GroupRule, Rule, Slot};
use crate::grammar::GrammarBuilder;

pub const MATCH_TYPE: &str = "match-type";
pub const COMPARATOR: &str = "comparator";
pub const ADDRESS_PART: &str = "address-part";

/// The tags shared by `header`-like tests: comparator and match type.
pub fn comparison_tags() -> Vec<Slot> {
    vec![slot(COMPARATOR, COMPARATOR), slot(MATCH_TYPE, MATCH_TYPE)]
}

/// The tags of `address`-like tests.
pub fn address_tags() -> Vec<Slot> {
    let mut tags = vec![slot(ADDRESS_PART, ADDRESS_PART)];
    tags.extend(comparison_tags());
    tags
}

pub fn register(builder: &mut GrammarBuilder) {
    register_actions(builder);
    register_tests(builder);
    register_groups(builder);
}

fn register_actions(builder: &mut GrammarBuilder) {
    builder.add(Rule::action(REQUIRE, "require").class(IMPORT).parameters(
        vec![slot("capabilities", STRING_LIST).value("\"fileinto\"")],
    ));

    builder.add(Rule::action("action/keep", "keep"));
    builder.add(Rule::action("action/discard", "discard"));
    builder.add(Rule::action("action/stop", "stop"));
    builder.add(
        Rule::action("action/redirect", "redirect").parameters(vec![slot(
            "address", STRING,
        )
        .value("\"user@example.com\"")]),
    );
    builder.add(
        Rule::action("action/fileinto", "fileinto")
            .requires("fileinto")
            .parameters(vec![slot("mailbox", STRING).value("\"INBOX\"")]),
    );
}

fn register_tests(builder: &mut GrammarBuilder) {
    builder.add(Rule::test("test/true", "true"));
    builder.add(Rule::test("test/false", "false"));

    builder.add(Rule::test("test/address", "address").tags(address_tags()).parameters(
        vec![
            slot("headers", STRING_LIST).value("\"To\""),
            slot("keys", STRING_LIST).value("\"me@example.com\""),
        ],
    ));
    builder.add(
        Rule::test("test/envelope", "envelope")
            .requires("envelope")
            .tags(address_tags())
            .parameters(vec![
                slot("envelopes", STRING_LIST).value("\"from\""),
                slot("keys", STRING_LIST).value("\"me@example.com\""),
            ]),
    );
    builder.add(
        Rule::test("test/header", "header")
            .tags(comparison_tags())
            .parameters(vec![
                slot("headers", STRING_LIST).value("\"Subject\""),
                slot("keys", STRING_LIST).value("\"Example\""),
            ]),
    );
    builder.add(
        Rule::test("test/exists", "exists").parameters(vec![slot(
            "headers",
            STRING_LIST,
        )
        .value("\"From\"")]),
    );
    builder.add(Rule::test("test/size", "size").parameters(vec![
        slot("operator", "size-operator"),
        slot("limit", NUMBER).value("1M"),
    ]));
}

fn register_groups(builder: &mut GrammarBuilder) {
    builder.add_group(GroupRule::explicit(
        MATCH_TYPE,
        &["match-type/"],
        ":is",
    ));
    keywords! {
        builder, "match-type/", Requirement::None;
        "match-type/is" => ":is",
        "match-type/contains" => ":contains",
        "match-type/matches" => ":matches",
    }

    builder.add_group(
        GroupRule::explicit(COMPARATOR, &["comparator/"], "\"i;ascii-casemap\"")
            .token(":comparator"),
    );
    keywords! {
        builder, "comparator/", Requirement::None;
        "comparator/i;octet" => "\"i;octet\"",
        "comparator/i;ascii-casemap" => "\"i;ascii-casemap\"",
    }
    keywords! {
        builder, "comparator/", Requirement::from("comparator-i;ascii-numeric");
        "comparator/i;ascii-numeric" => "\"i;ascii-numeric\"",
    }

    builder.add_group(GroupRule::explicit(
        ADDRESS_PART,
        &["address-part/"],
        ":all",
    ));
    keywords! {
        builder, "address-part/", Requirement::None;
        "address-part/all" => ":all",
        "address-part/localpart" => ":localpart",
        "address-part/domain" => ":domain",
    }

    builder.add_group(GroupRule::mandatory(
        "size-operator",
        &["size-operator/"],
        ":over",
    ));
    keywords! {
        builder, "size-operator/", Requirement::None;
        "size-operator/over" => ":over",
        "size-operator/under" => ":under",
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::dom::{Document, NodeId};
    use crate::grammar::capabilities::Capabilities;
    use crate::support::error::Error;

    fn document(capabilities: &[&str]) -> Document {
        crate::init_test_log();
        let capabilities = capabilities.iter().copied().collect::<Capabilities>();
        Document::new(Arc::new(crate::sieve::grammar(capabilities))).unwrap()
    }

    fn statement(doc: &Document, ix: usize) -> NodeId {
        doc.children(doc.body()).unwrap()[ix]
    }

    /// The test of the first branch of the condition at `ix`.
    fn condition_test(doc: &Document, ix: usize) -> NodeId {
        let cond = statement(doc, ix);
        let branch = doc.children(cond).unwrap()[0];
        doc.children(branch).unwrap()[0]
    }

    #[test]
    fn simple_round_trips() {
        let mut doc = document(&[]);
        for script in &[
            "keep;\r\n",
            "if true {\r\n}\r\n",
            "KEEP ;discard;\r\n  stop;  # done\r\n",
            "redirect \"a@example.com\";\r\n",
            "if size :over 100K {\r\n  discard;\r\n}\r\n",
            "if address :domain :comparator \"i;octet\" :is [\"from\", \"to\"] \
             \"example.com\" {\r\n  keep;\r\n}\r\n",
            "if exists \"X-Spam\" {\r\n  discard;\r\n}\r\n",
            "/* header */\r\nkeep;\r\n\r\n# tail",
            "",
        ] {
            doc.parse_script(script).unwrap();
            assert_eq!(*script, doc.serialize_script().unwrap());
        }
    }

    #[test]
    fn remove_action_from_block() {
        let mut doc = document(&[]);
        doc.parse_script(
            "if header :contains \"Subject\" \"Test\" {\r\n stop;\r\n}\r\n",
        )
        .unwrap();
        assert_eq!(
            "if header :contains \"Subject\" \"Test\" {\r\n stop;\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        let cond = statement(&doc, 0);
        let branch = doc.children(cond).unwrap()[0];
        let stop = doc.children(branch).unwrap()[1];
        assert_eq!("action/stop", doc.name(stop).unwrap());

        doc.remove(stop, false, None).unwrap();
        assert_eq!(
            "if header :contains \"Subject\" \"Test\" {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
        assert!(!doc.contains(stop));
    }

    #[test]
    fn line_endings_normalised() {
        let mut doc = document(&[]);
        doc.parse_script("if true {\n  keep;\r  stop;\r\n}\n").unwrap();
        assert_eq!(
            "if true {\r\n  keep;\r\n  stop;\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
    }

    #[test]
    fn default_match_type_collapses() {
        let mut doc = document(&[]);
        doc.parse_script("if header \"Subject\" \"x\" {\r\n}\r\n").unwrap();
        let header = condition_test(&doc, 0);

        assert_eq!(
            Some(":is".to_owned()),
            doc.tag_value(header, "match-type").unwrap()
        );
        assert_eq!(
            Some("\"i;ascii-casemap\"".to_owned()),
            doc.tag_value(header, "comparator").unwrap()
        );
        assert!(!doc.is_tag_enabled(header, "match-type").unwrap());

        doc.set_tag_value(header, "match-type", ":contains").unwrap();
        assert_eq!(
            "if header :contains \"Subject\" \"x\" {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
        assert!(doc.is_tag_enabled(header, "match-type").unwrap());

        doc.set_tag_value(header, "match-type", ":is").unwrap();
        assert_eq!(
            "if header \"Subject\" \"x\" {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
        assert!(!doc.is_tag_enabled(header, "match-type").unwrap());
        assert_eq!(
            Some(":is".to_owned()),
            doc.tag_value(header, "match-type").unwrap()
        );
    }

    #[test]
    fn explicit_default_is_kept_when_written() {
        let mut doc = document(&[]);
        let script = "if header :is :comparator \"i;ascii-casemap\" \"a\" \"b\" \
                      {\r\n}\r\n";
        doc.parse_script(script).unwrap();
        assert_eq!(script, doc.serialize_script().unwrap());

        let header = condition_test(&doc, 0);
        let comparator = doc.field(header, "comparator").unwrap();
        assert!(!doc.is_default(comparator).unwrap());

        doc.set_group_value(comparator, "\"i;ascii-casemap\"").unwrap();
        assert!(doc.is_default(comparator).unwrap());
        assert_eq!(
            "if header :is \"a\" \"b\" {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        doc.set_group_value(comparator, "\"i;octet\"").unwrap();
        assert_eq!(
            "if header :is :comparator \"i;octet\" \"a\" \"b\" {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
    }

    #[test]
    fn emptied_string_list_stays_parseable() {
        let mut doc = document(&[]);
        doc.parse_script("if header \"Subject\" \"x\" {\r\n}\r\n").unwrap();
        let header = condition_test(&doc, 0);
        let keys = doc.field(header, "keys").unwrap();

        doc.string_list_remove(keys, "x").unwrap();
        let text = doc.serialize_script().unwrap();
        assert_eq!("if header \"Subject\" \"\" {\r\n}\r\n", text);

        doc.parse_script(&text).unwrap();
        let keys = doc.field(condition_test(&doc, 0), "keys").unwrap();
        assert_eq!(vec![String::new()], doc.string_list(keys).unwrap());
    }

    #[test]
    fn gated_comparator() {
        let mut doc = document(&[]);
        let script = "if header :comparator \"i;ascii-numeric\" \"a\" \"1\" \
                      {\r\n}\r\n";
        assert!(doc.parse_script(script).unwrap_err().is_unknown_element());

        let mut doc = document(&["comparator-i;ascii-numeric"]);
        doc.parse_script(script).unwrap();
        assert_eq!(
            vec!["comparator-i;ascii-numeric".to_owned()],
            doc.required_capabilities().unwrap()
        );
    }

    #[test]
    fn size_operator_is_mandatory() {
        let mut doc = document(&[]);
        assert!(doc
            .parse_script("if size 100 {\r\n}\r\n")
            .unwrap_err()
            .is_unknown_element());

        let size = doc.create_by_name("test/size", None).unwrap();
        assert_eq!("size :over 1M", doc.to_script(size).unwrap());
        let limit = doc.field(size, "limit").unwrap();
        assert_eq!(1 << 20, doc.number_value(limit).unwrap());
        doc.set_number(limit, 500, Some('K')).unwrap();
        let operator = doc.field(size, "operator").unwrap();
        doc.set_group_value(operator, ":under").unwrap();
        assert_eq!("size :under 500K", doc.to_script(size).unwrap());
    }

    #[test]
    fn gated_action() {
        let mut doc = document(&[]);
        let err = doc.parse_script("fileinto \"Junk\";\r\n").unwrap_err();
        assert!(err.is_unknown_element(), "Unexpected error: {}", err);
        assert_matches!(
            Err(Error::Unsupported(_)),
            doc.create_by_name("action/fileinto", None)
        );

        let mut doc = document(&["fileinto"]);
        doc.parse_script("require \"fileinto\";\r\nfileinto \"Junk\";\r\n")
            .unwrap();
        let fileinto = statement(&doc, 0);
        let mailbox = doc.field(fileinto, "mailbox").unwrap();
        assert_eq!("Junk", doc.string_value(mailbox).unwrap());
    }

    #[test]
    fn require_of_unsupported_capability() {
        let mut doc = document(&["fileinto"]);
        doc.parse_script("keep;\r\n").unwrap();
        match doc.parse_script("require [\"fileinto\", \"body\"];\r\nkeep;\r\n")
        {
            Err(Error::UnknownCapability(name)) => assert_eq!("body", name),
            r => panic!("Unexpected result: {:?}", r),
        }
        // The failed parse left the document alone
        assert_eq!("keep;\r\n", doc.serialize_script().unwrap());
    }

    #[test]
    fn unparsed_remainder_is_an_error() {
        let mut doc = document(&[]);
        doc.parse_script("stop;\r\n").unwrap();
        let nodes = doc.len();

        match doc.parse_script("keep;\r\nfrobnicate;\r\n") {
            Err(Error::Unparsed(s)) => assert!(s.contains("frobnicate")),
            r => panic!("Unexpected result: {:?}", r),
        }
        assert_matches!(
            Err(Error::Syntax { .. }),
            doc.parse_script("keep\r\n")
        );
        assert_eq!("stop;\r\n", doc.serialize_script().unwrap());
        assert_eq!(nodes, doc.len());
    }

    #[test]
    fn requires_are_regenerated() {
        let mut doc = document(&["fileinto", "envelope"]);
        doc.parse_script(
            "# My rules\r\nif envelope \"from\" \"a@b.c\" {\r\n  \
             fileinto \"A\";\r\n}\r\n",
        )
        .unwrap();
        assert_eq!(
            vec!["envelope".to_owned(), "fileinto".to_owned()],
            doc.required_capabilities().unwrap()
        );
        assert_eq!(
            "require \"envelope\";\r\nrequire \"fileinto\";\r\n# My rules\r\n\
             if envelope \"from\" \"a@b.c\" {\r\n  fileinto \"A\";\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        // Nothing more to add; unused requires stay
        let mut doc = document(&["fileinto", "envelope"]);
        let script = "require [\"envelope\", \"fileinto\"];\r\nkeep;\r\n";
        doc.parse_script(script).unwrap();
        assert_eq!(script, doc.serialize_script().unwrap());
    }

    #[test]
    fn append_moves_between_blocks() {
        let mut doc = document(&[]);
        doc.parse_script("keep;\r\nif true {\r\n}\r\n").unwrap();
        let keep = statement(&doc, 0);
        let branch = doc.children(statement(&doc, 1)).unwrap()[0];

        doc.append(branch, keep, None).unwrap();
        assert_eq!(Some(branch), doc.parent(keep).unwrap());
        assert_eq!(1, doc.children(doc.body()).unwrap().len());
        assert_eq!(
            "if true {\r\nkeep;\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        // Tests only go where tests are expected
        let body = doc.body();
        let test = doc.children(branch).unwrap()[0];
        assert_matches!(
            Err(Error::Incompatible { .. }),
            doc.append(body, test, None)
        );
        let root = doc.root();
        assert_matches!(Err(Error::RootImmovable), doc.append(body, root, None));
    }

    #[test]
    fn appending_bound_node_fails() {
        let mut doc = document(&["fileinto"]);
        doc.parse_script("fileinto \"a\";\r\n").unwrap();
        let fileinto = statement(&doc, 0);
        let mailbox = doc.field(fileinto, "mailbox").unwrap();

        let any = doc.create_by_name("test/anyof", None).unwrap();
        let header = doc.create_by_name("test/header", None).unwrap();
        doc.append(any, header, None).unwrap();
        let keys = doc.field(header, "keys").unwrap();
        assert_matches!(
            Err(Error::Incompatible { .. }),
            doc.append(any, keys, None)
        );
        assert_matches!(
            Err(Error::NotAContainer(_)),
            doc.append(mailbox, header, None)
        );
        assert_matches!(
            Err(Error::NotAChild { .. }),
            doc.append(doc.body(), fileinto, Some(header))
        );
    }

    #[test]
    fn compact_frees_orphans() {
        let mut doc = document(&[]);
        doc.parse_script("keep;\r\n").unwrap();
        assert_eq!(0, doc.compact());

        let before = doc.len();
        doc.create_by_name("test/header", None).unwrap();
        assert!(doc.len() > before);
        assert!(doc.compact() > 0);
        assert_eq!(before, doc.len());
    }
}
