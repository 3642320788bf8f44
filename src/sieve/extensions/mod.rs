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

//! Rules for the optional extensions of the language.
//!
//! Each extension adds rules gated on its capability, and may extend the
//! rules of the base language with further tags.

use crate::grammar::GrammarBuilder;

mod body;
mod copy;
mod date;
mod environment;
mod flags;
mod include;
mod mailbox;
mod matching;
mod mime;
mod pipe;
mod reject;
mod spamtest;
mod vacation;
mod variables;

pub fn register(builder: &mut GrammarBuilder) {
    body::register(builder);
    copy::register(builder);
    date::register(builder);
    environment::register(builder);
    flags::register(builder);
    include::register(builder);
    mailbox::register(builder);
    matching::register(builder);
    mime::register(builder);
    pipe::register(builder);
    reject::register(builder);
    spamtest::register(builder);
    vacation::register(builder);
    variables::register(builder);
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::dom::{Document, NodeId};
    use crate::grammar::capabilities::Capabilities;

    fn document(capabilities: &[&str]) -> Document {
        crate::init_test_log();
        let capabilities = capabilities.iter().copied().collect::<Capabilities>();
        Document::new(Arc::new(crate::sieve::grammar(capabilities))).unwrap()
    }

    fn statement(doc: &Document, ix: usize) -> NodeId {
        doc.children(doc.body()).unwrap()[ix]
    }

    fn condition_test(doc: &Document, ix: usize) -> NodeId {
        let branch = doc.children(statement(doc, ix)).unwrap()[0];
        doc.children(branch).unwrap()[0]
    }

    const ALL: &[&str] = &[
        "body",
        "copy",
        "date",
        "environment",
        "fileinto",
        "imap4flags",
        "include",
        "mailbox",
        "mboxmetadata",
        "mime",
        "regex",
        "reject",
        "relational",
        "servermetadata",
        "spamtest",
        "subaddress",
        "vacation",
        "vacation-seconds",
        "variables",
        "virustest",
        "vnd.dovecot.execute",
        "vnd.dovecot.filter",
        "vnd.dovecot.pipe",
    ];

    #[test]
    fn extension_round_trips() {
        let mut doc = document(ALL);
        for script in &[
            "require \"body\";\r\nif body :content \"text\" :contains \"x\" \
             {\r\n  discard;\r\n}\r\n",
            "require [\"date\", \"relational\"];\r\n\
             if date :zone \"-0500\" :value \"ge\" \"date\" \"hour\" \"09\" \
             {\r\n}\r\nif currentdate :originalzone \"year\" \"2020\" {\r\n}\r\n",
            "require [\"fileinto\", \"mailbox\", \"copy\"];\r\n\
             fileinto :create :copy \"Archive\";\r\n\
             if mailboxexists [\"A\", \"B\"] {\r\n}\r\n",
            "require [\"imap4flags\", \"variables\"];\r\n\
             setflag \"flags\" \"\\\\Seen\";\r\naddflag \"\\\\Flagged\";\r\n\
             keep :flags [\"\\\\Seen\"];\r\n",
            "require [\"include\", \"variables\"];\r\n\
             include :global :once \"common\";\r\nglobal \"x\";\r\nreturn;\r\n",
            "require [\"mime\"];\r\n\
             if header :mime :anychild :param [\"charset\"] \"Content-Type\" \
             \"utf-8\" {\r\n}\r\n",
            "require [\"vnd.dovecot.pipe\", \"vnd.dovecot.execute\", \
             \"variables\"];\r\npipe :try \"sa-learn\" [\"--spam\"];\r\n\
             if execute :pipe :output \"out\" \"check\" {\r\n}\r\n",
            "require \"reject\";\r\nreject text:\r\nNo thanks.\r\n.\r\n;\r\n",
            "require [\"vacation\", \"vacation-seconds\"];\r\n\
             vacation :seconds 3600 :subject \"Away\" :mime \"Gone\";\r\n",
            "require \"variables\";\r\nset :upper :length \"n\" \"${x}\";\r\n\
             if string :matches \"${n}\" \"1*\" {\r\n}\r\n",
            "require [\"regex\", \"subaddress\", \"environment\"];\r\n\
             if allof (address :detail :regex \"to\" \"^a.*\", \
             environment \"name\" \"x\") {\r\n}\r\n",
        ] {
            doc.parse_script(script).unwrap();
            assert_eq!(*script, doc.serialize_script().unwrap());
        }
    }

    #[test]
    fn extensions_are_gated() {
        let mut doc = document(&[]);
        assert!(doc
            .parse_script("if body \"x\" {\r\n}\r\n")
            .unwrap_err()
            .is_unknown_element());
        // Tags of extensions are not recognised either
        assert!(doc.parse_script("redirect :copy \"a@b.c\";\r\n").is_err());

        let mut doc = document(&["body"]);
        doc.parse_script("if body \"x\" {\r\n}\r\n").unwrap();
        let body = condition_test(&doc, 0);
        assert_eq!(
            Some(":text".to_owned()),
            doc.tag_value(body, "transform").unwrap()
        );
        assert_eq!(
            vec!["body".to_owned()],
            doc.required_capabilities().unwrap()
        );
    }

    #[test]
    fn dependent_rolls_back_to_parameters() {
        let mut doc = document(&["imap4flags", "variables"]);
        doc.parse_script(
            "require [\"imap4flags\", \"variables\"];\r\n\
             if hasflag \"\\\\Seen\" {\r\n}\r\n",
        )
        .unwrap();
        let hasflag = condition_test(&doc, 0);
        assert!(!doc.is_dependent_enabled(hasflag, "variables").unwrap());
        let flags = doc.field(hasflag, "flags").unwrap();
        assert_eq!(vec!["\\Seen".to_owned()], doc.string_list(flags).unwrap());

        doc.parse_script(
            "require [\"imap4flags\", \"variables\"];\r\n\
             if hasflag :is \"mine\" \"\\\\Seen\" {\r\n}\r\n",
        )
        .unwrap();
        let hasflag = condition_test(&doc, 0);
        assert!(doc.is_dependent_enabled(hasflag, "variables").unwrap());
        let variables = doc.field(hasflag, "variables").unwrap();
        assert_eq!(
            vec!["mine".to_owned()],
            doc.string_list(variables).unwrap()
        );
        assert_eq!(
            vec!["imap4flags".to_owned(), "variables".to_owned()],
            doc.required_capabilities().unwrap()
        );

        // Without variables, only the flag list is accepted
        let mut doc = document(&["imap4flags"]);
        assert!(doc
            .parse_script("if hasflag \"mine\" \"\\\\Seen\" {\r\n}\r\n")
            .is_err());
        doc.parse_script("if hasflag \"\\\\Seen\" {\r\n}\r\n").unwrap();
        let hasflag = condition_test(&doc, 0);
        match doc.set_dependent_enabled(hasflag, "variables", true) {
            Err(crate::Error::Unsupported(_)) => (),
            r => panic!("Unexpected result: {:?}", r),
        }
    }

    #[test]
    fn higher_priority_rule_wins() {
        let script = "if spamtest :percent \"50\" {\r\n}\r\n";

        let mut doc = document(&["spamtest"]);
        assert!(doc.parse_script(script).is_err());
        doc.parse_script("if spamtest \"5\" {\r\n}\r\n").unwrap();
        assert_eq!("test/spamtest", doc.name(condition_test(&doc, 0)).unwrap());

        let mut doc = document(&["spamtest", "spamtestplus"]);
        doc.parse_script(script).unwrap();
        assert_eq!(
            "test/spamtestplus",
            doc.name(condition_test(&doc, 0)).unwrap()
        );
        assert_eq!(
            vec!["spamtestplus".to_owned()],
            doc.required_capabilities().unwrap()
        );
    }

    #[test]
    fn enabled_tags_are_required() {
        let mut doc = document(&["imap4flags", "copy"]);
        doc.parse_script("keep;\r\nredirect :copy \"a@b.c\";\r\n").unwrap();
        let keep = statement(&doc, 0);
        assert!(!doc.is_tag_enabled(keep, "flags").unwrap());

        doc.enable_tag(keep, "flags").unwrap();
        assert!(doc.is_tag_enabled(keep, "flags").unwrap());
        assert_eq!(
            vec!["imap4flags".to_owned(), "copy".to_owned()],
            doc.required_capabilities().unwrap()
        );
        assert_eq!(
            "require \"imap4flags\";\r\nrequire \"copy\";\r\n\
             keep :flags \"\\\\Flagged\";\r\nredirect :copy \"a@b.c\";\r\n",
            doc.serialize_script().unwrap()
        );

        doc.disable_tag(keep, "flags").unwrap();
        assert_eq!(
            "require \"imap4flags\";\r\nrequire \"copy\";\r\n\
             keep;\r\nredirect :copy \"a@b.c\";\r\n",
            doc.serialize_script().unwrap()
        );
    }

    #[test]
    fn known_capabilities_cover_extensions() {
        let grammar = crate::sieve::grammar(Capabilities::new());
        let known = grammar.known_capabilities();
        for name in ALL.iter().chain(&["spamtestplus", "ereject"]) {
            assert!(known.contains(name), "{} not known", name);
        }
    }
}
