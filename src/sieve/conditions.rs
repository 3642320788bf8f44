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

//! `if`/`elsif`/`else`.
//!
//! A condition is a list of branches: an `if` branch, any number of further
//! `if` branches written as `elsif`, and optionally a final `else`. The
//! spelling of an `if` branch follows its position in the list, so moving
//! branches around keeps the script valid.

use super::blocks::Braces;
use super::{CONDITION, TEST};
use crate::dom::{Body, Document, NodeId};
use crate::grammar::atoms::Literal;
use crate::grammar::cursor::Cursor;
use crate::grammar::lex::Whitespace;
use crate::grammar::rule::Trailing;
use crate::grammar::{probe_keyword, Descriptor, Grammar, GrammarBuilder};
use crate::support::error::Error;

pub const IF_BRANCH: &str = "branch/if";
pub const ELSE_BRANCH: &str = "branch/else";
pub const BRANCH: &str = "branch";

#[derive(Clone, Debug, Default)]
pub struct Condition {
    pub branches: Vec<NodeId>,
}

impl Condition {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        for &branch in &self.branches {
            doc.write(branch, out);
        }
    }
}

/// An `if` or `elsif` branch.
#[derive(Clone, Debug)]
pub struct IfBranch {
    pub keyword: Literal,
    pub gap: Whitespace,
    /// Only ever `None` transiently while the branch is being removed.
    pub test: Option<NodeId>,
    pub block: Braces,
    /// Whitespace after the `}`, up to the end of its line.
    pub tail: Whitespace,
}

impl IfBranch {
    pub(crate) fn respell(&mut self, token: &str) {
        if !self.keyword.token().eq_ignore_ascii_case(token) {
            self.keyword.respell(token);
        }
    }

    pub fn is_elsif(&self) -> bool {
        self.keyword.token().eq_ignore_ascii_case("elsif")
    }

    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        self.keyword.write_to(out);
        self.gap.write_to(out);
        if let Some(test) = self.test {
            doc.write(test, out);
        }
        self.block.write_to(doc, out);
        self.tail.write_to(out);
    }
}

#[derive(Clone, Debug)]
pub struct ElseBranch {
    pub keyword: Literal,
    pub block: Braces,
    pub tail: Whitespace,
}

impl ElseBranch {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        self.keyword.write_to(out);
        self.block.write_to(doc, out);
        self.tail.write_to(out);
    }
}

fn probe_condition(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "if")
}

fn probe_if(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "if") || probe_keyword(cursor, "elsif")
}

fn probe_else(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "else")
}

fn parse_condition(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let mut branches = vec![doc.parse_named(IF_BRANCH, id, cursor)?];
    while probe_keyword(cursor, "elsif") {
        branches.push(doc.parse_named(IF_BRANCH, id, cursor)?);
    }
    if probe_keyword(cursor, "else") {
        branches.push(doc.parse_named(ELSE_BRANCH, id, cursor)?);
    }

    Ok(Body::Condition(Condition { branches }))
}

fn create_condition(doc: &mut Document, id: NodeId) -> Result<Body, Error> {
    let branch = doc.create_named(IF_BRANCH, Some(id), None)?;
    Ok(Body::Condition(Condition {
        branches: vec![branch],
    }))
}

fn parse_if(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let token = if probe_keyword(cursor, "elsif") {
        "elsif"
    } else {
        "if"
    };

    let keyword = Literal::parse(cursor, token, Trailing::None)?;
    let gap = Whitespace::parse(cursor, false)?;
    let test = doc.parse_class(&[TEST], Some(id), cursor)?;
    let block = Braces::parse(doc, id, cursor)?;
    let tail = Whitespace::parse(cursor, true)?;

    Ok(Body::If(IfBranch {
        keyword,
        gap,
        test: Some(test),
        block,
        tail,
    }))
}

/// `if false {` and `}` on the next line.
fn create_if(doc: &mut Document, id: NodeId) -> Result<Body, Error> {
    let test = doc.create_named("test/false", Some(id), None)?;
    Ok(Body::If(IfBranch {
        keyword: Literal::new("if", Trailing::None),
        gap: Whitespace::space(),
        test: Some(test),
        block: Braces::new(),
        tail: Whitespace::line_break(),
    }))
}

fn parse_else(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let keyword = Literal::parse(cursor, "else", Trailing::None)?;
    let block = Braces::parse(doc, id, cursor)?;
    let tail = Whitespace::parse(cursor, true)?;
    Ok(Body::Else(ElseBranch {
        keyword,
        block,
        tail,
    }))
}

fn create_else(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::Else(ElseBranch {
        keyword: Literal::new("else", Trailing::None),
        block: Braces::new(),
        tail: Whitespace::line_break(),
    }))
}

pub fn register(builder: &mut GrammarBuilder) {
    builder.register(Descriptor::native(
        CONDITION,
        CONDITION,
        probe_condition,
        parse_condition,
        create_condition,
    ));
    builder.register(Descriptor::native(
        IF_BRANCH, BRANCH, probe_if, parse_if, create_if,
    ));
    builder.register(Descriptor::native(
        ELSE_BRANCH,
        BRANCH,
        probe_else,
        parse_else,
        create_else,
    ));
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::grammar::capabilities::Capabilities;

    fn document() -> Document {
        crate::init_test_log();
        Document::new(Arc::new(crate::sieve::grammar(Capabilities::new())))
            .unwrap()
    }

    fn first_statement(doc: &Document) -> NodeId {
        doc.children(doc.body()).unwrap()[0]
    }

    #[test]
    fn round_trip_conditions() {
        let mut doc = document();
        for script in &[
            "if true {\r\n}\r\n",
            "if true {\r\n  keep;\r\n} elsif false {\r\n  discard;\r\n}\r\n\
             else {\r\n  stop;\r\n}\r\n",
            "IF not true{keep;}ELSE{discard;}",
            "if allof ( true , not false ) {\r\n}\r\n",
            "if anyof(true) /* c */ {\r\n# comment\r\n}  # trailing\r\n",
        ] {
            doc.parse_script(script).unwrap();
            assert_eq!(*script, doc.serialize_script().unwrap());
        }
    }

    #[test]
    fn new_condition() {
        let mut doc = document();
        let cond = doc.create_by_name(CONDITION, None).unwrap();
        assert_eq!("if false {\r\n}\r\n", doc.to_script(cond).unwrap());

        let body = doc.body();
        doc.append(body, cond, None).unwrap();
        assert_eq!("if false {\r\n}\r\n", doc.serialize_script().unwrap());
    }

    #[test]
    fn appended_branches_are_respelled() {
        let mut doc = document();
        doc.parse_script("if true {\r\n}\r\n").unwrap();
        let cond = first_statement(&doc);

        let branch = doc.create_by_name(IF_BRANCH, None).unwrap();
        doc.append(cond, branch, None).unwrap();
        assert_eq!(
            "if true {\r\n}\r\nelsif false {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        // Moving it to the front makes it the `if`
        let first = doc.children(cond).unwrap()[0];
        doc.append(cond, branch, Some(first)).unwrap();
        assert_eq!(
            "if false {\r\n}\r\nelsif true {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        let otherwise = doc.create_by_name(ELSE_BRANCH, None).unwrap();
        doc.append(cond, otherwise, None).unwrap();
        // A further if goes in front of the else
        let third = doc.create_by_name(IF_BRANCH, None).unwrap();
        doc.append(cond, third, None).unwrap();
        assert_eq!(
            "if false {\r\n}\r\nelsif true {\r\n}\r\nelsif false {\r\n}\r\n\
             else {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );

        // Only one else, and only at the end
        let another = doc.create_by_name(ELSE_BRANCH, None).unwrap();
        assert_matches!(
            Err(Error::Incompatible { .. }),
            doc.append(cond, another, None)
        );
        assert_matches!(
            Err(Error::Incompatible { .. }),
            doc.append(cond, otherwise, Some(branch))
        );
    }

    #[test]
    fn removing_if_renames_elsif() {
        let mut doc = document();
        doc.parse_script(
            "if true {\r\n  keep;\r\n}\r\nelsif false {\r\n  discard;\r\n}\r\n",
        )
        .unwrap();
        let cond = first_statement(&doc);
        let first = doc.children(cond).unwrap()[0];

        doc.remove_child(cond, first, false, None).unwrap();
        assert_eq!(
            "if false {\r\n  discard;\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
    }

    #[test]
    fn removing_if_before_else_hoists_else() {
        let mut doc = document();
        doc.parse_script(
            "keep;\r\nif true {\r\n  stop;\r\n}\r\nelse {\r\n  discard;\r\n  \
             redirect \"a@b.c\";\r\n}\r\nkeep;\r\n",
        )
        .unwrap();
        let cond = doc.children(doc.body()).unwrap()[1];
        let first = doc.children(cond).unwrap()[0];

        doc.remove_child(cond, first, false, None).unwrap();
        assert_eq!(
            "keep;\r\n  discard;\r\n  redirect \"a@b.c\";\r\nkeep;\r\n",
            doc.serialize_script().unwrap()
        );
        assert!(!doc.contains(cond));
        assert_eq!(4, doc.children(doc.body()).unwrap().len());
        assert_eq!(0, doc.compact());
    }

    #[test]
    fn removing_only_branch_removes_condition() {
        let mut doc = document();
        doc.parse_script("if true {\r\n}\r\nkeep;\r\n").unwrap();
        let cond = first_statement(&doc);
        let branch = doc.children(cond).unwrap()[0];

        assert_eq!(cond, doc.remove_child(cond, branch, false, None).unwrap());
        assert_eq!("keep;\r\n", doc.serialize_script().unwrap());
    }

    #[test]
    fn removing_test_requires_cascade() {
        let mut doc = document();
        doc.parse_script("if true {\r\n}\r\n").unwrap();
        let cond = first_statement(&doc);
        let branch = doc.children(cond).unwrap()[0];
        let test = doc.children(branch).unwrap()[0];

        assert_matches!(
            Err(Error::RequiresCascade(_)),
            doc.remove_child(branch, test, false, None)
        );
        assert_eq!("if true {\r\n}\r\n", doc.serialize_script().unwrap());

        doc.remove_child(branch, test, true, None).unwrap();
        assert_eq!("", doc.serialize_script().unwrap());
    }

    #[test]
    fn set_test_replaces_test() {
        let mut doc = document();
        doc.parse_script("if true {\r\n}\r\n").unwrap();
        let cond = first_statement(&doc);
        let branch = doc.children(cond).unwrap()[0];
        let old = doc.children(branch).unwrap()[0];

        let test = doc.create_by_class(&[TEST], "not false").unwrap();
        doc.set_test(branch, test).unwrap();
        assert_eq!("if not false {\r\n}\r\n", doc.serialize_script().unwrap());
        assert!(!doc.contains(old));
        assert_eq!(Some(branch), doc.parent(test).unwrap());

        assert_matches!(
            Err(Error::AlreadyAttached(_)),
            doc.set_test(branch, test)
        );
    }
}
