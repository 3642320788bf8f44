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

//! The logical tests `not`, `allof` and `anyof`.

use super::TEST;
use crate::dom::{Body, Document, NodeId};
use crate::grammar::atoms::Literal;
use crate::grammar::cursor::Cursor;
use crate::grammar::lex::Whitespace;
use crate::grammar::rule::Trailing;
use crate::grammar::{probe_keyword, Descriptor, Grammar, GrammarBuilder};
use crate::support::error::Error;

pub const NOT: &str = "test/not";
pub const ALL_OF: &str = "test/allof";
pub const ANY_OF: &str = "test/anyof";

#[derive(Clone, Debug)]
pub struct Not {
    pub keyword: Literal,
    pub gap: Whitespace,
    pub test: Option<NodeId>,
}

impl Not {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        self.keyword.write_to(out);
        self.gap.write_to(out);
        if let Some(test) = self.test {
            doc.write(test, out);
        }
    }
}

/// One test in the list of an `allof` or `anyof`.
#[derive(Clone, Debug)]
pub struct Entry {
    pub leading: Whitespace,
    pub test: NodeId,
    pub trailing: Whitespace,
}

#[derive(Clone, Debug)]
pub struct Junction {
    pub keyword: Literal,
    /// The `(` and the whitespace in front of it.
    pub open: Literal,
    pub entries: Vec<Entry>,
    pub close: Literal,
}

impl Junction {
    pub fn tests(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.test)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, test: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.test == test)
    }

    pub(crate) fn insert(&mut self, ix: usize, test: NodeId) {
        if 0 == ix {
            if let Some(next) = self.entries.first_mut() {
                if next.leading.is_empty() {
                    next.leading = Whitespace::space();
                }
            }
        }

        self.entries.insert(
            ix,
            Entry {
                leading: if 0 == ix {
                    Whitespace::new()
                } else {
                    Whitespace::space()
                },
                test,
                trailing: Whitespace::new(),
            },
        );
    }

    pub(crate) fn remove(&mut self, test: NodeId) -> bool {
        match self.position(test) {
            Some(ix) => {
                self.entries.remove(ix);
                true
            }
            None => false,
        }
    }

    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        self.keyword.write_to(out);
        self.open.write_to(out);
        for (ix, entry) in self.entries.iter().enumerate() {
            if ix > 0 {
                out.push(',');
            }
            entry.leading.write_to(out);
            doc.write(entry.test, out);
            entry.trailing.write_to(out);
        }
        self.close.write_to(out);
    }
}

fn probe_not(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "not")
}

fn probe_all_of(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "allof")
}

fn probe_any_of(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    probe_keyword(cursor, "anyof")
}

fn parse_not(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let keyword = Literal::parse(cursor, "not", Trailing::None)?;
    let gap = Whitespace::parse(cursor, false)?;
    let test = doc.parse_class(&[TEST], Some(id), cursor)?;
    Ok(Body::Not(Not {
        keyword,
        gap,
        test: Some(test),
    }))
}

fn create_not(doc: &mut Document, id: NodeId) -> Result<Body, Error> {
    let test = doc.create_named("test/true", Some(id), None)?;
    Ok(Body::Not(Not {
        keyword: Literal::new("not", Trailing::None),
        gap: Whitespace::space(),
        test: Some(test),
    }))
}

fn parse_junction(
    token: &str,
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let keyword = Literal::parse(cursor, token, Trailing::None)?;
    let open = Literal::parse(cursor, "(", Trailing::None)?;

    let mut entries = Vec::new();
    loop {
        let leading = Whitespace::parse(cursor, false)?;
        let test = doc.parse_class(&[TEST], Some(id), cursor)?;
        let trailing = Whitespace::parse(cursor, false)?;
        entries.push(Entry {
            leading,
            test,
            trailing,
        });

        if !cursor.skip_char(',') {
            break;
        }
    }

    let close = Literal::parse(cursor, ")", Trailing::None)?;
    Ok(Body::Junction(Junction {
        keyword,
        open,
        entries,
        close,
    }))
}

/// An empty list, to be filled with `append()`.
fn create_junction(token: &str) -> Body {
    let mut open = Literal::new("(", Trailing::None);
    open.leading = Whitespace::space();
    Body::Junction(Junction {
        keyword: Literal::new(token, Trailing::None),
        open,
        entries: Vec::new(),
        close: Literal::new(")", Trailing::None),
    })
}

fn parse_all_of(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    parse_junction("allof", doc, id, cursor)
}

fn create_all_of(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(create_junction("allof"))
}

fn parse_any_of(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    parse_junction("anyof", doc, id, cursor)
}

fn create_any_of(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(create_junction("anyof"))
}

pub fn register(builder: &mut GrammarBuilder) {
    builder.register(Descriptor::native(
        NOT, TEST, probe_not, parse_not, create_not,
    ));
    builder.register(Descriptor::native(
        ALL_OF,
        TEST,
        probe_all_of,
        parse_all_of,
        create_all_of,
    ));
    builder.register(Descriptor::native(
        ANY_OF,
        TEST,
        probe_any_of,
        parse_any_of,
        create_any_of,
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

    #[test]
    fn build_junction() {
        let mut doc = document();
        let any = doc.create_by_name(ANY_OF, None).unwrap();
        let t = doc.create_by_class(&[TEST], "true").unwrap();
        let f = doc.create_by_class(&[TEST], "false").unwrap();
        let n = doc.create_by_name(NOT, None).unwrap();

        doc.append(any, t, None).unwrap();
        doc.append(any, f, None).unwrap();
        doc.append(any, n, Some(t)).unwrap();
        assert_eq!("anyof (not true, true, false)", doc.to_script(any).unwrap());
        assert_eq!(vec![n, t, f], doc.children(any).unwrap());

        let keep = doc
            .create_by_class(&[crate::sieve::ACTION], "keep;")
            .unwrap();
        assert_matches!(
            Err(Error::Incompatible { .. }),
            doc.append(any, keep, None)
        );
        assert_matches!(Err(Error::NotAContainer(_)), doc.append(n, t, None));
        assert_matches!(
            Err(Error::CyclicAppend(_)),
            doc.append(any, any, None)
        );
    }

    #[test]
    fn cascade_through_operators_stops_at_root() {
        let mut doc = document();
        doc.parse_script("if not anyof(true) {\r\n  keep;\r\n}\r\n")
            .unwrap();
        let root = doc.root();
        let body = doc.body();
        let cond = doc.children(body).unwrap()[0];
        let branch = doc.children(cond).unwrap()[0];
        let not = doc.children(branch).unwrap()[0];
        let any = doc.children(not).unwrap()[0];
        let t = doc.children(any).unwrap()[0];
        let keep = doc.children(branch).unwrap()[1];

        assert_eq!(cond, doc.remove(t, true, None).unwrap());
        for id in &[t, any, not, branch, cond, keep] {
            assert!(!doc.contains(*id));
        }
        assert!(doc.contains(root));
        assert!(doc.contains(body));
        assert_eq!("", doc.serialize_script().unwrap());
    }

    #[test]
    fn cascade_honours_stop() {
        let mut doc = document();
        doc.parse_script("if not anyof(true) {\r\n}\r\n").unwrap();
        let cond = doc.children(doc.body()).unwrap()[0];
        let branch = doc.children(cond).unwrap()[0];
        let not = doc.children(branch).unwrap()[0];
        let any = doc.children(not).unwrap()[0];
        let t = doc.children(any).unwrap()[0];

        assert_eq!(any, doc.remove(t, true, Some(not)).unwrap());
        // The test is gone but its separator is not
        assert_eq!("if not  {\r\n}\r\n", doc.serialize_script().unwrap());
        assert!(doc.contains(not));
    }

    #[test]
    fn removing_from_junction_without_cascade() {
        let mut doc = document();
        doc.parse_script("if allof (true, false) {\r\n}\r\n").unwrap();
        let cond = doc.children(doc.body()).unwrap()[0];
        let branch = doc.children(cond).unwrap()[0];
        let all = doc.children(branch).unwrap()[0];
        let t = doc.children(all).unwrap()[0];
        let f = doc.children(all).unwrap()[1];

        doc.remove_child(all, t, false, None).unwrap();
        assert_eq!(
            "if allof ( false) {\r\n}\r\n",
            doc.serialize_script().unwrap()
        );
        doc.remove_child(all, f, false, None).unwrap();
        assert_eq!("if allof () {\r\n}\r\n", doc.serialize_script().unwrap());
        assert!(doc.contains(all));
    }
}
