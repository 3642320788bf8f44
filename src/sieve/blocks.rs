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

//! The root of a script, statement blocks and `require` handling.

use log::debug;

use super::strings::SieveString;
use super::{ACTION, CONDITION, IMPORT, WHITESPACE};
use crate::dom::{Body, Document, NodeId};
use crate::grammar::atoms::Literal;
use crate::grammar::cursor::Cursor;
use crate::grammar::lex::Whitespace;
use crate::grammar::rule::Trailing;
use crate::grammar::{Descriptor, Grammar, GrammarBuilder};
use crate::support::error::Error;

pub const ROOT: &str = "root";
pub const IMPORTS: &str = "imports";
pub const BODY: &str = "body";
/// The name of the `require` rule.
pub const REQUIRE: &str = "import/require";

/// The root of a script: the `require` statements, then everything else.
#[derive(Clone, Debug)]
pub struct Root {
    pub imports: NodeId,
    pub body: NodeId,
}

impl Root {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        doc.write(self.imports, out);
        doc.write(self.body, out);
    }
}

/// A top-level sequence of statements.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub children: Vec<NodeId>,
}

impl Block {
    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        for &child in &self.children {
            doc.write(child, out);
        }
    }
}

/// A braced sequence of statements.
#[derive(Clone, Debug)]
pub struct Braces {
    /// The `{`, with the whitespace in front of it and the rest of its line.
    pub open: Literal,
    pub children: Vec<NodeId>,
    /// The `}`, with the whitespace in front of it.
    pub close: Literal,
}

impl Braces {
    pub(crate) fn parse(
        doc: &mut Document,
        parent: NodeId,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, Error> {
        let open = Literal::parse(cursor, "{", Trailing::Line)?;
        let children = parse_statements(
            doc,
            parent,
            cursor,
            &[ACTION, CONDITION, WHITESPACE],
        )?;
        let close = Literal::parse(cursor, "}", Trailing::None)?;
        Ok(Braces {
            open,
            children,
            close,
        })
    }

    /// ` {` and `}` on the next line.
    pub(crate) fn new() -> Self {
        let mut open = Literal::new("{", Trailing::Line);
        open.leading = Whitespace::space();
        Braces {
            open,
            children: Vec::new(),
            close: Literal::new("}", Trailing::None),
        }
    }

    pub(crate) fn write_to(&self, doc: &Document, out: &mut String) {
        self.open.write_to(out);
        for &child in &self.children {
            doc.write(child, out);
        }
        self.close.write_to(out);
    }
}

/// Parse statements of `classes` until none matches.
fn parse_statements(
    doc: &mut Document,
    parent: NodeId,
    cursor: &mut Cursor<'_>,
    classes: &[&str],
) -> Result<Vec<NodeId>, Error> {
    let grammar = doc.grammar();
    let mut children = Vec::new();
    while let Some(ix) = grammar.resolve(classes, cursor) {
        children.push(doc.instantiate(ix, Some(parent), Some(cursor))?);
    }
    Ok(children)
}

fn always(_: &Cursor<'_>, _: &Grammar) -> bool {
    true
}

fn parse_root(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let imports = doc.parse_named(IMPORTS, id, cursor)?;
    let body = doc.parse_named(BODY, id, cursor)?;
    Ok(Body::Root(Root { imports, body }))
}

fn create_root(doc: &mut Document, id: NodeId) -> Result<Body, Error> {
    let imports = doc.create_named(IMPORTS, Some(id), None)?;
    let body = doc.create_named(BODY, Some(id), None)?;
    Ok(Body::Root(Root { imports, body }))
}

fn parse_imports(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    // Whitespace after the last require belongs to the first command
    let children = parse_statements(doc, id, cursor, &[IMPORT])?;
    Ok(Body::Block(Block { children }))
}

fn parse_body(
    doc: &mut Document,
    id: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let children =
        parse_statements(doc, id, cursor, &[ACTION, CONDITION, WHITESPACE])?;
    Ok(Body::Block(Block { children }))
}

fn create_block(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::Block(Block::default()))
}

/// Every capability named by a `require` statement of the script rooted at
/// `root`, in order.
pub fn imported_capabilities(
    doc: &Document,
    root: NodeId,
) -> Result<Vec<String>, Error> {
    let imports = match *doc.node(root)?.body() {
        Body::Root(ref root) => root.imports,
        _ => return Err(Error::WrongKind(root)),
    };

    let mut names = Vec::<String>::new();
    for statement in doc.children(imports)? {
        if REQUIRE != doc.name(statement)? {
            continue;
        }

        let list = doc.field(statement, "capabilities")?;
        for name in doc.string_list(list)? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Check that the server supports everything the script requires.
pub fn check_imports(doc: &Document, root: NodeId) -> Result<(), Error> {
    for name in imported_capabilities(doc, root)? {
        if !doc.capabilities().contains(&name) {
            return Err(Error::UnknownCapability(name));
        }
    }
    Ok(())
}

/// Append `require "<name>";` to the imports of `doc`.
pub fn add_require(doc: &mut Document, name: &str) -> Result<NodeId, Error> {
    let mut text = "require ".to_owned();
    SieveString::quoted(name).write_to(&mut text);
    text.push_str(";\r\n");

    let require = doc.create_by_name(REQUIRE, Some(&text))?;
    let imports = doc.imports();
    doc.append(imports, require, None)?;
    debug!("Added {} as {}", text.trim_end(), require);
    Ok(require)
}

pub fn register(builder: &mut GrammarBuilder) {
    builder.register(Descriptor::native(
        ROOT, ROOT, always, parse_root, create_root,
    ));
    builder.register(Descriptor::native(
        IMPORTS,
        "block",
        always,
        parse_imports,
        create_block,
    ));
    builder.register(Descriptor::native(
        BODY,
        "block",
        always,
        parse_body,
        create_block,
    ));
}
