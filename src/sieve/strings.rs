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

//! Strings, string lists, numbers and free-standing whitespace.
//!
//! These are stored as they were written: escapes in quoted strings and dot
//! stuffing in multi-line strings are kept in their raw form, and only
//! interpreted when the value is read or replaced.

use lazy_static::lazy_static;
use regex::Regex;

use crate::dom::{Body, Document, NodeId};
use crate::grammar::cursor::Cursor;
use crate::grammar::lex::{Whitespace, CRLF};
use crate::grammar::{Descriptor, Grammar, GrammarBuilder};
use crate::support::error::Error;

lazy_static! {
    static ref RX_NUMBER: Regex = Regex::new("^[0-9]+[KkMmGg]?").unwrap();
}

pub const STRING: &str = "string";
pub const STRING_LIST: &str = "stringlist";
pub const NUMBER: &str = "number";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SieveString {
    /// A quoted string; holds the raw text between the quotes.
    Quoted(String),
    /// A `text:` string.
    MultiLine {
        /// The `text:` keyword as spelled.
        keyword: String,
        /// Everything after the keyword up to and including the first line
        /// break.
        header: String,
        /// The raw lines, each with its line break, without the terminating
        /// `.` line.
        body: String,
    },
}

impl SieveString {
    /// A quoted string with the value `value`.
    pub fn quoted(value: &str) -> Self {
        SieveString::Quoted(escape(value))
    }

    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let start = cursor.position();
        let result = if cursor.starts_with_keyword("text:") {
            Self::parse_multi_line(cursor)
        } else {
            Self::parse_quoted(cursor)
        };

        if result.is_err() {
            cursor.rewind(start);
        }
        result
    }

    fn parse_quoted(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        cursor.extract_char('"')?;

        let mut escaped = false;
        let mut len = None;
        for (n, c) in cursor.remaining().chars().enumerate() {
            if escaped {
                escaped = false;
            } else if '\\' == c {
                escaped = true;
            } else if '"' == c {
                len = Some(n);
                break;
            }
        }

        let len = len.ok_or_else(|| cursor.syntax_error("closing quote"))?;
        let raw = cursor.extract(len)?.to_owned();
        cursor.extract_char('"')?;
        Ok(SieveString::Quoted(raw))
    }

    fn parse_multi_line(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let keyword = cursor.match_keyword("text:")?.to_owned();

        let mut header = String::new();
        if cursor.is_char(&[' ', '\t']) {
            header.push_str(
                cursor.extract_run("blank", |c| ' ' == c || '\t' == c)?,
            );
        }
        if cursor.skip_char('#') {
            header.push('#');
            header.push_str(cursor.extract_until(CRLF)?);
        } else {
            cursor.match_literal(CRLF)?;
        }
        header.push_str(CRLF);

        let body = if cursor.starts_with(".\r\n") {
            cursor.match_literal(".\r\n")?;
            String::new()
        } else {
            let mut body = cursor.extract_until("\r\n.\r\n")?.to_owned();
            body.push_str(CRLF);
            body
        };

        Ok(SieveString::MultiLine {
            keyword,
            header,
            body,
        })
    }

    /// The string's value, with escapes or dot stuffing removed.
    pub fn value(&self) -> String {
        match *self {
            SieveString::Quoted(ref raw) => unescape(raw),
            SieveString::MultiLine { ref body, .. } => {
                let mut value = String::with_capacity(body.len());
                for line in lines(body) {
                    value.push_str(if line.starts_with("..") {
                        &line[1..]
                    } else {
                        line
                    });
                    value.push_str(CRLF);
                }
                value
            }
        }
    }

    /// Replace the value, keeping the kind of string.
    pub fn set_value(&mut self, value: &str) {
        match *self {
            SieveString::Quoted(ref mut raw) => *raw = escape(value),
            SieveString::MultiLine { ref mut body, .. } => {
                body.clear();
                let value = value.strip_suffix(CRLF).unwrap_or(value);
                if value.is_empty() {
                    return;
                }

                for line in value.split(CRLF) {
                    if line.starts_with('.') {
                        body.push('.');
                    }
                    body.push_str(line);
                    body.push_str(CRLF);
                }
            }
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match *self {
            SieveString::Quoted(ref raw) => {
                out.push('"');
                out.push_str(raw);
                out.push('"');
            }
            SieveString::MultiLine {
                ref keyword,
                ref header,
                ref body,
            } => {
                out.push_str(keyword);
                out.push_str(header);
                out.push_str(body);
                out.push_str(".\r\n");
            }
        }
    }
}

/// The lines of `body`, which ends with a line break, without their breaks.
fn lines(body: &str) -> impl Iterator<Item = &str> + '_ {
    body.strip_suffix(CRLF)
        .into_iter()
        .flat_map(|body| body.split(CRLF))
}

fn escape(value: &str) -> String {
    let mut raw = String::with_capacity(value.len());
    for c in value.chars() {
        if '"' == c || '\\' == c {
            raw.push('\\');
        }
        raw.push(c);
    }
    raw
}

fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if '\\' == c {
            if let Some(c) = chars.next() {
                value.push(c);
            }
        } else {
            value.push(c);
        }
    }
    value
}

/// One item of a bracketed string list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub leading: Whitespace,
    pub value: SieveString,
    pub trailing: Whitespace,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StringList {
    /// A single string standing for a list of one.
    Single(SieveString),
    /// `[ "a", "b" ]`
    List(Vec<ListItem>),
}

impl StringList {
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        if !cursor.is_char(&['[']) {
            return SieveString::parse(cursor).map(StringList::Single);
        }

        let start = cursor.position();
        let result = Self::parse_list(cursor);
        if result.is_err() {
            cursor.rewind(start);
        }
        result
    }

    fn parse_list(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        cursor.extract_char('[')?;
        let mut items = Vec::new();
        loop {
            let leading = Whitespace::parse(cursor, false)?;
            let value = SieveString::parse(cursor)?;
            let trailing = Whitespace::parse(cursor, false)?;
            items.push(ListItem {
                leading,
                value,
                trailing,
            });

            if !cursor.skip_char(',') {
                cursor.extract_char(']')?;
                return Ok(StringList::List(items));
            }
        }
    }

    pub fn values(&self) -> Vec<String> {
        match *self {
            StringList::Single(ref s) => vec![s.value()],
            StringList::List(ref items) => {
                items.iter().map(|i| i.value.value()).collect()
            }
        }
    }

    /// Replace the values, reusing the existing items and their whitespace
    /// position by position.
    pub fn set_values<S: AsRef<str>>(&mut self, values: &[S]) {
        if let StringList::Single(ref mut single) = *self {
            if 1 == values.len() {
                single.set_value(values[0].as_ref());
                return;
            }

            let single = single.clone();
            *self = StringList::List(vec![ListItem {
                leading: Whitespace::new(),
                value: single,
                trailing: Whitespace::new(),
            }]);
        }

        if let StringList::List(ref mut items) = *self {
            items.truncate(values.len());
            for (ix, value) in values.iter().enumerate() {
                let value = value.as_ref();
                match items.get_mut(ix) {
                    Some(item) => item.value.set_value(value),
                    None => items.push(ListItem {
                        leading: if 0 == ix {
                            Whitespace::new()
                        } else {
                            Whitespace::space()
                        },
                        value: SieveString::quoted(value),
                        trailing: Whitespace::new(),
                    }),
                }
            }
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match *self {
            StringList::Single(ref s) => s.write_to(out),
            // `[]` is not valid syntax; the closest list is one empty string
            StringList::List(ref items) if items.is_empty() => {
                out.push_str("\"\"")
            }
            StringList::List(ref items) => {
                out.push('[');
                for (ix, item) in items.iter().enumerate() {
                    if ix > 0 {
                        out.push(',');
                    }
                    item.leading.write_to(out);
                    item.value.write_to(out);
                    item.trailing.write_to(out);
                }
                out.push(']');
            }
        }
    }
}

/// A number with an optional quantifier, as in `100K`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Number {
    digits: String,
    unit: Option<char>,
}

impl Number {
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, Error> {
        let len = RX_NUMBER
            .find(cursor.remaining())
            .map(|m| m.end())
            .ok_or_else(|| cursor.syntax_error("number"))?;
        // The match is pure ASCII, so bytes and characters agree
        let text = cursor.extract(len)?;

        let mut digits = text.to_owned();
        let unit = match digits.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => {
                digits.pop();
                Some(c)
            }
            _ => None,
        };
        Ok(Number { digits, unit })
    }

    pub fn unit(&self) -> Option<char> {
        self.unit
    }

    /// The number with its quantifier applied.
    pub fn value(&self) -> Result<u64, Error> {
        let overflow = || Error::Syntax {
            expected: "number of at most 64 bits".to_owned(),
            found: format!("{:?}", self.to_script()),
        };

        let base = self.digits.parse::<u64>().map_err(|_| overflow())?;
        let scale = match self.unit.map(|c| c.to_ascii_uppercase()) {
            Some('K') => 1 << 10,
            Some('M') => 1 << 20,
            Some('G') => 1 << 30,
            _ => 1,
        };
        base.checked_mul(scale).ok_or_else(overflow)
    }

    /// Replace the number with `value` and the quantifier `unit`.
    pub fn set(&mut self, value: u64, unit: Option<char>) -> Result<(), Error> {
        if let Some(unit) = unit {
            if !"KkMmGg".contains(unit) {
                return Err(Error::Syntax {
                    expected: "K, M or G".to_owned(),
                    found: format!("{:?}", unit),
                });
            }
        }

        self.digits = value.to_string();
        self.unit = unit;
        Ok(())
    }

    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.digits);
        if let Some(unit) = self.unit {
            out.push(unit);
        }
    }

    fn to_script(&self) -> String {
        let mut s = String::new();
        self.write_to(&mut s);
        s
    }
}

fn probe_string(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    cursor.is_char(&['"']) || cursor.starts_with_keyword("text:")
}

fn probe_string_list(cursor: &Cursor<'_>, grammar: &Grammar) -> bool {
    cursor.is_char(&['[']) || probe_string(cursor, grammar)
}

fn probe_number(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    cursor.peek_char().map_or(false, |c| c.is_ascii_digit())
}

fn probe_whitespace(cursor: &Cursor<'_>, _: &Grammar) -> bool {
    Whitespace::probe(cursor)
}

fn parse_string(
    _: &mut Document,
    _: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    SieveString::parse(cursor).map(Body::String)
}

fn create_string(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::String(SieveString::quoted("")))
}

fn parse_string_list(
    _: &mut Document,
    _: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    StringList::parse(cursor).map(Body::StringList)
}

fn create_string_list(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::StringList(StringList::Single(SieveString::quoted(""))))
}

fn parse_number(
    _: &mut Document,
    _: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    Number::parse(cursor).map(Body::Number)
}

fn create_number(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::Number(Number {
        digits: "0".to_owned(),
        unit: None,
    }))
}

fn parse_whitespace(
    _: &mut Document,
    _: NodeId,
    cursor: &mut Cursor<'_>,
) -> Result<Body, Error> {
    let ws = Whitespace::parse(cursor, false)?;
    if ws.is_empty() {
        Err(cursor.syntax_error("whitespace"))
    } else {
        Ok(Body::Whitespace(ws))
    }
}

fn create_whitespace(_: &mut Document, _: NodeId) -> Result<Body, Error> {
    Ok(Body::Whitespace(Whitespace::line_break()))
}

pub fn register(builder: &mut GrammarBuilder) {
    builder.register(Descriptor::native(
        STRING,
        STRING,
        probe_string,
        parse_string,
        create_string,
    ));
    builder.register(Descriptor::native(
        STRING_LIST,
        STRING_LIST,
        probe_string_list,
        parse_string_list,
        create_string_list,
    ));
    builder.register(Descriptor::native(
        NUMBER,
        NUMBER,
        probe_number,
        parse_number,
        create_number,
    ));
    builder.register(Descriptor::native(
        super::WHITESPACE,
        super::WHITESPACE,
        probe_whitespace,
        parse_whitespace,
        create_whitespace,
    ));
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn parse_string_fully(text: &str) -> SieveString {
        let mut cursor = Cursor::new(text);
        let s = SieveString::parse(&mut cursor).unwrap();
        assert!(cursor.at_end(), "Unparsed: {:?}", cursor.remaining());
        s
    }

    fn string_script(s: &SieveString) -> String {
        let mut out = String::new();
        s.write_to(&mut out);
        out
    }

    #[test]
    fn quoted_strings() {
        let s = parse_string_fully(r#""foo \"bar\" \\ baz""#);
        assert_eq!(r#"foo "bar" \ baz"#, s.value());
        assert_eq!(r#""foo \"bar\" \\ baz""#, string_script(&s));

        // Escaping an ordinary character is allowed and kept
        let s = parse_string_fully(r#""\a""#);
        assert_eq!("a", s.value());
        assert_eq!(r#""\a""#, string_script(&s));

        let s = parse_string_fully("\"line\r\nbreak\"");
        assert_eq!("line\r\nbreak", s.value());
    }

    #[test]
    fn unterminated_quoted_string() {
        let mut cursor = Cursor::new(r#""foo\""#);
        assert_matches!(
            Err(Error::Syntax { .. }),
            SieveString::parse(&mut cursor)
        );
        assert_eq!(0, cursor.position());
    }

    #[test]
    fn multi_line_strings() {
        let text = "TEXT: # comment\r\nline 1\r\n..dot\r\n\r\n.\r\n";
        let s = parse_string_fully(text);
        assert_eq!("line 1\r\n.dot\r\n\r\n", s.value());
        assert_eq!(text, string_script(&s));

        let s = parse_string_fully("text:\r\n.\r\n");
        assert_eq!("", s.value());

        let s = parse_string_fully("text:\r\n\r\n.\r\n");
        assert_eq!("\r\n", s.value());
        assert_eq!("text:\r\n\r\n.\r\n", string_script(&s));
    }

    #[test]
    fn multi_line_set_value_stuffs_dots() {
        let mut s = parse_string_fully("text:\r\nx\r\n.\r\n");
        s.set_value(".hidden\r\nshown");
        assert_eq!("text:\r\n..hidden\r\nshown\r\n.\r\n", string_script(&s));
        assert_eq!(".hidden\r\nshown\r\n", s.value());
    }

    #[test]
    fn unterminated_multi_line_string() {
        let mut cursor = Cursor::new("text:\r\nfoo\r\n");
        assert_matches!(
            Err(Error::Syntax { .. }),
            SieveString::parse(&mut cursor)
        );
        assert_eq!(0, cursor.position());
    }

    #[test]
    fn string_lists() {
        let text = r#"[ "a" ,"b",	"c\"" ]"#;
        let mut cursor = Cursor::new(text);
        let mut list = StringList::parse(&mut cursor).unwrap();
        assert!(cursor.at_end());
        assert_eq!(vec!["a", "b", "c\""], list.values());

        let mut out = String::new();
        list.write_to(&mut out);
        assert_eq!(text, out);

        list.set_values(&["x", "y"]);
        let mut out = String::new();
        list.write_to(&mut out);
        assert_eq!(r#"[ "x" ,"y"]"#, out);

        list.set_values(&["x", "y", "z"]);
        let mut out = String::new();
        list.write_to(&mut out);
        assert_eq!(r#"[ "x" ,"y", "z"]"#, out);
    }

    #[test]
    fn single_string_list_grows_into_list() {
        let mut cursor = Cursor::new(r#""a""#);
        let mut list = StringList::parse(&mut cursor).unwrap();
        assert_eq!(StringList::Single(SieveString::quoted("a")), list);

        list.set_values(&["b"]);
        assert_eq!(vec!["b"], list.values());

        list.set_values(&["b", "c"]);
        let mut out = String::new();
        list.write_to(&mut out);
        assert_eq!(r#"["b", "c"]"#, out);
    }

    #[test]
    fn bad_string_lists() {
        for text in &[r#"["a""#, r#"["a",]"#, "[]", r#"["a" "b"]"#] {
            let mut cursor = Cursor::new(text);
            assert!(StringList::parse(&mut cursor).is_err(), "{}", text);
            assert_eq!(0, cursor.position(), "{}", text);
        }
    }

    #[test]
    fn numbers() {
        let mut cursor = Cursor::new("100K;");
        let n = Number::parse(&mut cursor).unwrap();
        assert_eq!(";", cursor.remaining());
        assert_eq!(Some('K'), n.unit());
        assert_eq!(102_400, n.value().unwrap());

        let mut cursor = Cursor::new("2g");
        assert_eq!(2 << 30, Number::parse(&mut cursor).unwrap().value().unwrap());

        let mut cursor = Cursor::new("99999999999999999999");
        let n = Number::parse(&mut cursor).unwrap();
        assert_matches!(Err(Error::Syntax { .. }), n.value());

        let mut cursor = Cursor::new("K");
        assert_matches!(Err(Error::Syntax { .. }), Number::parse(&mut cursor));
    }

    #[test]
    fn number_set() {
        let mut cursor = Cursor::new("1");
        let mut n = Number::parse(&mut cursor).unwrap();
        n.set(5, Some('M')).unwrap();
        assert_eq!("5M", n.to_script());
        assert_matches!(Err(Error::Syntax { .. }), n.set(5, Some('X')));
    }

    proptest! {
        #[test]
        fn quoted_set_value_is_reversible(value in "[a-z\"\\\\ \r\n]*") {
            let mut s = SieveString::quoted("");
            s.set_value(&value);
            let text = string_script(&s);
            let parsed = parse_string_fully(&text);
            prop_assert_eq!(value, parsed.value());
        }
    }
}
