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

//! The scanner underlying all parsing.
//!
//! A `Cursor` is a position within an immutable script text. It only moves
//! forward when something is consumed, but a position can be saved with
//! `position()` and restored with `rewind()`, which is how speculative
//! parsing is done. Since a cursor is just a reference and an offset, it is
//! `Copy`; probing is done on a copy so that the original never moves.
//!
//! None of the consuming operations move the cursor when they fail.

use crate::support::error::Error;

/// The maximum number of characters of remaining input quoted in errors.
const SNIPPET_LENGTH: usize = 50;

#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    data: &'a str,
    pos: usize,
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || '_' == ch
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a str) -> Self {
        Cursor { data, pos: 0 }
    }

    /// The current byte offset into the text.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Return to a position previously obtained from `position()`.
    pub fn rewind(&mut self, pos: usize) {
        debug_assert!(self.data.is_char_boundary(pos));
        self.pos = pos.min(self.data.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// All text which has not yet been consumed.
    pub fn remaining(&self) -> &'a str {
        &self.data[self.pos..]
    }

    /// The next `n` characters, or fewer at the end of input.
    pub fn peek(&self, n: usize) -> &'a str {
        let rest = self.remaining();
        match rest.char_indices().nth(n) {
            Some((end, _)) => &rest[..end],
            None => rest,
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// A short excerpt of the remaining input, for error messages.
    pub fn snippet(&self) -> String {
        self.peek(SNIPPET_LENGTH).to_owned()
    }

    pub fn syntax_error(&self, expected: impl Into<String>) -> Error {
        Error::Syntax {
            expected: expected.into(),
            found: self.snippet(),
        }
    }

    /// Whether the remaining input starts with exactly `token`.
    pub fn starts_with(&self, token: &str) -> bool {
        self.remaining().starts_with(token)
    }

    pub fn starts_with_any(&self, tokens: &[&str]) -> bool {
        tokens.iter().any(|t| self.starts_with(t))
    }

    /// Whether the remaining input starts with `token`, ignoring ASCII case.
    fn starts_with_ignore_case(&self, token: &str) -> bool {
        self.remaining()
            .get(..token.len())
            .map_or(false, |s| s.eq_ignore_ascii_case(token))
    }

    /// Whether the remaining input starts with the keyword `token`.
    ///
    /// Keywords are matched without regard to ASCII case. If `token` ends
    /// with an identifier character, it only matches if the input does not
    /// continue with another identifier character, so that `if` does not
    /// match `iffy` and `:is` does not match `:isnt`.
    pub fn starts_with_keyword(&self, token: &str) -> bool {
        if !self.starts_with_ignore_case(token) {
            return false;
        }

        if !token.chars().last().map_or(false, is_identifier_char) {
            return true;
        }

        !self.remaining()[token.len()..]
            .chars()
            .next()
            .map_or(false, is_identifier_char)
    }

    pub fn is_char(&self, chars: &[char]) -> bool {
        self.peek_char().map_or(false, |c| chars.contains(&c))
    }

    /// Consume `token`, which must appear exactly.
    pub fn match_literal(&mut self, token: &str) -> Result<&'a str, Error> {
        if self.starts_with(token) {
            Ok(self.advance(token.len()))
        } else {
            Err(self.syntax_error(format!("\"{}\"", token)))
        }
    }

    /// Consume `token` ignoring ASCII case, returning the spelling found in
    /// the input.
    pub fn match_keyword(&mut self, token: &str) -> Result<&'a str, Error> {
        if self.starts_with_ignore_case(token) {
            Ok(self.advance(token.len()))
        } else {
            Err(self.syntax_error(format!("\"{}\"", token)))
        }
    }

    /// Consume the single character `ch` if it is next; return whether it
    /// was.
    pub fn skip_char(&mut self, ch: char) -> bool {
        if Some(ch) == self.peek_char() {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    pub fn extract_char(&mut self, ch: char) -> Result<char, Error> {
        if self.skip_char(ch) {
            Ok(ch)
        } else {
            Err(self.syntax_error(format!("'{}'", ch)))
        }
    }

    /// Consume the next `n` characters, failing if fewer remain.
    pub fn extract(&mut self, n: usize) -> Result<&'a str, Error> {
        let s = self.peek(n);
        if s.chars().count() < n {
            return Err(
                self.syntax_error(format!("{} more characters", n))
            );
        }
        Ok(self.advance(s.len()))
    }

    /// Consume the maximal non-empty run of characters matching `pred`.
    ///
    /// `what` describes the run for the error raised if it is empty.
    pub fn extract_run(
        &mut self,
        what: &str,
        pred: impl Fn(char) -> bool,
    ) -> Result<&'a str, Error> {
        let rest = self.remaining();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(ix, _)| ix);

        if 0 == end {
            Err(self.syntax_error(what))
        } else {
            Ok(self.advance(end))
        }
    }

    /// Consume everything up to and including `delimiter`, returning the
    /// text before the delimiter.
    pub fn extract_until(
        &mut self,
        delimiter: &str,
    ) -> Result<&'a str, Error> {
        let rest = self.remaining();
        let needle = delimiter.as_bytes();
        let first = match needle.first() {
            Some(&first) => first,
            None => return Ok(""),
        };

        let haystack = rest.as_bytes();
        let mut offset = 0;
        while let Some(ix) = memchr::memchr(first, &haystack[offset..]) {
            let start = offset + ix;
            if haystack[start..].starts_with(needle) {
                let content = &rest[..start];
                self.advance(start + needle.len());
                return Ok(content);
            }
            offset = start + 1;
        }

        Err(self.syntax_error(format!("\"{}\"", delimiter.escape_default())))
    }

    /// Consume everything that remains.
    pub fn extract_rest(&mut self) -> &'a str {
        let len = self.remaining().len();
        self.advance(len)
    }

    fn advance(&mut self, len: usize) -> &'a str {
        let s = &self.data[self.pos..self.pos + len];
        self.pos += len;
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literals_and_keywords() {
        let mut c = Cursor::new("Keep;");
        assert_matches!(Err(Error::Syntax { .. }), c.match_literal("keep"));
        assert_eq!(0, c.position());
        assert_eq!("Keep", c.match_keyword("keep").unwrap());
        assert_eq!(";", c.match_literal(";").unwrap());
        assert!(c.at_end());
    }

    #[test]
    fn keyword_boundaries() {
        assert!(Cursor::new("if true").starts_with_keyword("if"));
        assert!(Cursor::new("IF(").starts_with_keyword("if"));
        assert!(!Cursor::new("iffy").starts_with_keyword("if"));
        assert!(!Cursor::new(":isnt").starts_with_keyword(":is"));
        assert!(Cursor::new(":is\"x\"").starts_with_keyword(":is"));
        assert!(Cursor::new("text:foo").starts_with_keyword("text:"));
        assert!(!Cursor::new("i").starts_with_keyword("if"));
        // Must not split a multi-byte character
        assert!(!Cursor::new("ä").starts_with_keyword("a"));
    }

    #[test]
    fn runs_and_delimiters() {
        let mut c = Cursor::new("123abc*/rest");
        assert_eq!("123", c.extract_run("digits", |c| c.is_ascii_digit()).unwrap());
        assert_matches!(
            Err(Error::Syntax { .. }),
            c.extract_run("digits", |c| c.is_ascii_digit())
        );
        assert_eq!(3, c.position());
        assert_eq!("abc", c.extract_until("*/").unwrap());
        assert_eq!("rest", c.remaining());
        assert_matches!(Err(Error::Syntax { .. }), c.extract_until("*/"));
        assert_eq!("rest", c.remaining());
    }

    #[test]
    fn extract_until_partial_matches() {
        let mut c = Cursor::new("a\r\nb\r\n.x\r\n.\r\nafter");
        assert_eq!("a\r\nb\r\n.x", c.extract_until("\r\n.\r\n").unwrap());
        assert_eq!("after", c.remaining());
    }

    #[test]
    fn rewind_and_peek() {
        let mut c = Cursor::new("äbc");
        assert_eq!("äb", c.peek(2));
        let pos = c.position();
        assert_eq!("äb", c.extract(2).unwrap());
        assert_eq!(Some('c'), c.peek_char());
        assert_matches!(Err(Error::Syntax { .. }), c.extract(2));
        c.rewind(pos);
        assert_eq!("äbc", c.remaining());
        assert!(c.skip_char('ä'));
        assert!(!c.skip_char('x'));
        assert!(c.is_char(&['a', 'b']));
        assert_eq!('b', c.extract_char('b').unwrap());
        assert_eq!("c", c.extract_rest());
        assert!(c.at_end());
    }

    #[test]
    fn snippet_is_bounded() {
        let text = "x".repeat(200);
        let c = Cursor::new(&text);
        assert_eq!(SNIPPET_LENGTH, c.snippet().len());
        match c.syntax_error("thing") {
            Error::Syntax { expected, found } => {
                assert_eq!("thing", expected);
                assert_eq!(SNIPPET_LENGTH, found.len());
            }
            e => panic!("Unexpected error: {:?}", e),
        }
    }
}
