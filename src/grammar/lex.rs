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

//! Whitespace and comments.
//!
//! Sieve allows whitespace and comments between nearly any two tokens. To be
//! able to write a script back out exactly as it was read, every run of
//! whitespace is kept verbatim, split into segments:
//!
//! - Blanks: spaces and tabs.
//! - Line breaks: `\r\n`. Scripts are normalised to CRLF before parsing.
//! - Bracket comments: `/* ... */`, which may span lines.
//! - Hash comments: `#` up to and including the end of the line. A hash
//!   comment at the very end of the script need not have a line break.
//!
//! A run can be parsed so that it stops right after the first line break.
//! This is used after `;`, `{` and `}` so that the whitespace at the start of
//! the following line belongs to whatever comes next, which keeps the
//! indentation of the surrounding lines intact when a statement is removed.

use super::cursor::Cursor;
use crate::support::error::Error;

pub const CRLF: &str = "\r\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Blank(String),
    LineBreak,
    BracketComment(String),
    HashComment { text: String, terminated: bool },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Whitespace {
    segments: Vec<Segment>,
}

impl Whitespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single space.
    pub fn space() -> Self {
        Whitespace {
            segments: vec![Segment::Blank(" ".to_owned())],
        }
    }

    /// A single line break.
    pub fn line_break() -> Self {
        Whitespace {
            segments: vec![Segment::LineBreak],
        }
    }

    /// Whether whitespace or a comment starts at the cursor.
    pub fn probe(cursor: &Cursor<'_>) -> bool {
        cursor.is_char(&[' ', '\t', '#'])
            || cursor.starts_with_any(&[CRLF, "/*"])
    }

    /// Parse a possibly empty run of whitespace.
    ///
    /// If `stop_at_line_break` is set, the run ends after the first line
    /// break or hash comment.
    pub fn parse(
        cursor: &mut Cursor<'_>,
        stop_at_line_break: bool,
    ) -> Result<Self, Error> {
        let start = cursor.position();
        let mut segments = Vec::new();

        loop {
            if cursor.starts_with(CRLF) {
                cursor.match_literal(CRLF)?;
                segments.push(Segment::LineBreak);
                if stop_at_line_break {
                    break;
                }
            } else if cursor.is_char(&[' ', '\t']) {
                let blank =
                    cursor.extract_run("blank", |c| ' ' == c || '\t' == c)?;
                segments.push(Segment::Blank(blank.to_owned()));
            } else if cursor.starts_with("/*") {
                cursor.match_literal("/*")?;
                match cursor.extract_until("*/") {
                    Ok(text) => {
                        segments.push(Segment::BracketComment(text.to_owned()))
                    }
                    Err(e) => {
                        cursor.rewind(start);
                        return Err(e);
                    }
                }
            } else if cursor.skip_char('#') {
                let (text, terminated) = match cursor.extract_until(CRLF) {
                    Ok(text) => (text, true),
                    Err(_) => (cursor.extract_rest(), false),
                };
                segments.push(Segment::HashComment {
                    text: text.to_owned(),
                    terminated,
                });
                if stop_at_line_break {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(Whitespace { segments })
    }

    /// Parse a complete run from `text`, which must contain nothing else.
    pub fn from_text(text: &str) -> Result<Self, Error> {
        let mut cursor = Cursor::new(text);
        let ws = Self::parse(&mut cursor, false)?;
        if !cursor.at_end() {
            return Err(cursor.syntax_error("whitespace"));
        }
        Ok(ws)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether this run ends a line.
    pub fn has_line_break(&self) -> bool {
        self.segments.iter().any(|s| match *s {
            Segment::LineBreak => true,
            Segment::HashComment { terminated, .. } => terminated,
            _ => false,
        })
    }

    pub fn has_comment(&self) -> bool {
        self.segments.iter().any(|s| {
            matches!(
                *s,
                Segment::BracketComment(..) | Segment::HashComment { .. }
            )
        })
    }

    pub fn write_to(&self, out: &mut String) {
        for segment in &self.segments {
            match *segment {
                Segment::Blank(ref s) => out.push_str(s),
                Segment::LineBreak => out.push_str(CRLF),
                Segment::BracketComment(ref text) => {
                    out.push_str("/*");
                    out.push_str(text);
                    out.push_str("*/");
                }
                Segment::HashComment {
                    ref text,
                    terminated,
                } => {
                    out.push('#');
                    out.push_str(text);
                    if terminated {
                        out.push_str(CRLF);
                    }
                }
            }
        }
    }

    pub fn to_script(&self) -> String {
        let mut s = String::new();
        self.write_to(&mut s);
        s
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_mixed_run() {
        let text = " \t/* a\r\nb */\r\n# hash\r\n  x";
        let mut c = Cursor::new(text);
        let ws = Whitespace::parse(&mut c, false).unwrap();
        assert_eq!("x", c.remaining());
        assert_eq!(
            &[
                Segment::Blank(" \t".to_owned()),
                Segment::BracketComment(" a\r\nb ".to_owned()),
                Segment::LineBreak,
                Segment::HashComment {
                    text: " hash".to_owned(),
                    terminated: true,
                },
                Segment::Blank("  ".to_owned()),
            ],
            ws.segments()
        );
        assert!(ws.has_comment());
        assert!(ws.has_line_break());
        assert_eq!(" \t/* a\r\nb */\r\n# hash\r\n  ", ws.to_script());
    }

    #[test]
    fn stop_at_line_break() {
        let mut c = Cursor::new("  \r\n  keep");
        let ws = Whitespace::parse(&mut c, true).unwrap();
        assert_eq!("  \r\n", ws.to_script());
        assert_eq!("  keep", c.remaining());

        let mut c = Cursor::new(" # note\r\n\r\nstop");
        let ws = Whitespace::parse(&mut c, true).unwrap();
        assert_eq!(" # note\r\n", ws.to_script());
        assert_eq!("\r\nstop", c.remaining());
    }

    #[test]
    fn empty_and_unterminated() {
        let mut c = Cursor::new("keep");
        assert!(Whitespace::parse(&mut c, false).unwrap().is_empty());
        assert_eq!(0, c.position());

        let mut c = Cursor::new("# trailing");
        let ws = Whitespace::parse(&mut c, false).unwrap();
        assert!(c.at_end());
        assert!(!ws.has_line_break());
        assert_eq!("# trailing", ws.to_script());

        let mut c = Cursor::new(" /* open");
        assert_matches!(
            Err(Error::Syntax { .. }),
            Whitespace::parse(&mut c, false)
        );
        assert_eq!(0, c.position());

        // A lone CR is not whitespace
        let mut c = Cursor::new("\rx");
        assert!(!Whitespace::probe(&c));
        assert!(Whitespace::parse(&mut c, false).unwrap().is_empty());
    }

    #[test]
    fn from_text() {
        assert_eq!(Whitespace::space(), Whitespace::from_text(" ").unwrap());
        assert_eq!(
            Whitespace::line_break(),
            Whitespace::from_text("\r\n").unwrap()
        );
        assert_matches!(
            Err(Error::Syntax { .. }),
            Whitespace::from_text(" x")
        );
    }

    proptest! {
        #[test]
        fn whitespace_is_reversible(
            s in "( |\t|\r\n|/\\*[a-z \r\n]*\\*/|#[a-z ]*\r\n)*"
        ) {
            let mut c = Cursor::new(&s);
            let ws = Whitespace::parse(&mut c, false).unwrap();
            prop_assert!(c.at_end());
            prop_assert_eq!(s, ws.to_script());
        }
    }
}
