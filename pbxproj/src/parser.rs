//! Recursive-descent parser for the ASCII property-list dialect.
//!
//! ```text
//! value  = dict | array | string | data
//! dict   = "{" (string "=" value ";")* "}"
//! array  = "(" (value ("," value)* ","?)? ")"
//! string = quoted | bare
//! data   = "<" hex* ">"
//! ```
//!
//! `/* ... */` and `// ...` comments may appear between any two tokens. A
//! block comment on the same line right after a string is attached to that
//! string (`ID /* Name */`); every other comment is collected separately so
//! callers can find section markers.

use crate::error::{PbxError, Result};
use crate::value::{Array, Data, Dict, DictEntry, Span, Str, Value};

/// A free-standing comment and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment body without delimiters, trimmed.
    pub text: String,
    pub span: Span,
}

/// Parse a single value, discarding free-standing comments.
pub fn parse_value(input: &str) -> Result<Value> {
    parse_document(input).map(|(value, _)| value)
}

pub(crate) fn parse_document(input: &str) -> Result<(Value, Vec<Comment>)> {
    let mut parser = Parser::new(input);
    if input.starts_with('\u{feff}') {
        parser.pos = '\u{feff}'.len_utf8();
    }
    parser.skip_trivia()?;
    let value = parser.value()?;
    parser.skip_trivia()?;
    if !parser.is_end() {
        return Err(parser.error(format!(
            "unexpected {} after the top-level value",
            parser.describe_next()
        )));
    }
    Ok((value, parser.comments))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    comments: Vec<Comment>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            comments: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + n).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn is_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> PbxError {
        PbxError::parse_at(self.input, self.pos, message)
    }

    fn describe_next(&self) -> String {
        match self.peek_char() {
            Some(ch) => format!("`{ch}`"),
            None => "end of input".to_string(),
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!(
                "expected `{}`, found {}",
                expected as char,
                self.describe_next()
            )))
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let comment = self.block_comment()?;
                    self.comments.push(comment);
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    let input = self.input;
                    let start = self.pos;
                    let end = input[start..]
                        .find('\n')
                        .map_or(input.len(), |i| start + i);
                    self.comments.push(Comment {
                        text: input[start + 2..end].trim().to_string(),
                        span: start..end,
                    });
                    self.pos = end;
                }
                _ => return Ok(()),
            }
        }
    }

    fn block_comment(&mut self) -> Result<Comment> {
        let input = self.input;
        let start = self.pos;
        let body = start + 2;
        let Some(len) = input[body..].find("*/") else {
            return Err(self.error("unterminated comment"));
        };
        self.pos = body + len + 2;
        Ok(Comment {
            text: input[body..body + len].trim().to_string(),
            span: start..self.pos,
        })
    }

    /// Attach a `/* comment */` that follows a string on the same line.
    fn inline_comment(&mut self) -> Result<Option<String>> {
        let bytes = self.input.as_bytes();
        let mut probe = self.pos;
        while matches!(bytes.get(probe), Some(b' ' | b'\t')) {
            probe += 1;
        }
        if bytes.get(probe) == Some(&b'/') && bytes.get(probe + 1) == Some(&b'*') {
            self.pos = probe;
            return self.block_comment().map(|comment| Some(comment.text));
        }
        Ok(None)
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'{') => self.dict().map(Value::Dict),
            Some(b'(') => self.array().map(Value::Array),
            Some(b'<') => self.data().map(Value::Data),
            Some(b'"') => self.quoted().map(Value::String),
            Some(b) if is_bare(b) => self.bare().map(Value::String),
            _ => Err(self.error(format!(
                "expected a value, found {}",
                self.describe_next()
            ))),
        }
    }

    fn string(&mut self) -> Result<Str> {
        match self.peek() {
            Some(b'"') => self.quoted(),
            Some(b) if is_bare(b) => self.bare(),
            _ => Err(self.error(format!(
                "expected a string, found {}",
                self.describe_next()
            ))),
        }
    }

    fn dict(&mut self) -> Result<Dict> {
        let start = self.pos;
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b'}') {
                self.pos += 1;
                break;
            }
            if self.is_end() {
                return Err(PbxError::parse_at(
                    self.input,
                    start,
                    "unterminated dictionary",
                ));
            }
            let key = self.string()?;
            self.skip_trivia()?;
            self.expect(b'=')?;
            self.skip_trivia()?;
            let value = self.value()?;
            self.skip_trivia()?;
            self.expect(b';')?;
            entries.push(DictEntry { key, value });
        }
        Ok(Dict {
            entries,
            span: start..self.pos,
        })
    }

    fn array(&mut self) -> Result<Array> {
        let start = self.pos;
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b')') {
                self.pos += 1;
                break;
            }
            if self.is_end() {
                return Err(PbxError::parse_at(self.input, start, "unterminated array"));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {}
                _ => {
                    return Err(self.error(format!(
                        "expected `,` or `)`, found {}",
                        self.describe_next()
                    )));
                }
            }
        }
        Ok(Array {
            items,
            span: start..self.pos,
        })
    }

    fn quoted(&mut self) -> Result<Str> {
        let start = self.pos;
        self.expect(b'"')?;
        let mut value = String::new();
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(PbxError::parse_at(self.input, start, "unterminated string"));
            };
            self.pos += ch.len_utf8();
            match ch {
                '"' => break,
                '\\' => value.push(self.escape()?),
                other => value.push(other),
            }
        }
        let span = start..self.pos;
        let comment = self.inline_comment()?;
        Ok(Str {
            value,
            quoted: true,
            comment,
            span,
        })
    }

    fn escape(&mut self) -> Result<char> {
        let Some(ch) = self.peek_char() else {
            return Err(self.error("unterminated escape sequence"));
        };
        self.pos += ch.len_utf8();
        let decoded = match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'U' | 'u' => {
                let digits = self.take_digits(4, |b| b.is_ascii_hexdigit());
                if digits.is_empty() {
                    return Err(self.error("expected hex digits after `\\U`"));
                }
                let code = u32::from_str_radix(digits, 16)
                    .map_err(|err| self.error(format!("invalid unicode escape: {err}")))?;
                char::from_u32(code)
                    .ok_or_else(|| self.error(format!("invalid unicode scalar U+{code:04X}")))?
            }
            '0'..='7' => {
                let first = ch as u32 - '0' as u32;
                let rest = self.take_digits(2, |b| (b'0'..=b'7').contains(&b));
                let code = rest
                    .bytes()
                    .fold(first, |acc, b| acc * 8 + u32::from(b - b'0'));
                char::from_u32(code)
                    .ok_or_else(|| self.error(format!("invalid octal escape {code:o}")))?
            }
            other => other,
        };
        Ok(decoded)
    }

    fn take_digits(&mut self, max: usize, accept: impl Fn(u8) -> bool) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while self.pos - start < max && self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        &input[start..self.pos]
    }

    fn bare(&mut self) -> Result<Str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            let opens_comment = b == b'/' && self.peek_at(1) == Some(b'*');
            if !is_bare(b) || opens_comment {
                break;
            }
            self.pos += 1;
        }
        let span = start..self.pos;
        let value = self.input[span.clone()].to_string();
        let comment = self.inline_comment()?;
        Ok(Str {
            value,
            quoted: false,
            comment,
            span,
        })
    }

    fn data(&mut self) -> Result<Data> {
        let start = self.pos;
        self.expect(b'<')?;
        let mut nibbles = Vec::new();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b) if b.is_ascii_hexdigit() => {
                    nibbles.push(hex_value(b));
                    self.pos += 1;
                }
                Some(_) => {
                    return Err(self.error(format!(
                        "invalid character {} in data block",
                        self.describe_next()
                    )));
                }
                None => {
                    return Err(PbxError::parse_at(
                        self.input,
                        start,
                        "unterminated data block",
                    ));
                }
            }
        }
        if nibbles.len() % 2 != 0 {
            return Err(PbxError::parse_at(
                self.input,
                start,
                "data block has an odd number of hex digits",
            ));
        }
        let bytes = nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect();
        Ok(Data {
            bytes,
            span: start..self.pos,
        })
    }
}

/// Characters allowed in an unquoted string.
pub(crate) fn is_bare(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'+' | b'/' | b':' | b'.' | b'-')
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
