//! Restricted literal parser for framework marker text
//!
//! Framework markers arrive as the `repr()` of a dictionary. Only plain data
//! is accepted: dicts with string keys, lists, tuples, strings, numbers,
//! booleans and `None` (JSON spellings `true`/`false`/`null` too). Names,
//! calls, operators and every other expression form are rejected, so marker
//! text is never executed.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum container nesting accepted in one marker
pub const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unsupported expression {word:?} at offset {offset}")]
    UnsupportedExpression { word: String, offset: usize },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("dictionary key at offset {offset} is not a string")]
    NonStringKey { offset: usize },

    #[error("nesting deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

type Result<T> = std::result::Result<T, LiteralError>;

/// Parse a single literal value spanning the whole of `text`
pub fn parse_literal(text: &str) -> Result<Value> {
    let mut parser = LiteralParser::new(text);
    let value = parser.value()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(_) => Err(LiteralError::TrailingInput { offset: parser.pos }),
    }
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect_more(&self) -> Result<char> {
        self.peek().ok_or(LiteralError::UnexpectedEnd)
    }

    fn unexpected(&self, found: char) -> LiteralError {
        LiteralError::UnexpectedChar {
            found,
            offset: self.pos,
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.expect_more()? {
            '{' => self.nested(Self::dict),
            '[' => self.nested(|p| p.sequence(']').map(|(items, _)| Value::Array(items))),
            '(' => self.nested(Self::tuple),
            '\'' | '"' => self.string().map(Value::String),
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.keyword(),
            c => Err(self.unexpected(c)),
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn dict(&mut self) -> Result<Value> {
        self.bump(); // '{'
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.expect_more()? == '}' {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key_offset = self.pos;
            let key = match self.value()? {
                Value::String(key) => key,
                _ => return Err(LiteralError::NonStringKey { offset: key_offset }),
            };

            self.skip_whitespace();
            match self.expect_more()? {
                ':' => {
                    self.bump();
                }
                c => return Err(self.unexpected(c)),
            }

            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.expect_more()? {
                ',' => {
                    self.bump();
                }
                '}' => {}
                c => return Err(self.unexpected(c)),
            }
        }
    }

    /// Comma separated values up to `close`; also reports whether any comma was seen
    fn sequence(&mut self, close: char) -> Result<(Vec<Value>, bool)> {
        self.bump(); // opening bracket
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.expect_more()? == close {
                self.bump();
                return Ok((items, saw_comma));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.expect_more()? {
                ',' => {
                    self.bump();
                    saw_comma = true;
                }
                c if c == close => {}
                c => return Err(self.unexpected(c)),
            }
        }
    }

    /// `(x)` is just `x`; `()`, `(x,)` and `(x, y)` are tuples, decoded as arrays
    fn tuple(&mut self) -> Result<Value> {
        let (mut items, saw_comma) = self.sequence(')')?;
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String> {
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
            match c {
                c if c == quote => return Ok(out),
                '\\' => out.push(self.escape()?),
                '\n' => return Err(self.unexpected(c)),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let offset = self.pos - 1;
        let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let decoded = match c {
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'v' => '\u{0b}',
            'x' => self.hex_escape(2, offset)?,
            'u' => self.hex_escape(4, offset)?,
            'U' => self.hex_escape(8, offset)?,
            _ => return Err(LiteralError::InvalidEscape { offset }),
        };
        Ok(decoded)
    }

    fn hex_escape(&mut self, digits: usize, offset: usize) -> Result<char> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or(LiteralError::InvalidEscape { offset })?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LiteralError::InvalidEscape { offset });
        }
        let code =
            u32::from_str_radix(hex, 16).map_err(|_| LiteralError::InvalidEscape { offset })?;
        let c = char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })?;
        self.pos = end;
        Ok(c)
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                // separator only between two digits
                '_' => {
                    let after_digit = self.src[..self.pos].ends_with(|p: char| p.is_ascii_digit());
                    let before_digit =
                        self.src[self.pos + 1..].starts_with(|n: char| n.is_ascii_digit());
                    if !(after_digit && before_digit) {
                        return Err(LiteralError::InvalidNumber {
                            text: self.src[start..=self.pos].to_string(),
                            offset: start,
                        });
                    }
                }
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-') | Some('+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        let text = &self.src[start..self.pos];
        let invalid = || LiteralError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        };
        let digits: String = text.chars().filter(|&c| c != '_').collect();
        let digits = digits.strip_prefix('+').unwrap_or(&digits);

        if !is_float {
            if let Ok(n) = digits.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = digits.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        let n: f64 = digits.parse().map_err(|_| invalid())?;
        Number::from_f64(n).map(Value::Number).ok_or_else(invalid)
    }

    fn keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            word => Err(LiteralError::UnsupportedExpression {
                word: word.to_string(),
                offset: start,
            }),
        }
    }
}
