//! JSON parsing into the binary encoding.
//!
//! A recursive-descent parser over UTF-8 bytes (RFC 8259, no extensions)
//! that emits directly into a [`Builder`]. Integers that fit a signed or
//! unsigned 64-bit value are encoded as integers; everything else becomes a
//! double.

use std::borrow::Cow;

use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::types::Value;

/// Converts textual JSON into encoded values.
#[derive(Debug, Default)]
pub struct Parser {
    options: Options,
    builder: Builder,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Parser {
        Parser {
            options,
            builder: Builder::with_options(options),
        }
    }

    /// One-shot convenience: parses `json` and returns the sealed builder.
    pub fn from_json(json: &str) -> Result<Builder> {
        let mut parser = Parser::new();
        parser.parse(json)?;
        Ok(parser.into_builder())
    }

    /// Like [`from_json`](Parser::from_json), with explicit options.
    pub fn from_json_with_options(json: &str, options: Options) -> Result<Builder> {
        let mut parser = Parser::with_options(options);
        parser.parse(json)?;
        Ok(parser.into_builder())
    }

    /// Parses one JSON document into the builder.
    pub fn parse(&mut self, json: &str) -> Result<()> {
        self.parse_bytes(json.as_bytes())
    }

    /// Parses one JSON document from raw UTF-8 bytes.
    pub fn parse_bytes(&mut self, json: &[u8]) -> Result<()> {
        tracing::trace!(len = json.len(), "parsing json input");
        let mut state = ParseState {
            input: json,
            pos: 0,
            line: 1,
            column: 1,
            builder: &mut self.builder,
            keep_top_level_open: self.options.keep_top_level_open,
            depth: 0,
        };
        state.skip_whitespace();
        state.parse_value()?;
        state.skip_whitespace();
        if state.pos != state.input.len() {
            return Err(state.error("unexpected trailing characters"));
        }
        Ok(())
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn into_builder(self) -> Builder {
        self.builder
    }
}

struct ParseState<'i, 'b> {
    input: &'i [u8],
    pos: usize,
    line: usize,
    column: usize,
    builder: &'b mut Builder,
    keep_top_level_open: bool,
    depth: usize,
}

impl<'i> ParseState<'i, '_> {
    fn error(&self, msg: &'static str) -> Error {
        Error::Parse {
            msg,
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes one byte, updating the line/column counters. Column counts
    /// characters, so UTF-8 continuation bytes do not advance it.
    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if b & 0xc0 != 0x80 {
            self.column += 1;
        }
        b.into()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn expect(&mut self, expected: u8, msg: &'static str) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error(msg)),
        }
    }

    fn parse_value(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => {
                let s = self.parse_string()?;
                self.builder.add(Value::String(s))?;
                Ok(())
            }
            Some(b't') => self.parse_literal(b"true", Value::Bool(true)),
            Some(b'f') => self.parse_literal(b"false", Value::Bool(false)),
            Some(b'n') => self.parse_literal(b"null", Value::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_literal(&mut self, literal: &'static [u8], value: Value<'static>) -> Result<()> {
        let (line, column) = (self.line, self.column);
        for &expected in literal {
            match self.bump() {
                Some(b) if b == expected => {}
                _ => {
                    return Err(Error::Parse {
                        msg: "invalid literal",
                        line,
                        column,
                    })
                }
            }
        }
        self.builder.add(value)?;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<()> {
        self.bump();
        self.depth += 1;
        self.builder.open_array()?;
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.bump();
            return self.finish_compound();
        }
        loop {
            self.parse_value()?;
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => self.skip_whitespace(),
                Some(b']') => return self.finish_compound(),
                _ => return Err(self.error("expecting ',' or ']' in array")),
            }
        }
    }

    fn parse_object(&mut self) -> Result<()> {
        self.bump();
        self.depth += 1;
        self.builder.open_object()?;
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.bump();
            return self.finish_compound();
        }
        loop {
            if self.peek() != Some(b'"') {
                return Err(Error::ExpectingAttributeName {
                    line: self.line,
                    column: self.column,
                });
            }
            let key = self.parse_string()?;
            self.builder.add(Value::String(key))?;
            self.skip_whitespace();
            self.expect(b':', "expecting ':' in object")?;
            self.skip_whitespace();
            self.parse_value()?;
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => self.skip_whitespace(),
                Some(b'}') => return self.finish_compound(),
                _ => return Err(self.error("expecting ',' or '}' in object")),
            }
        }
    }

    /// Closes the compound just parsed; the outermost one stays open when
    /// the builder was configured with `keep_top_level_open`.
    fn finish_compound(&mut self) -> Result<()> {
        self.depth -= 1;
        if self.depth == 0 && self.keep_top_level_open {
            return Ok(());
        }
        self.builder.close()
    }

    fn parse_string(&mut self) -> Result<Cow<'i, str>> {
        let input = self.input;
        self.bump();
        let start = self.pos;
        // Fast path: scan for a span without escapes.
        loop {
            match self.peek() {
                Some(b'"') => {
                    let raw = &input[start..self.pos];
                    self.bump();
                    let s =
                        std::str::from_utf8(raw).map_err(|_| Error::InvalidUtf8Sequence)?;
                    return Ok(Cow::Borrowed(s));
                }
                Some(b'\\') => break,
                Some(b) if b < 0x20 => {
                    return Err(Error::UnexpectedControlCharacter {
                        byte: b,
                        line: self.line,
                        column: self.column,
                    });
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error("unterminated string")),
            }
        }
        // Escape path: copy what was scanned, then decode the rest.
        let prefix =
            std::str::from_utf8(&input[start..self.pos]).map_err(|_| Error::InvalidUtf8Sequence)?;
        let mut out = String::with_capacity(prefix.len() + 16);
        out.push_str(prefix);
        let mut chunk_start;
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.bump();
                    return Ok(Cow::Owned(out));
                }
                Some(b'\\') => {
                    self.bump();
                    self.parse_escape(&mut out)?;
                }
                Some(b) if b < 0x20 => {
                    return Err(Error::UnexpectedControlCharacter {
                        byte: b,
                        line: self.line,
                        column: self.column,
                    });
                }
                Some(_) => {
                    chunk_start = self.pos;
                    while matches!(self.peek(), Some(b) if b != b'"' && b != b'\\' && b >= 0x20)
                    {
                        self.bump();
                    }
                    let chunk = std::str::from_utf8(&self.input[chunk_start..self.pos])
                        .map_err(|_| Error::InvalidUtf8Sequence)?;
                    out.push_str(chunk);
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        match self.bump() {
            Some(b'"') => out.push('"'),
            Some(b'\\') => out.push('\\'),
            Some(b'/') => out.push('/'),
            Some(b'b') => out.push('\u{0008}'),
            Some(b'f') => out.push('\u{000c}'),
            Some(b'n') => out.push('\n'),
            Some(b'r') => out.push('\r'),
            Some(b't') => out.push('\t'),
            Some(b'u') => {
                let unit = self.parse_hex4()?;
                let c = if (0xd800..0xdc00).contains(&unit) {
                    // High surrogate: a low surrogate must follow.
                    if self.bump() != Some(b'\\') || self.bump() != Some(b'u') {
                        return Err(Error::InvalidUtf8Sequence);
                    }
                    let low = self.parse_hex4()?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(Error::InvalidUtf8Sequence);
                    }
                    0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00)
                } else if (0xdc00..0xe000).contains(&unit) {
                    return Err(Error::InvalidUtf8Sequence);
                } else {
                    unit
                };
                out.push(char::from_u32(c).ok_or(Error::InvalidUtf8Sequence)?);
            }
            _ => return Err(self.error("invalid escape sequence")),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.bump() {
                Some(b @ b'0'..=b'9') => u32::from(b - b'0'),
                Some(b @ b'a'..=b'f') => u32::from(b - b'a') + 10,
                Some(b @ b'A'..=b'F') => u32::from(b - b'A') + 10,
                _ => return Err(self.error("invalid unicode escape")),
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<()> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.bump();
        }

        // Integer part; leading zeros are not allowed.
        match self.peek() {
            Some(b'0') => {
                self.bump();
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return Err(self.error("leading zeros are not allowed"));
                }
            }
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.bump();
                }
            }
            _ => return Err(self.error("invalid number")),
        }
        let int_end = self.pos;

        let mut is_integer = true;
        if self.peek() == Some(b'.') {
            is_integer = false;
            self.bump();
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expecting digits after decimal point"));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_integer = false;
            self.bump();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.bump();
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expecting digits in exponent"));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }

        if is_integer {
            let digits = &self.input[if negative { start + 1 } else { start }..int_end];
            if let Some(value) = accumulate_u64(digits) {
                if negative {
                    if value <= i64::MAX as u64 {
                        self.builder.add(Value::Int(-(value as i64)))?;
                        return Ok(());
                    }
                    if value == i64::MAX as u64 + 1 {
                        self.builder.add(Value::Int(i64::MIN))?;
                        return Ok(());
                    }
                } else {
                    if value <= i64::MAX as u64 {
                        self.builder.add(Value::Int(value as i64))?;
                    } else {
                        self.builder.add(Value::UInt(value))?;
                    }
                    return Ok(());
                }
            }
        }

        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| Error::InvalidUtf8Sequence)?;
        let value: f64 = text.parse().map_err(|_| self.error("invalid number"))?;
        if !value.is_finite() {
            return Err(Error::NumberOutOfRange);
        }
        self.builder.add(Value::Double(value))?;
        Ok(())
    }
}

/// Decimal digits to u64, `None` on overflow.
fn accumulate_u64(digits: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for &d in digits {
        value = value
            .checked_mul(10)?
            .checked_add(u64::from(d - b'0'))?;
    }
    Some(value)
}
