//! JSON output: serializes encoded values back into RFC 8259 text.

use crate::error::{Error, Result};
use crate::options::{Options, UnsupportedTypeBehavior};
use crate::sink::{Sink, StringSink};
use crate::slice::Slice;
use crate::types::ValueType;

/// Writes the JSON form of encoded values into a [`Sink`].
pub struct Dumper<'a, S: Sink> {
    sink: &'a mut S,
    options: Options,
}

/// Convenience: dumps `slice` into a freshly allocated string.
pub fn dump_to_string(slice: Slice<'_>, options: &Options) -> Result<String> {
    let mut sink = StringSink::new();
    Dumper::new(&mut sink, *options).dump(slice)?;
    sink.into_string()
}

impl<'a, S: Sink> Dumper<'a, S> {
    pub fn new(sink: &'a mut S, options: Options) -> Dumper<'a, S> {
        Dumper { sink, options }
    }

    /// Dumps one value, including all of its members.
    pub fn dump(&mut self, slice: Slice<'_>) -> Result<()> {
        self.sink.reserve(slice.byte_size()?)?;
        self.dump_value(slice)
    }

    fn dump_value(&mut self, slice: Slice<'_>) -> Result<()> {
        match slice.value_type() {
            ValueType::Null => self.sink.append(b"null"),
            ValueType::Bool => {
                if slice.get_bool()? {
                    self.sink.append(b"true")
                } else {
                    self.sink.append(b"false")
                }
            }
            ValueType::SmallInt | ValueType::Int => {
                self.sink.append(slice.get_int()?.to_string().as_bytes())
            }
            ValueType::UInt => self.sink.append(slice.get_uint()?.to_string().as_bytes()),
            ValueType::Double => {
                let value = slice.get_double()?;
                if value.is_finite() {
                    self.sink.append(value.to_string().as_bytes())
                } else {
                    self.dump_unsupported(ValueType::Double, None)
                }
            }
            ValueType::String => self.dump_string(slice.get_string()?),
            ValueType::Array => self.dump_array(slice),
            ValueType::Object => self.dump_object(slice),
            // Tagged values are transparent for JSON output.
            ValueType::Tagged => self.dump_value(slice.tagged_value()?),
            ValueType::UtcDate => {
                self.dump_unsupported(ValueType::UtcDate, Some(slice.get_utc_date()?))
            }
            other => self.dump_unsupported(other, None),
        }
    }

    fn dump_array(&mut self, slice: Slice<'_>) -> Result<()> {
        self.sink.push_byte(b'[')?;
        for (i, member) in slice.array_iter()?.enumerate() {
            if i > 0 {
                self.sink.push_byte(b',')?;
            }
            self.dump_value(member?)?;
        }
        self.sink.push_byte(b']')
    }

    fn dump_object(&mut self, slice: Slice<'_>) -> Result<()> {
        self.sink.push_byte(b'{')?;
        for (i, entry) in slice.object_iter()?.enumerate() {
            if i > 0 {
                self.sink.push_byte(b',')?;
            }
            let (key, value) = entry?;
            self.dump_string(key.get_string()?)?;
            self.sink.push_byte(b':')?;
            self.dump_value(value)?;
        }
        self.sink.push_byte(b'}')
    }

    fn dump_unsupported(&mut self, got: ValueType, date: Option<i64>) -> Result<()> {
        match self.options.unsupported_type_behavior {
            UnsupportedTypeBehavior::FailOnUnsupported => {
                Err(Error::NoJsonEquivalent { got })
            }
            UnsupportedTypeBehavior::NullifyUnsupported => self.sink.append(b"null"),
            UnsupportedTypeBehavior::ConvertUnsupported => match date {
                Some(millis) => self.sink.append(millis.to_string().as_bytes()),
                None => {
                    self.sink.push_byte(b'"')?;
                    self.sink.append(b"(non-representable ")?;
                    self.sink.append(format!("{got:?}").as_bytes())?;
                    self.sink.append(b")\"")
                }
            },
        }
    }

    fn dump_string(&mut self, s: &str) -> Result<()> {
        self.sink.push_byte(b'"')?;
        let bytes = s.as_bytes();
        let mut flushed = 0;
        for (pos, c) in s.char_indices() {
            let escape: Option<EscapeKind> = match c {
                '"' => Some(EscapeKind::Verbatim(b"\\\"")),
                '\\' => Some(EscapeKind::Verbatim(b"\\\\")),
                '\u{0008}' => Some(EscapeKind::Verbatim(b"\\b")),
                '\u{000c}' => Some(EscapeKind::Verbatim(b"\\f")),
                '\n' => Some(EscapeKind::Verbatim(b"\\n")),
                '\r' => Some(EscapeKind::Verbatim(b"\\r")),
                '\t' => Some(EscapeKind::Verbatim(b"\\t")),
                c if (c as u32) < 0x20 => Some(EscapeKind::Unicode(c as u32)),
                '/' if self.options.escape_forward_slashes => {
                    Some(EscapeKind::Verbatim(b"\\/"))
                }
                c if self.options.escape_unicode && !c.is_ascii() => {
                    Some(EscapeKind::Unicode(c as u32))
                }
                _ => None,
            };
            if let Some(escape) = escape {
                self.sink.append(&bytes[flushed..pos])?;
                flushed = pos + c.len_utf8();
                match escape {
                    EscapeKind::Verbatim(e) => self.sink.append(e)?,
                    EscapeKind::Unicode(cp) => self.dump_unicode_escape(cp)?,
                }
            }
        }
        self.sink.append(&bytes[flushed..])?;
        self.sink.push_byte(b'"')
    }

    fn dump_unicode_escape(&mut self, cp: u32) -> Result<()> {
        if cp >= 0x10000 {
            let reduced = cp - 0x10000;
            self.dump_hex4(0xd800 + (reduced >> 10))?;
            self.dump_hex4(0xdc00 + (reduced & 0x3ff))
        } else {
            self.dump_hex4(cp)
        }
    }

    fn dump_hex4(&mut self, unit: u32) -> Result<()> {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        self.sink.append(b"\\u")?;
        for shift in [12u32, 8, 4, 0] {
            self.sink.push_byte(HEX[((unit >> shift) & 0xf) as usize])?;
        }
        Ok(())
    }
}

enum EscapeKind {
    Verbatim(&'static [u8]),
    Unicode(u32),
}
