//! Incremental encoder assembling valid buffers value by value.
//!
//! A [`Builder`] owns a growable byte buffer and a stack of open compound
//! values. Scalars are appended in their final encoding immediately;
//! compound headers are reserved at maximum width when opened and finalised
//! at [`close`](Builder::close), where the narrowest admissible width is
//! chosen and the payload is shifted or the gap zero-padded.

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::format::{self, head};
use crate::options::{Options, PaddingBehavior};
use crate::slice::Slice;
use crate::types::{Value, ValueType};

/// Space reserved for a compound header: one head byte plus the widest
/// byte-length field.
const RESERVED_HEADER: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompoundKind {
    Array,
    Object,
}

#[derive(Debug)]
struct Compound {
    kind: CompoundKind,
    /// Buffer offset of the head byte.
    start: usize,
    /// Buffer offsets of member starts (key starts for objects).
    index: Vec<usize>,
    /// An attribute key has been written and its value is pending.
    key_written: bool,
}

/// Stateful encoder producing one top-level value.
#[derive(Debug, Default)]
pub struct Builder {
    buf: BytesMut,
    stack: Vec<Compound>,
    options: Options,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Builder {
        Builder {
            buf: BytesMut::with_capacity(64),
            stack: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether a complete top-level value is present.
    pub fn is_closed(&self) -> bool {
        self.stack.is_empty() && !self.buf.is_empty()
    }

    /// Discards all content, making the builder reusable.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.stack.clear();
    }

    /// A view of the finished value.
    pub fn slice(&self) -> Result<Slice<'_>> {
        if !self.stack.is_empty() {
            return Err(Error::BuilderNotSealed);
        }
        if self.buf.is_empty() {
            return Ok(Slice::none());
        }
        Slice::new(&self.buf)
    }

    /// Detaches the encoded bytes, consuming the builder.
    pub fn into_bytes(self) -> Result<Bytes> {
        if !self.stack.is_empty() {
            return Err(Error::BuilderNotSealed);
        }
        Ok(self.buf.freeze())
    }

    /// Appends a scalar value. At the top level this starts (and finishes)
    /// the encoded document; inside an open object a string in key position
    /// becomes the attribute key.
    pub fn add(&mut self, value: Value<'_>) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if !self.buf.is_empty() {
                    return Err(Error::BuilderNotSealed);
                }
            }
            Some(compound) => match compound.kind {
                CompoundKind::Array => compound.index.push(self.buf.len()),
                CompoundKind::Object => {
                    if !compound.key_written {
                        let key = value.as_str().ok_or(Error::BuilderKeyMustBeString)?;
                        compound.index.push(self.buf.len());
                        compound.key_written = true;
                        let buf = &mut self.buf;
                        Self::write_string(buf, key);
                        return Ok(());
                    }
                    compound.key_written = false;
                }
            },
        }
        self.write_value(&value);
        Ok(())
    }

    /// Appends one attribute, key and value, to the open object.
    pub fn add_key_value(&mut self, key: &str, value: Value<'_>) -> Result<()> {
        self.begin_attribute(key)?;
        self.write_value(&value);
        Ok(())
    }

    /// Appends an already-encoded value verbatim. A string slice in key
    /// position becomes the attribute key.
    pub fn add_slice(&mut self, slice: Slice<'_>) -> Result<()> {
        if slice.is_none() {
            return Err(Error::BuilderUnexpectedType {
                got: ValueType::None,
            });
        }
        let bytes = slice.value_bytes()?;
        match self.stack.last_mut() {
            None => {
                if !self.buf.is_empty() {
                    return Err(Error::BuilderNotSealed);
                }
            }
            Some(compound) => match compound.kind {
                CompoundKind::Array => compound.index.push(self.buf.len()),
                CompoundKind::Object => {
                    if !compound.key_written {
                        if !slice.is_string() {
                            return Err(Error::BuilderKeyMustBeString);
                        }
                        compound.index.push(self.buf.len());
                        compound.key_written = true;
                    } else {
                        compound.key_written = false;
                    }
                }
            },
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Appends one attribute whose value is an already-encoded slice.
    pub fn add_key_slice(&mut self, key: &str, slice: Slice<'_>) -> Result<()> {
        let bytes = slice.value_bytes()?;
        self.begin_attribute(key)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Appends a value wrapped with a tag id.
    pub fn add_tagged(&mut self, tag: u64, value: Value<'_>) -> Result<()> {
        if tag == 0 {
            return Err(Error::BuilderUnexpectedValue("tag id must not be zero"));
        }
        self.prepare_value_slot()?;
        if tag <= u64::from(u8::MAX) {
            self.buf.put_u8(head::TAGGED_SHORT);
            self.buf.put_u8(tag as u8);
        } else {
            self.buf.put_u8(head::TAGGED_LONG);
            self.buf.put_u64_le(tag);
        }
        self.write_value(&value);
        Ok(())
    }

    /// Opens an array. Members are added with `add`/`add_slice` or nested
    /// `open_*` calls until the matching `close`.
    pub fn open_array(&mut self) -> Result<()> {
        self.open_compound(CompoundKind::Array)
    }

    /// Opens an object. Attributes are added with `add_key_value` or key
    /// and value `add` calls in alternation until the matching `close`.
    pub fn open_object(&mut self) -> Result<()> {
        self.open_compound(CompoundKind::Object)
    }

    /// Closes the innermost open compound, choosing the final layout and
    /// narrowest admissible field width.
    pub fn close(&mut self) -> Result<()> {
        let compound = self.stack.pop().ok_or(Error::BuilderNeedOpenCompound)?;
        if compound.key_written {
            return Err(Error::BuilderKeyAlreadyWritten);
        }
        if compound.index.is_empty() {
            self.close_empty(&compound);
        } else {
            match compound.kind {
                CompoundKind::Object => {
                    if self.options.check_attribute_uniqueness {
                        self.check_unique_keys(&compound)?;
                    }
                    if self.options.build_unindexed_objects {
                        self.close_compact_object(compound);
                    } else {
                        self.close_indexed(compound);
                    }
                }
                CompoundKind::Array => {
                    if self.options.build_unindexed_arrays && self.members_equal_sized(&compound)
                    {
                        self.close_unindexed_array(&compound);
                    } else {
                        self.close_indexed(compound);
                    }
                }
            }
        }
        if self.stack.is_empty() {
            tracing::trace!(bytes = self.buf.len(), "sealed top-level value");
        }
        Ok(())
    }

    // -- Slot bookkeeping --

    fn begin_attribute(&mut self, key: &str) -> Result<()> {
        let compound = self
            .stack
            .last_mut()
            .filter(|c| c.kind == CompoundKind::Object)
            .ok_or(Error::BuilderNeedOpenObject)?;
        if compound.key_written {
            return Err(Error::BuilderKeyAlreadyWritten);
        }
        compound.index.push(self.buf.len());
        let buf = &mut self.buf;
        Self::write_string(buf, key);
        Ok(())
    }

    /// Validates and records a member slot for a non-key value.
    fn prepare_value_slot(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if !self.buf.is_empty() {
                    return Err(Error::BuilderNotSealed);
                }
            }
            Some(compound) => match compound.kind {
                CompoundKind::Array => compound.index.push(self.buf.len()),
                CompoundKind::Object => {
                    if !compound.key_written {
                        return Err(Error::BuilderKeyMustBeString);
                    }
                    compound.key_written = false;
                }
            },
        }
        Ok(())
    }

    fn open_compound(&mut self, kind: CompoundKind) -> Result<()> {
        self.prepare_value_slot()?;
        let start = self.buf.len();
        self.buf.put_bytes(0, RESERVED_HEADER);
        self.stack.push(Compound {
            kind,
            start,
            index: Vec::new(),
            key_written: false,
        });
        Ok(())
    }

    // -- Scalar encodings --

    fn write_value(&mut self, value: &Value<'_>) {
        let buf = &mut self.buf;
        match value {
            Value::Null => buf.put_u8(head::NULL),
            Value::Bool(false) => buf.put_u8(head::FALSE),
            Value::Bool(true) => buf.put_u8(head::TRUE),
            Value::Int(i) => Self::write_int(buf, *i),
            Value::UInt(u) => Self::write_uint(buf, *u),
            Value::Double(d) => {
                buf.put_u8(head::DOUBLE);
                buf.put_slice(&d.to_le_bytes());
            }
            Value::UtcDate(millis) => {
                buf.put_u8(head::UTC_DATE);
                buf.put_slice(&millis.to_le_bytes());
            }
            Value::String(s) => Self::write_string(buf, s),
            Value::Binary(b) => Self::write_binary(buf, b),
            Value::MinKey => buf.put_u8(head::MIN_KEY),
            Value::MaxKey => buf.put_u8(head::MAX_KEY),
            Value::Illegal => buf.put_u8(head::ILLEGAL),
        }
    }

    /// SmallInt for -6..=9, minimal-width Int otherwise.
    fn write_int(buf: &mut BytesMut, value: i64) {
        if (-6..=9).contains(&value) {
            Self::write_small_int(buf, value);
            return;
        }
        let len = format::int_payload_len(value);
        buf.put_u8(head::INT_1 + (len as u8 - 1));
        buf.put_slice(&value.to_le_bytes()[..len]);
    }

    /// SmallInt for 0..=9, minimal-width UInt otherwise.
    fn write_uint(buf: &mut BytesMut, value: u64) {
        if value <= 9 {
            Self::write_small_int(buf, value as i64);
            return;
        }
        let len = format::uint_payload_len(value);
        buf.put_u8(head::UINT_1 + (len as u8 - 1));
        buf.put_slice(&value.to_le_bytes()[..len]);
    }

    fn write_small_int(buf: &mut BytesMut, value: i64) {
        debug_assert!((-6..=9).contains(&value));
        if value >= 0 {
            buf.put_u8(head::SMALLINT_ZERO + value as u8);
        } else {
            buf.put_u8((0x40 + value) as u8);
        }
    }

    fn write_string(buf: &mut BytesMut, s: &str) {
        let bytes = s.as_bytes();
        if bytes.len() <= head::STRING_SHORT_MAX_LEN {
            buf.put_u8(head::STRING_SHORT_EMPTY + bytes.len() as u8);
        } else {
            buf.put_u8(head::STRING_LONG);
            buf.put_u64_le(bytes.len() as u64);
        }
        buf.put_slice(bytes);
    }

    fn write_binary(buf: &mut BytesMut, b: &[u8]) {
        let w = format::uint_payload_len(b.len() as u64);
        buf.put_u8(head::BINARY_1 + (w as u8 - 1));
        buf.put_slice(&(b.len() as u64).to_le_bytes()[..w]);
        buf.put_slice(b);
    }

    // -- Compound finalisation --

    fn close_empty(&mut self, compound: &Compound) {
        self.buf.truncate(compound.start);
        self.buf.put_u8(match compound.kind {
            CompoundKind::Array => head::EMPTY_ARRAY,
            CompoundKind::Object => head::EMPTY_OBJECT,
        });
    }

    fn members_equal_sized(&self, compound: &Compound) -> bool {
        let first_size = match compound.index.len() {
            0 | 1 => return true,
            _ => compound.index[1] - compound.index[0],
        };
        let mut prev = compound.index[1];
        for &offset in &compound.index[2..] {
            if offset - prev != first_size {
                return false;
            }
            prev = offset;
        }
        self.buf.len() - prev == first_size
    }

    /// Whether close keeps the reserved header and zero-fills the gap.
    fn keep_padding(&self, w: usize) -> bool {
        w < 8 && self.options.padding_behavior == PaddingBehavior::UsePadding
    }

    /// Removes (or widens) the gap between the reserved header and the
    /// payload so that the header occupies exactly `new_header` bytes.
    fn move_payload(&mut self, start: usize, new_header: usize) {
        let old = start + RESERVED_HEADER;
        let new = start + new_header;
        let len = self.buf.len();
        if new < old {
            self.buf.copy_within(old..len, new);
            self.buf.truncate(len - (old - new));
        } else if new > old {
            self.buf.resize(len + (new - old), 0);
            self.buf.copy_within(old..len, new);
        }
    }

    fn write_header_fields(&mut self, start: usize, head_byte: u8, byte_len: usize, w: usize) {
        self.buf[start] = head_byte;
        self.buf[start + 1..start + 1 + w]
            .copy_from_slice(&(byte_len as u64).to_le_bytes()[..w]);
    }

    fn close_unindexed_array(&mut self, compound: &Compound) {
        let start = compound.start;
        let payload_len = self.buf.len() - (start + RESERVED_HEADER);
        let (w, header) = self.pick_width(9, |_, header| header + payload_len);
        let byte_len = header + payload_len;
        self.move_payload(start, header);
        let exp = w.trailing_zeros() as u8;
        self.write_header_fields(start, head::ARRAY_UNINDEXED_1 + exp, byte_len, w);
    }

    fn close_indexed(&mut self, compound: Compound) {
        let start = compound.start;
        let payload_start = start + RESERVED_HEADER;
        let payload_len = self.buf.len() - payload_start;
        let n = compound.index.len();

        let mut order = compound.index;
        let sorted =
            compound.kind == CompoundKind::Object && self.options.sort_attribute_names;
        if sorted {
            let buf = &self.buf;
            order.sort_by(|&a, &b| key_content(buf, a).cmp(key_content(buf, b)));
        }

        let (w, header) = self.pick_width(17, |w, header| {
            let trailer = if w < 8 { w } else { 0 };
            header + payload_len + n * w + trailer
        });
        let trailer = if w < 8 { w } else { 0 };
        let byte_len = header + payload_len + n * w + trailer;

        // Member offsets relative to the payload, resolved before the move.
        let rel: Vec<usize> = order.iter().map(|&off| off - payload_start).collect();

        self.move_payload(start, header);

        let exp = w.trailing_zeros() as u8;
        let head_byte = match compound.kind {
            CompoundKind::Array => head::ARRAY_INDEXED_1 + exp,
            CompoundKind::Object if sorted => head::OBJECT_SORTED_1 + exp,
            CompoundKind::Object => head::OBJECT_UNSORTED_1 + exp,
        };
        self.write_header_fields(start, head_byte, byte_len, w);
        if w == 8 {
            self.buf[start + 9..start + 17].copy_from_slice(&(n as u64).to_le_bytes());
        }
        for r in rel {
            format::write_uint_le(&mut self.buf, (header + r) as u64, w);
        }
        if w < 8 {
            format::write_uint_le(&mut self.buf, n as u64, w);
        }
    }

    fn close_compact_object(&mut self, compound: Compound) {
        let start = compound.start;
        let payload_len = self.buf.len() - (start + RESERVED_HEADER);
        let n = compound.index.len() as u64;
        let tail_len = format::varint_len(n);

        // The byte length covers its own varint; iterate to a fixpoint.
        let mut byte_len = 1 + 1 + payload_len + tail_len;
        loop {
            let needed = 1 + format::varint_len(byte_len as u64) + payload_len + tail_len;
            if needed == byte_len {
                break;
            }
            byte_len = needed;
        }
        let header = 1 + format::varint_len(byte_len as u64);

        self.move_payload(start, header);
        self.buf[start] = head::OBJECT_COMPACT;
        let mut length_field = Vec::with_capacity(header - 1);
        format::write_varint(&mut length_field, byte_len as u64);
        self.buf[start + 1..start + header].copy_from_slice(&length_field);
        format::write_varint_reversed(&mut self.buf, n);
    }

    /// Picks the narrowest admissible width and its header size. `total`
    /// maps a candidate `(w, header)` to the resulting byte length;
    /// `wide_header` is the header size of the 8-byte fallback.
    fn pick_width(
        &self,
        wide_header: usize,
        total: impl Fn(usize, usize) -> usize,
    ) -> (usize, usize) {
        for w in [1usize, 2, 4] {
            let header = if self.keep_padding(w) {
                RESERVED_HEADER
            } else {
                1 + w
            };
            if total(w, header) <= max_length_for_width(w) {
                return (w, header);
            }
        }
        (8, wide_header)
    }

    fn check_unique_keys(&self, compound: &Compound) -> Result<()> {
        let mut seen: HashSet<&[u8]> = HashSet::with_capacity(compound.index.len());
        for &offset in &compound.index {
            if !seen.insert(key_content(&self.buf, offset)) {
                return Err(Error::DuplicateAttributeName);
            }
        }
        Ok(())
    }
}

/// Content bytes of the attribute key starting at `offset`. Keys are
/// guaranteed to be strings by the add paths.
fn key_content(buf: &[u8], offset: usize) -> &[u8] {
    let h = buf[offset];
    match h {
        head::STRING_SHORT_EMPTY..=head::STRING_SHORT_MAX => {
            let len = usize::from(h - head::STRING_SHORT_EMPTY);
            &buf[offset + 1..offset + 1 + len]
        }
        head::STRING_LONG => {
            let len = format::read_uint_le(&buf[offset + 1..offset + 9], 8) as usize;
            &buf[offset + 9..offset + 9 + len]
        }
        _ => &[],
    }
}

fn max_length_for_width(w: usize) -> usize {
    match w {
        1 => u8::MAX as usize,
        2 => u16::MAX as usize,
        4 => u32::MAX as usize,
        _ => usize::MAX,
    }
}
