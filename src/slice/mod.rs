//! Zero-copy views over encoded values.
//!
//! A [`Slice`] points at the head byte of an encoded value inside a buffer
//! it does not own. Every accessor computes on the bytes in place; compound
//! navigation hands out sub-views sharing the same backing memory.

mod iter;

pub use iter::{ArrayIter, ObjectIter};

use crate::error::{Error, Result};
use crate::format::{self, head};
use crate::types::ValueType;

static NONE_DATA: [u8; 1] = [head::NONE];

/// A non-owning view of one encoded value.
///
/// The wrapped byte slice starts at the value's head byte and may extend
/// past its end; [`byte_size`](Slice::byte_size) delimits the value.
#[derive(Debug, Clone, Copy)]
pub struct Slice<'a> {
    data: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Creates a view of the value starting at `data[0]`.
    pub fn new(data: &'a [u8]) -> Result<Slice<'a>> {
        if data.is_empty() {
            return Err(Error::Internal("empty slice data"));
        }
        Ok(Slice { data })
    }

    /// The distinguished `None` value.
    pub fn none() -> Slice<'static> {
        Slice { data: &NONE_DATA }
    }

    /// The head byte.
    pub fn head(&self) -> u8 {
        self.data[0]
    }

    /// Raw access to the underlying bytes, starting at the head byte.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The value's bytes, exactly `byte_size` long.
    pub fn value_bytes(&self) -> Result<&'a [u8]> {
        let size = self.byte_size()?;
        self.read(0, size)
    }

    /// The logical type of this value.
    pub fn value_type(&self) -> ValueType {
        ValueType::from_head(self.head())
    }

    pub fn is_none(&self) -> bool {
        self.head() == head::NONE
    }

    pub fn is_illegal(&self) -> bool {
        self.head() == head::ILLEGAL
    }

    pub fn is_null(&self) -> bool {
        self.head() == head::NULL
    }

    pub fn is_bool(&self) -> bool {
        self.value_type() == ValueType::Bool
    }

    pub fn is_array(&self) -> bool {
        self.value_type() == ValueType::Array
    }

    pub fn is_object(&self) -> bool {
        self.value_type() == ValueType::Object
    }

    pub fn is_double(&self) -> bool {
        self.value_type() == ValueType::Double
    }

    pub fn is_utc_date(&self) -> bool {
        self.value_type() == ValueType::UtcDate
    }

    pub fn is_external(&self) -> bool {
        self.value_type() == ValueType::External
    }

    pub fn is_min_key(&self) -> bool {
        self.value_type() == ValueType::MinKey
    }

    pub fn is_max_key(&self) -> bool {
        self.value_type() == ValueType::MaxKey
    }

    pub fn is_int(&self) -> bool {
        self.value_type() == ValueType::Int
    }

    pub fn is_uint(&self) -> bool {
        self.value_type() == ValueType::UInt
    }

    pub fn is_small_int(&self) -> bool {
        self.value_type() == ValueType::SmallInt
    }

    /// Whether this is any of the numeric types.
    pub fn is_number(&self) -> bool {
        self.value_type().is_number()
    }

    pub fn is_string(&self) -> bool {
        self.value_type() == ValueType::String
    }

    pub fn is_binary(&self) -> bool {
        self.value_type() == ValueType::Binary
    }

    pub fn is_tagged(&self) -> bool {
        self.value_type() == ValueType::Tagged
    }

    pub fn is_custom(&self) -> bool {
        self.value_type() == ValueType::Custom
    }

    /// Total encoded size in bytes, computed from the head byte and any
    /// length fields. O(1) for every head except the tagged forms, which
    /// recurse once into their inner value.
    pub fn byte_size(&self) -> Result<usize> {
        let h = self.head();
        let size = match h {
            head::NONE
            | head::EMPTY_ARRAY
            | head::EMPTY_OBJECT
            | head::ILLEGAL
            | head::NULL
            | head::FALSE
            | head::TRUE
            | head::MIN_KEY
            | head::MAX_KEY => 1,
            head::SMALLINT_ZERO..=head::SMALLINT_NEG_ONE => 1,
            head::ARRAY_UNINDEXED_1..=head::ARRAY_UNINDEXED_8 => {
                let w = 1usize << (h - head::ARRAY_UNINDEXED_1);
                self.read_length_field(w)?
            }
            head::ARRAY_INDEXED_1..=head::ARRAY_INDEXED_8 => {
                let w = 1usize << (h - head::ARRAY_INDEXED_1);
                self.read_length_field(w)?
            }
            head::OBJECT_SORTED_1..=head::OBJECT_SORTED_8 => {
                let w = 1usize << (h - head::OBJECT_SORTED_1);
                self.read_length_field(w)?
            }
            head::OBJECT_UNSORTED_1..=head::OBJECT_UNSORTED_8 => {
                let w = 1usize << (h - head::OBJECT_UNSORTED_1);
                self.read_length_field(w)?
            }
            head::ARRAY_COMPACT | head::OBJECT_COMPACT => {
                let (value, used) = format::read_varint(&self.data[1..])
                    .ok_or(Error::Internal("unterminated compact length"))?;
                let size = usize::try_from(value)
                    .map_err(|_| Error::NumberOutOfRange)?;
                if size < 1 + used {
                    return Err(Error::Internal("compact length smaller than header"));
                }
                size
            }
            head::DOUBLE | head::UTC_DATE => 9,
            head::EXTERNAL => 1 + std::mem::size_of::<usize>(),
            head::INT_1..=head::INT_8 => 2 + usize::from(h - head::INT_1),
            head::UINT_1..=head::UINT_8 => 2 + usize::from(h - head::UINT_1),
            head::STRING_SHORT_EMPTY..=head::STRING_SHORT_MAX => {
                1 + usize::from(h - head::STRING_SHORT_EMPTY)
            }
            head::STRING_LONG => {
                let len = format::read_uint_le(self.read(1, 8)?, 8);
                9 + usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?
            }
            head::BINARY_1..=head::BINARY_8 => {
                let w = usize::from(h - head::BINARY_1) + 1;
                let len = format::read_uint_le(self.read(1, w)?, w);
                1 + w + usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?
            }
            head::BCD_POS_1..=head::BCD_POS_8 => self.bcd_size(h - head::BCD_POS_1)?,
            head::BCD_NEG_1..=head::BCD_NEG_8 => self.bcd_size(h - head::BCD_NEG_1)?,
            head::TAGGED_SHORT => 2 + self.sub(2)?.byte_size()?,
            head::TAGGED_LONG => 9 + self.sub(9)?.byte_size()?,
            head::CUSTOM_FIXED_1..=head::CUSTOM_FIXED_8 => {
                1 + (1usize << (h - head::CUSTOM_FIXED_1))
            }
            head::CUSTOM_LENGTH_1..=head::CUSTOM_LENGTH_4 => {
                let w = 1usize << (h - head::CUSTOM_LENGTH_1);
                let len = format::read_uint_le(self.read(1, w)?, w);
                1 + w + usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?
            }
            head::CUSTOM_OPAQUE_FIRST..=0xff => {
                return Err(Error::NotImplemented {
                    got: ValueType::Custom,
                })
            }
            _ => {
                return Err(Error::invalid_type(ValueType::None, "a non-reserved type"));
            }
        };
        // A value cannot extend past its backing bytes.
        if size > self.data.len() {
            return Err(Error::Internal("value extends past end of data"));
        }
        Ok(size)
    }

    /// Number of members for arrays and objects, payload byte length for
    /// strings.
    pub fn length(&self) -> Result<u64> {
        let h = self.head();
        match h {
            head::EMPTY_ARRAY | head::EMPTY_OBJECT => Ok(0),
            head::ARRAY_UNINDEXED_1..=head::ARRAY_UNINDEXED_8 => {
                let (_, n) = self.unindexed_array_layout()?;
                Ok(n as u64)
            }
            head::ARRAY_INDEXED_1..=head::ARRAY_INDEXED_8
            | head::OBJECT_SORTED_1..=head::OBJECT_SORTED_8
            | head::OBJECT_UNSORTED_1..=head::OBJECT_UNSORTED_8 => {
                let meta = self.indexed_layout()?;
                Ok(meta.n as u64)
            }
            head::ARRAY_COMPACT | head::OBJECT_COMPACT => {
                let size = self.byte_size()?;
                let (n, _) = format::read_varint_reversed(self.data, size)
                    .ok_or(Error::Internal("unterminated compact item count"))?;
                Ok(n)
            }
            head::STRING_SHORT_EMPTY..=head::STRING_SHORT_MAX => {
                Ok(u64::from(h - head::STRING_SHORT_EMPTY))
            }
            head::STRING_LONG => Ok(format::read_uint_le(self.read(1, 8)?, 8)),
            _ => Err(Error::invalid_type(
                self.value_type(),
                "Array, Object or String",
            )),
        }
    }

    /// Member `index` of an array.
    pub fn at(&self, index: u64) -> Result<Slice<'a>> {
        let h = self.head();
        match h {
            head::EMPTY_ARRAY => Err(Error::IndexOutOfBounds { index, len: 0 }),
            head::ARRAY_UNINDEXED_1..=head::ARRAY_UNINDEXED_8 => {
                let (first, n) = self.unindexed_array_layout()?;
                if index >= n as u64 {
                    return Err(Error::IndexOutOfBounds {
                        index,
                        len: n as u64,
                    });
                }
                let stride = self.sub(first)?.byte_size()?;
                self.sub(first + index as usize * stride)
            }
            head::ARRAY_INDEXED_1..=head::ARRAY_INDEXED_8 => {
                let meta = self.indexed_layout()?;
                self.sub(meta.member_offset(self, index)?)
            }
            head::ARRAY_COMPACT => {
                let n = self.length()?;
                if index >= n {
                    return Err(Error::IndexOutOfBounds { index, len: n });
                }
                let mut offset = self.compact_first_member()?;
                for _ in 0..index {
                    offset += self.sub(offset)?.byte_size()?;
                }
                self.sub(offset)
            }
            _ => Err(Error::invalid_type(self.value_type(), "Array")),
        }
    }

    /// Key of object member `index`, in index order.
    pub fn key_at(&self, index: u64) -> Result<Slice<'a>> {
        self.sub(self.object_member_offset(index)?)
    }

    /// Value of object member `index`, in index order.
    pub fn value_at(&self, index: u64) -> Result<Slice<'a>> {
        let key_offset = self.object_member_offset(index)?;
        let key = self.sub(key_offset)?;
        self.sub(key_offset + key.byte_size()?)
    }

    /// Looks up `key`, returning `None` when the object has no such member.
    pub fn get(&self, key: &str) -> Result<Option<Slice<'a>>> {
        let h = self.head();
        match h {
            head::EMPTY_OBJECT => Ok(None),
            head::OBJECT_SORTED_1..=head::OBJECT_SORTED_8 => self.get_sorted(key),
            head::OBJECT_UNSORTED_1..=head::OBJECT_UNSORTED_8 | head::OBJECT_COMPACT => {
                self.get_linear(key)
            }
            _ => Err(Error::invalid_type(self.value_type(), "Object")),
        }
    }

    /// Whether the object has a member named `key`.
    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn get_bool(&self) -> Result<bool> {
        match self.head() {
            head::FALSE => Ok(false),
            head::TRUE => Ok(true),
            _ => Err(Error::invalid_type(self.value_type(), "Bool")),
        }
    }

    pub fn get_double(&self) -> Result<f64> {
        if self.head() != head::DOUBLE {
            return Err(Error::invalid_type(self.value_type(), "Double"));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read(1, 8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    /// Signed integer value. Converts from UInt, SmallInt and integral
    /// Double, failing with `NumberOutOfRange` when the value does not fit.
    pub fn get_int(&self) -> Result<i64> {
        let h = self.head();
        match h {
            head::INT_1..=head::INT_8 => {
                let w = usize::from(h - head::INT_1) + 1;
                Ok(format::read_int_le(self.read(1, w)?, w))
            }
            head::UINT_1..=head::UINT_8 => {
                let v = self.get_uint()?;
                i64::try_from(v).map_err(|_| Error::NumberOutOfRange)
            }
            head::SMALLINT_ZERO..=head::SMALLINT_NEG_ONE => self.get_small_int(),
            head::DOUBLE => {
                let d = self.get_double()?;
                if d >= -9_223_372_036_854_775_808.0 && d < 9_223_372_036_854_775_808.0 {
                    Ok(d as i64)
                } else {
                    Err(Error::NumberOutOfRange)
                }
            }
            _ => Err(Error::invalid_type(self.value_type(), "a number")),
        }
    }

    /// Unsigned integer value, with the same conversions as `get_int`.
    pub fn get_uint(&self) -> Result<u64> {
        let h = self.head();
        match h {
            head::UINT_1..=head::UINT_8 => {
                let w = usize::from(h - head::UINT_1) + 1;
                Ok(format::read_uint_le(self.read(1, w)?, w))
            }
            head::INT_1..=head::INT_8 | head::SMALLINT_ZERO..=head::SMALLINT_NEG_ONE => {
                let v = self.get_int()?;
                u64::try_from(v).map_err(|_| Error::NumberOutOfRange)
            }
            head::DOUBLE => {
                let d = self.get_double()?;
                if d >= 0.0 && d < 18_446_744_073_709_551_616.0 {
                    Ok(d as u64)
                } else {
                    Err(Error::NumberOutOfRange)
                }
            }
            _ => Err(Error::invalid_type(self.value_type(), "a number")),
        }
    }

    /// Value of a single-byte integer.
    pub fn get_small_int(&self) -> Result<i64> {
        let h = self.head();
        match h {
            head::SMALLINT_ZERO..=head::SMALLINT_NINE => {
                Ok(i64::from(h - head::SMALLINT_ZERO))
            }
            head::SMALLINT_NEG_SIX..=head::SMALLINT_NEG_ONE => Ok(i64::from(h) - 0x40),
            _ => Err(Error::invalid_type(self.value_type(), "SmallInt")),
        }
    }

    /// Any numeric value widened to a double.
    pub fn to_f64(&self) -> Result<f64> {
        match self.value_type() {
            ValueType::Double => self.get_double(),
            ValueType::UInt => Ok(self.get_uint()? as f64),
            ValueType::Int | ValueType::SmallInt => Ok(self.get_int()? as f64),
            other => Err(Error::invalid_type(other, "a number")),
        }
    }

    pub fn get_utc_date(&self) -> Result<i64> {
        if self.head() != head::UTC_DATE {
            return Err(Error::invalid_type(self.value_type(), "UtcDate"));
        }
        Ok(format::read_int_le(self.read(1, 8)?, 8))
    }

    /// Borrowed string content.
    pub fn get_string(&self) -> Result<&'a str> {
        std::str::from_utf8(self.string_bytes()?).map_err(|_| Error::InvalidUtf8Sequence)
    }

    /// Owned copy of the string content.
    pub fn copy_string(&self) -> Result<String> {
        Ok(self.get_string()?.to_owned())
    }

    /// Borrowed binary payload.
    pub fn get_binary(&self) -> Result<&'a [u8]> {
        let h = self.head();
        match h {
            head::BINARY_1..=head::BINARY_8 => {
                let w = usize::from(h - head::BINARY_1) + 1;
                let len = format::read_uint_le(self.read(1, w)?, w);
                let len = usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?;
                self.read(1 + w, len)
            }
            _ => Err(Error::invalid_type(self.value_type(), "Binary")),
        }
    }

    /// Tag id of a tagged value.
    pub fn tag(&self) -> Result<u64> {
        match self.head() {
            head::TAGGED_SHORT => Ok(u64::from(self.read(1, 1)?[0])),
            head::TAGGED_LONG => Ok(format::read_uint_le(self.read(1, 8)?, 8)),
            _ => Err(Error::invalid_type(self.value_type(), "Tagged")),
        }
    }

    /// The value wrapped by a tagged value.
    pub fn tagged_value(&self) -> Result<Slice<'a>> {
        match self.head() {
            head::TAGGED_SHORT => self.sub(2),
            head::TAGGED_LONG => self.sub(9),
            _ => Err(Error::invalid_type(self.value_type(), "Tagged")),
        }
    }

    /// Iterates over array members.
    pub fn array_iter(&self) -> Result<ArrayIter<'a>> {
        ArrayIter::new(*self)
    }

    /// Iterates over object members as `(key, value)` pairs, in index order.
    pub fn object_iter(&self) -> Result<ObjectIter<'a>> {
        ObjectIter::new(*self)
    }

    // -- Layout internals --

    fn read(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        self.data
            .get(start..start + len)
            .ok_or(Error::Internal("unexpected end of data"))
    }

    fn sub(&self, offset: usize) -> Result<Slice<'a>> {
        if offset >= self.data.len() {
            return Err(Error::Internal("unexpected end of data"));
        }
        Ok(Slice {
            data: &self.data[offset..],
        })
    }

    fn read_length_field(&self, w: usize) -> Result<usize> {
        let raw = format::read_uint_le(self.read(1, w)?, w);
        usize::try_from(raw).map_err(|_| Error::NumberOutOfRange)
    }

    fn bcd_size(&self, width_code: u8) -> Result<usize> {
        let w = usize::from(width_code) + 1;
        let len = format::read_uint_le(self.read(1, w)?, w);
        let len = usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?;
        Ok(1 + w + 4 + len)
    }

    /// First-member offset and member count of an equal-size array
    /// (0x02..0x05). Zero padding after the length field is skipped.
    fn unindexed_array_layout(&self) -> Result<(usize, usize)> {
        let h = self.head();
        let w = 1usize << (h - head::ARRAY_UNINDEXED_1);
        let size = self.byte_size()?;
        let mut first = 1 + w;
        while first < size && self.data[first] == 0 {
            first += 1;
        }
        if first >= size {
            return Err(Error::Internal("unindexed array without members"));
        }
        let stride = self.sub(first)?.byte_size()?;
        if stride == 0 || (size - first) % stride != 0 {
            return Err(Error::Internal("unindexed array stride mismatch"));
        }
        Ok((first, (size - first) / stride))
    }

    fn indexed_layout(&self) -> Result<IndexedLayout> {
        let h = self.head();
        let w = match h {
            head::ARRAY_INDEXED_1..=head::ARRAY_INDEXED_8 => {
                1usize << (h - head::ARRAY_INDEXED_1)
            }
            head::OBJECT_SORTED_1..=head::OBJECT_SORTED_8 => {
                1usize << (h - head::OBJECT_SORTED_1)
            }
            head::OBJECT_UNSORTED_1..=head::OBJECT_UNSORTED_8 => {
                1usize << (h - head::OBJECT_UNSORTED_1)
            }
            _ => return Err(Error::Internal("not an indexed compound")),
        };
        let size = self.byte_size()?;
        // Item count sits after the length field for 8-byte widths and in
        // the trailer otherwise.
        let n = if w == 8 {
            format::read_uint_le(self.read(9, 8)?, 8)
        } else {
            if size < 2 * w {
                return Err(Error::Internal("indexed compound too small"));
            }
            format::read_uint_le(self.read(size - w, w)?, w)
        };
        let n = usize::try_from(n).map_err(|_| Error::NumberOutOfRange)?;
        let table_end = if w == 8 { size } else { size - w };
        let table = n
            .checked_mul(w)
            .and_then(|t| table_end.checked_sub(t))
            .ok_or(Error::Internal("index table larger than value"))?;
        Ok(IndexedLayout { w, n, table })
    }

    /// Offset of the first member of a non-empty array, skipping padding.
    fn first_array_member_offset(&self) -> Result<usize> {
        let h = self.head();
        match h {
            head::ARRAY_UNINDEXED_1..=head::ARRAY_UNINDEXED_8 => {
                Ok(self.unindexed_array_layout()?.0)
            }
            head::ARRAY_INDEXED_1..=head::ARRAY_INDEXED_8 => {
                let meta = self.indexed_layout()?;
                meta.member_offset(self, 0)
            }
            head::ARRAY_COMPACT => self.compact_first_member(),
            _ => Err(Error::invalid_type(self.value_type(), "Array")),
        }
    }

    fn compact_first_member(&self) -> Result<usize> {
        let (_, used) = format::read_varint(&self.data[1..])
            .ok_or(Error::Internal("unterminated compact length"))?;
        Ok(1 + used)
    }

    fn object_member_offset(&self, index: u64) -> Result<usize> {
        let h = self.head();
        match h {
            head::EMPTY_OBJECT => Err(Error::IndexOutOfBounds { index, len: 0 }),
            head::OBJECT_SORTED_1..=head::OBJECT_SORTED_8
            | head::OBJECT_UNSORTED_1..=head::OBJECT_UNSORTED_8 => {
                let meta = self.indexed_layout()?;
                meta.member_offset(self, index)
            }
            head::OBJECT_COMPACT => {
                let n = self.length()?;
                if index >= n {
                    return Err(Error::IndexOutOfBounds { index, len: n });
                }
                let mut offset = self.compact_first_member()?;
                for _ in 0..index {
                    let key = self.sub(offset)?;
                    offset += key.byte_size()?;
                    offset += self.sub(offset)?.byte_size()?;
                }
                Ok(offset)
            }
            _ => Err(Error::invalid_type(self.value_type(), "Object")),
        }
    }

    /// Content bytes of a string value, used for raw key comparison.
    pub(crate) fn string_bytes(&self) -> Result<&'a [u8]> {
        let h = self.head();
        match h {
            head::STRING_SHORT_EMPTY..=head::STRING_SHORT_MAX => {
                self.read(1, usize::from(h - head::STRING_SHORT_EMPTY))
            }
            head::STRING_LONG => {
                let len = format::read_uint_le(self.read(1, 8)?, 8);
                let len = usize::try_from(len).map_err(|_| Error::NumberOutOfRange)?;
                self.read(9, len)
            }
            _ => Err(Error::invalid_type(self.value_type(), "String")),
        }
    }

    fn get_sorted(&self, key: &str) -> Result<Option<Slice<'a>>> {
        let meta = self.indexed_layout()?;
        let needle = key.as_bytes();
        let mut lo = 0usize;
        let mut hi = meta.n;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let offset = meta.member_offset(self, mid as u64)?;
            let mid_key = self.sub(offset)?;
            match mid_key.string_bytes()?.cmp(needle) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => {
                    return Ok(Some(self.sub(offset + mid_key.byte_size()?)?));
                }
            }
        }
        Ok(None)
    }

    fn get_linear(&self, key: &str) -> Result<Option<Slice<'a>>> {
        let needle = key.as_bytes();
        for entry in self.object_iter()? {
            let (k, v) = entry?;
            if k.string_bytes()? == needle {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

struct IndexedLayout {
    w: usize,
    n: usize,
    /// Offset of the first index table entry.
    table: usize,
}

impl IndexedLayout {
    fn member_offset(&self, slice: &Slice<'_>, index: u64) -> Result<usize> {
        if index >= self.n as u64 {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.n as u64,
            });
        }
        let entry = self.table + index as usize * self.w;
        let offset = format::read_uint_le(slice.read(entry, self.w)?, self.w);
        usize::try_from(offset).map_err(|_| Error::NumberOutOfRange)
    }
}

impl PartialEq for Slice<'_> {
    /// Byte-wise equality of the encoded values.
    fn eq(&self, other: &Self) -> bool {
        match (self.value_bytes(), other.value_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
