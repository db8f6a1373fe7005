//! Sequential iteration over compound members.

use super::Slice;
use crate::error::{Error, Result};
use crate::format::head;

/// Iterates the members of an array in order.
///
/// Members are contiguous in memory for every array layout, so the iterator
/// advances by each member's byte size instead of re-resolving offsets.
pub struct ArrayIter<'a> {
    slice: Slice<'a>,
    offset: usize,
    index: u64,
    len: u64,
    failed: bool,
}

impl<'a> ArrayIter<'a> {
    pub(super) fn new(slice: Slice<'a>) -> Result<ArrayIter<'a>> {
        if !slice.is_array() {
            return Err(Error::invalid_type(slice.value_type(), "Array"));
        }
        let len = slice.length()?;
        let offset = if len == 0 {
            0
        } else {
            slice.first_array_member_offset()?
        };
        Ok(ArrayIter {
            slice,
            offset,
            index: 0,
            len,
            failed: false,
        })
    }
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Result<Slice<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.len {
            return None;
        }
        let item = (|| {
            let member = self.slice.sub(self.offset)?;
            self.offset += member.byte_size()?;
            Ok(member)
        })();
        if item.is_err() {
            self.failed = true;
        }
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.index) as usize;
        (remaining, Some(remaining))
    }
}

/// Iterates the members of an object as `(key, value)` pairs.
///
/// Iteration follows index order, which is the sorted key order for sorted
/// layouts and insertion order otherwise. Compact objects are walked
/// sequentially.
pub struct ObjectIter<'a> {
    slice: Slice<'a>,
    index: u64,
    len: u64,
    /// Running offset, used only for the compact layout.
    offset: usize,
    compact: bool,
    failed: bool,
}

impl<'a> ObjectIter<'a> {
    pub(super) fn new(slice: Slice<'a>) -> Result<ObjectIter<'a>> {
        if !slice.is_object() {
            return Err(Error::invalid_type(slice.value_type(), "Object"));
        }
        let len = slice.length()?;
        let compact = slice.head() == head::OBJECT_COMPACT;
        let offset = if compact && len > 0 {
            slice.compact_first_member()?
        } else {
            0
        };
        Ok(ObjectIter {
            slice,
            index: 0,
            len,
            offset,
            compact,
            failed: false,
        })
    }
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = Result<(Slice<'a>, Slice<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.len {
            return None;
        }
        let entry = if self.compact {
            (|| {
                let key = self.slice.sub(self.offset)?;
                let value_offset = self.offset + key.byte_size()?;
                let value = self.slice.sub(value_offset)?;
                self.offset = value_offset + value.byte_size()?;
                Ok((key, value))
            })()
        } else {
            (|| {
                let key = self.slice.key_at(self.index)?;
                let value = self.slice.value_at(self.index)?;
                Ok((key, value))
            })()
        };
        if entry.is_err() {
            self.failed = true;
        }
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.index) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_iteration() {
        let data = [0x02, 0x05, 0x31, 0x32, 0x33];
        let slice = Slice::new(&data).unwrap();
        let values: Vec<i64> = slice
            .array_iter()
            .unwrap()
            .map(|s| s.unwrap().get_int().unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn empty_array_iteration() {
        let data = [0x01];
        let slice = Slice::new(&data).unwrap();
        assert_eq!(slice.array_iter().unwrap().count(), 0);
    }

    #[test]
    fn object_iteration_compact() {
        let data = [0x14, 0x09, 0x41, b'a', 0x31, 0x41, b'b', 0x32, 0x02];
        let slice = Slice::new(&data).unwrap();
        let pairs: Vec<(String, i64)> = slice
            .object_iter()
            .unwrap()
            .map(|e| {
                let (k, v) = e.unwrap();
                (k.copy_string().unwrap(), v.get_int().unwrap())
            })
            .collect();
        assert_eq!(pairs, vec![("a".to_owned(), 1), ("b".to_owned(), 2)]);
    }

    #[test]
    fn iter_type_mismatch() {
        let data = [0x18];
        let slice = Slice::new(&data).unwrap();
        assert!(matches!(
            slice.array_iter(),
            Err(Error::InvalidValueType { .. })
        ));
        assert!(matches!(
            slice.object_iter(),
            Err(Error::InvalidValueType { .. })
        ));
    }
}
