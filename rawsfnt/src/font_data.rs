//! Raw font bytes with bounds-checked access.

use std::ops::{Range, RangeBounds};

use bytemuck::AnyBitPattern;

use crate::read::ReadError;
use crate::types::Scalar;

/// A reference to raw binary font data.
///
/// This is a wrapper around a byte slice that provides convenience methods
/// for parsing that data. Every access is bounds checked; an offset that
/// escapes the underlying slice is reported as [`ReadError::OutOfBounds`]
/// and never observed as memory outside the buffer. This is the only road
/// from file offsets to bytes, which is what makes the crates above this
/// one safe on untrusted input.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

impl<'a> FontData<'a> {
    /// Creates a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the data, in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns self[pos..], or `None` if `pos` is out of bounds.
    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData { bytes })
    }

    /// Returns the sub-slice described by `range`, or `None` if any part
    /// of it is out of bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        self.bytes.get(bounds).map(|bytes| FontData { bytes })
    }

    /// Reads a scalar at the given offset.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        self.bytes
            .get(offset..)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Interprets the bytes in `range` as a slice of raw records.
    ///
    /// `T` must be an unaligned plain-old-data type (one of the `*Be`
    /// wrappers or a `#[repr(C)]` record of them).
    pub fn read_array<T: AnyBitPattern>(&self, range: Range<usize>) -> Result<&'a [T], ReadError> {
        let bytes = self.bytes.get(range).ok_or(ReadError::OutOfBounds)?;
        bytemuck::try_cast_slice(bytes).map_err(|_| ReadError::InvalidArrayLen)
    }

    /// Returns a cursor positioned at the start of the data.
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(src: &'a [u8]) -> FontData<'a> {
        FontData::new(src)
    }
}

/// A cursor for reading successive values out of a [`FontData`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> Cursor<'a> {
    /// Reads a scalar and advances past it.
    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let temp = self.data.read_at(self.pos);
        self.pos += T::RAW_BYTE_LEN;
        temp
    }

    /// Reads an unsigned big-endian integer of `n` bytes, `n` in `1..=4`.
    pub fn read_be_n(&mut self, n: usize) -> Result<u32, ReadError> {
        debug_assert!((1..=4).contains(&n));
        let mut v = 0u32;
        for _ in 0..n {
            v = (v << 8) | self.read::<u8>()? as u32;
        }
        Ok(v)
    }

    /// Reads a slice of `n_elems` raw records and advances past it.
    pub fn read_array<T: AnyBitPattern>(&mut self, n_elems: usize) -> Result<&'a [T], ReadError> {
        let len = n_elems
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ReadError::OutOfBounds)?;
        let end = self.pos.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let temp = self.data.read_array(self.pos..end);
        self.pos = end;
        temp
    }

    /// Moves the cursor forward by `n_bytes` without reading.
    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    /// Returns the current position, or an error if it is out of bounds.
    pub fn position(&self) -> Result<usize, ReadError> {
        (self.pos <= self.data.len())
            .then_some(self.pos)
            .ok_or(ReadError::OutOfBounds)
    }

    /// The number of bytes between the cursor and the end of the data.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// `true` if the cursor has consumed all of the data.
    pub fn is_done(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tag, U16Be};

    #[test]
    fn out_of_bounds_reads_fail() {
        let data = FontData::new(&[0, 1, 2]);
        assert!(data.read_at::<u32>(0).is_err());
        assert!(data.read_at::<u16>(2).is_err());
        assert!(data.read_at::<u8>(3).is_err());
        assert_eq!(data.read_at::<u16>(1), Ok(0x0102));
    }

    #[test]
    fn slices_reject_bad_ranges() {
        let data = FontData::new(&[0; 4]);
        assert!(data.slice(2..8).is_none());
        assert!(data.slice(5..).is_none());
        assert!(data.slice(..4).is_some());
    }

    #[test]
    fn cursor_tracks_position() {
        let data = FontData::new(&[0, 1, 0, 2, 0xDE, 0xAD]);
        let mut cursor = data.cursor();
        assert_eq!(cursor.read::<u16>(), Ok(1));
        assert_eq!(cursor.read::<u16>(), Ok(2));
        assert_eq!(cursor.position(), Ok(4));
        assert_eq!(cursor.remaining_bytes(), 2);
        cursor.advance_by(4);
        assert!(cursor.read::<u8>().is_err());
        assert!(cursor.position().is_err());
    }

    #[test]
    fn be_n_reads() {
        let data = FontData::new(&[0x01, 0x02, 0x03, 0x04]);
        let mut cursor = data.cursor();
        assert_eq!(cursor.read_be_n(3), Ok(0x010203));
        assert!(cursor.read_be_n(2).is_err());
    }

    #[test]
    fn typed_arrays() {
        let data = FontData::new(&[0, 1, 0, 2, 0, 3]);
        let array: &[U16Be] = data.read_array(0..6).unwrap();
        let values: Vec<_> = array.iter().map(|v| v.get()).collect();
        assert_eq!(values, [1, 2, 3]);
        // length not a record multiple
        assert!(data.read_array::<U16Be>(0..5).is_err());
    }

    #[test]
    fn tag_read() {
        let data = FontData::new(b"OTTO....");
        assert_eq!(data.read_at::<Tag>(0), Ok(Tag::new(b"OTTO")));
    }
}
