//! Parsing for CFF INDEX objects.
//!
//! See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf#page=12>

use super::Error;
use crate::{FontData, ReadError};

/// A CFF INDEX: a packed array of variable-length byte objects.
#[derive(Clone, Default)]
pub struct Index<'a> {
    count: u16,
    off_size: u8,
    offsets: &'a [u8],
    data: FontData<'a>,
}

impl<'a> Index<'a> {
    /// Creates a new index from the given data.
    pub fn new(data: FontData<'a>) -> Result<Self, Error> {
        let mut cursor = data.cursor();
        let count = cursor.read::<u16>()?;
        if count == 0 {
            // an empty index is just the two count bytes
            return Ok(Self::default());
        }
        let off_size = cursor.read::<u8>()?;
        if !(1..=4).contains(&off_size) {
            return Err(Error::InvalidIndexOffsetSize(off_size));
        }
        let offsets = cursor.read_array::<u8>((count as usize + 1) * off_size as usize)?;
        let data_start = cursor.position()?;
        let data = data.split_off(data_start).ok_or(ReadError::OutOfBounds)?;
        Ok(Self {
            count,
            off_size,
            offsets,
            data,
        })
    }

    /// Returns the number of objects in the index.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Computes the bias that is added to a subroutine operator in a
    /// charstring.
    pub fn subr_bias(&self) -> i32 {
        if self.count < 1240 {
            107
        } else if self.count < 33900 {
            1131
        } else {
            32768
        }
    }

    /// Returns the total size in bytes of the index, for sequential
    /// parsing of adjacent structures.
    pub fn size_in_bytes(&self) -> Result<usize, Error> {
        Ok(match self.count {
            0 => 2,
            count => 3 + self.offsets.len() + self.get_offset(count as usize)?,
        })
    }

    /// Returns the data offset of the object at the given index.
    ///
    /// Stored offsets are relative to the byte preceding the object data,
    /// so the first offset of an index is always 1.
    pub fn get_offset(&self, index: usize) -> Result<usize, Error> {
        if index > self.count as usize {
            return Err(ReadError::OutOfBounds.into());
        }
        let mut cursor = FontData::new(self.offsets).cursor();
        cursor.advance_by(index * self.off_size as usize);
        let raw = cursor.read_be_n(self.off_size as usize)? as usize;
        raw.checked_sub(1).ok_or(Error::ZeroOffsetInIndex)
    }

    /// Returns the data for the object at the given index.
    pub fn get(&self, index: usize) -> Result<&'a [u8], Error> {
        self.data
            .as_bytes()
            .get(self.get_offset(index)?..self.get_offset(index + 1)?)
            .ok_or_else(|| ReadError::OutOfBounds.into())
    }

    /// Returns the subroutine for a biased operand, as used by the
    /// `callsubr`/`callgsubr` charstring operators.
    pub fn get_subr(&self, operand: i32) -> Result<&'a [u8], Error> {
        let index = operand + self.subr_bias();
        if index < 0 || index >= self.count as i32 {
            return Err(Error::InvalidSubroutineIndex(operand));
        }
        self.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    /// Builds an INDEX holding `count` objects where object `i` contains
    /// `i + 1` bytes of the value `i`.
    fn make_index(off_size: u8, count: usize) -> BeBuffer {
        let mut buf = BeBuffer::new();
        buf.push(count as u16);
        if count == 0 {
            return buf;
        }
        buf.push(off_size);
        let mut offset = 1usize;
        for i in 0..count + 1 {
            match off_size {
                1 => buf.push(offset as u8),
                2 => buf.push(offset as u16),
                3 => {
                    buf.push((offset >> 16) as u8);
                    buf.push((offset & 0xFFFF) as u16);
                }
                4 => buf.push(offset as u32),
                _ => panic!("off_size should be 1-4"),
            }
            offset += i + 1;
        }
        for i in 0..count {
            buf.extend(std::iter::repeat(i as u8).take(i + 1));
        }
        buf
    }

    #[test]
    fn index_roundtrips() {
        for off_size in 1..=4u8 {
            let count = 8;
            let buf = make_index(off_size, count);
            let index = Index::new(FontData::new(&buf)).unwrap();
            assert_eq!(index.count() as usize, count);
            assert_eq!(index.size_in_bytes().unwrap(), buf.len());
            for i in 0..count {
                let object = index.get(i).unwrap();
                assert_eq!(object, vec![i as u8; i + 1]);
            }
            assert!(index.get(count).is_err());
        }
    }

    #[test]
    fn empty_index() {
        let buf = make_index(1, 0);
        let index = Index::new(FontData::new(&buf)).unwrap();
        assert_eq!(index.count(), 0);
        assert_eq!(index.size_in_bytes().unwrap(), 2);
        assert!(index.get(0).is_err());
    }

    #[test]
    fn zero_offset_is_invalid() {
        let mut buf = BeBuffer::new();
        buf.push(1u16);
        buf.push(1u8);
        buf.push(0u8); // offsets must start at 1
        buf.push(2u8);
        buf.push(0xAAu8);
        let index = Index::new(FontData::new(&buf)).unwrap();
        assert_eq!(index.get(0), Err(Error::ZeroOffsetInIndex));
    }

    #[test]
    fn subr_bias_thresholds() {
        let small = Index {
            count: 1239,
            ..Default::default()
        };
        let medium = Index {
            count: 1240,
            ..Default::default()
        };
        let large = Index {
            count: 33900,
            ..Default::default()
        };
        assert_eq!(small.subr_bias(), 107);
        assert_eq!(medium.subr_bias(), 1131);
        assert_eq!(large.subr_bias(), 32768);
    }
}
