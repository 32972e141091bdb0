//! Parsing for CFF FDSelect structures.

use super::Error;
use crate::{FontData, ReadError};

/// Mapping from glyph identifier to font DICT index in a CID-keyed font.
///
/// Formats 0 (byte per glyph) and 3 (sorted ranges) are supported.
#[derive(Clone)]
pub struct FdSelect<'a> {
    data: FontData<'a>,
}

impl<'a> FdSelect<'a> {
    pub fn new(data: FontData<'a>) -> Result<Self, Error> {
        let format = data.read_at::<u8>(0)?;
        if format != 0 && format != 3 {
            return Err(ReadError::InvalidFormat(format as i64).into());
        }
        Ok(FdSelect { data })
    }

    /// Returns the font DICT index for the given glyph.
    pub fn font_index(&self, glyph_id: u16) -> Option<u8> {
        match self.data.read_at::<u8>(0).ok()? {
            0 => self.data.read_at::<u8>(1 + glyph_id as usize).ok(),
            3 => {
                let num_ranges = self.data.read_at::<u16>(1).ok()?;
                let mut start = self.data.read_at::<u16>(3).ok()?;
                for i in 0..num_ranges as usize {
                    let fd = self.data.read_at::<u8>(5 + i * 3).ok()?;
                    let end = self.data.read_at::<u16>(6 + i * 3).ok()?;
                    if glyph_id >= start && glyph_id < end {
                        return Some(fd);
                    }
                    start = end;
                }
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    #[test]
    fn format0() {
        let mut buf = BeBuffer::new();
        buf.push(0u8);
        buf.extend([0u8, 0, 1, 1, 2]);
        let fd_select = FdSelect::new(FontData::new(&buf)).unwrap();
        assert_eq!(fd_select.font_index(0), Some(0));
        assert_eq!(fd_select.font_index(2), Some(1));
        assert_eq!(fd_select.font_index(4), Some(2));
        assert_eq!(fd_select.font_index(5), None);
    }

    #[test]
    fn format3() {
        let mut buf = BeBuffer::new();
        buf.push(3u8);
        buf.push(2u16); // nRanges
        buf.push(0u16); // first range starts at glyph 0
        buf.push(0u8); // fd 0
        buf.push(10u16); // second range starts at glyph 10
        buf.push(4u8); // fd 4
        buf.push(32u16); // sentinel
        let fd_select = FdSelect::new(FontData::new(&buf)).unwrap();
        assert_eq!(fd_select.font_index(0), Some(0));
        assert_eq!(fd_select.font_index(9), Some(0));
        assert_eq!(fd_select.font_index(10), Some(4));
        assert_eq!(fd_select.font_index(31), Some(4));
        assert_eq!(fd_select.font_index(32), None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let buf = [4u8, 0, 0];
        assert!(FdSelect::new(FontData::new(&buf)).is_err());
    }
}
