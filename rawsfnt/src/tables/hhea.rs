//! The [hhea](https://learn.microsoft.com/en-us/typography/opentype/spec/hhea) table.

use crate::types::Tag;
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"hhea");

/// The horizontal header table.
#[derive(Clone)]
pub struct Hhea<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Hhea<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        if data.len() < 36 {
            return Err(ReadError::OutOfBounds);
        }
        Ok(Hhea { data })
    }
}

impl<'a> Hhea<'a> {
    pub fn ascender(&self) -> i16 {
        self.data.read_at(4).unwrap_or_default()
    }

    pub fn descender(&self) -> i16 {
        self.data.read_at(6).unwrap_or_default()
    }

    pub fn line_gap(&self) -> i16 {
        self.data.read_at(8).unwrap_or_default()
    }

    pub fn number_of_h_metrics(&self) -> u16 {
        self.data.read_at(34).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    #[test]
    fn field_offsets() {
        let mut buf = BeBuffer::new();
        buf.push(0x0001_0000u32); // version
        buf.push(800i16); // ascender
        buf.push(-200i16); // descender
        buf.push(50i16); // lineGap
        buf.extend([0u16; 12]); // advanceWidthMax .. metricDataFormat
        buf.push(3u16); // numberOfHMetrics
        let hhea = Hhea::read(FontData::new(&buf)).unwrap();
        assert_eq!(hhea.ascender(), 800);
        assert_eq!(hhea.descender(), -200);
        assert_eq!(hhea.line_gap(), 50);
        assert_eq!(hhea.number_of_h_metrics(), 3);
    }
}
