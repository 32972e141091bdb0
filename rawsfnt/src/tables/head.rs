//! The [head](https://learn.microsoft.com/en-us/typography/opentype/spec/head) table.

use crate::types::Tag;
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"head");

/// The font header table.
#[derive(Clone)]
pub struct Head<'a> {
    data: FontData<'a>,
}

/// Bold bit of [`Head::mac_style`].
pub const MAC_STYLE_BOLD: u16 = 1 << 0;
/// Italic bit of [`Head::mac_style`].
pub const MAC_STYLE_ITALIC: u16 = 1 << 1;
/// Underscore bit of [`Head::mac_style`].
pub const MAC_STYLE_UNDERSCORE: u16 = 1 << 2;

impl<'a> FontRead<'a> for Head<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        // through glyphDataFormat
        if data.len() < 54 {
            return Err(ReadError::OutOfBounds);
        }
        Ok(Head { data })
    }
}

impl<'a> Head<'a> {
    pub fn units_per_em(&self) -> u16 {
        self.data.read_at(18).unwrap_or_default()
    }

    pub fn x_min(&self) -> i16 {
        self.data.read_at(36).unwrap_or_default()
    }

    pub fn y_min(&self) -> i16 {
        self.data.read_at(38).unwrap_or_default()
    }

    pub fn x_max(&self) -> i16 {
        self.data.read_at(40).unwrap_or_default()
    }

    pub fn y_max(&self) -> i16 {
        self.data.read_at(42).unwrap_or_default()
    }

    pub fn mac_style(&self) -> u16 {
        self.data.read_at(44).unwrap_or_default()
    }

    /// 0 for short (u16) `loca` offsets, 1 for long (u32).
    pub fn index_to_loc_format(&self) -> i16 {
        self.data.read_at(50).unwrap_or_default()
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
        buf.push(0u32); // fontRevision
        buf.push(0u32); // checksumAdjustment
        buf.push(0x5F0F_3CF5u32); // magicNumber
        buf.push(0u16); // flags
        buf.push(1000u16); // unitsPerEm
        buf.extend([0u32; 4]); // created + modified
        buf.push(-10i16); // xMin
        buf.push(-20i16); // yMin
        buf.push(30i16); // xMax
        buf.push(40i16); // yMax
        buf.push(MAC_STYLE_BOLD | MAC_STYLE_ITALIC); // macStyle
        buf.push(8u16); // lowestRecPPEM
        buf.push(2i16); // fontDirectionHint
        buf.push(1i16); // indexToLocFormat
        buf.push(0i16); // glyphDataFormat
        let head = Head::read(FontData::new(&buf)).unwrap();
        assert_eq!(head.units_per_em(), 1000);
        assert_eq!(
            (head.x_min(), head.y_min(), head.x_max(), head.y_max()),
            (-10, -20, 30, 40)
        );
        assert_eq!(head.mac_style(), 3);
        assert_eq!(head.index_to_loc_format(), 1);
    }

    #[test]
    fn too_short() {
        assert!(Head::read(FontData::new(&[0; 53])).is_err());
    }
}
