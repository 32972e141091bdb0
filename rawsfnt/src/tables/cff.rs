//! The [CFF](https://learn.microsoft.com/en-us/typography/opentype/spec/cff) table.
//!
//! The compact font format embeds several INDEX structures back to back:
//! the Name INDEX, Top DICT INDEX, String INDEX and Global Subr INDEX.
//! Offsets stored in the DICTs are relative to the start of the table.

use super::postscript::{Error, Index};
use crate::types::Tag;
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"CFF ");

/// The compact font format table.
#[derive(Clone)]
pub struct Cff<'a> {
    data: FontData<'a>,
    top_dict_data: &'a [u8],
    global_subrs: Index<'a>,
}

impl<'a> FontRead<'a> for Cff<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Self::parse(data).map_err(|err| match err {
            Error::Read(read) => read,
            _ => ReadError::MalformedData("invalid CFF header"),
        })
    }
}

impl<'a> Cff<'a> {
    fn parse(data: FontData<'a>) -> Result<Self, Error> {
        // header: major, minor, hdrSize, offSize
        let header_size = data.read_at::<u8>(2)? as usize;
        let mut pos = header_size;
        let name_index = Self::index_at(data, pos)?;
        pos += name_index.size_in_bytes()?;
        let top_dict_index = Self::index_at(data, pos)?;
        pos += top_dict_index.size_in_bytes()?;
        let string_index = Self::index_at(data, pos)?;
        pos += string_index.size_in_bytes()?;
        let global_subrs = Self::index_at(data, pos)?;
        // "The Name INDEX in the CFF must contain only one entry"; the
        // Top DICT at the same position describes that font.
        let top_dict_data = top_dict_index.get(0)?;
        Ok(Cff {
            data,
            top_dict_data,
            global_subrs,
        })
    }

    fn index_at(data: FontData<'a>, pos: usize) -> Result<Index<'a>, Error> {
        Index::new(data.split_off(pos).ok_or(ReadError::OutOfBounds)?)
    }

    /// The entire table, for resolving DICT offsets.
    pub fn offset_data(&self) -> FontData<'a> {
        self.data
    }

    /// The contents of the first (and only) Top DICT.
    pub fn top_dict_data(&self) -> &'a [u8] {
        self.top_dict_data
    }

    /// The Global Subr INDEX.
    pub fn global_subrs(&self) -> &Index<'a> {
        &self.global_subrs
    }
}

#[cfg(test)]
mod tests {
    use super::super::postscript::dict;
    use super::*;

    #[test]
    fn parse_synthetic_table() {
        let cff = font_test_data::cff_table();
        let cff = Cff::read(FontData::new(&cff)).unwrap();
        assert_eq!(cff.global_subrs().count(), 0);
        let charstrings_offset = dict::entries(FontData::new(cff.top_dict_data()))
            .filter_map(Result::ok)
            .find_map(|entry| match entry {
                dict::Entry::CharstringsOffset(offset) => Some(offset),
                _ => None,
            })
            .expect("top dict should hold a CharStrings entry");
        let charstrings =
            Index::new(cff.offset_data().split_off(charstrings_offset).unwrap()).unwrap();
        // .notdef plus the box glyph
        assert_eq!(charstrings.count(), 2);
    }

    #[test]
    fn truncated_table_is_rejected() {
        let cff = font_test_data::cff_table();
        for len in 0..cff.len().min(24) {
            assert!(Cff::read(FontData::new(&cff[..len])).is_err());
        }
    }
}
