//! Reading TrueType and OpenType font tables.
//!
//! This crate provides memory safe zero-allocation parsing of font files.
//! The input is a caller-supplied byte buffer and is assumed to be
//! adversarial: every table lookup and every offset dereferenced from the
//! file is bounds-checked against the buffer, and a malformed offset is
//! reported as an error rather than read.
//!
//! In addition to raw data access, reference implementations are provided
//! for the algorithms that make the data useful: mapping codepoints to
//! glyph identifiers through `cmap`, searching `kern` and `GPOS` pair
//! positioning, and evaluating CFF Type 2 charstrings.
//!
//! For glyph outlines, rasterization and metrics, see the companion
//! `rista` crate.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod font_data;
mod read;
pub mod tables;
pub mod types;

pub use font_data::{Cursor, FontData};
pub use read::{FontRead, ReadError};

use bytemuck::{Pod, Zeroable};
use types::{Tag, U32Be};

/// 0x00010000, the version word of a TrueType-flavored sfnt.
pub const TT_SFNT_VERSION: u32 = 0x0001_0000;
/// `OTTO`, the version word of a CFF-flavored sfnt.
pub const CFF_SFNT_VERSION: u32 = u32::from_be_bytes(*b"OTTO");
/// `true`, used by some Apple fonts.
pub const TRUE_SFNT_VERSION: u32 = u32::from_be_bytes(*b"true");
/// `typ1`, TrueType wrapping a Type 1 font.
pub const TYP1_SFNT_VERSION: u32 = u32::from_be_bytes(*b"typ1");
/// 0x31000000 (`1\0\0\0`), the TrueType 1 version word.
pub const TT1_SFNT_VERSION: u32 = u32::from_be_bytes(*b"1\0\0\0");

/// `ttcf`, the tag of a font collection header.
pub const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");

/// A record in the sfnt table directory.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: U32Be,
    pub offset: U32Be,
    pub length: U32Be,
}

/// The sfnt table directory for a single font.
#[derive(Clone)]
pub struct TableDirectory<'a> {
    sfnt_version: u32,
    records: &'a [TableRecord],
}

impl<'a> FontRead<'a> for TableDirectory<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let sfnt_version = cursor.read::<u32>()?;
        let num_tables = cursor.read::<u16>()?;
        // searchRange, entrySelector, rangeShift
        cursor.advance_by(6);
        let records = cursor.read_array::<TableRecord>(num_tables as usize)?;
        Ok(TableDirectory {
            sfnt_version,
            records,
        })
    }
}

impl<'a> TableDirectory<'a> {
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn table_records(&self) -> &'a [TableRecord] {
        self.records
    }
}

/// Reference to the content of a font or font collection file.
#[derive(Clone)]
pub enum FileRef<'a> {
    /// A single font.
    Font(FontRef<'a>),
    /// A collection of fonts.
    Collection(CollectionRef<'a>),
}

impl<'a> FileRef<'a> {
    /// Creates a new reference to a file representing a font or font
    /// collection.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        Ok(if let Ok(collection) = CollectionRef::new(data) {
            Self::Collection(collection)
        } else {
            Self::Font(FontRef::new(data)?)
        })
    }

    /// The number of fonts in the file: 1 for a single font, the
    /// collection count for a ttc.
    pub fn len(&self) -> u32 {
        match self {
            Self::Font(_) => 1,
            Self::Collection(collection) => collection.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference to the content of a font collection (ttc) file.
#[derive(Clone)]
pub struct CollectionRef<'a> {
    data: FontData<'a>,
    num_fonts: u32,
    offsets: &'a [U32Be],
}

impl<'a> CollectionRef<'a> {
    /// Creates a new reference to a font collection.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let mut cursor = data.cursor();
        let tag = cursor.read::<Tag>()?;
        if tag != TTC_HEADER_TAG {
            return Err(ReadError::InvalidTtc(tag));
        }
        let version = cursor.read::<u32>()?;
        if version != 0x0001_0000 && version != 0x0002_0000 {
            return Err(ReadError::InvalidFormat(version as i64));
        }
        let num_fonts = cursor.read::<u32>()?;
        let offsets = cursor.read_array::<U32Be>(num_fonts as usize)?;
        Ok(CollectionRef {
            data,
            num_fonts,
            offsets,
        })
    }

    /// Returns the number of fonts in the collection.
    pub fn len(&self) -> u32 {
        self.num_fonts
    }

    pub fn is_empty(&self) -> bool {
        self.num_fonts == 0
    }

    /// Returns the byte offset of the table directory for the font at
    /// `index`.
    pub fn offset(&self, index: u32) -> Result<u32, ReadError> {
        self.offsets
            .get(index as usize)
            .map(|off| off.get())
            .ok_or(ReadError::InvalidCollectionIndex(index))
    }

    /// Returns the font in the collection at the specified index.
    pub fn get(&self, index: u32) -> Result<FontRef<'a>, ReadError> {
        let offset = self.offset(index)? as usize;
        let directory_data = self.data.split_off(offset).ok_or(ReadError::OutOfBounds)?;
        FontRef::with_table_directory(self.data, TableDirectory::read(directory_data)?)
    }
}

/// Reference to an in-memory font.
///
/// The underlying buffer is borrowed, never copied; it must outlive the
/// reference and every table read from it.
#[derive(Clone)]
pub struct FontRef<'a> {
    data: FontData<'a>,
    table_directory: TableDirectory<'a>,
}

impl<'a> FontRef<'a> {
    /// Creates a new reference to an in-memory font backed by the given
    /// data.
    ///
    /// The data must be a single font beginning with a table directory.
    /// To load a font from a collection, use [`FontRef::from_index`].
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        Self::with_table_directory(data, TableDirectory::read(data)?)
    }

    /// Creates a new reference to the font at `index` in a file that is
    /// either a single font (only index 0 is valid) or a collection.
    pub fn from_index(data: &'a [u8], index: u32) -> Result<Self, ReadError> {
        match FileRef::new(data)? {
            FileRef::Font(font) => {
                if index == 0 {
                    Ok(font)
                } else {
                    Err(ReadError::InvalidCollectionIndex(index))
                }
            }
            FileRef::Collection(collection) => collection.get(index),
        }
    }

    /// Creates a font reference for a table directory at `offset` within
    /// `data`, as returned by [`CollectionRef::offset`] (0 for a single
    /// font).
    pub fn with_offset(data: &'a [u8], offset: u32) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let directory_data = data
            .split_off(offset as usize)
            .ok_or(ReadError::OutOfBounds)?;
        Self::with_table_directory(data, TableDirectory::read(directory_data)?)
    }

    fn with_table_directory(
        data: FontData<'a>,
        table_directory: TableDirectory<'a>,
    ) -> Result<Self, ReadError> {
        if [
            TT_SFNT_VERSION,
            CFF_SFNT_VERSION,
            TRUE_SFNT_VERSION,
            TYP1_SFNT_VERSION,
            TT1_SFNT_VERSION,
        ]
        .contains(&table_directory.sfnt_version())
        {
            Ok(FontRef {
                data,
                table_directory,
            })
        } else {
            Err(ReadError::InvalidSfnt(table_directory.sfnt_version()))
        }
    }

    pub fn table_directory(&self) -> &TableDirectory<'a> {
        &self.table_directory
    }

    /// Returns the data for the table with the specified tag, if present.
    ///
    /// Table offsets are relative to the start of the underlying buffer,
    /// which for collection members is the start of the whole file. The
    /// directory is scanned linearly: real-world fonts are not always
    /// sorted.
    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_directory
            .table_records()
            .iter()
            .find(|record| record.tag == tag)
            .and_then(|record| {
                let start = record.offset.get() as usize;
                let len = record.length.get() as usize;
                self.data.slice(start..start.checked_add(len)?)
            })
    }
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_data(tag)
    }
}

/// An interface for accessing tables from a font (or font-like object).
pub trait TableProvider<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>>;

    fn expect_data_for_tag(&self, tag: Tag) -> Result<FontData<'a>, ReadError> {
        self.data_for_tag(tag).ok_or(ReadError::TableIsMissing(tag))
    }

    fn head(&self) -> Result<tables::head::Head<'a>, ReadError> {
        self.expect_data_for_tag(tables::head::TAG)
            .and_then(FontRead::read)
    }

    fn hhea(&self) -> Result<tables::hhea::Hhea<'a>, ReadError> {
        self.expect_data_for_tag(tables::hhea::TAG)
            .and_then(FontRead::read)
    }

    fn maxp(&self) -> Result<tables::maxp::Maxp<'a>, ReadError> {
        self.expect_data_for_tag(tables::maxp::TAG)
            .and_then(FontRead::read)
    }

    fn os2(&self) -> Result<tables::os2::Os2<'a>, ReadError> {
        self.expect_data_for_tag(tables::os2::TAG)
            .and_then(FontRead::read)
    }

    fn hmtx(&self) -> Result<tables::hmtx::Hmtx<'a>, ReadError> {
        let num_glyphs = self.maxp()?.num_glyphs();
        let number_of_h_metrics = self.hhea()?.number_of_h_metrics();
        self.expect_data_for_tag(tables::hmtx::TAG)
            .and_then(|data| tables::hmtx::Hmtx::read(data, number_of_h_metrics, num_glyphs))
    }

    /// `is_long` can be provided if known; otherwise it is looked up in
    /// `head`.
    fn loca(&self, is_long: impl Into<Option<bool>>) -> Result<tables::loca::Loca<'a>, ReadError> {
        let is_long = match is_long.into() {
            Some(val) => val,
            None => self.head()?.index_to_loc_format() == 1,
        };
        self.expect_data_for_tag(tables::loca::TAG)
            .map(|data| tables::loca::Loca::read(data, is_long))
    }

    fn glyf(&self) -> Result<tables::glyf::Glyf<'a>, ReadError> {
        self.expect_data_for_tag(tables::glyf::TAG)
            .and_then(FontRead::read)
    }

    fn cmap(&self) -> Result<tables::cmap::Cmap<'a>, ReadError> {
        self.expect_data_for_tag(tables::cmap::TAG)
            .and_then(FontRead::read)
    }

    fn kern(&self) -> Result<tables::kern::Kern<'a>, ReadError> {
        self.expect_data_for_tag(tables::kern::TAG)
            .and_then(FontRead::read)
    }

    fn gpos(&self) -> Result<tables::gpos::Gpos<'a>, ReadError> {
        self.expect_data_for_tag(tables::gpos::TAG)
            .and_then(FontRead::read)
    }

    fn svg(&self) -> Result<tables::svg::Svg<'a>, ReadError> {
        self.expect_data_for_tag(tables::svg::TAG)
            .and_then(FontRead::read)
    }

    fn cff(&self) -> Result<tables::cff::Cff<'a>, ReadError> {
        self.expect_data_for_tag(tables::cff::TAG)
            .and_then(FontRead::read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ref_non_collection() {
        let font = font_test_data::test_ttf();
        assert!(matches!(FileRef::new(&font), Ok(FileRef::Font(_))));
    }

    #[test]
    fn file_ref_collection() {
        let ttc = font_test_data::test_ttc();
        let Ok(FileRef::Collection(collection)) = FileRef::new(&ttc) else {
            panic!("expected a collection");
        };
        assert_eq!(collection.len(), 2);
        for i in 0..2 {
            let font = collection.get(i).unwrap();
            assert!(font.table_data(Tag::new(b"head")).is_some());
        }
        assert!(collection.get(2).is_err());
    }

    #[test]
    fn from_index_rejects_out_of_range() {
        let font = font_test_data::test_ttf();
        assert!(FontRef::from_index(&font, 0).is_ok());
        assert!(matches!(
            FontRef::from_index(&font, 1),
            Err(ReadError::InvalidCollectionIndex(1))
        ));
    }

    #[test]
    fn unknown_magic_is_rejected() {
        assert!(matches!(
            FontRef::new(b"\x00\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00"),
            Err(ReadError::InvalidSfnt(0x0002_0000))
        ));
    }

    #[test]
    fn short_buffers_are_rejected_not_read() {
        let font = font_test_data::test_ttf();
        for len in 0..16 {
            // every truncation must fail cleanly
            assert!(FontRef::new(&font[..len]).is_err());
        }
    }

    #[test]
    fn missing_table_is_none() {
        let font = font_test_data::test_ttf();
        let font = FontRef::new(&font).unwrap();
        assert!(font.table_data(Tag::new(b"EBDT")).is_none());
        assert!(font.table_data(Tag::new(b"glyf")).is_some());
    }
}
