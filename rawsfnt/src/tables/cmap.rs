//! The [cmap](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap) table.

use bytemuck::{Pod, Zeroable};

use crate::types::{GlyphId, Tag, U16Be, U32Be};
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"cmap");

/// Unicode platform id.
pub const PLATFORM_ID_UNICODE: u16 = 0;
/// Macintosh platform id.
pub const PLATFORM_ID_MAC: u16 = 1;
/// ISO platform id (deprecated).
pub const PLATFORM_ID_ISO: u16 = 2;
/// Windows platform id.
pub const PLATFORM_ID_MICROSOFT: u16 = 3;

/// Windows symbol encoding.
pub const MS_EID_SYMBOL: u16 = 0;
/// Windows Unicode BMP (UCS-2) encoding.
pub const MS_EID_UNICODE_BMP: u16 = 1;
/// Windows ShiftJIS encoding.
pub const MS_EID_SHIFTJIS: u16 = 2;
/// Windows Unicode full repertoire (UCS-4) encoding.
pub const MS_EID_UNICODE_FULL: u16 = 10;

/// Mac Roman encoding.
pub const MAC_EID_ROMAN: u16 = 0;

/// Macintosh-platform language id for English, as used by `name` table
/// records.
pub const MAC_LANG_ENGLISH: u16 = 0;
/// Macintosh-platform language id for Japanese.
pub const MAC_LANG_JAPANESE: u16 = 11;
/// Macintosh-platform language id for Chinese (Simplified).
pub const MAC_LANG_CHINESE_SIMPLIFIED: u16 = 33;
/// Macintosh-platform language id for Korean.
pub const MAC_LANG_KOREAN: u16 = 23;

/// Windows-platform language id for English (United States).
pub const MS_LANG_ENGLISH: u16 = 0x0409;
/// Windows-platform language id for Japanese.
pub const MS_LANG_JAPANESE: u16 = 0x0411;
/// Windows-platform language id for Chinese (PRC).
pub const MS_LANG_CHINESE: u16 = 0x0804;
/// Windows-platform language id for Korean.
pub const MS_LANG_KOREAN: u16 = 0x0412;

/// An entry in the cmap encoding record list.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct EncodingRecord {
    platform_id: U16Be,
    encoding_id: U16Be,
    subtable_offset: U32Be,
}

impl EncodingRecord {
    pub fn platform_id(&self) -> u16 {
        self.platform_id.get()
    }

    pub fn encoding_id(&self) -> u16 {
        self.encoding_id.get()
    }

    pub fn subtable_offset(&self) -> u32 {
        self.subtable_offset.get()
    }
}

/// The character to glyph index mapping table.
#[derive(Clone)]
pub struct Cmap<'a> {
    data: FontData<'a>,
    records: &'a [EncodingRecord],
}

impl<'a> FontRead<'a> for Cmap<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let _version = cursor.read::<u16>()?;
        let num_tables = cursor.read::<u16>()?;
        let records = cursor.read_array::<EncodingRecord>(num_tables as usize)?;
        Ok(Cmap { data, records })
    }
}

impl<'a> Cmap<'a> {
    pub fn encoding_records(&self) -> &'a [EncodingRecord] {
        self.records
    }

    /// Returns the subtable for an encoding record, if its offset lands
    /// inside the table.
    pub fn subtable(&self, record: &EncodingRecord) -> Option<CmapSubtable<'a>> {
        let data = self.data.split_off(record.subtable_offset() as usize)?;
        CmapSubtable::new(data)
    }
}

/// A cmap subtable of any format.
///
/// Unrecognized formats (including format 2, the legacy high-byte CJK
/// mapping) are reported as [`CmapSubtable::Unsupported`]; mapping
/// through them yields no glyph.
#[derive(Clone)]
pub enum CmapSubtable<'a> {
    Format0(Cmap0<'a>),
    Format4(Cmap4<'a>),
    Format6(Cmap6<'a>),
    Format12(Cmap12<'a>),
    Format13(Cmap13<'a>),
    Unsupported(u16),
}

impl<'a> CmapSubtable<'a> {
    fn new(data: FontData<'a>) -> Option<Self> {
        let format = data.read_at::<u16>(0).ok()?;
        Some(match format {
            0 => Self::Format0(Cmap0 { data }),
            4 => Self::Format4(Cmap4 { data }),
            6 => Self::Format6(Cmap6 { data }),
            12 => Self::Format12(Cmap12::new(data)?),
            13 => Self::Format13(Cmap13(Cmap12::new(data)?)),
            other => Self::Unsupported(other),
        })
    }

    /// Maps a codepoint to a glyph identifier.
    ///
    /// This is total over `u32`; any miss or inconsistency in the
    /// subtable yields `None`.
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        match self {
            Self::Format0(subtable) => subtable.map_codepoint(codepoint),
            Self::Format4(subtable) => subtable.map_codepoint(codepoint),
            Self::Format6(subtable) => subtable.map_codepoint(codepoint),
            Self::Format12(subtable) => subtable.map_codepoint(codepoint),
            Self::Format13(subtable) => subtable.map_codepoint(codepoint),
            Self::Unsupported(_) => None,
        }
    }
}

/// Format 0: byte encoding table.
#[derive(Clone)]
pub struct Cmap0<'a> {
    data: FontData<'a>,
}

impl<'a> Cmap0<'a> {
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let length = self.data.read_at::<u16>(2).ok()? as u32;
        if codepoint < length.saturating_sub(6) {
            let glyph = self.data.read_at::<u8>(6 + codepoint as usize).ok()?;
            Some(GlyphId::new(glyph as u16))
        } else {
            None
        }
    }
}

/// Format 4: segment mapping to delta values.
#[derive(Clone)]
pub struct Cmap4<'a> {
    data: FontData<'a>,
}

impl<'a> Cmap4<'a> {
    /// Performs the searchRange/entrySelector guided binary search over
    /// the segment arrays.
    ///
    /// The header-driven walk is implemented as specified (rather than a
    /// conventional binary search over the real segment count) because
    /// fonts in the wild depend on its exact decrement-and-bias
    /// structure.
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        if codepoint > 0xFFFF {
            return None;
        }
        let data = &self.data;
        let segcount = (data.read_at::<u16>(6).ok()? >> 1) as usize;
        let mut search_range = (data.read_at::<u16>(8).ok()? >> 1) as usize;
        let mut entry_selector = data.read_at::<u16>(10).ok()?;
        let range_shift = (data.read_at::<u16>(12).ok()? >> 1) as usize;

        // the end codes start at offset 14
        let end_count = 14usize;
        let mut search = end_count;

        if codepoint >= data.read_at::<u16>(search + range_shift * 2).ok()? as u32 {
            search += range_shift * 2;
        }

        search = search.checked_sub(2)?;
        while entry_selector != 0 {
            search_range >>= 1;
            let end = data.read_at::<u16>(search + search_range * 2).ok()? as u32;
            if codepoint > end {
                search += search_range * 2;
            }
            entry_selector -= 1;
        }
        search += 2;

        let item = (search - end_count) >> 1;
        let start = data
            .read_at::<u16>(end_count + segcount * 2 + 2 + 2 * item)
            .ok()? as u32;
        let last = data.read_at::<u16>(end_count + 2 * item).ok()? as u32;
        if codepoint < start || codepoint > last {
            return None;
        }

        let id_range_base = end_count + segcount * 6 + 2 + 2 * item;
        let id_range_offset = data.read_at::<u16>(id_range_base).ok()? as usize;
        let glyph = if id_range_offset == 0 {
            let id_delta = data
                .read_at::<i16>(end_count + segcount * 4 + 2 + 2 * item)
                .ok()?;
            (codepoint as u16).wrapping_add(id_delta as u16)
        } else {
            data.read_at::<u16>(id_range_base + id_range_offset + (codepoint - start) as usize * 2)
                .ok()?
        };
        Some(GlyphId::new(glyph))
    }
}

/// Format 6: trimmed table mapping.
#[derive(Clone)]
pub struct Cmap6<'a> {
    data: FontData<'a>,
}

impl<'a> Cmap6<'a> {
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let first = self.data.read_at::<u16>(6).ok()? as u32;
        let count = self.data.read_at::<u16>(8).ok()? as u32;
        if codepoint >= first && codepoint < first + count {
            let glyph = self
                .data
                .read_at::<u16>(10 + (codepoint - first) as usize * 2)
                .ok()?;
            Some(GlyphId::new(glyph))
        } else {
            None
        }
    }
}

/// A (start, end, startGlyph) group in a format 12 or 13 subtable.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct SequentialMapGroup {
    start_char_code: U32Be,
    end_char_code: U32Be,
    start_glyph_id: U32Be,
}

/// Format 12: segmented coverage.
#[derive(Clone)]
pub struct Cmap12<'a> {
    groups: &'a [SequentialMapGroup],
}

impl<'a> Cmap12<'a> {
    fn new(data: FontData<'a>) -> Option<Self> {
        let num_groups = data.read_at::<u32>(12).ok()? as usize;
        // clamp a lying group count to what the table can actually hold
        let available = data.len().saturating_sub(16) / std::mem::size_of::<SequentialMapGroup>();
        let groups = data.read_array(16..16 + num_groups.min(available) * 12).ok()?;
        Some(Cmap12 { groups })
    }

    fn group_for(&self, codepoint: u32) -> Option<&SequentialMapGroup> {
        let index = match self
            .groups
            .binary_search_by(|group| group.start_char_code.get().cmp(&codepoint))
        {
            Ok(index) => index,
            Err(index) => index.checked_sub(1)?,
        };
        let group = self.groups.get(index)?;
        (codepoint <= group.end_char_code.get()).then_some(group)
    }

    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let group = self.group_for(codepoint)?;
        let glyph = group
            .start_glyph_id
            .get()
            .checked_add(codepoint - group.start_char_code.get())?;
        u16::try_from(glyph).ok().map(GlyphId::new)
    }
}

/// Format 13: many-to-one range mapping.
///
/// Same group layout as format 12 but every codepoint in a range maps to
/// the same glyph.
#[derive(Clone)]
pub struct Cmap13<'a>(Cmap12<'a>);

impl<'a> Cmap13<'a> {
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let group = self.0.group_for(codepoint)?;
        u16::try_from(group.start_glyph_id.get()).ok().map(GlyphId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    fn subtable(buf: &BeBuffer) -> CmapSubtable<'_> {
        CmapSubtable::new(FontData::new(buf)).unwrap()
    }

    #[test]
    fn format0() {
        let mut buf = BeBuffer::new();
        buf.push(0u16); // format
        buf.push(262u16); // length
        buf.push(0u16); // language
        let mut glyphs = [0u8; 256];
        glyphs[b'A' as usize] = 7;
        buf.extend(glyphs);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint('A' as u32), Some(GlyphId::new(7)));
        assert_eq!(table.map_codepoint('B' as u32), Some(GlyphId::NOTDEF));
        assert_eq!(table.map_codepoint(0x300), None);
    }

    #[test]
    fn format4() {
        let buf = font_test_data::cmap4_subtable(&[(b'A' as u16, b'Z' as u16, 1)]);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint('A' as u32), Some(GlyphId::new(1)));
        assert_eq!(table.map_codepoint('Z' as u32), Some(GlyphId::new(26)));
        assert_eq!(table.map_codepoint('a' as u32), None);
        assert_eq!(table.map_codepoint(0x10000), None);
    }

    #[test]
    fn format4_multiple_segments() {
        let buf = font_test_data::cmap4_subtable(&[(32, 32, 4), (65, 90, 1), (196, 196, 30)]);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint(32), Some(GlyphId::new(4)));
        assert_eq!(table.map_codepoint(65), Some(GlyphId::new(1)));
        assert_eq!(table.map_codepoint(90), Some(GlyphId::new(26)));
        assert_eq!(table.map_codepoint(196), Some(GlyphId::new(30)));
        assert_eq!(table.map_codepoint(64), None);
        assert_eq!(table.map_codepoint(91), None);
        assert_eq!(table.map_codepoint(195), None);
    }

    #[test]
    fn format6() {
        let mut buf = BeBuffer::new();
        buf.push(6u16); // format
        buf.push(16u16); // length
        buf.push(0u16); // language
        buf.push(0x20u16); // first
        buf.push(3u16); // count
        buf.extend([5u16, 6, 7]);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint(0x1F), None);
        assert_eq!(table.map_codepoint(0x20), Some(GlyphId::new(5)));
        assert_eq!(table.map_codepoint(0x22), Some(GlyphId::new(7)));
        assert_eq!(table.map_codepoint(0x23), None);
    }

    fn format12_buf(format: u16) -> BeBuffer {
        let mut buf = BeBuffer::new();
        buf.push(format);
        buf.push(0u16); // reserved
        buf.push(16u32 + 2 * 12); // length
        buf.push(0u32); // language
        buf.push(2u32); // numGroups
        // [0x10000, 0x10010] -> 100.., [0x20000, 0x20005] -> 200..
        buf.extend([0x10000u32, 0x10010, 100]);
        buf.extend([0x20000u32, 0x20005, 200]);
        buf
    }

    #[test]
    fn format12() {
        let buf = format12_buf(12);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint(0x0FFFF), None);
        assert_eq!(table.map_codepoint(0x10000), Some(GlyphId::new(100)));
        assert_eq!(table.map_codepoint(0x10010), Some(GlyphId::new(116)));
        assert_eq!(table.map_codepoint(0x10011), None);
        assert_eq!(table.map_codepoint(0x20003), Some(GlyphId::new(203)));
    }

    #[test]
    fn format13_maps_ranges_to_one_glyph() {
        let buf = format12_buf(13);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint(0x10000), Some(GlyphId::new(100)));
        assert_eq!(table.map_codepoint(0x10010), Some(GlyphId::new(100)));
        assert_eq!(table.map_codepoint(0x20003), Some(GlyphId::new(200)));
    }

    #[test]
    fn format2_is_unsupported() {
        let mut buf = BeBuffer::new();
        buf.push(2u16);
        buf.extend([0u16; 16]);
        let table = subtable(&buf);
        assert!(matches!(table, CmapSubtable::Unsupported(2)));
        assert_eq!(table.map_codepoint(0x4E00), None);
    }

    #[test]
    fn lying_group_count_is_clamped() {
        let mut buf = BeBuffer::new();
        buf.push(12u16);
        buf.push(0u16);
        buf.push(16u32 + 12);
        buf.push(0u32);
        buf.push(0xFFFF_FFFFu32); // numGroups lies
        buf.extend([0x41u32, 0x41, 9]);
        let table = subtable(&buf);
        assert_eq!(table.map_codepoint(0x41), Some(GlyphId::new(9)));
        assert_eq!(table.map_codepoint(0x42), None);
    }
}
