//! Selection of a usable `cmap` subtable and codepoint mapping.

use rawsfnt::tables::cmap::{
    Cmap, CmapSubtable, MS_EID_UNICODE_BMP, MS_EID_UNICODE_FULL, PLATFORM_ID_MICROSOFT,
    PLATFORM_ID_UNICODE,
};
use rawsfnt::types::GlyphId;

/// The cached character mapping of a [`Font`](crate::Font).
///
/// A subtable is chosen once at construction: the first encoding record
/// that is Windows/Unicode-BMP, Windows/Unicode-full or any Unicode
/// platform entry. A font with none of these has no usable mapping and
/// the containing context fails to construct.
#[derive(Clone)]
pub(crate) struct Charmap<'a> {
    subtable: Option<CmapSubtable<'a>>,
}

impl<'a> Charmap<'a> {
    /// Picks a subtable, or `None` when no supported encoding exists.
    pub fn new(table: &Cmap<'a>) -> Option<Self> {
        let record = table.encoding_records().iter().find(|record| {
            match (record.platform_id(), record.encoding_id()) {
                (PLATFORM_ID_MICROSOFT, MS_EID_UNICODE_BMP | MS_EID_UNICODE_FULL) => true,
                // all Unicode-platform encodings map Unicode codepoints
                (PLATFORM_ID_UNICODE, _) => true,
                _ => false,
            }
        })?;
        // a record whose subtable cannot be resolved still counts as a
        // mapping; every lookup through it just misses
        Some(Charmap {
            subtable: table.subtable(record),
        })
    }

    /// Maps a codepoint to a glyph, 0 for anything unmapped.
    pub fn glyph_index(&self, codepoint: u32) -> GlyphId {
        self.subtable
            .as_ref()
            .and_then(|subtable| subtable.map_codepoint(codepoint))
            .unwrap_or(GlyphId::NOTDEF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawsfnt::{FontData, FontRead};

    #[test]
    fn picks_first_supported_record() {
        // records: mac roman (ignored), then windows bmp
        let cmap = font_test_data::cmap_with_records(&[(1, 0), (3, 1)]);
        let table = Cmap::read(FontData::new(&cmap)).unwrap();
        let charmap = Charmap::new(&table).unwrap();
        assert_eq!(charmap.glyph_index('A' as u32), GlyphId::new(1));
        assert_eq!(charmap.glyph_index(0x2603), GlyphId::NOTDEF);
    }

    #[test]
    fn no_supported_record_fails() {
        let cmap = font_test_data::cmap_with_records(&[(1, 0)]);
        let table = Cmap::read(FontData::new(&cmap)).unwrap();
        assert!(Charmap::new(&table).is_none());
    }

    #[test]
    fn lookup_is_total_over_u32() {
        let cmap = font_test_data::cmap_with_records(&[(3, 1)]);
        let table = Cmap::read(FontData::new(&cmap)).unwrap();
        let charmap = Charmap::new(&table).unwrap();
        for codepoint in [0u32, 1, 0xFFFF, 0x10000, 0x10FFFF, u32::MAX] {
            let _ = charmap.glyph_index(codepoint);
        }
    }
}
