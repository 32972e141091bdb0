//! Builders for complete synthetic fonts and individual tables.
//!
//! The main TrueType fixture contains five glyphs:
//!
//! | gid | codepoint | contents |
//! |-----|-----------|----------|
//! | 0   | (none)    | .notdef, empty |
//! | 1   | `A`       | square from (100, 100) to (600, 600) |
//! | 2   | `B`       | square from (0, 0) to (100, 100) |
//! | 3   | `Ä`       | composite of gid 1 and gid 2 offset by (50, 700) |
//! | 4   | space     | empty (`loca[4] == loca[5]`) |
//!
//! The CFF fixture holds an empty .notdef and a square glyph from
//! (100, 100) to (300, 300) mapped from `A`.

use crate::BeBuffer;

/// Units per em of every fixture.
const UPEM: u16 = 1000;

// --- cmap ---------------------------------------------------------------

/// Builds a format 4 cmap subtable from `(first, last, first_glyph)`
/// segments (sorted, inclusive). The required terminal 0xFFFF segment is
/// appended automatically.
pub fn cmap4_subtable(segments: &[(u16, u16, u16)]) -> BeBuffer {
    let seg_count = segments.len() as u16 + 1;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 * (1u16 << entry_selector);
    let range_shift = 2 * seg_count - search_range;

    let mut buf = BeBuffer::new();
    buf.push(4u16); // format
    buf.push(16 + 8 * seg_count); // length
    buf.push(0u16); // language
    buf.push(seg_count * 2);
    buf.push(search_range);
    buf.push(entry_selector);
    buf.push(range_shift);
    for &(_, last, _) in segments {
        buf.push(last);
    }
    buf.push(0xFFFFu16);
    buf.push(0u16); // reservedPad
    for &(first, _, _) in segments {
        buf.push(first);
    }
    buf.push(0xFFFFu16);
    for &(first, _, first_glyph) in segments {
        buf.push(first_glyph.wrapping_sub(first)); // idDelta
    }
    buf.push(1u16); // terminal idDelta maps 0xFFFF to 0
    for _ in 0..seg_count {
        buf.push(0u16); // idRangeOffset
    }
    buf
}

fn cmap_table(records: &[(u16, u16)], segments: &[(u16, u16, u16)]) -> BeBuffer {
    let subtable = cmap4_subtable(segments);
    let subtable_offset = 4 + 8 * records.len() as u32;
    let mut buf = BeBuffer::new();
    buf.push(0u16); // version
    buf.push(records.len() as u16);
    for &(platform, encoding) in records {
        buf.push(platform);
        buf.push(encoding);
        buf.push(subtable_offset);
    }
    buf.extend(subtable.iter().copied());
    buf
}

/// A cmap table whose encoding records all reference one format 4
/// subtable mapping `A..=Z` to glyphs 1..=26.
pub fn cmap_with_records(records: &[(u16, u16)]) -> BeBuffer {
    cmap_table(records, &[(b'A' as u16, b'Z' as u16, 1)])
}

// --- glyf ---------------------------------------------------------------

/// A simple one-contour square glyph, all points on-curve.
fn square_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(1i16); // numberOfContours
    buf.push(x0);
    buf.push(y0);
    buf.push(x1);
    buf.push(y1);
    buf.push(3u16); // endPtsOfContours
    buf.push(0u16); // instructionLength
    buf.extend([0x01u8; 4]); // on-curve, long vectors
    let w = x1 - x0;
    let h = y1 - y0;
    buf.extend([x0, w, 0, -w]); // x deltas
    buf.extend([y0, 0, h, 0]); // y deltas
    buf
}

/// The `A` glyph of the TrueType fixture.
pub fn square_glyph_data() -> BeBuffer {
    square_glyph(100, 100, 600, 600)
}

/// The diaeresis-dot glyph of the TrueType fixture.
pub fn dot_glyph_data() -> BeBuffer {
    square_glyph(0, 0, 100, 100)
}

/// The composite glyph: gid 1 in place, gid 2 translated by (50, 700).
pub fn diaeresis_composite_data() -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(-1i16); // numberOfContours
    buf.push(50i16);
    buf.push(100i16);
    buf.push(600i16);
    buf.push(800i16);
    // words | xy values | more components
    buf.push(0x0023u16);
    buf.push(1u16);
    buf.push(0i16);
    buf.push(0i16);
    // words | xy values
    buf.push(0x0003u16);
    buf.push(2u16);
    buf.push(50i16);
    buf.push(700i16);
    buf
}

// --- kern / GPOS --------------------------------------------------------

/// A kern table with one horizontal format 0 subtable holding the given
/// `(left, right, value)` pairs.
pub fn kern_table(pairs: &[(u16, u16, i16)]) -> BeBuffer {
    let mut pairs = pairs.to_vec();
    pairs.sort_by_key(|&(left, right, _)| (left as u32) << 16 | right as u32);
    let n = pairs.len() as u16;
    let entry_selector = if n == 0 {
        0
    } else {
        15 - n.leading_zeros() as u16
    };
    let search_range = if n == 0 { 0 } else { 6 * (1u16 << entry_selector) };

    let mut buf = BeBuffer::new();
    buf.push(0u16); // table version
    buf.push(1u16); // nTables
    buf.push(0u16); // subtable version
    buf.push(14 + 6 * n); // length
    buf.push(1u16); // coverage: horizontal, format 0
    buf.push(n);
    buf.push(search_range);
    buf.push(entry_selector);
    buf.push(6 * n - search_range);
    for (left, right, value) in pairs {
        buf.push(left);
        buf.push(right);
        buf.push(value);
    }
    buf
}

/// Wraps one pair-positioning subtable in a GPOS header, lookup list and
/// lookup of type 2.
fn gpos_with_subtable(subtable: &[u8]) -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(1u16); // major
    buf.push(0u16); // minor
    buf.push(0u16); // scriptListOffset
    buf.push(0u16); // featureListOffset
    buf.push(10u16); // lookupListOffset
    // lookup list
    buf.push(1u16); // lookupCount
    buf.push(4u16); // offset to the lookup
    // lookup
    buf.push(2u16); // lookupType: pair adjustment
    buf.push(0u16); // lookupFlag
    buf.push(1u16); // subTableCount
    buf.push(8u16); // offset to the subtable
    buf.extend(subtable.iter().copied());
    buf
}

/// A GPOS table with one pair positioning subtable in format 1.
///
/// `sets` maps each covered first glyph to its sorted
/// `(second glyph, x advance)` pairs.
pub fn gpos_pair_format1(sets: &[(u16, &[(u16, i16)])]) -> BeBuffer {
    let n = sets.len() as u16;
    let mut subtable = BeBuffer::new();
    subtable.push(1u16); // posFormat
    let fixed = 10 + 2 * n;
    let pair_sets_len: u16 = sets
        .iter()
        .map(|(_, pairs)| 2 + 4 * pairs.len() as u16)
        .sum();
    subtable.push(fixed + pair_sets_len); // coverageOffset
    subtable.push(4u16); // valueFormat1: X_ADVANCE
    subtable.push(0u16); // valueFormat2
    subtable.push(n); // pairSetCount
    let mut pair_set_offset = fixed;
    for (_, pairs) in sets {
        subtable.push(pair_set_offset);
        pair_set_offset += 2 + 4 * pairs.len() as u16;
    }
    for (_, pairs) in sets {
        subtable.push(pairs.len() as u16);
        for &(second, advance) in pairs.iter() {
            subtable.push(second);
            subtable.push(advance);
        }
    }
    // coverage format 1 over the first glyphs
    subtable.push(1u16);
    subtable.push(n);
    for &(first, _) in sets {
        subtable.push(first);
    }
    gpos_with_subtable(&subtable)
}

/// A GPOS table with one pair positioning subtable in format 2:
/// class 1 = {glyph 1}, class 2 = {glyph 22}, adjustment -60.
pub fn gpos_pair_format2() -> BeBuffer {
    let mut subtable = BeBuffer::new();
    subtable.push(2u16); // posFormat
    subtable.push(24u16); // coverageOffset
    subtable.push(4u16); // valueFormat1
    subtable.push(0u16); // valueFormat2
    subtable.push(30u16); // classDef1Offset
    subtable.push(38u16); // classDef2Offset
    subtable.push(2u16); // class1Count
    subtable.push(2u16); // class2Count
    subtable.extend([0i16, 0, 0, -60]); // class pair matrix
    // coverage: format 1, glyph 1
    subtable.push(1u16);
    subtable.push(1u16);
    subtable.push(1u16);
    // classDef 1: format 1, glyph 1 is class 1
    subtable.push(1u16);
    subtable.push(1u16);
    subtable.push(1u16);
    subtable.push(1u16);
    // classDef 2: format 2, glyph 22 is class 1
    subtable.push(2u16);
    subtable.push(1u16);
    subtable.push(22u16);
    subtable.push(22u16);
    subtable.push(1u16);
    gpos_with_subtable(&subtable)
}

// --- CFF ----------------------------------------------------------------

/// Builds a CFF INDEX with one-byte offsets.
fn index1(objects: &[&[u8]]) -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(objects.len() as u16);
    if objects.is_empty() {
        return buf;
    }
    buf.push(1u8); // offSize
    let mut offset = 1usize;
    for object in objects {
        buf.push(offset as u8);
        offset += object.len();
    }
    buf.push(offset as u8);
    for object in objects {
        buf.extend(object.iter().copied());
    }
    buf
}

/// A `CFF ` table with two charstrings: an empty .notdef and a square
/// from (100, 100) to (300, 300).
pub fn cff_table() -> Vec<u8> {
    // 100 100 rmoveto 200 hlineto 200 vlineto -200 hlineto endchar
    let square: &[u8] = &[
        239, 239, 0x15, // 100 100 rmoveto
        247, 92, 0x06, // 200 hlineto
        247, 92, 0x07, // 200 vlineto
        251, 92, 0x06, // -200 hlineto
        0x0E, // endchar
    ];
    let notdef: &[u8] = &[0x0E];
    let charstrings = index1(&[notdef, square]);

    let name_index = index1(&[b"Test"]);
    let string_index = index1(&[]);
    let gsubr_index = index1(&[]);
    // the top dict holds one entry: CharStrings at a fixed-width offset
    // so the dict's own size does not depend on the value
    let top_dict_len = 6u8;
    let top_dict_index_len = 2 + 1 + 2 + top_dict_len as usize;
    let charstrings_offset = (4
        + name_index.len()
        + top_dict_index_len
        + string_index.len()
        + gsubr_index.len()) as u32;

    let mut buf = BeBuffer::new();
    // header: major, minor, hdrSize, offSize
    buf.extend([1u8, 0, 4, 1]);
    buf.extend(name_index.iter().copied());
    // top dict index holding one 6-byte dict
    buf.push(1u16);
    buf.push(1u8);
    buf.push(1u8);
    buf.push(1 + top_dict_len);
    buf.push(29u8); // 32-bit integer operand
    buf.push(charstrings_offset);
    buf.push(17u8); // CharStrings operator
    buf.extend(string_index.iter().copied());
    buf.extend(gsubr_index.iter().copied());
    buf.extend(charstrings.iter().copied());
    buf.into_vec()
}

// --- sfnt assembly ------------------------------------------------------

fn head_table() -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(0x0001_0000u32); // version
    buf.push(0u32); // fontRevision
    buf.push(0u32); // checksumAdjustment
    buf.push(0x5F0F_3CF5u32); // magicNumber
    buf.push(0u16); // flags
    buf.push(UPEM);
    buf.extend([0u32; 4]); // created + modified
    buf.push(0i16); // xMin
    buf.push(0i16); // yMin
    buf.push(650i16); // xMax
    buf.push(800i16); // yMax
    buf.push(0u16); // macStyle
    buf.push(8u16); // lowestRecPPEM
    buf.push(2i16); // fontDirectionHint
    buf.push(0i16); // indexToLocFormat: short
    buf.push(0i16); // glyphDataFormat
    buf
}

fn hhea_table(number_of_h_metrics: u16) -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(0x0001_0000u32); // version
    buf.push(800i16); // ascender
    buf.push(-200i16); // descender
    buf.push(0i16); // lineGap
    buf.push(650u16); // advanceWidthMax
    buf.extend([0i16; 11]); // bearings .. metricDataFormat
    buf.push(number_of_h_metrics);
    buf
}

fn maxp_table(num_glyphs: u16) -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(0x0000_5000u32); // version 0.5
    buf.push(num_glyphs);
    buf
}

fn os2_table() -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.push(1u16); // version
    buf.extend([0u16; 33]); // everything up to the typo metrics
    buf.push(750i16); // sTypoAscender
    buf.push(-250i16); // sTypoDescender
    buf.push(10i16); // sTypoLineGap
    buf.push(800u16); // usWinAscent
    buf.push(200u16); // usWinDescent
    buf
}

fn hmtx_table() -> BeBuffer {
    let mut buf = BeBuffer::new();
    buf.extend([500u16, 0, 650, 100, 300, 0]); // three long metrics
    buf.extend([50i16, 0]); // bearings for gids 3 and 4
    buf
}

fn glyf_and_loca() -> (BeBuffer, BeBuffer) {
    let g1 = square_glyph_data();
    let g2 = dot_glyph_data();
    let g3 = diaeresis_composite_data();
    let mut glyf = BeBuffer::new();
    let mut ends = Vec::new();
    for glyph in [&g1, &g2, &g3] {
        glyf.extend(glyph.iter().copied());
        ends.push(glyf.len() as u16);
    }
    let mut loca = BeBuffer::new();
    // gid 0 and gid 4 are empty
    loca.extend([0u16, 0, ends[0] / 2, ends[1] / 2, ends[2] / 2, ends[2] / 2]);
    (glyf, loca)
}

fn ttf_cmap() -> BeBuffer {
    cmap_table(
        &[(3, 1)],
        &[(32, 32, 4), (65, 65, 1), (66, 66, 2), (196, 196, 3)],
    )
}

/// Lays out an sfnt with its table directory, with table offsets
/// rebased by `base` (non-zero for collection members).
fn build_sfnt(version: u32, mut tables: Vec<([u8; 4], Vec<u8>)>, base: u32) -> Vec<u8> {
    tables.sort_by_key(|(tag, _)| *tag);
    let n = tables.len() as u16;
    let entry_selector = 15 - n.leading_zeros() as u16;
    let search_range = 16 * (1u16 << entry_selector);

    let mut buf = BeBuffer::new();
    buf.push(version);
    buf.push(n);
    buf.push(search_range);
    buf.push(entry_selector);
    buf.push(16 * n - search_range);
    let mut offset = base + 12 + 16 * n as u32;
    for (tag, data) in &tables {
        buf.extend(tag.iter().copied());
        buf.push(0u32); // checksum, unchecked by the readers
        buf.push(offset);
        buf.push(data.len() as u32);
        offset += padded(data.len()) as u32;
    }
    for (_, data) in &tables {
        buf.extend(data.iter().copied());
        for _ in data.len()..padded(data.len()) {
            buf.push(0u8);
        }
    }
    buf.into_vec()
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn ttf_tables() -> Vec<([u8; 4], Vec<u8>)> {
    let (glyf, loca) = glyf_and_loca();
    vec![
        (*b"cmap", ttf_cmap().into_vec()),
        (*b"glyf", glyf.into_vec()),
        (*b"head", head_table().into_vec()),
        (*b"hhea", hhea_table(3).into_vec()),
        (*b"hmtx", hmtx_table().into_vec()),
        (*b"loca", loca.into_vec()),
        (*b"maxp", maxp_table(5).into_vec()),
        (*b"OS/2", os2_table().into_vec()),
    ]
}

/// The five-glyph TrueType fixture.
pub fn test_ttf() -> Vec<u8> {
    build_sfnt(0x0001_0000, ttf_tables(), 0)
}

/// The TrueType fixture plus a `kern` table holding (A, B) -> -80.
pub fn test_ttf_with_kern() -> Vec<u8> {
    let mut tables = ttf_tables();
    tables.push((*b"kern", kern_table(&[(1, 2, -80)]).into_vec()));
    build_sfnt(0x0001_0000, tables, 0)
}

/// The TrueType fixture plus a GPOS pair adjustment (A, B) -> -80.
pub fn test_ttf_with_gpos() -> Vec<u8> {
    let mut tables = ttf_tables();
    tables.push((
        *b"GPOS",
        gpos_pair_format1(&[(1, &[(2, -80)])]).into_vec(),
    ));
    build_sfnt(0x0001_0000, tables, 0)
}

/// An OpenType/CFF fixture: .notdef plus a square glyph mapped from `A`.
pub fn test_otf() -> Vec<u8> {
    let mut hmtx = BeBuffer::new();
    hmtx.extend([500u16, 0, 400, 100]);
    let tables = vec![
        (*b"CFF ", cff_table()),
        (*b"cmap", cmap_table(&[(3, 1)], &[(65, 65, 1)]).into_vec()),
        (*b"head", head_table().into_vec()),
        (*b"hhea", hhea_table(2).into_vec()),
        (*b"hmtx", hmtx.into_vec()),
        (*b"maxp", maxp_table(2).into_vec()),
    ];
    build_sfnt(u32::from_be_bytes(*b"OTTO"), tables, 0)
}

/// A two-member collection; both members share one table directory.
pub fn test_ttc() -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.extend(b"ttcf".iter().copied());
    buf.push(0x0001_0000u32);
    buf.push(2u32);
    // directory offsets; the header is 20 bytes
    buf.push(20u32);
    buf.push(20u32);
    let mut out = buf.into_vec();
    out.extend(build_sfnt(0x0001_0000, ttf_tables(), 20));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_sizes_are_consistent() {
        let (glyf, loca) = glyf_and_loca();
        // three glyph records, all of even length
        assert_eq!(glyf.len(), 34 + 34 + 26);
        assert_eq!(loca.len(), 6 * 2);
        assert_eq!(head_table().len(), 54);
        assert_eq!(hhea_table(3).len(), 36);
        assert_eq!(os2_table().len(), 78);
    }

    #[test]
    fn cff_offsets_resolve() {
        let cff = cff_table();
        // the top dict starts after the 4-byte header, the 9-byte name
        // index and the 5-byte top dict index header
        assert_eq!(cff[18], 29);
        assert_eq!(cff[23], 17);
        // the CharStrings operand must point at a two-entry index
        let offset = u32::from_be_bytes([cff[19], cff[20], cff[21], cff[22]]) as usize;
        assert!(offset < cff.len());
        assert_eq!(u16::from_be_bytes([cff[offset], cff[offset + 1]]), 2);
    }
}
