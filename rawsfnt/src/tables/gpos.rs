//! The [GPOS](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos) table.
//!
//! Only what pair kerning needs is implemented: the lookup list, lookup
//! type 2 (pair adjustment) subtable formats 1 and 2, coverage formats 1
//! and 2 and class definition formats 1 and 2. Value records other than
//! `{X_ADVANCE, none}` are not interpreted.

use bytemuck::{Pod, Zeroable};

use crate::types::{Tag, U16Be};
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"GPOS");

const LOOKUP_TYPE_PAIR_POS: u16 = 2;
const VALUE_FORMAT_X_ADVANCE: u16 = 0x0004;

/// The glyph positioning table.
#[derive(Clone)]
pub struct Gpos<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Gpos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let major = data.read_at::<u16>(0)?;
        let minor = data.read_at::<u16>(2)?;
        if (major, minor) != (1, 0) {
            return Err(ReadError::InvalidFormat(((major as i64) << 16) | minor as i64));
        }
        Ok(Gpos { data })
    }
}

impl<'a> Gpos<'a> {
    /// Searches every pair adjustment lookup for an x-advance adjustment
    /// of the pair `(left, right)`, returning the first match.
    pub fn pair_x_advance(&self, left: u16, right: u16) -> Option<i16> {
        let lookup_list_offset = self.data.read_at::<u16>(8).ok()? as usize;
        let lookup_list = self.data.split_off(lookup_list_offset)?;
        let lookup_count = lookup_list.read_at::<u16>(0).ok()?;
        for i in 0..lookup_count as usize {
            let lookup_offset = lookup_list.read_at::<u16>(2 + 2 * i).ok()? as usize;
            let lookup = lookup_list.split_off(lookup_offset)?;
            if lookup.read_at::<u16>(0).ok()? != LOOKUP_TYPE_PAIR_POS {
                continue;
            }
            let subtable_count = lookup.read_at::<u16>(4).ok()?;
            for sti in 0..subtable_count as usize {
                let subtable_offset = lookup.read_at::<u16>(6 + 2 * sti).ok()? as usize;
                let subtable = lookup.split_off(subtable_offset)?;
                if let Some(advance) = pair_pos_x_advance(subtable, left, right) {
                    return Some(advance);
                }
            }
        }
        None
    }
}

fn pair_pos_x_advance(table: FontData<'_>, left: u16, right: u16) -> Option<i16> {
    let coverage_offset = table.read_at::<u16>(2).ok()? as usize;
    let coverage_index = coverage_index(table.split_off(coverage_offset)?, left)?;
    let value_format1 = table.read_at::<u16>(4).ok()?;
    let value_format2 = table.read_at::<u16>(6).ok()?;
    if value_format1 != VALUE_FORMAT_X_ADVANCE || value_format2 != 0 {
        return None;
    }
    match table.read_at::<u16>(0).ok()? {
        1 => {
            // pair sets of (second glyph, value record) entries
            let pair_set_count = table.read_at::<u16>(8).ok()? as usize;
            if coverage_index >= pair_set_count {
                return None;
            }
            let pair_set_offset = table.read_at::<u16>(10 + 2 * coverage_index).ok()? as usize;
            let pair_set = table.split_off(pair_set_offset)?;
            let pair_count = pair_set.read_at::<u16>(0).ok()? as usize;
            let available = pair_set.len().saturating_sub(2) / std::mem::size_of::<PairValue>();
            let pairs: &[PairValue] = pair_set
                .read_array(2..2 + pair_count.min(available) * 4)
                .ok()?;
            pairs
                .binary_search_by(|pair| pair.second_glyph.get().cmp(&right))
                .ok()
                .map(|index| pairs[index].x_advance.get() as i16)
        }
        2 => {
            let class1 = glyph_class(table.split_off(table.read_at::<u16>(8).ok()? as usize)?, left)?;
            let class2 =
                glyph_class(table.split_off(table.read_at::<u16>(10).ok()? as usize)?, right)?;
            let class1_count = table.read_at::<u16>(12).ok()?;
            let class2_count = table.read_at::<u16>(14).ok()?;
            if class1 >= class1_count || class2 >= class2_count {
                return None;
            }
            // one i16 x-advance per (class1, class2) cell
            let record_offset =
                16 + 2 * (class1 as usize * class2_count as usize + class2 as usize);
            table.read_at::<i16>(record_offset).ok()
        }
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
struct PairValue {
    second_glyph: U16Be,
    x_advance: U16Be,
}

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
struct RangeRecord {
    start: U16Be,
    end: U16Be,
    value: U16Be,
}

/// Returns the coverage index of `glyph`, or `None` if it is not covered.
fn coverage_index(coverage: FontData<'_>, glyph: u16) -> Option<usize> {
    match coverage.read_at::<u16>(0).ok()? {
        1 => {
            let count = coverage.read_at::<u16>(2).ok()? as usize;
            let available = coverage.len().saturating_sub(4) / 2;
            let glyphs: &[U16Be] = coverage.read_array(4..4 + count.min(available) * 2).ok()?;
            glyphs.binary_search_by(|id| id.get().cmp(&glyph)).ok()
        }
        2 => {
            let count = coverage.read_at::<u16>(2).ok()? as usize;
            let available = coverage.len().saturating_sub(4) / std::mem::size_of::<RangeRecord>();
            let ranges: &[RangeRecord] =
                coverage.read_array(4..4 + count.min(available) * 6).ok()?;
            let index = match ranges.binary_search_by(|range| range.start.get().cmp(&glyph)) {
                Ok(index) => index,
                Err(index) => index.checked_sub(1)?,
            };
            let range = ranges.get(index)?;
            (glyph <= range.end.get())
                .then(|| range.value.get() as usize + (glyph - range.start.get()) as usize)
        }
        _ => None,
    }
}

/// Returns the class of `glyph` in a ClassDef table.
///
/// Glyphs not assigned to a class fall into class 0.
fn glyph_class(class_def: FontData<'_>, glyph: u16) -> Option<u16> {
    match class_def.read_at::<u16>(0).ok()? {
        1 => {
            let start = class_def.read_at::<u16>(2).ok()?;
            let count = class_def.read_at::<u16>(4).ok()?;
            if glyph >= start && (glyph - start) < count {
                class_def.read_at::<u16>(6 + 2 * (glyph - start) as usize).ok()
            } else {
                Some(0)
            }
        }
        2 => {
            let count = class_def.read_at::<u16>(2).ok()? as usize;
            let available = class_def.len().saturating_sub(4) / std::mem::size_of::<RangeRecord>();
            let ranges: &[RangeRecord] =
                class_def.read_array(4..4 + count.min(available) * 6).ok()?;
            let index = match ranges.binary_search_by(|range| range.start.get().cmp(&glyph)) {
                Ok(index) => index,
                Err(index) => match index.checked_sub(1) {
                    Some(index) => index,
                    None => return Some(0),
                },
            };
            let range = ranges.get(index)?;
            if glyph <= range.end.get() {
                Some(range.value.get())
            } else {
                Some(0)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_pos_format1() {
        let buf = font_test_data::gpos_pair_format1(&[(1, &[(22, -80), (23, 40)]), (4, &[(22, 7)])]);
        let gpos = Gpos::read(FontData::new(&buf)).unwrap();
        assert_eq!(gpos.pair_x_advance(1, 22), Some(-80));
        assert_eq!(gpos.pair_x_advance(1, 23), Some(40));
        assert_eq!(gpos.pair_x_advance(4, 22), Some(7));
        assert_eq!(gpos.pair_x_advance(1, 24), None);
        assert_eq!(gpos.pair_x_advance(2, 22), None);
    }

    #[test]
    fn pair_pos_format2() {
        // class 1 = {glyph 1}, class 2 = {glyph 22}; matrix[1][1] = -60
        let buf = font_test_data::gpos_pair_format2();
        let gpos = Gpos::read(FontData::new(&buf)).unwrap();
        assert_eq!(gpos.pair_x_advance(1, 22), Some(-60));
        // class 0 cells are zero
        assert_eq!(gpos.pair_x_advance(1, 9), Some(0));
        // first glyph not covered at all
        assert_eq!(gpos.pair_x_advance(3, 22), None);
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut buf = font_test_data::gpos_pair_format2();
        buf.write_u16_at(0, 2);
        assert!(Gpos::read(FontData::new(&buf)).is_err());
    }
}
