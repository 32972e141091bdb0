//! The legacy [kern](https://learn.microsoft.com/en-us/typography/opentype/spec/kern) table.
//!
//! Only the first subtable is consulted, and only when it is horizontal
//! format 0 (sorted pairs).

use bytemuck::{Pod, Zeroable};

use crate::types::{I16Be, Tag, U16Be};
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"kern");

/// A kerning pair record: two glyph ids and an adjustment in font units.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct KernPair {
    left: U16Be,
    right: U16Be,
    value: I16Be,
}

impl KernPair {
    pub fn left(&self) -> u16 {
        self.left.get()
    }

    pub fn right(&self) -> u16 {
        self.right.get()
    }

    pub fn value(&self) -> i16 {
        self.value.get()
    }

    /// The search key: `(left << 16) | right`.
    fn key(&self) -> u32 {
        (self.left() as u32) << 16 | self.right() as u32
    }
}

/// The kerning table.
#[derive(Clone)]
pub struct Kern<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Kern<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        if data.len() < 4 {
            return Err(ReadError::OutOfBounds);
        }
        Ok(Kern { data })
    }
}

impl<'a> Kern<'a> {
    /// Returns the sorted pair array of the first subtable, or `None`
    /// when that subtable is not horizontal format 0.
    pub fn pairs(&self) -> Option<&'a [KernPair]> {
        let num_tables = self.data.read_at::<u16>(2).ok()?;
        if num_tables < 1 {
            return None;
        }
        // first subtable header: version, length, coverage
        let coverage = self.data.read_at::<u16>(8).ok()?;
        if coverage != 1 {
            // must be horizontal, format 0, no cross-stream
            return None;
        }
        let num_pairs = self.data.read_at::<u16>(10).ok()? as usize;
        let available = self.data.len().saturating_sub(18) / std::mem::size_of::<KernPair>();
        self.data
            .read_array(18..18 + num_pairs.min(available) * 6)
            .ok()
    }

    /// Binary-searches the pair list for `(left, right)`.
    pub fn kern_advance(&self, left: u16, right: u16) -> i16 {
        let needle = (left as u32) << 16 | right as u32;
        self.pairs()
            .and_then(|pairs| {
                pairs
                    .binary_search_by(|pair| pair.key().cmp(&needle))
                    .ok()
                    .map(|index| pairs[index].value())
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_search() {
        let buf = font_test_data::kern_table(&[(1, 2, -80), (1, 5, 30), (4, 2, -15)]);
        let kern = Kern::read(FontData::new(&buf)).unwrap();
        assert_eq!(kern.pairs().unwrap().len(), 3);
        assert_eq!(kern.kern_advance(1, 2), -80);
        assert_eq!(kern.kern_advance(1, 5), 30);
        assert_eq!(kern.kern_advance(4, 2), -15);
        assert_eq!(kern.kern_advance(2, 1), 0);
        assert_eq!(kern.kern_advance(0, 0), 0);
    }

    #[test]
    fn vertical_subtable_is_ignored() {
        let mut buf = font_test_data::kern_table(&[(1, 2, -80)]);
        // clear the horizontal bit in the coverage field
        buf.write_u16_at(8, 0);
        let kern = Kern::read(FontData::new(&buf)).unwrap();
        assert!(kern.pairs().is_none());
        assert_eq!(kern.kern_advance(1, 2), 0);
    }
}
