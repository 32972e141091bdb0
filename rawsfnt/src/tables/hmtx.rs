//! The [hmtx](https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx) table.

use bytemuck::{Pod, Zeroable};

use crate::types::{I16Be, Tag, U16Be};
use crate::{FontData, ReadError};

pub const TAG: Tag = Tag::new(b"hmtx");

/// A paired advance width and left side bearing.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct LongMetric {
    advance: U16Be,
    lsb: I16Be,
}

impl LongMetric {
    pub fn advance(&self) -> u16 {
        self.advance.get()
    }

    pub fn lsb(&self) -> i16 {
        self.lsb.get()
    }
}

/// The horizontal metrics table.
///
/// The first `number_of_h_metrics` glyphs carry full (advance, lsb)
/// pairs; the remaining glyphs share the last advance and take their
/// left side bearing from a trailing array.
#[derive(Clone)]
pub struct Hmtx<'a> {
    h_metrics: &'a [LongMetric],
    left_side_bearings: &'a [I16Be],
}

impl<'a> Hmtx<'a> {
    /// Reads the table. The metric and glyph counts come from `hhea` and
    /// `maxp`; the trailing bearing array is truncated to what the table
    /// actually holds.
    pub fn read(
        data: FontData<'a>,
        number_of_h_metrics: u16,
        num_glyphs: u16,
    ) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let h_metrics = cursor.read_array::<LongMetric>(number_of_h_metrics as usize)?;
        let tail = num_glyphs.saturating_sub(number_of_h_metrics) as usize;
        let available = cursor.remaining_bytes() / std::mem::size_of::<I16Be>();
        let left_side_bearings = cursor.read_array::<I16Be>(tail.min(available))?;
        Ok(Hmtx {
            h_metrics,
            left_side_bearings,
        })
    }

    pub fn h_metrics(&self) -> &'a [LongMetric] {
        self.h_metrics
    }

    pub fn left_side_bearings(&self) -> &'a [I16Be] {
        self.left_side_bearings
    }

    /// Returns the advance width of a glyph, falling back to the last
    /// full metric for glyphs past `number_of_h_metrics`.
    pub fn advance(&self, glyph_id: u16) -> u16 {
        self.h_metrics
            .get(glyph_id as usize)
            .or_else(|| self.h_metrics.last())
            .map(|metric| metric.advance())
            .unwrap_or_default()
    }

    /// Returns the left side bearing of a glyph.
    pub fn side_bearing(&self, glyph_id: u16) -> i16 {
        self.h_metrics
            .get(glyph_id as usize)
            .map(|metric| metric.lsb())
            .or_else(|| {
                let tail_index = (glyph_id as usize).checked_sub(self.h_metrics.len())?;
                self.left_side_bearings.get(tail_index).map(|lsb| lsb.get())
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    fn sample() -> BeBuffer {
        let mut buf = BeBuffer::new();
        // two long metrics
        buf.push(500u16);
        buf.push(10i16);
        buf.push(600u16);
        buf.push(20i16);
        // two short metrics
        buf.push(-5i16);
        buf.push(30i16);
        buf
    }

    #[test]
    fn long_metrics() {
        let buf = sample();
        let hmtx = Hmtx::read(FontData::new(&buf), 2, 4).unwrap();
        assert_eq!(hmtx.advance(0), 500);
        assert_eq!(hmtx.side_bearing(0), 10);
        assert_eq!(hmtx.advance(1), 600);
        assert_eq!(hmtx.side_bearing(1), 20);
    }

    #[test]
    fn short_metrics_share_last_advance() {
        let buf = sample();
        let hmtx = Hmtx::read(FontData::new(&buf), 2, 4).unwrap();
        assert_eq!(hmtx.advance(2), 600);
        assert_eq!(hmtx.side_bearing(2), -5);
        assert_eq!(hmtx.advance(3), 600);
        assert_eq!(hmtx.side_bearing(3), 30);
        // out of range: last advance, zero bearing
        assert_eq!(hmtx.advance(9), 600);
        assert_eq!(hmtx.side_bearing(9), 0);
    }

    #[test]
    fn truncated_bearing_tail_is_tolerated() {
        let buf = sample();
        let hmtx = Hmtx::read(FontData::new(&buf), 2, 40).unwrap();
        assert_eq!(hmtx.left_side_bearings().len(), 2);
        assert_eq!(hmtx.advance(30), 600);
        assert_eq!(hmtx.side_bearing(30), 0);
    }
}
