//! The [glyf](https://learn.microsoft.com/en-us/typography/opentype/spec/glyf) table.

use std::ops::Range;

use crate::types::{F2Dot14, GlyphId, Tag, U16Be};
use crate::{Cursor, FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"glyf");

/// The glyph data table.
#[derive(Clone)]
pub struct Glyf<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Glyf<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(Glyf { data })
    }
}

impl<'a> Glyf<'a> {
    /// Reads the glyph stored at the given byte range (from `loca`).
    pub fn glyph(&self, range: Range<usize>) -> Result<Glyph<'a>, ReadError> {
        let data = self.data.slice(range).ok_or(ReadError::OutOfBounds)?;
        Glyph::read(data)
    }
}

/// Either a simple or composite glyph.
#[derive(Clone)]
pub enum Glyph<'a> {
    Simple(SimpleGlyph<'a>),
    Composite(CompositeGlyph<'a>),
}

impl<'a> FontRead<'a> for Glyph<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let number_of_contours = data.read_at::<i16>(0)?;
        // the 10-byte header must be present either way
        data.read_at::<i16>(8)?;
        Ok(if number_of_contours < 0 {
            Glyph::Composite(CompositeGlyph { data })
        } else {
            Glyph::Simple(SimpleGlyph {
                data,
                number_of_contours: number_of_contours as u16,
            })
        })
    }
}

impl<'a> Glyph<'a> {
    pub fn x_min(&self) -> i16 {
        self.header(2)
    }

    pub fn y_min(&self) -> i16 {
        self.header(4)
    }

    pub fn x_max(&self) -> i16 {
        self.header(6)
    }

    pub fn y_max(&self) -> i16 {
        self.header(8)
    }

    fn header(&self, offset: usize) -> i16 {
        let data = match self {
            Glyph::Simple(glyph) => &glyph.data,
            Glyph::Composite(glyph) => &glyph.data,
        };
        data.read_at(offset).unwrap_or_default()
    }
}

/// Flags describing a point in a simple glyph.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct SimpleGlyphFlags(u8);

impl SimpleGlyphFlags {
    pub const ON_CURVE_POINT: Self = Self(0x01);
    pub const X_SHORT_VECTOR: Self = Self(0x02);
    pub const Y_SHORT_VECTOR: Self = Self(0x04);
    pub const REPEAT_FLAG: Self = Self(0x08);
    pub const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR: Self = Self(0x10);
    pub const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR: Self = Self(0x20);

    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0x3F)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A point decoded from a simple glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurvePoint {
    /// X coordinate, in font units.
    pub x: i16,
    /// Y coordinate, in font units.
    pub y: i16,
    /// True if this is an on-curve point.
    pub on_curve: bool,
}

impl CurvePoint {
    pub fn new(x: i16, y: i16, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }

    pub fn on_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, true)
    }

    pub fn off_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, false)
    }
}

/// A glyph defined by its own contours.
#[derive(Clone)]
pub struct SimpleGlyph<'a> {
    data: FontData<'a>,
    number_of_contours: u16,
}

impl<'a> SimpleGlyph<'a> {
    pub fn number_of_contours(&self) -> u16 {
        self.number_of_contours
    }

    /// The point index ending each contour, inclusive.
    pub fn end_pts_of_contours(&self) -> Result<&'a [U16Be], ReadError> {
        self.data
            .read_array(10..10 + self.number_of_contours as usize * 2)
    }

    /// The total number of points in the glyph.
    pub fn num_points(&self) -> usize {
        self.end_pts_of_contours()
            .ok()
            .and_then(|end_pts| end_pts.last().map(|last| last.get() as usize + 1))
            .unwrap_or_default()
    }

    fn coordinate_data(&self) -> Result<Cursor<'a>, ReadError> {
        let ins_offset = 10 + self.number_of_contours as usize * 2;
        let ins_len = self.data.read_at::<u16>(ins_offset)? as usize;
        let start = ins_offset + 2 + ins_len;
        Ok(self
            .data
            .split_off(start)
            .ok_or(ReadError::OutOfBounds)?
            .cursor())
    }

    /// Decodes the flag, x and y coordinate streams into absolute points.
    ///
    /// The flag stream is run-length compressed; x and y deltas are each
    /// stored as one unsigned byte with a sign flag, as a signed word, or
    /// omitted when unchanged.
    pub fn read_points(&self) -> Result<Vec<CurvePoint>, ReadError> {
        let n_points = self.num_points();
        let mut cursor = self.coordinate_data()?;
        let mut flags = Vec::with_capacity(n_points);
        while flags.len() < n_points {
            let flag = SimpleGlyphFlags::from_bits_truncate(cursor.read::<u8>()?);
            if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
                let count = (cursor.read::<u8>()? as usize + 1).min(n_points - flags.len());
                flags.extend(std::iter::repeat(flag).take(count));
            } else {
                flags.push(flag);
            }
        }
        let mut points = vec![CurvePoint::on_curve(0, 0); n_points];
        let mut x = 0i16;
        for (flag, point) in flags.iter().zip(points.iter_mut()) {
            let delta = if flag.contains(SimpleGlyphFlags::X_SHORT_VECTOR) {
                let value = cursor.read::<u8>()? as i16;
                if flag.contains(SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR) {
                    value
                } else {
                    -value
                }
            } else if flag.contains(SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR) {
                0
            } else {
                cursor.read::<i16>()?
            };
            x = x.wrapping_add(delta);
            point.x = x;
        }
        let mut y = 0i16;
        for (flag, point) in flags.iter().zip(points.iter_mut()) {
            let delta = if flag.contains(SimpleGlyphFlags::Y_SHORT_VECTOR) {
                let value = cursor.read::<u8>()? as i16;
                if flag.contains(SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR) {
                    value
                } else {
                    -value
                }
            } else if flag.contains(SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR) {
                0
            } else {
                cursor.read::<i16>()?
            };
            y = y.wrapping_add(delta);
            point.y = y;
            point.on_curve = flag.contains(SimpleGlyphFlags::ON_CURVE_POINT);
        }
        Ok(points)
    }
}

/// Flags in a composite glyph component record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct CompositeGlyphFlags(u16);

impl CompositeGlyphFlags {
    pub const ARG_1_AND_2_ARE_WORDS: Self = Self(0x0001);
    pub const ARGS_ARE_XY_VALUES: Self = Self(0x0002);
    pub const WE_HAVE_A_SCALE: Self = Self(0x0008);
    pub const MORE_COMPONENTS: Self = Self(0x0020);
    pub const WE_HAVE_AN_X_AND_Y_SCALE: Self = Self(0x0040);
    pub const WE_HAVE_A_TWO_BY_TWO: Self = Self(0x0080);
    pub const WE_HAVE_INSTRUCTIONS: Self = Self(0x0100);

    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// The 2x2 transform of a composite component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    pub xx: F2Dot14,
    pub yx: F2Dot14,
    pub xy: F2Dot14,
    pub yy: F2Dot14,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            xx: F2Dot14::from_bits(16384),
            yx: F2Dot14::from_bits(0),
            xy: F2Dot14::from_bits(0),
            yy: F2Dot14::from_bits(16384),
        }
    }
}

/// A reference to another glyph within a composite glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub flags: CompositeGlyphFlags,
    pub glyph: GlyphId,
    /// Translation of the component, in font units.
    ///
    /// Zero when the component is anchored by point matching, which is
    /// not supported.
    pub dx: i16,
    pub dy: i16,
    pub transform: Transform,
}

/// A glyph assembled from other glyphs.
#[derive(Clone)]
pub struct CompositeGlyph<'a> {
    data: FontData<'a>,
}

impl<'a> CompositeGlyph<'a> {
    /// Returns an iterator over the components of the composite glyph.
    pub fn components(&self) -> impl Iterator<Item = Component> + 'a + Clone {
        ComponentIter {
            done: false,
            cursor: self
                .data
                .split_off(10)
                .unwrap_or_else(|| FontData::new(&[]))
                .cursor(),
        }
    }
}

#[derive(Clone)]
struct ComponentIter<'a> {
    done: bool,
    cursor: Cursor<'a>,
}

impl Iterator for ComponentIter<'_> {
    type Item = Component;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let flags = CompositeGlyphFlags::from_bits_truncate(self.cursor.read::<u16>().ok()?);
        let glyph = self.cursor.read::<GlyphId>().ok()?;
        let args_are_words = flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS);
        let args_are_xy_values = flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES);
        let (dx, dy) = match (args_are_xy_values, args_are_words) {
            (true, true) => (
                self.cursor.read::<i16>().ok()?,
                self.cursor.read::<i16>().ok()?,
            ),
            (true, false) => (
                self.cursor.read::<i8>().ok()? as i16,
                self.cursor.read::<i8>().ok()? as i16,
            ),
            // point-matching anchors: consume the arguments, keep the
            // component untranslated
            (false, true) => {
                self.cursor.advance_by(4);
                (0, 0)
            }
            (false, false) => {
                self.cursor.advance_by(2);
                (0, 0)
            }
        };
        let mut transform = Transform::default();
        if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            transform.xx = self.cursor.read().ok()?;
            transform.yy = transform.xx;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            transform.xx = self.cursor.read().ok()?;
            transform.yy = self.cursor.read().ok()?;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            transform.xx = self.cursor.read().ok()?;
            transform.yx = self.cursor.read().ok()?;
            transform.xy = self.cursor.read().ok()?;
            transform.yy = self.cursor.read().ok()?;
        }
        self.done = !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS);
        Some(Component {
            flags,
            glyph,
            dx,
            dy,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    #[test]
    fn simple_glyph_points() {
        let buf = font_test_data::square_glyph_data();
        let Glyph::Simple(glyph) = Glyph::read(FontData::new(&buf)).unwrap() else {
            panic!("expected a simple glyph");
        };
        assert_eq!(glyph.number_of_contours(), 1);
        assert_eq!(glyph.num_points(), 4);
        let points = glyph.read_points().unwrap();
        assert_eq!(
            points,
            [
                CurvePoint::on_curve(100, 100),
                CurvePoint::on_curve(600, 100),
                CurvePoint::on_curve(600, 600),
                CurvePoint::on_curve(100, 600),
            ]
        );
    }

    #[test]
    fn repeat_flags_and_word_deltas() {
        let mut buf = BeBuffer::new();
        buf.push(1i16); // numberOfContours
        buf.extend([0i16; 4]); // bbox
        buf.push(2u16); // endPtsOfContours
        buf.push(0u16); // instructionLength
        // one flag with repeat covering all 3 points: on-curve, no short vectors
        buf.push(0x09u8);
        buf.push(2u8); // repeat count
        // x deltas: three words
        buf.extend([1000i16, -500, 250]);
        // y deltas
        buf.extend([-1i16, 2, -3]);
        let Glyph::Simple(glyph) = Glyph::read(FontData::new(&buf)).unwrap() else {
            panic!("expected a simple glyph");
        };
        let points = glyph.read_points().unwrap();
        assert_eq!(
            points,
            [
                CurvePoint::on_curve(1000, -1),
                CurvePoint::on_curve(500, 1),
                CurvePoint::on_curve(750, -2),
            ]
        );
    }

    #[test]
    fn truncated_coordinates_error() {
        let mut buf = BeBuffer::new();
        buf.push(1i16);
        buf.extend([0i16; 4]);
        buf.push(1u16); // two points
        buf.push(0u16);
        buf.push(0x01u8); // on curve, long x, long y
        buf.push(0x01u8);
        buf.push(7i16); // x0 only; everything else missing
        let Glyph::Simple(glyph) = Glyph::read(FontData::new(&buf)).unwrap() else {
            panic!("expected a simple glyph");
        };
        assert!(glyph.read_points().is_err());
    }

    #[test]
    fn composite_components() {
        let buf = font_test_data::diaeresis_composite_data();
        let Glyph::Composite(glyph) = Glyph::read(FontData::new(&buf)).unwrap() else {
            panic!("expected a composite glyph");
        };
        let components: Vec<_> = glyph.components().collect();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].glyph, GlyphId::new(1));
        assert_eq!((components[0].dx, components[0].dy), (0, 0));
        assert_eq!(components[1].glyph, GlyphId::new(2));
        assert_eq!((components[1].dx, components[1].dy), (50, 700));
        assert!(!components[1]
            .flags
            .contains(CompositeGlyphFlags::MORE_COMPONENTS));
    }

    #[test]
    fn two_by_two_transform() {
        let mut buf = BeBuffer::new();
        buf.push(-1i16);
        buf.extend([0i16; 4]);
        buf.push(0x0083u16); // words | xy values | 2x2
        buf.push(5u16); // glyph id
        buf.push(10i16);
        buf.push(-10i16);
        buf.extend([8192i16, 0, 0, -16384]); // 0.5, 0, 0, -1.0
        let Glyph::Composite(glyph) = Glyph::read(FontData::new(&buf)).unwrap() else {
            panic!("expected a composite glyph");
        };
        let component = glyph.components().next().unwrap();
        assert_eq!(component.transform.xx.to_f32(), 0.5);
        assert_eq!(component.transform.yy.to_f32(), -1.0);
    }
}
