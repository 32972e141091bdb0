//! CFF (Type 2 charstring) outline extraction.

use rawsfnt::tables::cff::Cff;
use rawsfnt::tables::postscript::{charstring, dict, CommandSink, Error, FdSelect, Index};
use rawsfnt::{FontData, ReadError};

use super::Vertex;

/// Type for loading outlines from a `CFF ` table.
///
/// Parses the Top DICT once at construction and caches the structures
/// needed per glyph: the charstrings, global and local subroutines and,
/// for CID-keyed fonts, the FDArray/FDSelect pair used to route each
/// glyph to its font DICT.
pub(crate) struct Outlines<'a> {
    cff: Cff<'a>,
    charstrings: Index<'a>,
    /// Local subrs from the top-level Private DICT (non-CID fonts).
    subrs: Option<Index<'a>>,
    font_dicts: Index<'a>,
    fd_select: Option<FdSelect<'a>>,
}

impl<'a> Outlines<'a> {
    pub fn new(cff: Cff<'a>) -> Result<Self, Error> {
        let table = cff.offset_data();
        let mut charstrings_offset = 0usize;
        let mut charstring_type = 2i32;
        let mut private_range: Option<(usize, usize)> = None;
        let mut fd_array_offset = None;
        let mut fd_select_offset = None;
        for entry in dict::entries(FontData::new(cff.top_dict_data())) {
            match entry? {
                dict::Entry::CharstringsOffset(offset) => charstrings_offset = offset,
                dict::Entry::CharstringType(cstype) => charstring_type = cstype,
                dict::Entry::PrivateDictRange { offset, size } => {
                    private_range = Some((offset, size));
                }
                dict::Entry::FdArrayOffset(offset) => fd_array_offset = Some(offset),
                dict::Entry::FdSelectOffset(offset) => fd_select_offset = Some(offset),
                _ => {}
            }
        }
        if charstring_type != 2 {
            return Err(Error::CharstringTypeUnsupported(charstring_type));
        }
        if charstrings_offset == 0 {
            return Err(Error::MissingCharstrings);
        }
        let charstrings = index_at(table, charstrings_offset)?;
        let subrs = match private_range {
            Some(range) => private_subrs(table, range)?,
            None => None,
        };
        // FDArray and FDSelect travel together in a CID-keyed font
        let (font_dicts, fd_select) = match (fd_array_offset, fd_select_offset) {
            (Some(fd_array), Some(fd_select)) => (
                index_at(table, fd_array)?,
                Some(FdSelect::new(
                    table.split_off(fd_select).ok_or(ReadError::OutOfBounds)?,
                )?),
            ),
            (Some(_), None) => return Err(Error::Read(ReadError::MalformedData(
                "CID-keyed CFF without FDSelect",
            ))),
            _ => (Index::default(), None),
        };
        Ok(Outlines {
            cff,
            charstrings,
            subrs,
            font_dicts,
            fd_select,
        })
    }

    pub fn glyph_count(&self) -> u16 {
        self.charstrings.count()
    }

    /// Returns the local subroutines applicable to a glyph: routed
    /// through FDSelect for CID-keyed fonts, the top-level Private DICT
    /// subrs otherwise.
    fn glyph_subrs(&self, glyph_id: u16) -> Result<Option<Index<'a>>, Error> {
        let Some(fd_select) = &self.fd_select else {
            return Ok(self.subrs.clone());
        };
        let Some(fd) = fd_select.font_index(glyph_id) else {
            return Ok(None);
        };
        let font_dict = self.font_dicts.get(fd as usize)?;
        let mut private_range = None;
        for entry in dict::entries(FontData::new(font_dict)) {
            if let dict::Entry::PrivateDictRange { offset, size } = entry? {
                private_range = Some((offset, size));
                break;
            }
        }
        match private_range {
            Some(range) => private_subrs(self.cff.offset_data(), range),
            None => Ok(None),
        }
    }

    /// Evaluates the glyph's charstring into the given sink.
    pub fn draw(&self, glyph_id: u16, sink: &mut impl CommandSink) -> Result<(), Error> {
        let charstring = self.charstrings.get(glyph_id as usize)?;
        let subrs = self.glyph_subrs(glyph_id)?;
        charstring::evaluate(charstring, self.cff.global_subrs(), subrs.as_ref(), sink)
    }

    /// Decodes the glyph into a vertex stream, running the charstring
    /// once for bounds/validity and once for emission.
    pub fn glyph_shape(&self, glyph_id: u16) -> Result<Vec<Vertex>, Error> {
        let mut bounds = BoundsSink::default();
        self.draw(glyph_id, &mut bounds)?;
        let mut sink = VertexSink {
            vertices: Vec::with_capacity(bounds.vertex_count),
        };
        self.draw(glyph_id, &mut sink)?;
        Ok(sink.vertices)
    }
}

fn index_at<'a>(table: FontData<'a>, offset: usize) -> Result<Index<'a>, Error> {
    Index::new(table.split_off(offset).ok_or(ReadError::OutOfBounds)?)
}

/// Resolves the `Subrs` entry of a Private DICT at `(offset, size)`
/// within the table.
fn private_subrs<'a>(
    table: FontData<'a>,
    (offset, size): (usize, usize),
) -> Result<Option<Index<'a>>, Error> {
    if offset == 0 || size == 0 {
        return Ok(None);
    }
    let end = offset.checked_add(size).ok_or(ReadError::OutOfBounds)?;
    let private_dict = table.slice(offset..end).ok_or(ReadError::OutOfBounds)?;
    let mut subrs_offset = None;
    for entry in dict::entries(private_dict) {
        if let dict::Entry::SubrsOffset(subrs) = entry? {
            subrs_offset = Some(subrs);
            break;
        }
    }
    match subrs_offset {
        // the subrs offset is relative to the private dict itself
        Some(subrs) if subrs != 0 => index_at(table, offset + subrs).map(Some),
        _ => Ok(None),
    }
}

/// Sink that collects emitted commands as [`Vertex`] records.
pub(crate) struct VertexSink {
    pub vertices: Vec<Vertex>,
}

impl CommandSink for VertexSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.vertices.push(Vertex::move_to(x as i16, y as i16));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.vertices.push(Vertex::line_to(x as i16, y as i16));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.vertices.push(Vertex::cubic_to(
            cx0 as i16, cy0 as i16, cx1 as i16, cy1 as i16, x as i16, y as i16,
        ));
    }
}

/// Sink that tracks the extent of the evaluated path without storing it.
///
/// Control points participate in the tracked box, matching the bounds
/// used to size bitmaps for CFF glyphs.
#[derive(Default)]
pub(crate) struct BoundsSink {
    pub vertex_count: usize,
    started: bool,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundsSink {
    pub fn is_empty(&self) -> bool {
        !self.started
    }

    fn track(&mut self, x: f32, y: f32) {
        let (x, y) = (x as i32, y as i32);
        if !self.started || x > self.max_x {
            self.max_x = x;
        }
        if !self.started || y > self.max_y {
            self.max_y = y;
        }
        if !self.started || x < self.min_x {
            self.min_x = x;
        }
        if !self.started || y < self.min_y {
            self.min_y = y;
        }
        self.started = true;
    }
}

impl CommandSink for BoundsSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.vertex_count += 1;
        self.track(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.vertex_count += 1;
        self.track(x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.vertex_count += 1;
        self.track(cx0, cy0);
        self.track(cx1, cy1);
        self.track(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawsfnt::FontRead;

    fn outlines(table: &[u8]) -> Outlines<'_> {
        let cff = Cff::read(FontData::new(table)).unwrap();
        Outlines::new(cff).unwrap()
    }

    #[test]
    fn box_glyph_shape() {
        let table = font_test_data::cff_table();
        let outlines = outlines(&table);
        assert_eq!(outlines.glyph_count(), 2);
        let vertices = outlines.glyph_shape(1).unwrap();
        use crate::outline::Vertex as V;
        assert_eq!(
            vertices,
            [
                V::move_to(100, 100),
                V::line_to(300, 100),
                V::line_to(300, 300),
                V::line_to(100, 300),
                V::line_to(100, 100),
            ]
        );
    }

    #[test]
    fn bounds_match_shape() {
        let table = font_test_data::cff_table();
        let outlines = outlines(&table);
        let mut bounds = BoundsSink::default();
        outlines.draw(1, &mut bounds).unwrap();
        assert!(!bounds.is_empty());
        assert_eq!(
            (bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y),
            (100, 100, 300, 300)
        );
    }

    #[test]
    fn notdef_is_empty() {
        let table = font_test_data::cff_table();
        let outlines = outlines(&table);
        let mut bounds = BoundsSink::default();
        outlines.draw(0, &mut bounds).unwrap();
        assert!(bounds.is_empty());
    }
}
