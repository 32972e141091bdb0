//! The [SVG](https://learn.microsoft.com/en-us/typography/opentype/spec/svg) table.
//!
//! Only the document list is indexed; document content is returned as an
//! opaque byte slice (it may be gzip-compressed per the spec).

use bytemuck::{Pod, Zeroable};

use crate::types::{Tag, U16Be, U32Be};
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"SVG ");

/// An entry in the SVG document list, covering an inclusive glyph range.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct SvgDocumentRecord {
    start_glyph_id: U16Be,
    end_glyph_id: U16Be,
    svg_doc_offset: U32Be,
    svg_doc_length: U32Be,
}

impl SvgDocumentRecord {
    pub fn start_glyph_id(&self) -> u16 {
        self.start_glyph_id.get()
    }

    pub fn end_glyph_id(&self) -> u16 {
        self.end_glyph_id.get()
    }
}

/// The SVG glyph definition table.
#[derive(Clone)]
pub struct Svg<'a> {
    document_list: FontData<'a>,
    records: &'a [SvgDocumentRecord],
}

impl<'a> FontRead<'a> for Svg<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let list_offset = data.read_at::<u32>(2)? as usize;
        let document_list = data.split_off(list_offset).ok_or(ReadError::OutOfBounds)?;
        let num_entries = document_list.read_at::<u16>(0)? as usize;
        let available =
            document_list.len().saturating_sub(2) / std::mem::size_of::<SvgDocumentRecord>();
        let records = document_list.read_array(2..2 + num_entries.min(available) * 12)?;
        Ok(Svg {
            document_list,
            records,
        })
    }
}

impl<'a> Svg<'a> {
    pub fn records(&self) -> &'a [SvgDocumentRecord] {
        self.records
    }

    /// Returns the raw SVG document covering `glyph_id`, if any.
    pub fn glyph_document(&self, glyph_id: u16) -> Option<&'a [u8]> {
        let record = self
            .records
            .iter()
            .find(|record| glyph_id >= record.start_glyph_id() && glyph_id <= record.end_glyph_id())?;
        let start = record.svg_doc_offset.get() as usize;
        let end = start.checked_add(record.svg_doc_length.get() as usize)?;
        self.document_list.slice(start..end).map(|data| data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::BeBuffer;

    #[test]
    fn document_lookup() {
        let doc = b"<svg>stub</svg>";
        let mut buf = BeBuffer::new();
        buf.push(0u16); // version
        buf.push(10u32); // documentListOffset
        buf.push(0u32); // reserved
        // document list with a single record for glyphs 3..=5
        buf.push(1u16);
        buf.push(3u16);
        buf.push(5u16);
        buf.push(14u32); // offset from list start
        buf.push(doc.len() as u32);
        buf.extend(*doc);
        let svg = Svg::read(FontData::new(&buf)).unwrap();
        assert!(svg.glyph_document(2).is_none());
        assert_eq!(svg.glyph_document(3), Some(doc.as_slice()));
        assert_eq!(svg.glyph_document(5), Some(doc.as_slice()));
        assert!(svg.glyph_document(6).is_none());
    }
}
