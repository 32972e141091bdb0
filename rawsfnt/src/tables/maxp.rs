//! The [maxp](https://learn.microsoft.com/en-us/typography/opentype/spec/maxp) table.

use crate::types::Tag;
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"maxp");

/// The maximum profile table. Only the glyph count is consumed here.
#[derive(Clone)]
pub struct Maxp<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Maxp<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        if data.len() < 6 {
            return Err(ReadError::OutOfBounds);
        }
        Ok(Maxp { data })
    }
}

impl<'a> Maxp<'a> {
    pub fn num_glyphs(&self) -> u16 {
        self.data.read_at(4).unwrap_or_default()
    }
}
