//! The [OS/2](https://learn.microsoft.com/en-us/typography/opentype/spec/os2) table.

use crate::types::Tag;
use crate::{FontData, FontRead, ReadError};

pub const TAG: Tag = Tag::new(b"OS/2");

/// The OS/2 and Windows metrics table.
///
/// Only the typographic line metrics are consumed here.
#[derive(Clone)]
pub struct Os2<'a> {
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for Os2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        // through sTypoLineGap
        if data.len() < 74 {
            return Err(ReadError::OutOfBounds);
        }
        Ok(Os2 { data })
    }
}

impl<'a> Os2<'a> {
    pub fn s_typo_ascender(&self) -> i16 {
        self.data.read_at(68).unwrap_or_default()
    }

    pub fn s_typo_descender(&self) -> i16 {
        self.data.read_at(70).unwrap_or_default()
    }

    pub fn s_typo_line_gap(&self) -> i16 {
        self.data.read_at(72).unwrap_or_default()
    }
}
