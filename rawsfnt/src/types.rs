//! Scalar types used throughout the font file format.

use bytemuck::{Pod, Zeroable};

/// An OpenType tag.
///
/// A tag is a 4-byte array where each byte is within the printable ascii
/// range (0x20..=0x7E), used to identify tables, features, scripts and
/// languages.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#data-types>
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Creates a tag from a raw byte array.
    pub const fn new(src: &[u8; 4]) -> Self {
        Tag(*src)
    }

    /// Returns the tag as a byte array.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Returns the tag bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            // tags are ascii by convention but the input is untrusted
            let c = if byte.is_ascii() && !byte.is_ascii_control() {
                byte as char
            } else {
                '_'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag(\"{self}\")")
    }
}

/// A 16.16 fixed point value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Self = Fixed(0);
    pub const ONE: Self = Fixed(0x10000);

    /// Creates a fixed point value from its raw bit representation.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}

/// A 2.14 fixed point value, used by composite glyph transforms.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct F2Dot14(i16);

impl F2Dot14 {
    pub const fn from_bits(bits: i16) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> i16 {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 16384.0
    }
}

/// A font-internal glyph identifier.
///
/// Glyph 0 is the "missing glyph" by convention.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GlyphId(u16);

impl GlyphId {
    /// The identifier reserved for unknown glyphs.
    pub const NOTDEF: Self = GlyphId(0);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }

    pub const fn to_u32(self) -> u32 {
        self.0 as u32
    }
}

impl From<u16> for GlyphId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

/// A type that can be read from raw big-endian bytes.
pub trait Scalar: Sized + Copy {
    /// The size of the encoded value in the font file.
    const RAW_BYTE_LEN: usize;

    /// Reads a value from the start of `bytes`, returning `None` if there
    /// are not enough bytes.
    fn read(bytes: &[u8]) -> Option<Self>;
}

macro_rules! int_scalar {
    ($ty:ty) => {
        impl Scalar for $ty {
            const RAW_BYTE_LEN: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Option<Self> {
                Some(<$ty>::from_be_bytes(
                    bytes.get(..Self::RAW_BYTE_LEN)?.try_into().ok()?,
                ))
            }
        }
    };
}

int_scalar!(u8);
int_scalar!(i8);
int_scalar!(u16);
int_scalar!(i16);
int_scalar!(u32);
int_scalar!(i32);

impl Scalar for Tag {
    const RAW_BYTE_LEN: usize = 4;

    fn read(bytes: &[u8]) -> Option<Self> {
        Some(Tag(bytes.get(..4)?.try_into().ok()?))
    }
}

impl Scalar for Fixed {
    const RAW_BYTE_LEN: usize = 4;

    fn read(bytes: &[u8]) -> Option<Self> {
        i32::read(bytes).map(Fixed::from_bits)
    }
}

impl Scalar for F2Dot14 {
    const RAW_BYTE_LEN: usize = 2;

    fn read(bytes: &[u8]) -> Option<Self> {
        i16::read(bytes).map(F2Dot14::from_bits)
    }
}

impl Scalar for GlyphId {
    const RAW_BYTE_LEN: usize = 2;

    fn read(bytes: &[u8]) -> Option<Self> {
        u16::read(bytes).map(GlyphId::new)
    }
}

/// Raw big-endian `u16`, for zero-copy record arrays.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
#[repr(transparent)]
pub struct U16Be([u8; 2]);

impl U16Be {
    pub fn get(self) -> u16 {
        u16::from_be_bytes(self.0)
    }
}

/// Raw big-endian `i16`, for zero-copy record arrays.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
#[repr(transparent)]
pub struct I16Be([u8; 2]);

impl I16Be {
    pub fn get(self) -> i16 {
        i16::from_be_bytes(self.0)
    }
}

/// Raw big-endian `u32`, for zero-copy record arrays.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Pod, Zeroable)]
#[repr(transparent)]
pub struct U32Be([u8; 4]);

impl U32Be {
    pub fn get(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_display() {
        assert_eq!(Tag::new(b"glyf").to_string(), "glyf");
        assert_eq!(Tag::new(b"OS/2").to_string(), "OS/2");
    }

    #[test]
    fn scalar_reads_are_big_endian() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(u16::read(&bytes), Some(0x0102));
        assert_eq!(u32::read(&bytes), Some(0x01020304));
        assert_eq!(i16::read(&[0xFF, 0xFE]), Some(-2));
        assert_eq!(u32::read(&bytes[..3]), None);
    }

    #[test]
    fn f2dot14_units() {
        assert_eq!(F2Dot14::from_bits(16384).to_f32(), 1.0);
        assert_eq!(F2Dot14::from_bits(-16384).to_f32(), -1.0);
        assert_eq!(F2Dot14::from_bits(8192).to_f32(), 0.5);
    }

    #[test]
    fn fixed_units() {
        assert_eq!(Fixed::ONE.to_f32(), 1.0);
        assert_eq!(Fixed::from_bits(0x8000).to_f32(), 0.5);
    }
}
