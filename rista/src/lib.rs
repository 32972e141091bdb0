//! Glyph rendering for TrueType and OpenType fonts.
//!
//! This crate sits on top of [`rawsfnt`] and turns parsed font tables
//! into usable artifacts:
//!
//! * glyph outlines as vertex streams ([`Font::glyph_shape`]),
//! * antialiased coverage bitmaps with subpixel positioning
//!   ([`Font::render_glyph_bitmap`]), computed by an analytic scanline
//!   rasterizer with exact trapezoid areas (no supersampling),
//! * signed distance fields ([`Font::glyph_sdf`]),
//! * glyph and font metrics, including `GPOS`/`kern` pair kerning.
//!
//! The entry point is [`Font`], an immutable view over a caller-supplied
//! byte buffer. The buffer is borrowed, never copied, and is assumed to
//! be untrusted: malformed data yields missing glyphs, empty shapes and
//! empty bitmaps, never memory unsafety or panics.
//!
//! ```no_run
//! # let buffer: Vec<u8> = Vec::new();
//! use rista::Font;
//! let font = Font::new(&buffer).expect("unreadable font");
//! let glyph = font.glyph_index('A' as u32);
//! let scale = font.scale_for_pixel_height(20.0);
//! let bitmap = font.render_glyph_bitmap(glyph, scale, scale, 0.0, 0.0);
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod bitmap;
mod charmap;
mod flatten;
mod font;
mod outline;
mod raster;
mod sdf;

pub use bitmap::Bitmap;
pub use font::{
    font_offset_for_index, number_of_fonts, BBox, Font, HMetrics, VMetrics,
};
pub use outline::{Vertex, VertexKind};

pub use rawsfnt::types::GlyphId;
