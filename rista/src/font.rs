//! The font context: cached tables and the public query surface.

use rawsfnt::tables::gpos::Gpos;
use rawsfnt::tables::hhea::Hhea;
use rawsfnt::tables::hmtx::{self, Hmtx};
use rawsfnt::tables::kern::Kern;
use rawsfnt::tables::svg::Svg;
use rawsfnt::tables::{glyf, head};
use rawsfnt::types::GlyphId;
use rawsfnt::{FileRef, FontRef, TableProvider};

use crate::bitmap::{Bitmap, BitmapSlice};
use crate::charmap::Charmap;
use crate::outline::cff::{BoundsSink, Outlines as CffOutlines};
use crate::outline::glyf::GlyfOutlines;
use crate::outline::Vertex;
use crate::{raster, sdf};

/// Flatness passed to the rasterizer, in pixels.
const FLATNESS_IN_PIXELS: f32 = 0.35;

/// A glyph's advance width and left side bearing, in font units.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct HMetrics {
    pub advance_width: i32,
    pub left_side_bearing: i32,
}

/// Font-wide vertical metrics, in font units.
///
/// `ascent - descent` spans the nominal line box; `line_gap` is the
/// recommended extra space between lines (descent is negative below the
/// baseline).
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct VMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub line_gap: i32,
}

/// An axis-aligned bounding box. For boxes in font units y grows upward;
/// for bitmap boxes y grows downward.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct BBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

enum OutlineSource<'a> {
    Glyf(GlyfOutlines<'a>),
    Cff(CffOutlines<'a>),
}

/// An immutable view of one font inside a caller-supplied byte buffer.
///
/// Construction resolves and validates every table the queries need;
/// afterwards the context is a value-like handle that can be queried
/// freely (and from multiple threads) without further coordination. The
/// buffer is borrowed and must outlive the context.
pub struct Font<'a> {
    font: FontRef<'a>,
    charmap: Charmap<'a>,
    head: head::Head<'a>,
    hhea: Hhea<'a>,
    hmtx: Hmtx<'a>,
    num_glyphs: u16,
    outlines: OutlineSource<'a>,
    kern: Option<Kern<'a>>,
    gpos: Option<Gpos<'a>>,
    svg: Option<Svg<'a>>,
}

/// Returns the number of fonts in a buffer: 1 for a plain sfnt, the
/// member count for a collection, 0 for anything unrecognized.
pub fn number_of_fonts(buffer: &[u8]) -> u32 {
    FileRef::new(buffer).map(|file| file.len()).unwrap_or(0)
}

/// Returns the byte offset of the table directory for collection member
/// `index` (0 for a plain sfnt with `index` 0).
pub fn font_offset_for_index(buffer: &[u8], index: u32) -> Option<u32> {
    match FileRef::new(buffer).ok()? {
        FileRef::Font(_) => (index == 0).then_some(0),
        FileRef::Collection(collection) => collection.offset(index).ok(),
    }
}

impl<'a> Font<'a> {
    /// Creates a context for a single font starting at the beginning of
    /// the buffer.
    ///
    /// Returns `None` when the buffer is not a recognizable sfnt, when a
    /// mandatory table (`cmap`, `head`, `hhea`, `hmtx`, and `glyf` +
    /// `loca` or `CFF `) is missing or malformed, or when no supported
    /// `cmap` subtable exists.
    pub fn new(buffer: &'a [u8]) -> Option<Self> {
        Self::from_font_ref(FontRef::new(buffer).ok()?)
    }

    /// Creates a context for the font whose table directory starts at
    /// `font_offset`, as returned by [`font_offset_for_index`].
    pub fn with_offset(buffer: &'a [u8], font_offset: u32) -> Option<Self> {
        Self::from_font_ref(FontRef::with_offset(buffer, font_offset).ok()?)
    }

    /// Creates a context for font `index` of a collection (or a single
    /// font when `index` is 0).
    pub fn from_index(buffer: &'a [u8], index: u32) -> Option<Self> {
        Self::from_font_ref(FontRef::from_index(buffer, index).ok()?)
    }

    fn from_font_ref(font: FontRef<'a>) -> Option<Self> {
        let head = font.head().ok()?;
        let hhea = font.hhea().ok()?;
        let charmap = Charmap::new(&font.cmap().ok()?)?;
        // maxp is technically optional; without it every glyph id is
        // assumed addressable
        let num_glyphs = font.maxp().map(|maxp| maxp.num_glyphs()).unwrap_or(0xFFFF);
        let hmtx_data = font.expect_data_for_tag(hmtx::TAG).ok()?;
        let hmtx = Hmtx::read(hmtx_data, hhea.number_of_h_metrics(), num_glyphs).ok()?;
        let outlines = if let Ok(glyf) = font.glyf() {
            // only the short and long index formats exist
            if !matches!(head.index_to_loc_format(), 0 | 1) {
                return None;
            }
            let loca = font.loca(head.index_to_loc_format() == 1).ok()?;
            OutlineSource::Glyf(GlyfOutlines {
                loca,
                glyf,
                num_glyphs,
            })
        } else {
            OutlineSource::Cff(CffOutlines::new(font.cff().ok()?).ok()?)
        };
        Some(Font {
            charmap,
            head,
            hhea,
            hmtx,
            num_glyphs,
            outlines,
            kern: font.kern().ok(),
            gpos: font.gpos().ok(),
            svg: font.svg().ok(),
            font,
        })
    }

    /// The number of glyphs in the font.
    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// Access to the underlying table provider, for queries this crate
    /// does not wrap.
    pub fn font_ref(&self) -> &FontRef<'a> {
        &self.font
    }

    // --- character mapping ---------------------------------------------

    /// Maps a Unicode codepoint to a glyph identifier, 0 when the font
    /// has no glyph for it.
    pub fn glyph_index(&self, codepoint: u32) -> GlyphId {
        let glyph = self.charmap.glyph_index(codepoint);
        if glyph.to_u16() >= self.num_glyphs {
            GlyphId::NOTDEF
        } else {
            glyph
        }
    }

    // --- metrics -------------------------------------------------------

    /// Per-glyph horizontal metrics from `hmtx`.
    pub fn glyph_h_metrics(&self, glyph_id: GlyphId) -> HMetrics {
        HMetrics {
            advance_width: self.hmtx.advance(glyph_id.to_u16()) as i32,
            left_side_bearing: self.hmtx.side_bearing(glyph_id.to_u16()) as i32,
        }
    }

    /// The pair-kerning adjustment to the advance between two glyphs.
    ///
    /// `GPOS` pair positioning is preferred; the legacy `kern` table is
    /// the fallback. 0 when the pair is not kerned.
    pub fn glyph_kern_advance(&self, left: GlyphId, right: GlyphId) -> i32 {
        if let Some(gpos) = &self.gpos {
            return gpos
                .pair_x_advance(left.to_u16(), right.to_u16())
                .unwrap_or(0) as i32;
        }
        self.kern
            .as_ref()
            .map(|kern| kern.kern_advance(left.to_u16(), right.to_u16()) as i32)
            .unwrap_or(0)
    }

    /// Vertical metrics from `hhea`.
    pub fn font_v_metrics(&self) -> VMetrics {
        VMetrics {
            ascent: self.hhea.ascender() as i32,
            descent: self.hhea.descender() as i32,
            line_gap: self.hhea.line_gap() as i32,
        }
    }

    /// Typographic vertical metrics from `OS/2`, when the table exists.
    pub fn font_v_metrics_os2(&self) -> Option<VMetrics> {
        let os2 = self.font.os2().ok()?;
        Some(VMetrics {
            ascent: os2.s_typo_ascender() as i32,
            descent: os2.s_typo_descender() as i32,
            line_gap: os2.s_typo_line_gap() as i32,
        })
    }

    /// The font-wide bounding box from `head`, in font units.
    pub fn font_bounding_box(&self) -> BBox {
        BBox {
            x0: self.head.x_min() as i32,
            y0: self.head.y_min() as i32,
            x1: self.head.x_max() as i32,
            y1: self.head.y_max() as i32,
        }
    }

    /// The scale factor that makes `ascent - descent` span `pixels`.
    pub fn scale_for_pixel_height(&self, pixels: f32) -> f32 {
        let font_height = self.hhea.ascender() as i32 - self.hhea.descender() as i32;
        pixels / font_height as f32
    }

    /// The scale factor that maps one em to `pixels`.
    pub fn scale_for_em_to_pixels(&self, pixels: f32) -> f32 {
        pixels / self.head.units_per_em() as f32
    }

    // --- outlines ------------------------------------------------------

    /// Decodes a glyph outline into a vertex stream.
    ///
    /// Returns an empty vector for empty, out-of-range and malformed
    /// glyphs; the context remains usable either way.
    pub fn glyph_shape(&self, glyph_id: GlyphId) -> Vec<Vertex> {
        match &self.outlines {
            OutlineSource::Glyf(outlines) => {
                outlines.glyph_shape(glyph_id.to_u16()).unwrap_or_default()
            }
            OutlineSource::Cff(outlines) => {
                outlines.glyph_shape(glyph_id.to_u16()).unwrap_or_default()
            }
        }
    }

    /// True when the glyph has no outline (like a space).
    pub fn is_glyph_empty(&self, glyph_id: GlyphId) -> bool {
        match &self.outlines {
            OutlineSource::Glyf(outlines) => match outlines.glyph(glyph_id.to_u16()) {
                Some(glyf::Glyph::Simple(glyph)) => glyph.number_of_contours() == 0,
                Some(glyf::Glyph::Composite(_)) => false,
                None => true,
            },
            OutlineSource::Cff(outlines) => {
                let mut bounds = BoundsSink::default();
                outlines.draw(glyph_id.to_u16(), &mut bounds).is_err() || bounds.is_empty()
            }
        }
    }

    /// The glyph's bounding box in font units, `None` when it has none.
    pub fn glyph_box(&self, glyph_id: GlyphId) -> Option<BBox> {
        match &self.outlines {
            OutlineSource::Glyf(outlines) => {
                let glyph = outlines.glyph(glyph_id.to_u16())?;
                Some(BBox {
                    x0: glyph.x_min() as i32,
                    y0: glyph.y_min() as i32,
                    x1: glyph.x_max() as i32,
                    y1: glyph.y_max() as i32,
                })
            }
            OutlineSource::Cff(outlines) => {
                let mut bounds = BoundsSink::default();
                outlines.draw(glyph_id.to_u16(), &mut bounds).ok()?;
                if bounds.is_empty() {
                    return None;
                }
                Some(BBox {
                    x0: bounds.min_x,
                    y0: bounds.min_y,
                    x1: bounds.max_x,
                    y1: bounds.max_y,
                })
            }
        }
    }

    // --- rasterization -------------------------------------------------

    /// The pixel rectangle a glyph occupies when rendered at the given
    /// scale and subpixel shift.
    ///
    /// Output is y-down: the glyph's top (max y in font units) maps to
    /// the box's `y0`. An empty glyph yields the zero box.
    pub fn glyph_bitmap_box(
        &self,
        glyph_id: GlyphId,
        scale_x: f32,
        scale_y: f32,
        shift_x: f32,
        shift_y: f32,
    ) -> BBox {
        match self.glyph_box(glyph_id) {
            Some(bounds) => BBox {
                x0: (bounds.x0 as f32 * scale_x + shift_x).floor() as i32,
                y0: (-bounds.y1 as f32 * scale_y + shift_y).floor() as i32,
                x1: (bounds.x1 as f32 * scale_x + shift_x).ceil() as i32,
                y1: (-bounds.y0 as f32 * scale_y + shift_y).ceil() as i32,
            },
            None => BBox::default(),
        }
    }

    /// Rasterizes a glyph into a freshly allocated coverage bitmap.
    ///
    /// The bitmap is exactly the size of
    /// [`glyph_bitmap_box`](Self::glyph_bitmap_box) and carries its
    /// placement in `left`/`top`. Empty glyphs produce an empty bitmap.
    pub fn render_glyph_bitmap(
        &self,
        glyph_id: GlyphId,
        mut scale_x: f32,
        mut scale_y: f32,
        shift_x: f32,
        shift_y: f32,
    ) -> Bitmap {
        if scale_x == 0.0 {
            scale_x = scale_y;
        }
        if scale_y == 0.0 {
            if scale_x == 0.0 {
                return Bitmap::empty();
            }
            scale_y = scale_x;
        }
        let bounds = self.glyph_bitmap_box(glyph_id, scale_x, scale_y, shift_x, shift_y);
        let width = (bounds.x1 - bounds.x0).max(0) as usize;
        let height = (bounds.y1 - bounds.y0).max(0) as usize;
        if width == 0 || height == 0 {
            return Bitmap::empty();
        }
        let mut bitmap = Bitmap {
            left: bounds.x0,
            top: bounds.y0,
            width: width as u32,
            height: height as u32,
            pixels: vec![0; width * height],
        };
        let vertices = self.glyph_shape(glyph_id);
        let mut slice = BitmapSlice::new(&mut bitmap.pixels, width, height, width);
        raster::rasterize(
            &mut slice,
            FLATNESS_IN_PIXELS,
            &vertices,
            scale_x,
            scale_y,
            shift_x,
            shift_y,
            bounds.x0,
            bounds.y0,
            true,
        );
        bitmap
    }

    /// Rasterizes a glyph into caller storage of `width` x `height`
    /// pixels with `stride` bytes between rows, clipping to what fits.
    #[allow(clippy::too_many_arguments)]
    pub fn render_glyph_bitmap_into(
        &self,
        output: &mut [u8],
        width: usize,
        height: usize,
        stride: usize,
        glyph_id: GlyphId,
        scale_x: f32,
        scale_y: f32,
        shift_x: f32,
        shift_y: f32,
    ) {
        let bounds = self.glyph_bitmap_box(glyph_id, scale_x, scale_y, shift_x, shift_y);
        let vertices = self.glyph_shape(glyph_id);
        let mut slice = BitmapSlice::new(output, width, height, stride);
        if slice.width == 0 || slice.height == 0 {
            return;
        }
        raster::rasterize(
            &mut slice,
            FLATNESS_IN_PIXELS,
            &vertices,
            scale_x,
            scale_y,
            shift_x,
            shift_y,
            bounds.x0,
            bounds.y0,
            true,
        );
    }

    /// Computes a signed distance field for a glyph at a uniform scale.
    ///
    /// The output box is the glyph's bitmap box grown by `padding` on
    /// every side; `None` for empty glyphs. Values above `onedge_value`
    /// are inside the outline.
    pub fn glyph_sdf(
        &self,
        glyph_id: GlyphId,
        scale: f32,
        padding: i32,
        onedge_value: u8,
        pixel_dist_scale: f32,
    ) -> Option<Bitmap> {
        if scale == 0.0 {
            return None;
        }
        let bounds = self.glyph_bitmap_box(glyph_id, scale, scale, 0.0, 0.0);
        let vertices = self.glyph_shape(glyph_id);
        sdf::glyph_sdf(
            &vertices,
            (bounds.x0, bounds.y0, bounds.x1, bounds.y1),
            scale,
            padding,
            onedge_value,
            pixel_dist_scale,
        )
    }

    // --- svg -----------------------------------------------------------

    /// Returns the raw SVG document covering a glyph, when the font has
    /// an `SVG ` table. The content is an opaque (possibly compressed)
    /// blob.
    pub fn glyph_svg(&self, glyph_id: GlyphId) -> Option<&'a [u8]> {
        self.svg.as_ref()?.glyph_document(glyph_id.to_u16())
    }

    // --- codepoint convenience wrappers --------------------------------

    pub fn codepoint_h_metrics(&self, codepoint: u32) -> HMetrics {
        self.glyph_h_metrics(self.glyph_index(codepoint))
    }

    pub fn codepoint_kern_advance(&self, left: u32, right: u32) -> i32 {
        if self.kern.is_none() && self.gpos.is_none() {
            // skip both codepoint lookups when no kerning data exists
            return 0;
        }
        self.glyph_kern_advance(self.glyph_index(left), self.glyph_index(right))
    }

    pub fn codepoint_shape(&self, codepoint: u32) -> Vec<Vertex> {
        self.glyph_shape(self.glyph_index(codepoint))
    }

    pub fn codepoint_box(&self, codepoint: u32) -> Option<BBox> {
        self.glyph_box(self.glyph_index(codepoint))
    }

    pub fn codepoint_bitmap_box(
        &self,
        codepoint: u32,
        scale_x: f32,
        scale_y: f32,
        shift_x: f32,
        shift_y: f32,
    ) -> BBox {
        self.glyph_bitmap_box(self.glyph_index(codepoint), scale_x, scale_y, shift_x, shift_y)
    }

    pub fn render_codepoint_bitmap(
        &self,
        codepoint: u32,
        scale_x: f32,
        scale_y: f32,
        shift_x: f32,
        shift_y: f32,
    ) -> Bitmap {
        self.render_glyph_bitmap(self.glyph_index(codepoint), scale_x, scale_y, shift_x, shift_y)
    }

    pub fn codepoint_sdf(
        &self,
        codepoint: u32,
        scale: f32,
        padding: i32,
        onedge_value: u8,
        pixel_dist_scale: f32,
    ) -> Option<Bitmap> {
        self.glyph_sdf(
            self.glyph_index(codepoint),
            scale,
            padding,
            onedge_value,
            pixel_dist_scale,
        )
    }

    pub fn codepoint_svg(&self, codepoint: u32) -> Option<&'a [u8]> {
        self.glyph_svg(self.glyph_index(codepoint))
    }
}
