//! TrueType (`glyf`) outline extraction.

use rawsfnt::tables::glyf::{CurvePoint, Glyf, Glyph, SimpleGlyph};
use rawsfnt::tables::loca::Loca;
use rawsfnt::ReadError;

use super::{Vertex, VertexKind};

/// Upper bound on composite nesting. Legitimate fonts nest a handful of
/// levels; a malformed font can reference itself.
const COMPONENT_DEPTH_LIMIT: u32 = 64;

pub(crate) struct GlyfOutlines<'a> {
    pub loca: Loca<'a>,
    pub glyf: Glyf<'a>,
    pub num_glyphs: u16,
}

impl<'a> GlyfOutlines<'a> {
    /// Returns the glyph record, or `None` for empty and out-of-range
    /// glyphs.
    pub fn glyph(&self, glyph_id: u16) -> Option<Glyph<'a>> {
        if glyph_id >= self.num_glyphs {
            return None;
        }
        let range = self.loca.glyph_range(glyph_id)?;
        self.glyf.glyph(range).ok()
    }

    /// Decodes the outline of a glyph into a vertex stream.
    ///
    /// Composite glyphs are flattened recursively: each component is
    /// decoded, transformed and concatenated in order.
    pub fn glyph_shape(&self, glyph_id: u16) -> Result<Vec<Vertex>, ReadError> {
        let mut vertices = Vec::new();
        self.append_glyph_shape(glyph_id, 0, &mut vertices)?;
        Ok(vertices)
    }

    fn append_glyph_shape(
        &self,
        glyph_id: u16,
        depth: u32,
        vertices: &mut Vec<Vertex>,
    ) -> Result<(), ReadError> {
        if depth > COMPONENT_DEPTH_LIMIT {
            return Err(ReadError::MalformedData("composite glyph nesting too deep"));
        }
        let Some(glyph) = self.glyph(glyph_id) else {
            return Ok(());
        };
        match glyph {
            Glyph::Simple(glyph) => {
                simple_glyph_shape(&glyph, vertices)?;
            }
            Glyph::Composite(glyph) => {
                for component in glyph.components() {
                    let start = vertices.len();
                    self.append_glyph_shape(component.glyph.to_u16(), depth + 1, vertices)?;
                    transform_component(&mut vertices[start..], &component);
                }
            }
        }
        Ok(())
    }
}

/// Applies a component's offset and 2x2 transform to freshly appended
/// vertices, using the same scale convention as Apple's rendering: each
/// axis is additionally scaled by the length of its basis column.
fn transform_component(vertices: &mut [Vertex], component: &rawsfnt::tables::glyf::Component) {
    let a = component.transform.xx.to_f32();
    let b = component.transform.yx.to_f32();
    let c = component.transform.xy.to_f32();
    let d = component.transform.yy.to_f32();
    let e = component.dx as f32;
    let f = component.dy as f32;
    let m = (a * a + b * b).sqrt();
    let n = (c * c + d * d).sqrt();
    let apply = |x: i16, y: i16| -> (i16, i16) {
        let (x, y) = (x as f32, y as f32);
        (
            (m * (a * x + c * y + e)) as i16,
            (n * (b * x + d * y + f)) as i16,
        )
    };
    for vertex in vertices {
        (vertex.x, vertex.y) = apply(vertex.x, vertex.y);
        (vertex.cx, vertex.cy) = apply(vertex.cx, vertex.cy);
        if vertex.kind == VertexKind::CubicTo {
            (vertex.cx1, vertex.cy1) = apply(vertex.cx1, vertex.cy1);
        }
    }
}

/// Converts the decoded point list into move/line/quad segments.
///
/// Off-curve points become quadratic controls; two adjacent off-curve
/// points imply an on-curve midpoint between them. A contour that starts
/// off-curve is rebased onto a synthesized start point.
fn simple_glyph_shape(glyph: &SimpleGlyph<'_>, vertices: &mut Vec<Vertex>) -> Result<(), ReadError> {
    let points = glyph.read_points()?;
    let end_pts = glyph.end_pts_of_contours()?;

    let mut contour_start = 0usize;
    for end in end_pts {
        let end = end.get() as usize;
        let contour = points
            .get(contour_start..end + 1)
            .ok_or(ReadError::MalformedData("contour points out of range"))?;
        contour_shape(contour, vertices);
        contour_start = end + 1;
    }
    Ok(())
}

fn contour_shape(contour: &[CurvePoint], vertices: &mut Vec<Vertex>) {
    if contour.is_empty() {
        return;
    }
    // establish the start point; when the contour opens off-curve the
    // real start is the midpoint to the next point (or the next point
    // itself when that one is on-curve)
    let first = contour[0];
    let start_off = !first.on_curve;
    let (sx, sy, skip_first);
    if start_off {
        match contour.get(1) {
            Some(next) if !next.on_curve => {
                sx = ((first.x as i32 + next.x as i32) >> 1) as i16;
                sy = ((first.y as i32 + next.y as i32) >> 1) as i16;
                skip_first = 1;
            }
            Some(next) => {
                sx = next.x;
                sy = next.y;
                skip_first = 2;
            }
            None => {
                sx = first.x;
                sy = first.y;
                skip_first = 1;
            }
        }
    } else {
        sx = first.x;
        sy = first.y;
        skip_first = 1;
    }
    vertices.push(Vertex::move_to(sx, sy));

    // pending off-curve control, if any
    let mut control: Option<(i16, i16)> = None;
    for point in &contour[skip_first..] {
        if !point.on_curve {
            if let Some((cx, cy)) = control {
                // two off-curve points in a row: implied on-curve midpoint
                vertices.push(Vertex::quad_to(
                    cx,
                    cy,
                    ((cx as i32 + point.x as i32) >> 1) as i16,
                    ((cy as i32 + point.y as i32) >> 1) as i16,
                ));
            }
            control = Some((point.x, point.y));
        } else {
            match control.take() {
                Some((cx, cy)) => vertices.push(Vertex::quad_to(cx, cy, point.x, point.y)),
                None => vertices.push(Vertex::line_to(point.x, point.y)),
            }
        }
    }

    // close back to the start, honoring any pending control and the
    // saved off-curve start point
    match (control, start_off) {
        (Some((cx, cy)), true) => {
            vertices.push(Vertex::quad_to(
                cx,
                cy,
                ((cx as i32 + first.x as i32) >> 1) as i16,
                ((cy as i32 + first.y as i32) >> 1) as i16,
            ));
            vertices.push(Vertex::quad_to(first.x, first.y, sx, sy));
        }
        (None, true) => vertices.push(Vertex::quad_to(first.x, first.y, sx, sy)),
        (Some((cx, cy)), false) => vertices.push(Vertex::quad_to(cx, cy, sx, sy)),
        (None, false) => vertices.push(Vertex::line_to(sx, sy)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawsfnt::tables::glyf::CurvePoint;

    fn shape(points: &[CurvePoint]) -> Vec<Vertex> {
        let mut vertices = Vec::new();
        contour_shape(points, &mut vertices);
        vertices
    }

    #[test]
    fn all_on_curve_is_a_polygon() {
        let vertices = shape(&[
            CurvePoint::on_curve(0, 0),
            CurvePoint::on_curve(10, 0),
            CurvePoint::on_curve(10, 10),
        ]);
        assert_eq!(
            vertices,
            [
                Vertex::move_to(0, 0),
                Vertex::line_to(10, 0),
                Vertex::line_to(10, 10),
                Vertex::line_to(0, 0),
            ]
        );
    }

    #[test]
    fn off_curve_becomes_quad() {
        let vertices = shape(&[
            CurvePoint::on_curve(0, 0),
            CurvePoint::off_curve(10, 0),
            CurvePoint::on_curve(10, 10),
        ]);
        assert_eq!(
            vertices,
            [
                Vertex::move_to(0, 0),
                Vertex::quad_to(10, 0, 10, 10),
                Vertex::line_to(0, 0),
            ]
        );
    }

    #[test]
    fn adjacent_off_curve_points_imply_midpoint() {
        let vertices = shape(&[
            CurvePoint::on_curve(0, 0),
            CurvePoint::off_curve(10, 0),
            CurvePoint::off_curve(10, 10),
            CurvePoint::on_curve(0, 10),
        ]);
        assert_eq!(
            vertices,
            [
                Vertex::move_to(0, 0),
                Vertex::quad_to(10, 0, 10, 5),
                Vertex::quad_to(10, 10, 0, 10),
                Vertex::line_to(0, 0),
            ]
        );
    }

    #[test]
    fn contour_starting_off_curve_synthesizes_start() {
        // off-curve start followed by an on-curve point: the on-curve
        // point becomes the start
        let vertices = shape(&[
            CurvePoint::off_curve(5, 5),
            CurvePoint::on_curve(10, 0),
            CurvePoint::on_curve(10, 10),
        ]);
        assert_eq!(
            vertices,
            [
                Vertex::move_to(10, 0),
                Vertex::line_to(10, 10),
                Vertex::quad_to(5, 5, 10, 0),
            ]
        );
    }

    #[test]
    fn contour_of_two_off_curve_points() {
        let vertices = shape(&[CurvePoint::off_curve(0, 0), CurvePoint::off_curve(10, 10)]);
        assert_eq!(
            vertices,
            [
                Vertex::move_to(5, 5),
                Vertex::quad_to(10, 10, 5, 5),
                Vertex::quad_to(0, 0, 5, 5),
            ]
        );
    }
}
