//! Tessellation of outlines into contour point lists.

use crate::outline::{Vertex, VertexKind};

/// Subdivision stops at this depth, bounding the work a hostile curve
/// can demand (2^16 segments per curve).
const MAX_SUBDIVISION_DEPTH: u32 = 16;

#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub(crate) struct Point {
    pub x: f32,
    pub y: f32,
}

pub(crate) fn point(x: f32, y: f32) -> Point {
    Point { x, y }
}

/// The flattened form of a glyph outline: all contour points back to
/// back, with a parallel list of per-contour point counts.
#[derive(Default)]
pub(crate) struct Contours {
    pub points: Vec<Point>,
    pub lengths: Vec<usize>,
}

/// Flattens every curve in the outline to line segments such that the
/// deviation from the true curve stays within `objspace_flatness` (in
/// font units).
pub(crate) fn flatten_curves(vertices: &[Vertex], objspace_flatness: f32) -> Contours {
    let flatness_squared = objspace_flatness * objspace_flatness;
    let mut contours = Contours::default();
    let mut contour_start = 0usize;
    let (mut x, mut y) = (0.0f32, 0.0f32);

    let mut close_contour = |contours: &mut Contours, contour_start: &mut usize| {
        let len = contours.points.len() - *contour_start;
        if len > 0 {
            contours.lengths.push(len);
        }
        *contour_start = contours.points.len();
    };

    for vertex in vertices {
        match vertex.kind {
            VertexKind::MoveTo => {
                close_contour(&mut contours, &mut contour_start);
                x = vertex.x as f32;
                y = vertex.y as f32;
                contours.points.push(point(x, y));
            }
            VertexKind::LineTo => {
                x = vertex.x as f32;
                y = vertex.y as f32;
                contours.points.push(point(x, y));
            }
            VertexKind::QuadTo => {
                tessellate_quad(
                    &mut contours.points,
                    point(x, y),
                    point(vertex.cx as f32, vertex.cy as f32),
                    point(vertex.x as f32, vertex.y as f32),
                    flatness_squared,
                    0,
                );
                x = vertex.x as f32;
                y = vertex.y as f32;
            }
            VertexKind::CubicTo => {
                tessellate_cubic(
                    &mut contours.points,
                    point(x, y),
                    point(vertex.cx as f32, vertex.cy as f32),
                    point(vertex.cx1 as f32, vertex.cy1 as f32),
                    point(vertex.x as f32, vertex.y as f32),
                    flatness_squared,
                    0,
                );
                x = vertex.x as f32;
                y = vertex.y as f32;
            }
        }
    }
    close_contour(&mut contours, &mut contour_start);
    contours
}

/// Recursively subdivides a quadratic until the midpoint of the curve is
/// within tolerance of the chord midpoint, then emits the endpoint.
fn tessellate_quad(
    points: &mut Vec<Point>,
    p0: Point,
    p1: Point,
    p2: Point,
    flatness_squared: f32,
    depth: u32,
) {
    // midpoint of the curve at t = 0.5
    let mx = (p0.x + 2.0 * p1.x + p2.x) / 4.0;
    let my = (p0.y + 2.0 * p1.y + p2.y) / 4.0;
    // deviation from the chord midpoint
    let dx = (p0.x + p2.x) / 2.0 - mx;
    let dy = (p0.y + p2.y) / 2.0 - my;
    if depth > MAX_SUBDIVISION_DEPTH {
        return;
    }
    if dx * dx + dy * dy > flatness_squared {
        let m = point(mx, my);
        tessellate_quad(
            points,
            p0,
            point((p0.x + p1.x) / 2.0, (p0.y + p1.y) / 2.0),
            m,
            flatness_squared,
            depth + 1,
        );
        tessellate_quad(
            points,
            m,
            point((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0),
            p2,
            flatness_squared,
            depth + 1,
        );
    } else {
        points.push(p2);
    }
}

/// Recursively subdivides a cubic at its de Casteljau midpoints.
///
/// Flatness is judged by how much longer the control polygon is than the
/// chord, which is zero exactly when the curve is a straight line.
fn tessellate_cubic(
    points: &mut Vec<Point>,
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    flatness_squared: f32,
    depth: u32,
) {
    let long_len = hypot(p1.x - p0.x, p1.y - p0.y)
        + hypot(p2.x - p1.x, p2.y - p1.y)
        + hypot(p3.x - p2.x, p3.y - p2.y);
    let short_len = hypot(p3.x - p0.x, p3.y - p0.y);
    let deviation_squared = long_len * long_len - short_len * short_len;

    if depth > MAX_SUBDIVISION_DEPTH {
        return;
    }
    if deviation_squared > flatness_squared {
        let p01 = midpoint(p0, p1);
        let p12 = midpoint(p1, p2);
        let p23 = midpoint(p2, p3);
        let pa = midpoint(p01, p12);
        let pb = midpoint(p12, p23);
        let m = midpoint(pa, pb);
        tessellate_cubic(points, p0, p01, pa, m, flatness_squared, depth + 1);
        tessellate_cubic(points, m, pb, p23, p3, flatness_squared, depth + 1);
    } else {
        points.push(p3);
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn hypot(x: f32, y: f32) -> f32 {
    (x * x + y * y).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Vertex;

    #[test]
    fn lines_pass_through() {
        let vertices = [
            Vertex::move_to(0, 0),
            Vertex::line_to(10, 0),
            Vertex::line_to(10, 10),
            Vertex::line_to(0, 0),
        ];
        let contours = flatten_curves(&vertices, 0.35);
        assert_eq!(contours.lengths, [4]);
        assert_eq!(contours.points.len(), 4);
        assert_eq!(contours.points[0], point(0.0, 0.0));
        assert_eq!(contours.points[3], point(0.0, 0.0));
    }

    #[test]
    fn multiple_contours_are_separated() {
        let vertices = [
            Vertex::move_to(0, 0),
            Vertex::line_to(4, 0),
            Vertex::move_to(10, 10),
            Vertex::line_to(14, 10),
            Vertex::line_to(10, 14),
        ];
        let contours = flatten_curves(&vertices, 0.35);
        assert_eq!(contours.lengths, [2, 3]);
        assert_eq!(contours.points.len(), 5);
    }

    #[test]
    fn quads_are_subdivided_within_tolerance() {
        let vertices = [
            Vertex::move_to(0, 0),
            Vertex::quad_to(50, 100, 100, 0),
            Vertex::line_to(0, 0),
        ];
        let contours = flatten_curves(&vertices, 0.35);
        // a tall arch needs several segments at this tolerance
        assert!(contours.points.len() > 6);
        // every flattened point stays near the true curve
        for p in &contours.points {
            // the curve is y = 2t(1-t) * 100 at x = 100t
            let t = p.x / 100.0;
            let expected = 200.0 * t * (1.0 - t);
            assert!((p.y - expected).abs() <= 1.0, "{p:?} vs y={expected}");
        }
        let last = contours.points[contours.points.len() - 1];
        assert_eq!(last, point(0.0, 0.0));
    }

    #[test]
    fn cubics_terminate_on_degenerate_input() {
        // all control points coincident with the endpoints
        let vertices = [
            Vertex::move_to(0, 0),
            Vertex::cubic_to(0, 0, 7, 7, 7, 7),
        ];
        let contours = flatten_curves(&vertices, 0.35);
        assert_eq!(contours.lengths, [2]);
    }

    #[test]
    fn tight_tolerance_gives_more_segments() {
        let vertices = [Vertex::move_to(0, 0), Vertex::quad_to(50, 100, 100, 0)];
        let coarse = flatten_curves(&vertices, 5.0).points.len();
        let fine = flatten_curves(&vertices, 0.1).points.len();
        assert!(fine > coarse);
    }
}
