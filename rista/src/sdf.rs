//! Signed distance field generation.
//!
//! Distances are measured against the unflattened outline: exact
//! point-to-line distance for straight segments and a cubic solve for
//! the closest point on each quadratic. Insideness comes from a
//! horizontal ray cast with signed crossings against the same segments.

use crate::bitmap::Bitmap;
use crate::outline::{Vertex, VertexKind};

/// Distance from singular values, in pixel-grid units.
const EPS: f32 = 1.0 / 1024.0;

/// Computes a signed distance field for the outline.
///
/// `bounds` is the unpadded bitmap box of the glyph at `scale`
/// (y-down); `padding` grows it uniformly. `onedge_value` is the output
/// value exactly on the outline and `pixel_dist_scale` converts pixel
/// distance to output units, positive inside.
pub(crate) fn glyph_sdf(
    vertices: &[Vertex],
    bounds: (i32, i32, i32, i32),
    scale: f32,
    padding: i32,
    onedge_value: u8,
    pixel_dist_scale: f32,
) -> Option<Bitmap> {
    if scale == 0.0 {
        return None;
    }
    let (ix0, iy0, ix1, iy1) = bounds;
    if ix0 == ix1 || iy0 == iy1 {
        return None;
    }
    let ix0 = ix0 - padding;
    let iy0 = iy0 - padding;
    let ix1 = ix1 + padding;
    let iy1 = iy1 + padding;
    if ix0 >= ix1 || iy0 >= iy1 {
        return None;
    }
    let w = (ix1 - ix0) as usize;
    let h = (iy1 - iy0) as usize;

    let scale_x = scale;
    // invert for y-downwards bitmaps
    let scale_y = -scale;

    // per-segment inverse lengths, to keep divisions out of the pixel loop
    let precompute: Vec<f32> = vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            let prev = if i > 0 { &vertices[i - 1] } else { vertex };
            match vertex.kind {
                VertexKind::LineTo => {
                    let x0 = vertex.x as f32 * scale_x;
                    let y0 = vertex.y as f32 * scale_y;
                    let x1 = prev.x as f32 * scale_x;
                    let y1 = prev.y as f32 * scale_y;
                    let dist = ((x1 - x0) * (x1 - x0) + (y1 - y0) * (y1 - y0)).sqrt();
                    if dist < EPS {
                        0.0
                    } else {
                        1.0 / dist
                    }
                }
                VertexKind::QuadTo => {
                    let x2 = prev.x as f32 * scale_x;
                    let y2 = prev.y as f32 * scale_y;
                    let x1 = vertex.cx as f32 * scale_x;
                    let y1 = vertex.cy as f32 * scale_y;
                    let x0 = vertex.x as f32 * scale_x;
                    let y0 = vertex.y as f32 * scale_y;
                    let bx = x0 - 2.0 * x1 + x2;
                    let by = y0 - 2.0 * y1 + y2;
                    let len2 = bx * bx + by * by;
                    if len2 >= EPS * EPS {
                        1.0 / len2
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            }
        })
        .collect();

    let mut pixels = vec![0u8; w * h];
    for y in iy0..iy1 {
        for x in ix0..ix1 {
            let sx = x as f32 + 0.5;
            let sy = y as f32 + 0.5;
            let x_gspace = sx / scale_x;
            let y_gspace = sy / scale_y;

            let winding = compute_crossings(x_gspace, y_gspace, vertices);
            let mut min_dist = 999999.0f32;

            for (i, vertex) in vertices.iter().enumerate() {
                let x0 = vertex.x as f32 * scale_x;
                let y0 = vertex.y as f32 * scale_y;
                match vertex.kind {
                    VertexKind::LineTo if precompute[i] != 0.0 => {
                        let Some(prev) = vertices.get(i.wrapping_sub(1)) else {
                            continue;
                        };
                        let x1 = prev.x as f32 * scale_x;
                        let y1 = prev.y as f32 * scale_y;

                        let dist2 = (x0 - sx) * (x0 - sx) + (y0 - sy) * (y0 - sy);
                        if dist2 < min_dist * min_dist {
                            min_dist = dist2.sqrt();
                        }

                        let dist =
                            ((x1 - x0) * (y0 - sy) - (y1 - y0) * (x0 - sx)).abs() * precompute[i];
                        if dist < min_dist {
                            // only accept the perpendicular distance when
                            // its foot lies within the segment
                            let dx = x1 - x0;
                            let dy = y1 - y0;
                            let px = x0 - sx;
                            let py = y0 - sy;
                            let t = -(px * dx + py * dy) / (dx * dx + dy * dy);
                            if (0.0..=1.0).contains(&t) {
                                min_dist = dist;
                            }
                        }
                    }
                    VertexKind::QuadTo => {
                        let Some(prev) = vertices.get(i.wrapping_sub(1)) else {
                            continue;
                        };
                        let x2 = prev.x as f32 * scale_x;
                        let y2 = prev.y as f32 * scale_y;
                        let x1 = vertex.cx as f32 * scale_x;
                        let y1 = vertex.cy as f32 * scale_y;
                        let box_x0 = x0.min(x1).min(x2);
                        let box_y0 = y0.min(y1).min(y2);
                        let box_x1 = x0.max(x1).max(x2);
                        let box_y1 = y0.max(y1).max(y2);
                        // coarse cull before the cubic solve
                        if sx > box_x0 - min_dist
                            && sx < box_x1 + min_dist
                            && sy > box_y0 - min_dist
                            && sy < box_y1 + min_dist
                        {
                            let ax = x1 - x0;
                            let ay = y1 - y0;
                            let bx = x0 - 2.0 * x1 + x2;
                            let by = y0 - 2.0 * y1 + y2;
                            let mx = x0 - sx;
                            let my = y0 - sy;
                            let mut res = [0.0f32; 3];
                            let num;
                            let a_inv = precompute[i];
                            if a_inv == 0.0 {
                                // degenerate: the cubic collapses to a
                                // quadratic (or linear) equation
                                let a = 3.0 * (ax * bx + ay * by);
                                let b = 2.0 * (ax * ax + ay * ay) + (mx * bx + my * by);
                                let c = mx * ax + my * ay;
                                if a.abs() < EPS * EPS {
                                    if b.abs() >= EPS * EPS {
                                        res[0] = -c / b;
                                        num = 1;
                                    } else {
                                        num = 0;
                                    }
                                } else {
                                    let discriminant = b * b - 4.0 * a * c;
                                    if discriminant < 0.0 {
                                        num = 0;
                                    } else {
                                        let root = discriminant.sqrt();
                                        res[0] = (-b - root) / (2.0 * a);
                                        res[1] = (-b + root) / (2.0 * a);
                                        num = 2;
                                    }
                                }
                            } else {
                                let b = 3.0 * (ax * bx + ay * by) * a_inv;
                                let c = (2.0 * (ax * ax + ay * ay) + (mx * bx + my * by)) * a_inv;
                                let d = (mx * ax + my * ay) * a_inv;
                                num = solve_cubic(b, c, d, &mut res);
                            }
                            let dist2 = (x0 - sx) * (x0 - sx) + (y0 - sy) * (y0 - sy);
                            if dist2 < min_dist * min_dist {
                                min_dist = dist2.sqrt();
                            }
                            for &t in res.iter().take(num) {
                                if (0.0..=1.0).contains(&t) {
                                    let it = 1.0 - t;
                                    let px = it * it * x0 + 2.0 * t * it * x1 + t * t * x2;
                                    let py = it * it * y0 + 2.0 * t * it * y1 + t * t * y2;
                                    let dist2 = (px - sx) * (px - sx) + (py - sy) * (py - sy);
                                    if dist2 < min_dist * min_dist {
                                        min_dist = dist2.sqrt();
                                    }
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            if winding == 0 {
                // outside the shape: negative distance
                min_dist = -min_dist;
            }
            let val = (onedge_value as f32 + pixel_dist_scale * min_dist).clamp(0.0, 255.0);
            pixels[((y - iy0) as usize) * w + (x - ix0) as usize] = val as u8;
        }
    }

    Some(Bitmap {
        left: ix0,
        top: iy0,
        width: w as u32,
        height: h as u32,
        pixels,
    })
}

/// Counts signed crossings of a leftward horizontal ray from `(x, y)`
/// with every line and quadratic segment, in glyph space.
fn compute_crossings(x: f32, mut y: f32, vertices: &[Vertex]) -> i32 {
    let mut winding = 0;

    // keep the ray away from vertices
    let y_frac = y % 1.0;
    if y_frac < 0.01 {
        y += 0.01;
    } else if y_frac > 0.99 {
        y -= 0.01;
    }

    for (i, vertex) in vertices.iter().enumerate() {
        match vertex.kind {
            VertexKind::LineTo => {
                let Some(prev) = vertices.get(i.wrapping_sub(1)) else {
                    continue;
                };
                winding += line_crossing(
                    x,
                    y,
                    prev.x as f32,
                    prev.y as f32,
                    vertex.x as f32,
                    vertex.y as f32,
                );
            }
            VertexKind::QuadTo => {
                let Some(prev) = vertices.get(i.wrapping_sub(1)) else {
                    continue;
                };
                let q0 = [prev.x as f32, prev.y as f32];
                let q1 = [vertex.cx as f32, vertex.cy as f32];
                let q2 = [vertex.x as f32, vertex.y as f32];
                let ax = q0[0].min(q1[0]).min(q2[0]);
                let ay = q0[1].min(q1[1]).min(q2[1]);
                let by = q0[1].max(q1[1]).max(q2[1]);
                if y > ay && y < by && x > ax {
                    if q0 == q1 || q1 == q2 {
                        // degenerate control point: treat as a line
                        winding += line_crossing(x, y, q0[0], q0[1], q2[0], q2[1]);
                    } else {
                        let mut hits = [[0.0f32; 2]; 2];
                        let num_hits = ray_intersect_bezier([x, y], [1.0, 0.0], q0, q1, q2, &mut hits);
                        for hit in hits.iter().take(num_hits) {
                            if hit[0] < 0.0 {
                                winding += if hit[1] < 0.0 { -1 } else { 1 };
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    winding
}

fn line_crossing(x: f32, y: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> i32 {
    if y > y0.min(y1) && y < y0.max(y1) && x > x0.min(x1) {
        let x_inter = (y - y0) / (y1 - y0) * (x1 - x0) + x0;
        if x_inter < x {
            return if y0 < y1 { 1 } else { -1 };
        }
    }
    0
}

/// Intersects a ray with a quadratic Bézier, reporting up to two hits as
/// `[signed distance along the ray, tangent sign]`.
fn ray_intersect_bezier(
    orig: [f32; 2],
    ray: [f32; 2],
    q0: [f32; 2],
    q1: [f32; 2],
    q2: [f32; 2],
    hits: &mut [[f32; 2]; 2],
) -> usize {
    let q0perp = q0[1] * ray[0] - q0[0] * ray[1];
    let q1perp = q1[1] * ray[0] - q1[0] * ray[1];
    let q2perp = q2[1] * ray[0] - q2[0] * ray[1];
    let roperp = orig[1] * ray[0] - orig[0] * ray[1];

    let a = q0perp - 2.0 * q1perp + q2perp;
    let b = q1perp - q0perp;
    let c = q0perp - roperp;

    let mut s0 = 0.0f32;
    let mut s1 = 0.0f32;
    let mut num_s = 0usize;

    if a != 0.0 {
        let discr = b * b - a * c;
        if discr > 0.0 {
            let rcpna = -1.0 / a;
            let d = discr.sqrt();
            s0 = (b + d) * rcpna;
            s1 = (b - d) * rcpna;
            if (0.0..=1.0).contains(&s0) {
                num_s = 1;
            }
            if d > 0.0 && (0.0..=1.0).contains(&s1) {
                if num_s == 0 {
                    s0 = s1;
                }
                num_s += 1;
            }
        }
    } else {
        // 2*b*s + c = 0
        s0 = c / (-2.0 * b);
        if (0.0..=1.0).contains(&s0) {
            num_s = 1;
        }
    }

    if num_s == 0 {
        return 0;
    }
    let rcp_len2 = 1.0 / (ray[0] * ray[0] + ray[1] * ray[1]);
    let rayn_x = ray[0] * rcp_len2;
    let rayn_y = ray[1] * rcp_len2;

    let q0d = q0[0] * rayn_x + q0[1] * rayn_y;
    let q1d = q1[0] * rayn_x + q1[1] * rayn_y;
    let q2d = q2[0] * rayn_x + q2[1] * rayn_y;
    let rod = orig[0] * rayn_x + orig[1] * rayn_y;

    let q10d = q1d - q0d;
    let q20d = q2d - q0d;
    let q0rd = q0d - rod;

    hits[0][0] = q0rd + s0 * (2.0 - 2.0 * s0) * q10d + s0 * s0 * q20d;
    hits[0][1] = a * s0 + b;

    if num_s > 1 {
        hits[1][0] = q0rd + s1 * (2.0 - 2.0 * s1) * q10d + s1 * s1 * q20d;
        hits[1][1] = a * s1 + b;
        2
    } else {
        1
    }
}

/// Solves `x^3 + a*x^2 + b*x + c = 0`, returning the number of real
/// roots written to `r`.
fn solve_cubic(a: f32, b: f32, c: f32, r: &mut [f32; 3]) -> usize {
    let s = -a / 3.0;
    let p = b - a * a / 3.0;
    let q = a * (2.0 * a * a - 9.0 * b) / 27.0 + c;
    let p3 = p * p * p;
    let d = q * q + 4.0 * p3 / 27.0;
    if d >= 0.0 {
        let z = d.sqrt();
        let u = cube_root((-q + z) / 2.0);
        let v = cube_root((-q - z) / 2.0);
        r[0] = s + u + v;
        1
    } else {
        // three real roots via the trigonometric form; p3 is negative
        // here because d is
        let u = (-p / 3.0).sqrt();
        let v = (-(-27.0 / p3).sqrt() * q / 2.0).acos() / 3.0;
        let m = v.cos();
        let n = (v - std::f32::consts::FRAC_PI_2).cos() * 1.732_050_8;
        r[0] = s + u * 2.0 * m;
        r[1] = s - u * (m + n);
        r[2] = s - u * (m - n);
        3
    }
}

fn cube_root(x: f32) -> f32 {
    if x < 0.0 {
        -(-x).powf(1.0 / 3.0)
    } else {
        x.powf(1.0 / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Vertex;

    fn square() -> Vec<Vertex> {
        vec![
            Vertex::move_to(10, 10),
            Vertex::line_to(90, 10),
            Vertex::line_to(90, 90),
            Vertex::line_to(10, 90),
            Vertex::line_to(10, 10),
        ]
    }

    #[test]
    fn winding_inside_and_out() {
        let vertices = square();
        assert_eq!(compute_crossings(50.0, 50.0, &vertices), 1);
        assert_eq!(compute_crossings(5.0, 50.0, &vertices), 0);
        assert_eq!(compute_crossings(95.0, 50.0, &vertices), 0);
        assert_eq!(compute_crossings(50.0, 95.0, &vertices), 0);
    }

    #[test]
    fn quad_crossings_match_line_for_flat_curve() {
        // a "curve" whose control point sits on the chord midpoint is
        // geometrically a line but exercises the quadratic path... not
        // quite: coincident with neither endpoint, so the solver runs
        let vertices = vec![
            Vertex::move_to(0, 0),
            Vertex::quad_to(0, 50, 0, 100),
            Vertex::line_to(100, 100),
            Vertex::line_to(100, 0),
            Vertex::line_to(0, 0),
        ];
        assert_eq!(compute_crossings(50.0, 50.0, &vertices), 1);
        assert_eq!(compute_crossings(-5.0, 50.0, &vertices), 0);
    }

    #[test]
    fn solve_cubic_known_roots() {
        // (x-1)(x-2)(x-3) = x^3 - 6x^2 + 11x - 6
        let mut roots = [0.0f32; 3];
        let num = solve_cubic(-6.0, 11.0, -6.0, &mut roots);
        assert_eq!(num, 3);
        let mut roots = roots.to_vec();
        roots.sort_by(f32::total_cmp);
        assert!((roots[0] - 1.0).abs() < 1e-3);
        assert!((roots[1] - 2.0).abs() < 1e-3);
        assert!((roots[2] - 3.0).abs() < 1e-3);

        // x^3 - 1 has a single real root
        let mut roots = [0.0f32; 3];
        let num = solve_cubic(0.0, 0.0, -1.0, &mut roots);
        assert_eq!(num, 1);
        assert!((roots[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sdf_sign_and_edge_value() {
        let vertices = square();
        let bitmap = glyph_sdf(&vertices, (1, -9, 9, -1), 0.1, 4, 128, 16.0).unwrap();
        assert_eq!(bitmap.width, 16);
        assert_eq!(bitmap.height, 16);
        // center of the shape: well inside
        let center = bitmap.pixel(8, 8).unwrap();
        assert!(center > 128, "center = {center}");
        // far corner: well outside
        let corner = bitmap.pixel(0, 0).unwrap();
        assert!(corner < 128, "corner = {corner}");
    }

    #[test]
    fn empty_box_yields_none() {
        assert!(glyph_sdf(&[], (0, 0, 0, 0), 1.0, 2, 128, 10.0).is_none());
    }
}
