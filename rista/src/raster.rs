//! Analytic antialiased scanline rasterization.
//!
//! Outlines are flattened to edges, sorted by top y, and swept one
//! scanline at a time. Coverage is the exact signed trapezoid area each
//! edge cuts out of each pixel, accumulated under the non-zero winding
//! rule; no supersampling is involved.

use crate::bitmap::BitmapSlice;
use crate::flatten::{flatten_curves, Contours};
use crate::outline::Vertex;

/// Rasterizes an outline into the given bitmap region.
///
/// `scale` and `shift` map font units to subpixel positions;
/// `(off_x, off_y)` is the pixel position of the bitmap's top-left
/// corner within that space. When `invert` is set, y grows downward in
/// the output (the usual convention for bitmaps).
#[allow(clippy::too_many_arguments)]
pub(crate) fn rasterize(
    result: &mut BitmapSlice<'_>,
    flatness_in_pixels: f32,
    vertices: &[Vertex],
    scale_x: f32,
    scale_y: f32,
    shift_x: f32,
    shift_y: f32,
    off_x: i32,
    off_y: i32,
    invert: bool,
) {
    if result.width == 0 || result.height == 0 {
        return;
    }
    let scale = if scale_x > scale_y { scale_y } else { scale_x };
    if scale <= 0.0 {
        return;
    }
    let contours = flatten_curves(vertices, flatness_in_pixels / scale);
    if contours.points.is_empty() {
        return;
    }
    let mut edges = build_edges(
        &contours, scale_x, scale_y, shift_x, shift_y, off_y, result.height, invert,
    );
    // sort by top y; the pattern-defeating quicksort in the stdlib does
    // the median-of-three + insertion-sort-for-short-runs dance
    let sentinel = edges.len() - 1;
    edges[..sentinel].sort_unstable_by(|a, b| a.y0.total_cmp(&b.y0));
    rasterize_sorted_edges(result, &edges, off_x, off_y);
}

#[derive(Clone, Copy, Default)]
struct Edge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    invert: bool,
}

/// Converts flattened contours to edges: horizontal segments are
/// dropped, endpoints are ordered so `y0 < y1`, and `invert` records the
/// original winding direction. A sentinel edge below the bitmap is
/// appended so the sweep never runs off the list.
#[allow(clippy::too_many_arguments)]
fn build_edges(
    contours: &Contours,
    scale_x: f32,
    scale_y: f32,
    shift_x: f32,
    shift_y: f32,
    off_y: i32,
    height: usize,
    invert: bool,
) -> Vec<Edge> {
    let y_scale_inv = if invert { -scale_y } else { scale_y };
    let mut edges = Vec::with_capacity(contours.points.len() + 1);
    let mut base = 0usize;
    for &count in &contours.lengths {
        let points = &contours.points[base..base + count];
        base += count;
        let mut j = count - 1;
        for k in 0..count {
            let (pj, pk) = (points[j], points[k]);
            if pj.y == pk.y {
                j = k;
                continue;
            }
            // orient so that y0 < y1 after any vertical flip
            let rising = if invert { pj.y > pk.y } else { pj.y < pk.y };
            let (a, b) = if rising { (pj, pk) } else { (pk, pj) };
            edges.push(Edge {
                x0: a.x * scale_x + shift_x,
                y0: a.y * y_scale_inv + shift_y,
                x1: b.x * scale_x + shift_x,
                y1: b.y * y_scale_inv + shift_y,
                invert: rising,
            });
            j = k;
        }
    }
    edges.push(Edge {
        y0: (off_y + height as i32) as f32 + 1.0,
        ..Edge::default()
    });
    edges
}

const NO_EDGE: u32 = u32::MAX;

/// An edge taking part in the current scanline.
struct ActiveEdge {
    next: u32,
    /// Current x at the top of the scanline.
    fx: f32,
    /// dx/dy slope.
    fdx: f32,
    /// dy/dx, zero for vertical edges.
    fdy: f32,
    /// +1 or -1 winding contribution.
    direction: f32,
    sy: f32,
    ey: f32,
}

/// Pool of active edges addressed by index, with an intrusive free list
/// threaded through vacated slots.
struct ActiveEdgeArena {
    nodes: Vec<ActiveEdge>,
    free_head: u32,
}

/// Growth quantum of the arena, sized for small nodes.
const ARENA_CHUNK: usize = 2000;

impl ActiveEdgeArena {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_head: NO_EDGE,
        }
    }

    fn alloc(&mut self, edge: &Edge, off_x: i32, start_point: f32) -> u32 {
        let dxdy = (edge.x1 - edge.x0) / (edge.y1 - edge.y0);
        let node = ActiveEdge {
            next: NO_EDGE,
            fdx: dxdy,
            fdy: if dxdy != 0.0 { 1.0 / dxdy } else { 0.0 },
            fx: edge.x0 + dxdy * (start_point - edge.y0) - off_x as f32,
            direction: if edge.invert { 1.0 } else { -1.0 },
            sy: edge.y0,
            ey: edge.y1,
        };
        if self.free_head != NO_EDGE {
            let index = self.free_head;
            self.free_head = self.nodes[index as usize].next;
            self.nodes[index as usize] = node;
            index
        } else {
            if self.nodes.len() == self.nodes.capacity() {
                self.nodes.reserve_exact(ARENA_CHUNK);
            }
            self.nodes.push(node);
            (self.nodes.len() - 1) as u32
        }
    }

    fn free(&mut self, index: u32) {
        self.nodes[index as usize].direction = 0.0;
        self.nodes[index as usize].next = self.free_head;
        self.free_head = index;
    }

    fn get(&self, index: u32) -> &ActiveEdge {
        &self.nodes[index as usize]
    }

    fn get_mut(&mut self, index: u32) -> &mut ActiveEdge {
        &mut self.nodes[index as usize]
    }
}

/// Sweeps the sorted edge list over every scanline of the bitmap.
fn rasterize_sorted_edges(result: &mut BitmapSlice<'_>, edges: &[Edge], off_x: i32, off_y: i32) {
    let width = result.width;
    let mut arena = ActiveEdgeArena::new();
    let mut active: u32 = NO_EDGE;
    // coverage for the row, and the "everything to the right is filled"
    // carry; the extra carry slot absorbs writes at x = width
    let mut scanline = vec![0.0f32; width];
    let mut scanline_fill = vec![0.0f32; width + 1];

    let mut next_edge = 0usize;
    let mut y = off_y;
    let mut j = 0usize;
    while j < result.height {
        let scan_y_top = y as f32;
        let scan_y_bottom = (y + 1) as f32;
        scanline.fill(0.0);
        scanline_fill.fill(0.0);

        // expire edges that end above this scanline
        let mut prev = NO_EDGE;
        let mut cur = active;
        while cur != NO_EDGE {
            let next = arena.get(cur).next;
            if arena.get(cur).ey <= scan_y_top {
                if prev == NO_EDGE {
                    active = next;
                } else {
                    arena.get_mut(prev).next = next;
                }
                arena.free(cur);
            } else {
                prev = cur;
            }
            cur = next;
        }

        // admit edges that start before the bottom of this scanline
        while edges[next_edge].y0 <= scan_y_bottom {
            let edge = &edges[next_edge];
            if edge.y0 != edge.y1 {
                let index = arena.alloc(edge, off_x, scan_y_top);
                if j == 0 && off_y != 0 && arena.get(index).ey < scan_y_top {
                    // subpixel positioning can round an edge just above
                    // the first scanline
                    arena.get_mut(index).ey = scan_y_top;
                }
                arena.get_mut(index).next = active;
                active = index;
            }
            next_edge += 1;
        }

        if active != NO_EDGE {
            fill_active_edges(
                &mut scanline,
                &mut scanline_fill,
                width,
                &arena,
                active,
                scan_y_top,
            );
        }

        // non-zero winding: prefix-sum the carry, add the local
        // coverage, and emit |area| as an 8-bit value
        let mut sum = 0.0f32;
        let row = result.row_mut(j);
        for i in 0..width {
            sum += scanline_fill[i];
            let coverage = (scanline[i] + sum).abs() * 255.0 + 0.5;
            row[i] = (coverage as i32).min(255) as u8;
        }

        // step every active edge to the next scanline
        let mut cur = active;
        while cur != NO_EDGE {
            let node = arena.get_mut(cur);
            node.fx += node.fdx;
            cur = node.next;
        }

        y += 1;
        j += 1;
    }
}

fn sized_trapezoid_area(height: f32, top_width: f32, bottom_width: f32) -> f32 {
    debug_assert!(top_width >= 0.0);
    debug_assert!(bottom_width >= 0.0);
    (top_width + bottom_width) / 2.0 * height
}

fn position_trapezoid_area(height: f32, tx0: f32, tx1: f32, bx0: f32, bx1: f32) -> f32 {
    sized_trapezoid_area(height, tx1 - tx0, bx1 - bx0)
}

fn sized_triangle_area(height: f32, width: f32) -> f32 {
    height * width / 2.0
}

/// Accumulates the coverage contributed by a segment that has already
/// been clipped to the vertical slab of pixel `x` (it does not cross the
/// lines at `x` or `x + 1`). Vertical clipping to the edge's own extent
/// happens here.
fn handle_clipped_edge(
    scanline: &mut [f32],
    x: i32,
    e: &ActiveEdge,
    mut x0: f32,
    mut y0: f32,
    mut x1: f32,
    mut y1: f32,
) {
    if y0 == y1 {
        return;
    }
    debug_assert!(y0 < y1);
    debug_assert!(e.sy <= e.ey);
    if y0 > e.ey || y1 < e.sy {
        return;
    }
    if y0 < e.sy {
        x0 += (x1 - x0) * (e.sy - y0) / (y1 - y0);
        y0 = e.sy;
    }
    if y1 > e.ey {
        x1 += (x1 - x0) * (e.ey - y1) / (y1 - y0);
        y1 = e.ey;
    }

    let xf = x as f32;
    if x0 <= xf && x1 <= xf {
        scanline[x as usize] += e.direction * (y1 - y0);
    } else if x0 >= xf + 1.0 && x1 >= xf + 1.0 {
        // entirely right of this pixel
    } else {
        debug_assert!(x0 >= xf && x0 <= xf + 1.0 && x1 >= xf && x1 <= xf + 1.0);
        // coverage = 1 - average x position
        scanline[x as usize] +=
            e.direction * (y1 - y0) * (1.0 - ((x0 - xf) + (x1 - xf)) / 2.0);
    }
}

/// Computes the exact area every active edge covers within the scanline
/// `[y_top, y_top + 1]`.
///
/// `scanline` receives the pixel-local coverage; `scanline_fill` (one
/// slot wider) receives, at index `x + 1`, the signed height each edge
/// contributes to every pixel right of `x`.
fn fill_active_edges(
    scanline: &mut [f32],
    scanline_fill: &mut [f32],
    len: usize,
    arena: &ActiveEdgeArena,
    first: u32,
    y_top: f32,
) {
    let y_bottom = y_top + 1.0;
    let mut cur = first;
    while cur != NO_EDGE {
        let e = arena.get(cur);
        debug_assert!(e.ey >= y_top);

        if e.fdx == 0.0 {
            let x0 = e.fx;
            if x0 < len as f32 {
                if x0 >= 0.0 {
                    handle_clipped_edge(scanline, x0 as i32, e, x0, y_top, x0, y_bottom);
                    handle_clipped_edge(scanline_fill, x0 as i32 + 1, e, x0, y_top, x0, y_bottom);
                } else {
                    handle_clipped_edge(scanline_fill, 0, e, x0, y_top, x0, y_bottom);
                }
            }
        } else {
            let mut x0 = e.fx;
            let mut dx = e.fdx;
            let mut xb = x0 + dx;
            let mut dy = e.fdy;
            debug_assert!(e.sy <= y_bottom && e.ey >= y_top);

            // clip the segment to this scanline's vertical strip
            let (mut x_top, mut sy0) = if e.sy > y_top {
                (x0 + dx * (e.sy - y_top), e.sy)
            } else {
                (x0, y_top)
            };
            let (mut x_bottom, mut sy1) = if e.ey < y_bottom {
                (x0 + dx * (e.ey - y_top), e.ey)
            } else {
                (xb, y_bottom)
            };

            if x_top >= 0.0 && x_bottom >= 0.0 && x_top < len as f32 && x_bottom < len as f32 {
                // no x range checks needed from here on
                if x_top as i32 == x_bottom as i32 {
                    // the edge stays within one pixel column
                    let x = x_top as i32;
                    let height = (sy1 - sy0) * e.direction;
                    scanline[x as usize] +=
                        position_trapezoid_area(height, x_top, x as f32 + 1.0, x_bottom, x as f32 + 1.0);
                    // everything right of this pixel is filled
                    scanline_fill[x as usize + 1] += height;
                } else {
                    // the edge crosses 2+ pixel columns
                    if x_top > x_bottom {
                        // reflect the scanline vertically; the signed
                        // area stays the same
                        sy0 = y_bottom - (sy0 - y_top);
                        sy1 = y_bottom - (sy1 - y_top);
                        std::mem::swap(&mut sy0, &mut sy1);
                        std::mem::swap(&mut x_bottom, &mut x_top);
                        std::mem::swap(&mut x0, &mut xb);
                        dx = -dx;
                        dy = -dy;
                    }
                    debug_assert!(dy >= 0.0);
                    debug_assert!(dx >= 0.0);

                    let x1 = x_top as i32;
                    let x2 = x_bottom as i32;
                    // crossing of the vertical line at x1 + 1
                    let mut y_crossing = y_top + dy * (x1 as f32 + 1.0 - x0);
                    // crossing of the vertical line at x2
                    let mut y_final = y_top + dy * (x2 as f32 - x0);

                    // when x2 sits right at the column boundary,
                    // y_crossing can overshoot the scanline
                    if y_crossing > y_bottom {
                        y_crossing = y_bottom;
                    }

                    let sign = e.direction;
                    // area of the rectangle covered from sy0..y_crossing
                    let mut area = sign * (y_crossing - sy0);

                    // triangle at (x_top, sy0), (x1+1, sy0), (x1+1, y_crossing)
                    scanline[x1 as usize] +=
                        sized_triangle_area(area, x1 as f32 + 1.0 - x_top);

                    if y_final > y_bottom {
                        y_final = y_bottom;
                        dy = (y_final - y_crossing) / (x2 as f32 - (x1 as f32 + 1.0));
                    }

                    // each whole column in between gets the rectangle
                    // carried in from the left plus a sliding trapezoid
                    let step = sign * dy;
                    for x in x1 + 1..x2 {
                        scanline[x as usize] += area + step / 2.0;
                        area += step;
                    }
                    debug_assert!(area.abs() <= 1.01);
                    debug_assert!(sy1 > y_final - 0.01);

                    scanline[x2 as usize] += area
                        + sign
                            * position_trapezoid_area(
                                sy1 - y_final,
                                x2 as f32,
                                x2 as f32 + 1.0,
                                x_bottom,
                                x2 as f32 + 1.0,
                            );

                    scanline_fill[x2 as usize + 1] += sign * (sy1 - sy0);
                }
            } else {
                // the edge escapes the bitmap horizontally: fall back to
                // splitting it at every pixel boundary it crosses. The
                // extrapolated x_top/x_bottom land out here routinely
                // when an edge merely starts or ends mid-scanline.
                for x in 0..len {
                    let y0 = y_top;
                    let x1 = x as f32;
                    let x2 = x as f32 + 1.0;
                    let x3 = xb;
                    let y3 = y_bottom;

                    // x = x0 + dx * (y - y_top) solved for y
                    let y1 = (x as f32 - x0) / dx + y_top;
                    let y2 = (x as f32 + 1.0 - x0) / dx + y_top;

                    let x_ = x as i32;
                    if x0 < x1 && x3 > x2 {
                        // three pieces descending right
                        handle_clipped_edge(scanline, x_, e, x0, y0, x1, y1);
                        handle_clipped_edge(scanline, x_, e, x1, y1, x2, y2);
                        handle_clipped_edge(scanline, x_, e, x2, y2, x3, y3);
                    } else if x3 < x1 && x0 > x2 {
                        // three pieces descending left
                        handle_clipped_edge(scanline, x_, e, x0, y0, x2, y2);
                        handle_clipped_edge(scanline, x_, e, x2, y2, x1, y1);
                        handle_clipped_edge(scanline, x_, e, x1, y1, x3, y3);
                    } else if x0 < x1 && x3 > x1 {
                        handle_clipped_edge(scanline, x_, e, x0, y0, x1, y1);
                        handle_clipped_edge(scanline, x_, e, x1, y1, x3, y3);
                    } else if x3 < x1 && x0 > x1 {
                        handle_clipped_edge(scanline, x_, e, x0, y0, x1, y1);
                        handle_clipped_edge(scanline, x_, e, x1, y1, x3, y3);
                    } else if x0 < x2 && x3 > x2 {
                        handle_clipped_edge(scanline, x_, e, x0, y0, x2, y2);
                        handle_clipped_edge(scanline, x_, e, x2, y2, x3, y3);
                    } else if x3 < x2 && x0 > x2 {
                        handle_clipped_edge(scanline, x_, e, x0, y0, x2, y2);
                        handle_clipped_edge(scanline, x_, e, x2, y2, x3, y3);
                    } else {
                        handle_clipped_edge(scanline, x_, e, x0, y0, x3, y3);
                    }
                }
            }
        }
        cur = e.next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Vertex;

    fn render(vertices: &[Vertex], w: usize, h: usize, invert: bool) -> Vec<u8> {
        let mut pixels = vec![0u8; w * h];
        let mut slice = BitmapSlice::new(&mut pixels, w, h, w);
        rasterize(&mut slice, 0.35, vertices, 1.0, 1.0, 0.0, 0.0, 0, 0, invert);
        pixels
    }

    fn square(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<Vertex> {
        // counter-clockwise in y-up coordinates
        vec![
            Vertex::move_to(x0, y0),
            Vertex::line_to(x1, y0),
            Vertex::line_to(x1, y1),
            Vertex::line_to(x0, y1),
            Vertex::line_to(x0, y0),
        ]
    }

    #[test]
    fn unit_square_nonzero_winding() {
        let pixels = render(&square(1, 1, 3, 3), 4, 4, false);
        for y in 0..4 {
            for x in 0..4 {
                let expected = if (1..3).contains(&x) && (1..3).contains(&y) {
                    255
                } else {
                    0
                };
                assert_eq!(pixels[y * 4 + x], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn winding_direction_does_not_change_coverage() {
        let ccw = render(&square(1, 1, 3, 3), 4, 4, false);
        let cw = render(
            &[
                Vertex::move_to(1, 1),
                Vertex::line_to(1, 3),
                Vertex::line_to(3, 3),
                Vertex::line_to(3, 1),
                Vertex::line_to(1, 1),
            ],
            4,
            4,
            false,
        );
        assert_eq!(ccw, cw);
    }

    #[test]
    fn hole_is_uncovered() {
        // outer square with an opposite-winding inner square
        let mut vertices = square(0, 0, 6, 6);
        vertices.extend([
            Vertex::move_to(2, 2),
            Vertex::line_to(2, 4),
            Vertex::line_to(4, 4),
            Vertex::line_to(4, 2),
            Vertex::line_to(2, 2),
        ]);
        let pixels = render(&vertices, 6, 6, false);
        assert_eq!(pixels[1 * 6 + 1], 255);
        assert_eq!(pixels[3 * 6 + 3], 0);
        assert_eq!(pixels[5 * 6 + 5], 255);
    }

    #[test]
    fn half_covered_pixels() {
        // a square covering the left half of a pixel column
        let mut pixels = vec![0u8; 2];
        let mut slice = BitmapSlice::new(&mut pixels, 2, 1, 2);
        rasterize(
            &mut slice,
            0.35,
            &square(0, 0, 1, 1),
            0.5,
            1.0,
            0.0,
            0.0,
            0,
            0,
            false,
        );
        // half coverage lands within rounding of 128
        assert!((pixels[0] as i32 - 128).abs() <= 1, "got {}", pixels[0]);
        assert_eq!(pixels[1], 0);
    }

    #[test]
    fn coverage_is_clamped() {
        // two coincident squares double the winding but not the output
        let mut vertices = square(0, 0, 2, 2);
        vertices.extend(square(0, 0, 2, 2));
        let pixels = render(&vertices, 2, 2, false);
        assert!(pixels.iter().all(|&p| p == 255));
    }

    #[test]
    fn diagonal_coverage_sums_to_half() {
        // a right triangle covering half of a 4x4 box
        let vertices = vec![
            Vertex::move_to(0, 0),
            Vertex::line_to(4, 0),
            Vertex::line_to(0, 4),
            Vertex::line_to(0, 0),
        ];
        let pixels = render(&vertices, 4, 4, false);
        let mass: f32 = pixels.iter().map(|&p| p as f32 / 255.0).sum();
        assert!((mass - 8.0).abs() < 0.1, "mass = {mass}");
    }

    #[test]
    fn invert_flips_vertically() {
        // a square in the lower half of y-up space appears in the lower
        // rows of the y-down bitmap after shifting by the height
        let vertices = square(0, 0, 4, 2);
        let mut pixels = vec![0u8; 16];
        let mut slice = BitmapSlice::new(&mut pixels, 4, 4, 4);
        rasterize(&mut slice, 0.35, &vertices, 1.0, 1.0, 0.0, 4.0, 0, 0, true);
        for y in 0..4 {
            for x in 0..4 {
                let expected = if y >= 2 { 255 } else { 0 };
                assert_eq!(pixels[y * 4 + x], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn edges_outside_the_box_are_clipped() {
        // a huge square: everything inside should still be full coverage
        let pixels = render(&square(-100, -100, 100, 100), 4, 4, false);
        assert!(pixels.iter().all(|&p| p == 255));
    }
}
