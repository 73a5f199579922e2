// ============================================================================
// PIXEL DRAWING - single pixels, Bresenham lines, rectangles
// ============================================================================

use crate::canvas::PixelBuffer;
use crate::view::DocPoint;

/// Write one cell. Coordinates outside the buffer are silently ignored so
/// strokes running off the edge never fail.
#[inline]
pub fn set_pixel(buffer: &mut PixelBuffer, x: i32, y: i32, value: u32) {
    buffer.put(x, y, value);
}

/// Integer Bresenham line from `(x0, y0)` to `(x1, y1)`, both ends inclusive.
///
/// A zero-length line writes its single pixel. Swapping the endpoints gives
/// the same pixel set.
pub fn draw_line(buffer: &mut PixelBuffer, x0: i32, y0: i32, x1: i32, y1: i32, value: u32) {
    // Always walk from the lexicographically smaller end so that ties in the
    // error term break the same way regardless of argument order.
    let (mut x, mut y, x1, y1) = if (x1, y1) < (x0, y0) {
        (x1, y1, x0, y0)
    } else {
        (x0, y0, x1, y1)
    };

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        set_pixel(buffer, x, y, value);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

pub fn draw_line_points(buffer: &mut PixelBuffer, from: DocPoint, to: DocPoint, value: u32) {
    draw_line(buffer, from.x, from.y, to.x, to.y, value);
}

/// Axis-aligned rectangle spanned by two corners (inclusive). `filled` covers
/// the interior, otherwise only the four edges are drawn.
pub fn draw_rectangle(
    buffer: &mut PixelBuffer,
    a: DocPoint,
    b: DocPoint,
    value: u32,
    filled: bool,
) {
    let (left, right) = (a.x.min(b.x), a.x.max(b.x));
    let (top, bottom) = (a.y.min(b.y), a.y.max(b.y));

    if filled {
        // Clip once instead of bounds-checking every cell of large rects.
        let x_lo = left.max(0);
        let x_hi = right.min(buffer.width() as i32 - 1);
        let y_lo = top.max(0);
        let y_hi = bottom.min(buffer.height() as i32 - 1);
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                set_pixel(buffer, x, y, value);
            }
        }
        return;
    }

    draw_line(buffer, left, top, right, top, value);
    draw_line(buffer, left, bottom, right, bottom, value);
    draw_line(buffer, left, top, left, bottom, value);
    draw_line(buffer, right, top, right, bottom, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BufferMode;

    fn buffer() -> PixelBuffer {
        PixelBuffer::new(BufferMode::Indexed, 32, 32).unwrap()
    }

    fn set_cells(buf: &PixelBuffer) -> Vec<(i32, i32)> {
        let mut cells = Vec::new();
        for y in 0..buf.height() as i32 {
            for x in 0..buf.width() as i32 {
                if buf.get(x, y) != Some(0) {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    #[test]
    fn zero_length_line_sets_one_pixel() {
        let mut buf = buffer();
        draw_line(&mut buf, 0, 0, 0, 0, 5);
        assert_eq!(set_cells(&buf), vec![(0, 0)]);
        assert_eq!(buf.get(0, 0), Some(5));
    }

    #[test]
    fn horizontal_line_covers_exact_span() {
        let mut buf = buffer();
        draw_line(&mut buf, 0, 0, 3, 0, 7);
        assert_eq!(set_cells(&buf), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn diagonal_and_steep_lines_are_connected() {
        let mut buf = buffer();
        draw_line(&mut buf, 2, 1, 5, 12, 1);
        let cells = set_cells(&buf);
        assert_eq!(cells.len(), 12);
        assert!(cells.contains(&(2, 1)));
        assert!(cells.contains(&(5, 12)));
    }

    #[test]
    fn swapped_endpoints_give_same_pixels() {
        let mut a = buffer();
        let mut b = buffer();
        draw_line(&mut a, 1, 3, 20, 9, 1);
        draw_line(&mut b, 20, 9, 1, 3, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn lines_clip_at_the_edges() {
        let mut buf = buffer();
        draw_line(&mut buf, -5, 0, 40, 0, 2);
        assert_eq!(set_cells(&buf).len(), 32);
    }

    #[test]
    fn rectangle_outline_and_fill() {
        let mut outline = buffer();
        draw_rectangle(&mut outline, DocPoint::new(4, 4), DocPoint::new(1, 1), 3, false);
        assert_eq!(set_cells(&outline).len(), 12);
        assert_eq!(outline.get(2, 2), Some(0));

        let mut filled = buffer();
        draw_rectangle(&mut filled, DocPoint::new(1, 1), DocPoint::new(4, 4), 3, true);
        assert_eq!(set_cells(&filled).len(), 16);
    }
}
