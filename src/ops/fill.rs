// ============================================================================
// FLOOD FILL - scanline fill for indexed buffers, per-pixel fill for direct
// ============================================================================

use crate::canvas::{PixelBuffer, PixelData};

/// 4-connected flood fill from `(x, y)` over cells equal to the seed's value.
///
/// Returns the number of cells rewritten. A seed outside the buffer, or a
/// seed already holding `replacement`, leaves the buffer untouched.
pub fn flood_fill(buffer: &mut PixelBuffer, x: i32, y: i32, replacement: u32) -> usize {
    if !buffer.contains(x, y) {
        return 0;
    }
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let (x, y) = (x as usize, y as usize);

    match buffer.data_mut() {
        PixelData::Indexed(pixels) => {
            scanline_fill(pixels, width, height, x, y, replacement as u8)
        }
        PixelData::Direct(pixels) => stack_fill(pixels, width, height, x, y, replacement),
    }
}

/// Span-based fill. Each popped seed expands to its full horizontal run, and
/// the rows above and below get one seed per run that still holds `target`.
fn scanline_fill(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    replacement: u8,
) -> usize {
    let target = pixels[y * width + x];
    if target == replacement {
        return 0;
    }

    let mut filled = 0;
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(64);
    stack.push((x, y));

    while let Some((sx, sy)) = stack.pop() {
        let row = sy * width;
        // Already filled through another run.
        if pixels[row + sx] != target {
            continue;
        }

        let mut west = sx;
        while west > 0 && pixels[row + west - 1] == target {
            west -= 1;
        }
        let mut east = sx;
        while east + 1 < width && pixels[row + east + 1] == target {
            east += 1;
        }

        pixels[row + west..=row + east].fill(replacement);
        filled += east - west + 1;

        if sy > 0 {
            push_run_seeds(pixels, width, sy - 1, west, east, target, &mut stack);
        }
        if sy + 1 < height {
            push_run_seeds(pixels, width, sy + 1, west, east, target, &mut stack);
        }
    }

    filled
}

fn push_run_seeds(
    pixels: &[u8],
    width: usize,
    y: usize,
    west: usize,
    east: usize,
    target: u8,
    stack: &mut Vec<(usize, usize)>,
) {
    let row = y * width;
    let mut in_run = false;
    for x in west..=east {
        if pixels[row + x] == target {
            if !in_run {
                stack.push((x, y));
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
}

/// Plain per-pixel fill for direct buffers. Cells are rewritten when pushed,
/// so each matching cell enters the stack exactly once.
// TODO: switch direct buffers to the scanline walk once it is generic over the cell type.
fn stack_fill(
    pixels: &mut [u32],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    replacement: u32,
) -> usize {
    let target = pixels[y * width + x];
    if target == replacement {
        return 0;
    }

    let mut filled = 1;
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(256);
    pixels[y * width + x] = replacement;
    stack.push((x, y));

    while let Some((px, py)) = stack.pop() {
        let mut visit = |nx: usize, ny: usize, stack: &mut Vec<(usize, usize)>| {
            let i = ny * width + nx;
            if pixels[i] == target {
                pixels[i] = replacement;
                filled += 1;
                stack.push((nx, ny));
            }
        };
        if px > 0 {
            visit(px - 1, py, &mut stack);
        }
        if px + 1 < width {
            visit(px + 1, py, &mut stack);
        }
        if py > 0 {
            visit(px, py - 1, &mut stack);
        }
        if py + 1 < height {
            visit(px, py + 1, &mut stack);
        }
    }

    filled
}
