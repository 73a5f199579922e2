// ============================================================================
// RENDERER - document → RGBA → zoomed display surface with optional grid
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{Document, PixelData};
use crate::components::colors::{FALLBACK_COLOR, PaletteColor};
use crate::view::ViewState;

/// Grid lines are only drawn from this zoom factor up.
pub const GRID_MIN_ZOOM: u32 = 2;

/// White at 20% opacity.
pub const GRID_COLOR: Rgba<u8> = Rgba([255, 255, 255, 51]);

/// Converts documents to pixels. Both images are kept between frames and only
/// reallocated when their size changes.
pub struct Renderer {
    /// 1:1 RGBA copy of the document.
    document_image: RgbaImage,
    /// Zoomed, panned output.
    surface: RgbaImage,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            document_image: RgbaImage::new(0, 0),
            surface: RgbaImage::new(0, 0),
        }
    }

    /// Render with the document's own palette.
    pub fn render(&mut self, document: &Document, view: &ViewState) -> &RgbaImage {
        self.render_with_colors(document, view, document.palette.colors())
    }

    /// Render with `colors` standing in for the palette (indexed documents
    /// only; the cycler passes its rotated copy here).
    pub fn render_with_colors(
        &mut self,
        document: &Document,
        view: &ViewState,
        colors: &[PaletteColor],
    ) -> &RgbaImage {
        let (width, height) = (document.width(), document.height());
        let zoom = view.zoom.factor();

        ensure_size(&mut self.document_image, width, height);
        write_document_pixels(document, colors, &mut self.document_image);

        ensure_size(&mut self.surface, width * zoom, height * zoom);
        blit_nearest(&self.document_image, &mut self.surface, view);

        if view.show_grid && zoom >= GRID_MIN_ZOOM {
            draw_grid(&mut self.surface, width, height, view);
        }
        &self.surface
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn document_image(&self) -> &RgbaImage {
        &self.document_image
    }
}

fn ensure_size(image: &mut RgbaImage, width: u32, height: u32) {
    if image.width() != width || image.height() != height {
        *image = RgbaImage::new(width, height);
    }
}

/// Fill `out` (already sized to the document) with one RGBA pixel per cell.
pub fn write_document_pixels(document: &Document, colors: &[PaletteColor], out: &mut RgbaImage) {
    let width = document.width() as usize;
    let raw: &mut [u8] = out;

    match document.buffer.data() {
        PixelData::Indexed(pixels) => {
            // 256-entry lookup; indices past the palette end get the fallback.
            let mut lut = [FALLBACK_COLOR.to_array(); 256];
            for (slot, color) in lut.iter_mut().zip(colors) {
                *slot = color.to_array();
            }
            raw.par_chunks_mut(width * 4)
                .zip(pixels.par_chunks(width))
                .for_each(|(dst, src)| {
                    for (px, &index) in dst.chunks_exact_mut(4).zip(src) {
                        px.copy_from_slice(&lut[index as usize]);
                    }
                });
        }
        PixelData::Direct(pixels) => {
            // Cells are stored as native-endian [r, g, b, a] words.
            raw.copy_from_slice(bytemuck::cast_slice(pixels));
        }
    }
}

/// Nearest-neighbour scale of `src` into `dst`, panned by the view offsets.
/// Surface pixels with no document pixel behind them are transparent.
fn blit_nearest(src: &RgbaImage, dst: &mut RgbaImage, view: &ViewState) {
    let zoom = view.zoom.factor() as i64;
    let src_w = src.width() as i64;
    let src_h = src.height() as i64;
    let dst_w = dst.width() as usize;
    let src_raw: &[u8] = src;
    let dst_raw: &mut [u8] = dst;
    let (off_x, off_y) = (view.offset_x as i64, view.offset_y as i64);

    dst_raw
        .par_chunks_mut(dst_w * 4)
        .enumerate()
        .for_each(|(dy, row)| {
            let sy = dy as i64 / zoom + off_y;
            if sy < 0 || sy >= src_h {
                row.fill(0);
                return;
            }
            let src_row = sy as usize * src_w as usize * 4;
            for (dx, px) in row.chunks_exact_mut(4).enumerate() {
                let sx = dx as i64 / zoom + off_x;
                if sx < 0 || sx >= src_w {
                    px.fill(0);
                } else {
                    let i = src_row + sx as usize * 4;
                    px.copy_from_slice(&src_raw[i..i + 4]);
                }
            }
        });
}

/// Source-over blend of a single grid pixel.
#[inline]
fn blend_grid(px: &mut Rgba<u8>) {
    let a = GRID_COLOR[3] as u32;
    let inv = 255 - a;
    for c in 0..3 {
        px[c] = ((GRID_COLOR[c] as u32 * a + px[c] as u32 * inv + 127) / 255) as u8;
    }
    px[3] = (a + (px[3] as u32 * inv + 127) / 255).min(255) as u8;
}

/// One-pixel lines on every document pixel boundary, clipped to the part of
/// the surface the document covers.
fn draw_grid(surface: &mut RgbaImage, doc_width: u32, doc_height: u32, view: &ViewState) {
    let zoom = view.zoom.factor() as i64;
    let (sw, sh) = (surface.width() as i64, surface.height() as i64);

    // Document extent in surface coordinates, clipped.
    let left = (-(view.offset_x as i64) * zoom).max(0);
    let top = (-(view.offset_y as i64) * zoom).max(0);
    let right = ((doc_width as i64 - view.offset_x as i64) * zoom).min(sw);
    let bottom = ((doc_height as i64 - view.offset_y as i64) * zoom).min(sh);
    if left >= right || top >= bottom {
        return;
    }

    for x in 0..=doc_width as i64 {
        let px = (x - view.offset_x as i64) * zoom;
        if px < left || px >= right {
            continue;
        }
        for py in top..bottom {
            blend_grid(surface.get_pixel_mut(px as u32, py as u32));
        }
    }
    for y in 0..=doc_height as i64 {
        let py = (y - view.offset_y as i64) * zoom;
        if py < top || py >= bottom {
            continue;
        }
        for px in left..right {
            // Crossings were already blended by the vertical pass.
            if (px + view.offset_x as i64 * zoom) % zoom == 0 {
                continue;
            }
            blend_grid(surface.get_pixel_mut(px as u32, py as u32));
        }
    }
}
