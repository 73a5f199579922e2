use serde::{Deserialize, Serialize};

use crate::components::colors::Palette;
use crate::error::{EngineError, Result};

pub const MIN_DOCUMENT_DIMENSION: u32 = 32;
pub const MAX_DOCUMENT_DIMENSION: u32 = 4096;

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 200;

/// Validate a requested document size against the supported range.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    let range = MIN_DOCUMENT_DIMENSION..=MAX_DOCUMENT_DIMENSION;
    if range.contains(&width) && range.contains(&height) {
        Ok(())
    } else {
        Err(EngineError::InvalidDimension { width, height })
    }
}

// ============================================================================
// PIXEL BUFFER
// ============================================================================

/// Storage layout of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferMode {
    /// One palette index per pixel.
    Indexed,
    /// One packed RGBA word per pixel (see [`crate::components::colors::PaletteColor::to_packed`]).
    Direct,
}

impl BufferMode {
    pub fn label(&self) -> &'static str {
        match self {
            BufferMode::Indexed => "Indexed",
            BufferMode::Direct => "Direct",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelData {
    Indexed(Vec<u8>),
    Direct(Vec<u32>),
}

impl PixelData {
    fn zeroed(mode: BufferMode, len: usize) -> Self {
        match mode {
            BufferMode::Indexed => PixelData::Indexed(vec![0; len]),
            BufferMode::Direct => PixelData::Direct(vec![0; len]),
        }
    }

    fn len(&self) -> usize {
        match self {
            PixelData::Indexed(d) => d.len(),
            PixelData::Direct(d) => d.len(),
        }
    }
}

/// Fixed-size raster storage. The size never changes in place; use
/// [`PixelBuffer::resize`] to get a new buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: PixelData,
}

impl PixelBuffer {
    /// Zero-initialized buffer (index 0 / transparent black).
    pub fn new(mode: BufferMode, width: u32, height: u32) -> Result<Self> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: PixelData::zeroed(mode, (width * height) as usize),
        })
    }

    pub fn from_indexed(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::from_data(width, height, PixelData::Indexed(data))
    }

    pub fn from_direct(width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        Self::from_data(width, height, PixelData::Direct(data))
    }

    fn from_data(width: u32, height: u32, data: PixelData) -> Result<Self> {
        let buffer = Self {
            width,
            height,
            data,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Check the size bounds and the `data.len() == width * height` invariant.
    /// Deserialized buffers must pass through here before use.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.width, self.height)?;
        let expected = self.width as usize * self.height as usize;
        let actual = self.data.len();
        if actual != expected {
            return Err(EngineError::DataLength { expected, actual });
        }
        Ok(())
    }

    /// Copy into a new buffer of the given size. The overlapping top-left
    /// rectangle is copied row by row; everything else is zero.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self> {
        validate_dimensions(width, height)?;
        let copy_w = self.width.min(width) as usize;
        let copy_h = self.height.min(height) as usize;
        let src_w = self.width as usize;
        let dst_w = width as usize;
        let len = dst_w * height as usize;

        fn copy_rows<T: Copy + Default>(
            src: &[T],
            src_w: usize,
            dst_w: usize,
            len: usize,
            copy_w: usize,
            copy_h: usize,
        ) -> Vec<T> {
            let mut dst = vec![T::default(); len];
            for y in 0..copy_h {
                let s = y * src_w;
                let d = y * dst_w;
                dst[d..d + copy_w].copy_from_slice(&src[s..s + copy_w]);
            }
            dst
        }

        let data = match &self.data {
            PixelData::Indexed(src) => {
                PixelData::Indexed(copy_rows(src, src_w, dst_w, len, copy_w, copy_h))
            }
            PixelData::Direct(src) => {
                PixelData::Direct(copy_rows(src, src_w, dst_w, len, copy_w, copy_h))
            }
        };

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn mode(&self) -> BufferMode {
        match self.data {
            PixelData::Indexed(_) => BufferMode::Indexed,
            PixelData::Direct(_) => BufferMode::Direct,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut PixelData {
        &mut self.data
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Cell value, widened to `u32`. `None` outside the buffer.
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if !self.contains(x, y) {
            return None;
        }
        let i = self.offset(x as u32, y as u32);
        Some(match &self.data {
            PixelData::Indexed(d) => d[i] as u32,
            PixelData::Direct(d) => d[i],
        })
    }

    /// Overwrite one cell. Out-of-bounds coordinates are ignored and return
    /// `false`. Indexed buffers keep the low byte of `value`.
    pub fn put(&mut self, x: i32, y: i32, value: u32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        let i = self.offset(x as u32, y as u32);
        match &mut self.data {
            PixelData::Indexed(d) => d[i] = value as u8,
            PixelData::Direct(d) => d[i] = value,
        }
        true
    }

    pub fn fill(&mut self, value: u32) {
        match &mut self.data {
            PixelData::Indexed(d) => d.fill(value as u8),
            PixelData::Direct(d) => d.fill(value),
        }
    }

    pub fn as_indexed(&self) -> Option<&[u8]> {
        match &self.data {
            PixelData::Indexed(d) => Some(d),
            PixelData::Direct(_) => None,
        }
    }

    pub fn as_direct(&self) -> Option<&[u32]> {
        match &self.data {
            PixelData::Direct(d) => Some(d),
            PixelData::Indexed(_) => None,
        }
    }

    pub fn memory_bytes(&self) -> usize {
        match &self.data {
            PixelData::Indexed(d) => d.len(),
            PixelData::Direct(d) => d.len() * 4,
        }
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// The editable raster: one buffer plus its palette.
///
/// Indexed documents render through `palette`. Direct documents keep the
/// palette only as a swatch set for color selection; their cycle ranges are
/// never animated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub buffer: PixelBuffer,
    pub palette: Palette,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            buffer: PixelBuffer {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                data: PixelData::zeroed(
                    BufferMode::Indexed,
                    (DEFAULT_WIDTH * DEFAULT_HEIGHT) as usize,
                ),
            },
            palette: Palette::default(),
        }
    }
}

impl Document {
    pub fn new(mode: BufferMode, width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            buffer: PixelBuffer::new(mode, width, height)?,
            palette: Palette::default(),
        })
    }

    pub fn with_palette(buffer: PixelBuffer, palette: Palette) -> Result<Self> {
        let doc = Self { buffer, palette };
        doc.validate()?;
        Ok(doc)
    }

    pub fn validate(&self) -> Result<()> {
        self.buffer.validate()?;
        self.palette.validate()
    }

    pub fn mode(&self) -> BufferMode {
        self.buffer.mode()
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.buffer.get(x, y)
    }

    pub fn is_indexed(&self) -> bool {
        self.mode() == BufferMode::Indexed
    }
}
