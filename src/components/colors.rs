use serde::{Deserialize, Serialize};

use crate::canvas::BufferMode;
use crate::error::{EngineError, Result};

pub const MIN_PALETTE_SIZE: usize = 2;
pub const MAX_PALETTE_SIZE: usize = 256;
pub const DEFAULT_PALETTE_LENGTH: usize = 32;

/// Steps per second given to a range created by [`Palette::toggle_cycling`].
pub const DEFAULT_CYCLE_RATE: i32 = 10;

/// Opaque black, used whenever an index has no palette entry.
pub const FALLBACK_COLOR: PaletteColor = PaletteColor::rgba(0, 0, 0, 255);

// ============================================================================
// PALETTE COLOR
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PaletteColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PaletteColor {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Pack into the direct-mode cell layout. The word's in-memory bytes are
    /// `[r, g, b, a]`, so a direct buffer can be viewed as RGBA bytes as-is.
    pub fn to_packed(self) -> u32 {
        u32::from_ne_bytes(self.to_array())
    }

    pub fn from_packed(value: u32) -> Self {
        let [r, g, b, a] = value.to_ne_bytes();
        Self { r, g, b, a }
    }
}

// ============================================================================
// CYCLE RANGE
// ============================================================================

/// A contiguous palette slice `[low, high]` that rotates on a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleRange {
    /// Rotation steps per second. `<= 0` falls back to a slow default speed.
    pub rate: i32,
    pub low: u8,
    pub high: u8,
    pub active: bool,
}

impl CycleRange {
    pub fn new(rate: i32, low: u8, high: u8) -> Self {
        Self {
            rate,
            low: low.min(high),
            high: low.max(high),
            active: true,
        }
    }

    /// Number of palette entries covered.
    pub fn span(&self) -> usize {
        (self.high as usize + 1).saturating_sub(self.low as usize)
    }

    /// True when the range can rotate within a palette of `len` colors.
    pub fn fits(&self, len: usize) -> bool {
        self.low <= self.high && (self.high as usize) < len
    }
}

// ============================================================================
// PALETTE
// ============================================================================

/// Ordered colors plus the foreground/background selection and cycle ranges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<PaletteColor>,
    foreground_index: usize,
    background_index: usize,
    cycles: Vec<CycleRange>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: Self::grey_ramp(DEFAULT_PALETTE_LENGTH),
            foreground_index: 1,
            background_index: 0,
            cycles: Vec::new(),
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<PaletteColor>) -> Result<Self> {
        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&colors.len()) {
            return Err(EngineError::InvalidPaletteSize { len: colors.len() });
        }
        Ok(Self {
            foreground_index: 1.min(colors.len() - 1),
            background_index: 0,
            colors,
            cycles: Vec::new(),
        })
    }

    /// `r = g = b = index` ramp, length clamped to the supported range.
    pub fn grey_ramp(len: usize) -> Vec<PaletteColor> {
        let len = len.clamp(MIN_PALETTE_SIZE, MAX_PALETTE_SIZE);
        (0..len)
            .map(|i| PaletteColor::rgba(i as u8, i as u8, i as u8, 255))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let len = self.colors.len();
        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&len) {
            return Err(EngineError::InvalidPaletteSize { len });
        }
        for index in [self.foreground_index, self.background_index] {
            if index >= len {
                return Err(EngineError::InvalidSelection { index, len });
            }
        }
        Ok(())
    }

    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PaletteColor> {
        self.colors.get(index).copied()
    }

    pub fn find(&self, color: PaletteColor) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    pub fn foreground_index(&self) -> usize {
        self.foreground_index
    }

    pub fn background_index(&self) -> usize {
        self.background_index
    }

    pub fn set_foreground_index(&mut self, index: usize) {
        self.foreground_index = index.min(self.colors.len().saturating_sub(1));
    }

    pub fn set_background_index(&mut self, index: usize) {
        self.background_index = index.min(self.colors.len().saturating_sub(1));
    }

    /// Drawing value for a selection index: the index itself for indexed
    /// buffers, the packed color for direct ones.
    pub fn value_for(&self, mode: BufferMode, index: usize) -> u32 {
        match mode {
            BufferMode::Indexed => index as u32,
            BufferMode::Direct => self.get(index).unwrap_or(FALLBACK_COLOR).to_packed(),
        }
    }

    pub fn set_color(&mut self, index: usize, color: PaletteColor) -> bool {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Append a color. Refused once the palette holds 256 entries.
    pub fn add_color(&mut self, color: PaletteColor) -> bool {
        if self.colors.len() >= MAX_PALETTE_SIZE {
            return false;
        }
        self.colors.push(color);
        true
    }

    /// Remove the color at `index`, keeping at least two entries. Selections
    /// past the new end are clamped.
    pub fn remove_color(&mut self, index: usize) -> bool {
        if self.colors.len() <= MIN_PALETTE_SIZE || index >= self.colors.len() {
            return false;
        }
        self.colors.remove(index);
        let last = self.colors.len() - 1;
        self.foreground_index = self.foreground_index.min(last);
        self.background_index = self.background_index.min(last);
        true
    }

    pub fn cycles(&self) -> &[CycleRange] {
        &self.cycles
    }

    pub fn add_cycle_range(&mut self, range: CycleRange) {
        self.cycles.push(range);
    }

    pub fn remove_cycle_range(&mut self, index: usize) -> Option<CycleRange> {
        (index < self.cycles.len()).then(|| self.cycles.remove(index))
    }

    pub fn set_cycle_active(&mut self, index: usize, active: bool) -> bool {
        match self.cycles.get_mut(index) {
            Some(range) => {
                range.active = active;
                true
            }
            None => false,
        }
    }

    /// With no ranges, add one spanning the whole palette; otherwise drop them all.
    pub fn toggle_cycling(&mut self) {
        if self.cycles.is_empty() {
            let high = (self.colors.len() - 1) as u8;
            self.cycles.push(CycleRange::new(DEFAULT_CYCLE_RATE, 0, high));
        } else {
            self.cycles.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_color_bytes_are_rgba_in_memory() {
        let c = PaletteColor::rgba(1, 2, 3, 4);
        let packed = c.to_packed();
        assert_eq!(packed.to_ne_bytes(), [1, 2, 3, 4]);
        assert_eq!(PaletteColor::from_packed(packed), c);
    }

    #[test]
    fn palette_size_is_bounded() {
        assert!(Palette::new(vec![PaletteColor::default()]).is_err());
        assert!(Palette::new(vec![PaletteColor::default(); 257]).is_err());
        assert!(Palette::new(vec![PaletteColor::default(); 2]).is_ok());
    }

    #[test]
    fn add_and_remove_respect_limits_and_clamp_selection() {
        let mut palette = Palette::default();
        assert!(palette.add_color(PaletteColor::rgba(9, 9, 9, 255)));
        assert_eq!(palette.len(), 33);

        palette.set_foreground_index(32);
        palette.set_background_index(31);
        assert!(palette.remove_color(32));
        assert_eq!(palette.len(), 32);
        assert_eq!(palette.foreground_index(), 31);
        assert_eq!(palette.background_index(), 31);

        let mut tiny = Palette::new(vec![PaletteColor::default(); 2]).unwrap();
        assert!(!tiny.remove_color(0));

        let mut full = Palette::new(Palette::grey_ramp(256)).unwrap();
        assert!(!full.add_color(PaletteColor::default()));
    }

    #[test]
    fn selection_is_clamped_to_palette() {
        let mut palette = Palette::default();
        palette.set_foreground_index(500);
        assert_eq!(palette.foreground_index(), 31);
    }

    #[test]
    fn toggle_cycling_adds_then_clears() {
        let mut palette = Palette::default();
        palette.toggle_cycling();
        assert_eq!(palette.cycles().len(), 1);
        assert_eq!(palette.cycles()[0].low, 0);
        assert_eq!(palette.cycles()[0].high, 31);
        palette.toggle_cycling();
        assert!(palette.cycles().is_empty());
    }

    #[test]
    fn value_for_depends_on_mode() {
        let mut palette = Palette::default();
        palette.set_color(3, PaletteColor::rgba(200, 10, 20, 255));
        assert_eq!(palette.value_for(BufferMode::Indexed, 3), 3);
        assert_eq!(
            palette.value_for(BufferMode::Direct, 3),
            PaletteColor::rgba(200, 10, 20, 255).to_packed()
        );
    }

    #[test]
    fn cycle_range_orders_bounds() {
        let range = CycleRange::new(5, 9, 2);
        assert_eq!((range.low, range.high), (2, 9));
        assert_eq!(range.span(), 8);
        assert!(range.fits(10));
        assert!(!range.fits(9));
    }
}
