// ============================================================================
// PALETTE CYCLER - timed rotation of palette ranges for display
// ============================================================================
//
// The cycler never touches the document palette. It keeps its own copy of
// the colors, rotates slices of that copy as time is fed in through `tick`,
// and the renderer reads the copy when cycle animation is on.

use std::time::Duration;

use crate::canvas::Document;
use crate::components::colors::{CycleRange, Palette, PaletteColor};

/// Interval used when a range has no usable rate.
pub const FALLBACK_CYCLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Fastest allowed step, roughly one display frame.
pub const MIN_CYCLE_INTERVAL: Duration = Duration::from_millis(16);

/// Rotate `colors[low..=high]` by `amount` positions, wrapping. Positive
/// amounts move every color toward the high end.
///
/// Returns `false` when nothing moved: a range of one entry or less, an
/// amount that is a whole number of turns, or a range past the slice end.
pub fn rotate_range_in_place(
    colors: &mut [PaletteColor],
    low: usize,
    high: usize,
    amount: i64,
) -> bool {
    if low >= high || high >= colors.len() {
        return false;
    }
    let span = (high - low + 1) as i64;
    let shift = amount.rem_euclid(span) as usize;
    if shift == 0 {
        return false;
    }
    colors[low..=high].rotate_right(shift);
    true
}

/// Time between single steps of `range`. Higher rates give shorter
/// intervals; a rate of zero or below gets the slow fallback.
pub fn cycle_interval(range: &CycleRange) -> Duration {
    if range.rate <= 0 {
        return FALLBACK_CYCLE_INTERVAL;
    }
    let micros = 1_000_000 / range.rate as u64;
    Duration::from_micros(micros).max(MIN_CYCLE_INTERVAL)
}

/// Display-side scheduler: one time accumulator per cycle range.
#[derive(Clone, Debug, Default)]
pub struct PaletteCycler {
    colors: Vec<PaletteColor>,
    accumulators: Vec<Duration>,
    /// Cycle list the accumulators were built for.
    ranges: Vec<CycleRange>,
}

impl PaletteCycler {
    pub fn new(palette: &Palette) -> Self {
        let mut cycler = Self::default();
        cycler.reset(palette);
        cycler
    }

    /// Drop all rotation progress and copy the palette afresh.
    pub fn reset(&mut self, palette: &Palette) {
        self.colors = palette.colors().to_vec();
        self.ranges = palette.cycles().to_vec();
        self.accumulators = vec![Duration::ZERO; self.ranges.len()];

        for (i, range) in self.ranges.iter().enumerate() {
            if !range.fits(self.colors.len()) {
                crate::log_warn!(
                    "Cycle range #{} ({}..={}) does not fit a {}-color palette; skipped",
                    i,
                    range.low,
                    range.high,
                    self.colors.len()
                );
            }
        }
    }

    /// Colors as currently rotated.
    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    /// True when the display copy still tracks `palette`.
    fn in_sync(&self, palette: &Palette) -> bool {
        self.ranges.as_slice() == palette.cycles() && self.colors.len() == palette.len()
    }

    /// Advance by `elapsed`. Returns whether any displayed color changed, so
    /// callers can skip a redraw.
    pub fn tick(&mut self, elapsed: Duration, document: &Document) -> bool {
        if !document.is_indexed() {
            return false;
        }
        if !self.in_sync(&document.palette) {
            self.reset(&document.palette);
        }

        let len = self.colors.len();
        let mut changed = false;
        for (range, acc) in self.ranges.iter().zip(self.accumulators.iter_mut()) {
            if !range.active || !range.fits(len) {
                continue;
            }
            *acc += elapsed;
            let interval = cycle_interval(range);
            let steps = acc.as_nanos() / interval.as_nanos();
            if steps == 0 {
                continue;
            }
            *acc = Duration::from_nanos((acc.as_nanos() % interval.as_nanos()) as u64);

            let amount = (steps % range.span() as u128) as i64;
            changed |= rotate_range_in_place(
                &mut self.colors,
                range.low as usize,
                range.high as usize,
                amount,
            );
        }
        changed
    }
}
