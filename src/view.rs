// ============================================================================
// VIEW STATE - zoom ladder, pan offsets, screen ↔ document mapping
// ============================================================================

use serde::{Deserialize, Serialize};

/// Supported integer zoom factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ZoomLevel {
    X1,
    X2,
    #[default]
    X4,
    X8,
    X16,
    X32,
}

impl ZoomLevel {
    pub fn all() -> &'static [ZoomLevel] {
        &[
            ZoomLevel::X1,
            ZoomLevel::X2,
            ZoomLevel::X4,
            ZoomLevel::X8,
            ZoomLevel::X16,
            ZoomLevel::X32,
        ]
    }

    pub fn factor(self) -> u32 {
        match self {
            ZoomLevel::X1 => 1,
            ZoomLevel::X2 => 2,
            ZoomLevel::X4 => 4,
            ZoomLevel::X8 => 8,
            ZoomLevel::X16 => 16,
            ZoomLevel::X32 => 32,
        }
    }

    pub fn from_factor(factor: u32) -> Option<Self> {
        Self::all().iter().copied().find(|z| z.factor() == factor)
    }

    /// Next level up, saturating at 32×.
    pub fn zoom_in(self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|&z| z == self).unwrap_or(0);
        all[(i + 1).min(all.len() - 1)]
    }

    /// Next level down, saturating at 1×.
    pub fn zoom_out(self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|&z| z == self).unwrap_or(0);
        all[i.saturating_sub(1)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: ZoomLevel,
    /// Pan offset in document pixels.
    pub offset_x: i32,
    pub offset_y: i32,
    pub show_grid: bool,
    pub cycle_animation_enabled: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: ZoomLevel::default(),
            offset_x: 0,
            offset_y: 0,
            show_grid: false,
            cycle_animation_enabled: false,
        }
    }
}

impl ViewState {
    /// Set the zoom from a raw factor. Factors off the ladder fall back to
    /// the default zoom.
    pub fn set_zoom_factor(&mut self, factor: u32) {
        self.zoom = ZoomLevel::from_factor(factor).unwrap_or_default();
    }

    pub fn set_offsets(&mut self, offset_x: i32, offset_y: i32) {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
    }

    /// `None` flips the grid, `Some(v)` forces it.
    pub fn toggle_grid(&mut self, show: Option<bool>) {
        self.show_grid = show.unwrap_or(!self.show_grid);
    }
}

/// Integer document-space coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DocPoint {
    pub x: i32,
    pub y: i32,
}

impl DocPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for DocPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Map a surface-relative screen position to the document pixel under it,
/// clamped to `[0, width-1] × [0, height-1]`.
pub fn screen_to_document(
    screen_x: f32,
    screen_y: f32,
    view: &ViewState,
    doc_width: u32,
    doc_height: u32,
) -> DocPoint {
    let zoom = view.zoom.factor() as f32;
    let x = ((screen_x + view.offset_x as f32 * zoom) / zoom).floor();
    let y = ((screen_y + view.offset_y as f32 * zoom) / zoom).floor();
    DocPoint {
        x: (x as i32).clamp(0, doc_width.saturating_sub(1) as i32),
        y: (y as i32).clamp(0, doc_height.saturating_sub(1) as i32),
    }
}

/// Top-left screen position of a document pixel (used for overlays).
pub fn document_to_screen(point: DocPoint, view: &ViewState) -> (f32, f32) {
    let zoom = view.zoom.factor() as f32;
    (
        (point.x - view.offset_x) as f32 * zoom,
        (point.y - view.offset_y) as f32 * zoom,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panned_view() -> ViewState {
        ViewState {
            zoom: ZoomLevel::X4,
            offset_x: 10,
            offset_y: 5,
            ..ViewState::default()
        }
    }

    #[test]
    fn screen_to_document_respects_zoom_and_pan() {
        let p = screen_to_document(40.0, 20.0, &panned_view(), 320, 200);
        assert_eq!(p, DocPoint::new(20, 10));
    }

    #[test]
    fn screen_to_document_clamps_to_bounds() {
        let view = panned_view();
        assert_eq!(
            screen_to_document(-1000.0, -1000.0, &view, 320, 200),
            DocPoint::new(0, 0)
        );
        assert_eq!(
            screen_to_document(1.0e6, 1.0e6, &view, 320, 200),
            DocPoint::new(319, 199)
        );
    }

    #[test]
    fn document_to_screen_inverts_the_mapping() {
        assert_eq!(
            document_to_screen(DocPoint::new(20, 10), &panned_view()),
            (40.0, 20.0)
        );
    }

    #[test]
    fn invalid_zoom_falls_back_to_default() {
        let mut view = ViewState::default();
        view.set_zoom_factor(8);
        assert_eq!(view.zoom, ZoomLevel::X8);
        view.set_zoom_factor(3);
        assert_eq!(view.zoom, ZoomLevel::X4);
    }

    #[test]
    fn zoom_steps_saturate() {
        assert_eq!(ZoomLevel::X32.zoom_in(), ZoomLevel::X32);
        assert_eq!(ZoomLevel::X1.zoom_out(), ZoomLevel::X1);
        assert_eq!(ZoomLevel::X2.zoom_in(), ZoomLevel::X4);
    }

    #[test]
    fn grid_toggle_flips_or_forces() {
        let mut view = ViewState::default();
        view.toggle_grid(None);
        assert!(view.show_grid);
        view.toggle_grid(Some(false));
        assert!(!view.show_grid);
    }
}
