//! Property-based invariant tests for the paint engine.
//!
//! 1. Resize keeps the overlapping region and zeroes everything new
//! 2. Lines always contain both endpoints and ignore argument order
//! 3. Flood fill rewrites exactly the connected region of the seed value,
//!    once per cell, in indexed and direct buffers
//! 4. Undo of every gesture restores the starting document; redo replays it,
//!    in both buffer modes
//! 5. The undo stack never exceeds its limit
//! 6. Palette rotation is a permutation and composes modulo the span
//! 7. Screen mapping always lands inside the document
//! 8. The display surface is the document scaled by the zoom factor

use proptest::prelude::*;

use swankypaint::canvas::{BufferMode, Document, PixelBuffer};
use swankypaint::components::colors::PaletteColor;
use swankypaint::components::history::HistoryManager;
use swankypaint::components::tools::{PointerButton, Tool, ToolBox};
use swankypaint::cycler::rotate_range_in_place;
use swankypaint::ops::draw::draw_line;
use swankypaint::ops::fill::flood_fill;
use swankypaint::renderer::Renderer;
use swankypaint::view::{screen_to_document, DocPoint, ViewState, ZoomLevel};

// ── Strategies ──────────────────────────────────────────────────────────

fn dimension() -> impl Strategy<Value = u32> {
    32u32..96
}

fn coord() -> impl Strategy<Value = i32> {
    -8i32..72
}

#[derive(Debug, Clone)]
enum Gesture {
    Stroke(Vec<(i32, i32)>),
    Line((i32, i32), (i32, i32)),
    Rectangle((i32, i32), (i32, i32), bool),
    Fill((i32, i32), usize),
    Cancelled(Vec<(i32, i32)>),
    Pick((i32, i32), bool),
}

fn point() -> impl Strategy<Value = (i32, i32)> {
    (0i32..32, 0i32..32)
}

fn gesture_strategy() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        prop::collection::vec(point(), 1..6).prop_map(Gesture::Stroke),
        (point(), point()).prop_map(|(a, b)| Gesture::Line(a, b)),
        (point(), point(), any::<bool>()).prop_map(|(a, b, f)| Gesture::Rectangle(a, b, f)),
        (point(), 0usize..32).prop_map(|(p, i)| Gesture::Fill(p, i)),
        prop::collection::vec(point(), 1..6).prop_map(Gesture::Cancelled),
        (point(), any::<bool>()).prop_map(|(p, secondary)| Gesture::Pick(p, secondary)),
    ]
}

fn mode_strategy() -> impl Strategy<Value = BufferMode> {
    prop_oneof![Just(BufferMode::Indexed), Just(BufferMode::Direct)]
}

fn p((x, y): (i32, i32)) -> DocPoint {
    DocPoint::new(x, y)
}

/// Run one gesture through the tool box.
fn perform(doc: &mut Document, history: &mut HistoryManager, tools: &mut ToolBox, g: &Gesture) {
    match g {
        Gesture::Stroke(points) | Gesture::Cancelled(points) => {
            tools.set_active_tool(Tool::Pencil, doc, history);
            tools.pointer_down(doc, history, p(points[0]), PointerButton::Primary);
            for &pt in &points[1..] {
                tools.pointer_move(doc, history, p(pt));
            }
            if matches!(g, Gesture::Cancelled(_)) {
                tools.cancel(doc, history);
            } else {
                let last = points[points.len() - 1];
                tools.pointer_up(doc, history, p(last));
            }
        }
        Gesture::Line(a, b) => {
            tools.set_active_tool(Tool::Line, doc, history);
            tools.pointer_down(doc, history, p(*a), PointerButton::Secondary);
            tools.pointer_up(doc, history, p(*b));
        }
        Gesture::Rectangle(a, b, filled) => {
            tools.set_active_tool(Tool::Rectangle, doc, history);
            tools.options.rectangle_filled = *filled;
            tools.pointer_down(doc, history, p(*a), PointerButton::Primary);
            tools.pointer_up(doc, history, p(*b));
        }
        Gesture::Fill(at, index) => {
            doc.palette.set_foreground_index(*index);
            tools.set_active_tool(Tool::Fill, doc, history);
            tools.pointer_down(doc, history, p(*at), PointerButton::Primary);
            tools.pointer_up(doc, history, p(*at));
        }
        Gesture::Pick(at, secondary) => {
            let button = if *secondary {
                PointerButton::Secondary
            } else {
                PointerButton::Primary
            };
            tools.set_active_tool(Tool::Picker, doc, history);
            tools.pointer_down(doc, history, p(*at), button);
            tools.pointer_up(doc, history, p(*at));
        }
    }
}

/// Breadth-first reachability over the seed value, as a fill reference.
fn reachable(before: &PixelBuffer, sx: i32, sy: i32) -> Vec<bool> {
    let w = before.width() as i32;
    let target = before.get(sx, sy);
    let mut reach = vec![false; (before.width() * before.height()) as usize];
    let mut queue = vec![(sx, sy)];
    reach[(sy * w + sx) as usize] = true;
    while let Some((x, y)) = queue.pop() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if before.get(nx, ny) == target && !reach[(ny * w + nx) as usize] {
                reach[(ny * w + nx) as usize] = true;
                queue.push((nx, ny));
            }
        }
    }
    reach
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Resize
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_preserves_overlap(
        w in dimension(),
        h in dimension(),
        nw in dimension(),
        nh in dimension(),
        seed in any::<u8>(),
    ) {
        let data: Vec<u8> = (0..w * h).map(|i| (i as u8).wrapping_add(seed) | 1).collect();
        let buf = PixelBuffer::from_indexed(w, h, data).unwrap();
        let resized = buf.resize(nw, nh).unwrap();

        prop_assert_eq!((resized.width(), resized.height()), (nw, nh));
        for y in 0..nh as i32 {
            for x in 0..nw as i32 {
                let expected = if (x as u32) < w && (y as u32) < h { buf.get(x, y) } else { Some(0) };
                prop_assert_eq!(resized.get(x, y), expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn out_of_range_sizes_are_rejected(w in 0u32..32, h in dimension()) {
        let buf = PixelBuffer::new(BufferMode::Indexed, 32, 32).unwrap();
        prop_assert!(buf.resize(w, h).is_err());
        prop_assert!(buf.resize(h, w).is_err());
        prop_assert!(buf.resize(4097, h).is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Lines
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lines_hit_both_ends_symmetrically(
        x0 in 0i32..64, y0 in 0i32..64, x1 in 0i32..64, y1 in 0i32..64,
    ) {
        let mut a = PixelBuffer::new(BufferMode::Indexed, 64, 64).unwrap();
        let mut b = a.clone();
        draw_line(&mut a, x0, y0, x1, y1, 1);
        draw_line(&mut b, x1, y1, x0, y0, 1);

        prop_assert_eq!(a.get(x0, y0), Some(1));
        prop_assert_eq!(a.get(x1, y1), Some(1));
        prop_assert_eq!(&a, &b);

        let count = a.as_indexed().unwrap().iter().filter(|&&v| v == 1).count();
        let expected = (x1 - x0).abs().max((y1 - y0).abs()) as usize + 1;
        prop_assert_eq!(count, expected);
    }

    #[test]
    fn lines_never_panic_off_canvas(x0 in coord(), y0 in coord(), x1 in coord(), y1 in coord()) {
        let mut buf = PixelBuffer::new(BufferMode::Direct, 64, 64).unwrap();
        draw_line(&mut buf, x0 * 100, y0, x1, y1 * 100, 7);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Flood fill
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fill_rewrites_exactly_the_connected_region(
        cells in prop::collection::vec(0u8..3, 32 * 32),
        sx in 0i32..32,
        sy in 0i32..32,
    ) {
        let before = PixelBuffer::from_indexed(32, 32, cells).unwrap();
        let mut after = before.clone();
        let filled = flood_fill(&mut after, sx, sy, 9);
        let reach = reachable(&before, sx, sy);

        prop_assert_eq!(filled, reach.iter().filter(|&&r| r).count());
        for y in 0..32 {
            for x in 0..32 {
                let expected = if reach[(y * 32 + x) as usize] { Some(9) } else { before.get(x, y) };
                prop_assert_eq!(after.get(x, y), expected);
            }
        }
    }

    #[test]
    fn direct_fill_touches_each_connected_cell_once(
        cells in prop::collection::vec(
            prop::sample::select(vec![0u32, 0x1122_3344, 0xFFFF_FFFF]),
            32 * 32,
        ),
        sx in 0i32..32,
        sy in 0i32..32,
    ) {
        const REPLACEMENT: u32 = 0xFF00_FF00;
        let before = PixelBuffer::from_direct(32, 32, cells).unwrap();
        let mut after = before.clone();
        let filled = flood_fill(&mut after, sx, sy, REPLACEMENT);
        let reach = reachable(&before, sx, sy);

        prop_assert_eq!(filled, reach.iter().filter(|&&r| r).count());
        for y in 0..32 {
            for x in 0..32 {
                let expected = if reach[(y * 32 + x) as usize] {
                    Some(REPLACEMENT)
                } else {
                    before.get(x, y)
                };
                prop_assert_eq!(after.get(x, y), expected);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4 & 5. History
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn undo_all_restores_and_redo_all_replays(
        mode in mode_strategy(),
        gestures in prop::collection::vec(gesture_strategy(), 1..12),
    ) {
        let mut doc = Document::new(mode, 32, 32).unwrap();
        let start = doc.clone();
        let mut history = HistoryManager::default();
        let mut tools = ToolBox::default();

        for g in &gestures {
            perform(&mut doc, &mut history, &mut tools, g);
        }
        let finished = doc.clone();

        // Selection moves outside history; buffers and palette colors do not.
        while history.undo(&mut doc).is_some() {}
        prop_assert_eq!(&doc.buffer, &start.buffer);
        prop_assert_eq!(doc.palette.colors(), start.palette.colors());
        while history.redo(&mut doc).is_some() {}
        prop_assert_eq!(&doc.buffer, &finished.buffer);
        prop_assert_eq!(doc.palette.colors(), finished.palette.colors());
    }

    #[test]
    fn history_never_exceeds_limit(
        limit in 1usize..8,
        mode in mode_strategy(),
        gestures in prop::collection::vec(gesture_strategy(), 0..20),
    ) {
        let mut doc = Document::new(mode, 32, 32).unwrap();
        let mut history = HistoryManager::new(limit);
        let mut tools = ToolBox::default();
        for g in &gestures {
            perform(&mut doc, &mut history, &mut tools, g);
            prop_assert!(history.undo_count() <= limit);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Palette rotation
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rotation_is_a_permutation_that_composes(
        len in 2usize..64,
        a in 0usize..64,
        b in 0usize..64,
        amount in -200i64..200,
    ) {
        let (low, high) = (a.min(b) % len, a.max(b) % len);
        let (low, high) = (low.min(high), low.max(high));
        let initial: Vec<PaletteColor> =
            (0..len).map(|i| PaletteColor::rgba(i as u8, 0, 0, 255)).collect();

        let mut colors = initial.clone();
        rotate_range_in_place(&mut colors, low, high, amount);

        // Outside the range nothing moves.
        for i in (0..low).chain(high + 1..len) {
            prop_assert_eq!(colors[i], initial[i]);
        }
        let mut sorted = colors.clone();
        sorted.sort_by_key(|c| c.r);
        prop_assert_eq!(&sorted, &initial);

        // Rotating back by the same amount restores the slice.
        rotate_range_in_place(&mut colors, low, high, -amount);
        prop_assert_eq!(&colors, &initial);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7 & 8. View and rendering
// ═══════════════════════════════════════════════════════════════════════

fn zoom_strategy() -> impl Strategy<Value = ZoomLevel> {
    prop::sample::select(ZoomLevel::all().to_vec())
}

proptest! {
    #[test]
    fn screen_mapping_stays_in_bounds(
        sx in -5000.0f32..5000.0,
        sy in -5000.0f32..5000.0,
        zoom in zoom_strategy(),
        ox in -100i32..100,
        oy in -100i32..100,
        w in dimension(),
        h in dimension(),
    ) {
        let view = ViewState { zoom, offset_x: ox, offset_y: oy, ..ViewState::default() };
        let pt = screen_to_document(sx, sy, &view, w, h);
        prop_assert!(pt.x >= 0 && pt.x < w as i32);
        prop_assert!(pt.y >= 0 && pt.y < h as i32);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn surface_is_document_times_zoom(
        w in dimension(),
        h in dimension(),
        zoom in prop::sample::select(vec![ZoomLevel::X1, ZoomLevel::X2, ZoomLevel::X4]),
        grid in any::<bool>(),
        x in 0i32..32,
        y in 0i32..32,
    ) {
        let mut doc = Document::new(BufferMode::Indexed, w, h).unwrap();
        doc.buffer.put(x, y, 31);
        let view = ViewState { zoom, show_grid: grid, ..ViewState::default() };

        let mut renderer = Renderer::new();
        let surface = renderer.render(&doc, &view);
        let f = zoom.factor();
        prop_assert_eq!(surface.dimensions(), (w * f, h * f));

        // Interior of a zoomed cell (away from grid lines) shows the cell color.
        let (px, py) = (x as u32 * f + f / 2, y as u32 * f + f / 2);
        let inside_grid_line = grid && f >= 2 && (px % f == 0 || py % f == 0);
        if !inside_grid_line {
            prop_assert_eq!(surface.get_pixel(px, py).0, [31, 31, 31, 255]);
        }
    }
}
