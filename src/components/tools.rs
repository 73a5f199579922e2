use crate::canvas::{BufferMode, Document, PixelBuffer};
use crate::components::colors::PaletteColor;
use crate::components::history::{Command, CommandKind, HistoryManager, StrokeTool};
use crate::ops::draw::{draw_line_points, set_pixel};
use crate::view::DocPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    Line,
    Rectangle,
    Fill,
    Picker,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Eraser,
            Tool::Line,
            Tool::Rectangle,
            Tool::Fill,
            Tool::Picker,
        ]
    }

    /// Stable identifier used by the session layer.
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Pencil => "pencil",
            Tool::Eraser => "eraser",
            Tool::Line => "line",
            Tool::Rectangle => "rectangle",
            Tool::Fill => "fill",
            Tool::Picker => "picker",
        }
    }

    pub fn from_id(id: &str) -> Option<Tool> {
        Self::all().iter().copied().find(|t| t.id() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Fill => "Fill",
            Tool::Picker => "Color Picker",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Tool::Pencil => 'b',
            Tool::Eraser => 'e',
            Tool::Line => 'l',
            Tool::Rectangle => 'r',
            Tool::Fill => 'f',
            Tool::Picker => 'i',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Tool> {
        let key = key.to_ascii_lowercase();
        Self::all().iter().copied().find(|t| t.shortcut() == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    /// Draws with the foreground selection.
    #[default]
    Primary,
    /// Draws with the background selection.
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ToolOptions {
    pub rectangle_filled: bool,
}

/// Everything a tool may touch while handling a gesture.
pub struct ToolContext<'a> {
    pub document: &'a mut Document,
    pub history: &'a mut HistoryManager,
    pub options: ToolOptions,
}

impl ToolContext<'_> {
    /// Drawing value selected by `button`.
    fn pointer_value(&self, button: PointerButton) -> u32 {
        let palette = &self.document.palette;
        let index = match button {
            PointerButton::Primary => palette.foreground_index(),
            PointerButton::Secondary => palette.background_index(),
        };
        palette.value_for(self.document.mode(), index)
    }

    fn background_value(&self) -> u32 {
        let palette = &self.document.palette;
        palette.value_for(self.document.mode(), palette.background_index())
    }
}

/// The gesture callbacks every tool answers. Callbacks that commit a command
/// return its label.
pub trait GestureHandler {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String>;

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint);

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) -> Option<String>;

    /// Abandon the gesture in progress. History is never touched.
    fn on_cancel(&mut self, _ctx: &mut ToolContext<'_>) {}
}

// ============================================================================
// PENCIL / ERASER
// ============================================================================

struct ActiveStroke {
    before: PixelBuffer,
    points: Vec<DocPoint>,
    value: u32,
}

/// Freehand stroke drawn live. The undo snapshot is taken once at pointer
/// down; the point list lets redo replay the same segments.
pub struct StrokeGesture {
    tool: StrokeTool,
    active: Option<ActiveStroke>,
}

impl StrokeGesture {
    pub fn new(tool: StrokeTool) -> Self {
        Self { tool, active: None }
    }
}

impl GestureHandler for StrokeGesture {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        let value = match self.tool {
            StrokeTool::Pencil => ctx.pointer_value(button),
            StrokeTool::Eraser => ctx.background_value(),
        };
        let before = ctx.document.buffer.clone();
        set_pixel(&mut ctx.document.buffer, pos.x, pos.y, value);
        self.active = Some(ActiveStroke {
            before,
            points: vec![pos],
            value,
        });
        None
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) {
        let Some(stroke) = self.active.as_mut() else {
            return;
        };
        let last = stroke.points.last().copied().unwrap_or(pos);
        draw_line_points(&mut ctx.document.buffer, last, pos, stroke.value);
        stroke.points.push(pos);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) -> Option<String> {
        let mut stroke = self.active.take()?;
        if stroke.points.last() != Some(&pos) {
            let last = stroke.points.last().copied().unwrap_or(pos);
            draw_line_points(&mut ctx.document.buffer, last, pos, stroke.value);
            stroke.points.push(pos);
        }

        let command = Command::new(CommandKind::Stroke {
            tool: self.tool,
            before: stroke.before,
            points: stroke.points,
            value: stroke.value,
        });
        // Already drawn live; record without re-applying.
        Some(ctx.history.push(command))
    }

    fn on_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        // Drop the uncommitted live pixels along with the gesture.
        if let Some(stroke) = self.active.take() {
            ctx.document.buffer = stroke.before;
        }
    }
}

// ============================================================================
// LINE / RECTANGLE
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
}

/// Anchor-and-release shapes. Nothing is written until pointer up; previews
/// belong to the rendering layer.
pub struct ShapeGesture {
    kind: ShapeKind,
    anchor: Option<(DocPoint, u32)>,
}

impl ShapeGesture {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, anchor: None }
    }

    /// Anchor point of the gesture in progress (for preview overlays).
    pub fn anchor(&self) -> Option<DocPoint> {
        self.anchor.map(|(p, _)| p)
    }
}

impl GestureHandler for ShapeGesture {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        self.anchor = Some((pos, ctx.pointer_value(button)));
        None
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _pos: DocPoint) {}

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) -> Option<String> {
        let (start, value) = self.anchor.take()?;
        let before = ctx.document.buffer.clone();
        let kind = match self.kind {
            ShapeKind::Line => CommandKind::Line {
                before,
                start,
                end: pos,
                value,
            },
            ShapeKind::Rectangle => CommandKind::Rectangle {
                before,
                start,
                end: pos,
                value,
                filled: ctx.options.rectangle_filled,
            },
        };
        Some(ctx.history.execute(Command::new(kind), ctx.document))
    }

    fn on_cancel(&mut self, _ctx: &mut ToolContext<'_>) {
        self.anchor = None;
    }
}

// ============================================================================
// FILL
// ============================================================================

#[derive(Default)]
pub struct FillGesture;

impl GestureHandler for FillGesture {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        let value = ctx.pointer_value(button);
        let current = ctx.document.get(pos.x, pos.y)?;
        let normalized = match ctx.document.mode() {
            BufferMode::Indexed => value & 0xFF,
            BufferMode::Direct => value,
        };
        if current == normalized {
            return None;
        }

        let command = Command::new(CommandKind::Fill {
            before: ctx.document.buffer.clone(),
            seed: pos,
            value,
        });
        Some(ctx.history.execute(command, ctx.document))
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _pos: DocPoint) {}

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _pos: DocPoint) -> Option<String> {
        None
    }
}

// ============================================================================
// COLOR PICKER
// ============================================================================

/// Samples the cell under the pointer into the foreground (primary) or
/// background (secondary) selection. A direct color with no palette match is
/// written into the selected slot as an undoable "Pick color" step; every
/// other pick only moves the selection.
#[derive(Default)]
pub struct PickerGesture;

impl GestureHandler for PickerGesture {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        let value = ctx.document.get(pos.x, pos.y)?;
        let palette = &ctx.document.palette;

        let index = match ctx.document.mode() {
            BufferMode::Indexed => {
                let index = value as usize;
                // Cells may hold indices past the palette end; keep the selection.
                if index >= palette.len() {
                    return None;
                }
                index
            }
            BufferMode::Direct => {
                let color = PaletteColor::from_packed(value);
                match palette.find(color) {
                    Some(i) => i,
                    None => return Some(store_picked_color(ctx, color, button)),
                }
            }
        };

        let palette = &mut ctx.document.palette;
        match button {
            PointerButton::Primary => palette.set_foreground_index(index),
            PointerButton::Secondary => palette.set_background_index(index),
        }
        None
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext<'_>, _pos: DocPoint) {}

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext<'_>, _pos: DocPoint) -> Option<String> {
        None
    }
}

/// Overwrite the slot selected by `button` with `color` through history.
fn store_picked_color(
    ctx: &mut ToolContext<'_>,
    color: PaletteColor,
    button: PointerButton,
) -> String {
    let before = ctx.document.palette.clone();
    let mut after = before.clone();
    let slot = match button {
        PointerButton::Primary => after.foreground_index(),
        PointerButton::Secondary => after.background_index(),
    };
    after.set_color(slot, color);
    let command = Command::new(CommandKind::Palette {
        label: "Pick color".to_string(),
        before,
        after,
    });
    ctx.history.execute(command, ctx.document)
}

// ============================================================================
// TOOL STATE - tagged dispatch over the concrete tools
// ============================================================================

pub enum ToolState {
    Pencil(StrokeGesture),
    Eraser(StrokeGesture),
    Line(ShapeGesture),
    Rectangle(ShapeGesture),
    Fill(FillGesture),
    Picker(PickerGesture),
}

impl ToolState {
    pub fn new(tool: Tool) -> Self {
        match tool {
            Tool::Pencil => ToolState::Pencil(StrokeGesture::new(StrokeTool::Pencil)),
            Tool::Eraser => ToolState::Eraser(StrokeGesture::new(StrokeTool::Eraser)),
            Tool::Line => ToolState::Line(ShapeGesture::new(ShapeKind::Line)),
            Tool::Rectangle => ToolState::Rectangle(ShapeGesture::new(ShapeKind::Rectangle)),
            Tool::Fill => ToolState::Fill(FillGesture),
            Tool::Picker => ToolState::Picker(PickerGesture),
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            ToolState::Pencil(_) => Tool::Pencil,
            ToolState::Eraser(_) => Tool::Eraser,
            ToolState::Line(_) => Tool::Line,
            ToolState::Rectangle(_) => Tool::Rectangle,
            ToolState::Fill(_) => Tool::Fill,
            ToolState::Picker(_) => Tool::Picker,
        }
    }

    fn handler(&mut self) -> &mut dyn GestureHandler {
        match self {
            ToolState::Pencil(g) | ToolState::Eraser(g) => g,
            ToolState::Line(g) | ToolState::Rectangle(g) => g,
            ToolState::Fill(g) => g,
            ToolState::Picker(g) => g,
        }
    }
}

impl GestureHandler for ToolState {
    fn on_pointer_down(
        &mut self,
        ctx: &mut ToolContext<'_>,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        self.handler().on_pointer_down(ctx, pos, button)
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) {
        self.handler().on_pointer_move(ctx, pos)
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext<'_>, pos: DocPoint) -> Option<String> {
        self.handler().on_pointer_up(ctx, pos)
    }

    fn on_cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.handler().on_cancel(ctx)
    }
}

// ============================================================================
// TOOL BOX - active tool plus gesture ordering
// ============================================================================

/// Owns the active tool and enforces down → move* → up|cancel ordering.
/// Stray moves and ups outside a gesture are dropped.
pub struct ToolBox {
    state: ToolState,
    pub options: ToolOptions,
    in_gesture: bool,
}

impl Default for ToolBox {
    fn default() -> Self {
        Self {
            state: ToolState::new(Tool::default()),
            options: ToolOptions::default(),
            in_gesture: false,
        }
    }
}

impl ToolBox {
    pub fn active_tool(&self) -> Tool {
        self.state.tool()
    }

    pub fn in_gesture(&self) -> bool {
        self.in_gesture
    }

    /// Anchor of a line or rectangle gesture in progress.
    pub fn shape_anchor(&self) -> Option<DocPoint> {
        match &self.state {
            ToolState::Line(g) | ToolState::Rectangle(g) => g.anchor(),
            _ => None,
        }
    }

    /// Switch tools. A gesture in progress on the old tool is cancelled.
    pub fn set_active_tool(
        &mut self,
        tool: Tool,
        document: &mut Document,
        history: &mut HistoryManager,
    ) {
        if tool == self.state.tool() {
            return;
        }
        self.cancel(document, history);
        self.state = ToolState::new(tool);
    }

    pub fn pointer_down(
        &mut self,
        document: &mut Document,
        history: &mut HistoryManager,
        pos: DocPoint,
        button: PointerButton,
    ) -> Option<String> {
        if self.in_gesture {
            return None;
        }
        self.in_gesture = true;
        let mut ctx = ToolContext {
            document,
            history,
            options: self.options,
        };
        self.state.on_pointer_down(&mut ctx, pos, button)
    }

    pub fn pointer_move(
        &mut self,
        document: &mut Document,
        history: &mut HistoryManager,
        pos: DocPoint,
    ) {
        if !self.in_gesture {
            return;
        }
        let mut ctx = ToolContext {
            document,
            history,
            options: self.options,
        };
        self.state.on_pointer_move(&mut ctx, pos);
    }

    pub fn pointer_up(
        &mut self,
        document: &mut Document,
        history: &mut HistoryManager,
        pos: DocPoint,
    ) -> Option<String> {
        if !self.in_gesture {
            return None;
        }
        self.in_gesture = false;
        let mut ctx = ToolContext {
            document,
            history,
            options: self.options,
        };
        self.state.on_pointer_up(&mut ctx, pos)
    }

    /// Escape: abandon the current gesture. Committed history is untouched.
    pub fn cancel(&mut self, document: &mut Document, history: &mut HistoryManager) {
        if !self.in_gesture {
            return;
        }
        self.in_gesture = false;
        let mut ctx = ToolContext {
            document,
            history,
            options: self.options,
        };
        self.state.on_cancel(&mut ctx);
    }

    /// Forget any gesture without touching the document (document replaced).
    pub fn reset(&mut self) {
        self.in_gesture = false;
        self.state = ToolState::new(self.state.tool());
    }
}
