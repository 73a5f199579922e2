use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::{BufferMode, Document};
use crate::components::colors::{CycleRange, Palette, PaletteColor};
use crate::components::history::{Command, CommandKind, HistoryManager};
use crate::components::tools::{PointerButton, Tool, ToolBox};
use crate::cycler::PaletteCycler;
use crate::error::Result;
use crate::io::{self, ProjectError};
use crate::ops::canvas_ops;
use crate::renderer::Renderer;
use crate::view::{self, DocPoint, ViewState};

/// One open document with everything needed to edit and display it.
///
/// All engine state lives here and is passed explicitly; there is no global
/// store.
pub struct EditorSession {
    pub id: Uuid,
    /// Display name (from the file name or "Untitled-N").
    pub name: String,
    /// `None` until the session is saved or opened from disk.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    document: Document,
    view: ViewState,
    history: HistoryManager,
    tools: ToolBox,
    cycler: PaletteCycler,
    renderer: Renderer,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::from_document(Document::default(), "Untitled-1".to_string())
    }
}

impl EditorSession {
    pub fn new_untitled(
        untitled_counter: usize,
        mode: BufferMode,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let document = canvas_ops::new_document(mode, width, height)?;
        Ok(Self::from_document(
            document,
            format!("Untitled-{}", untitled_counter),
        ))
    }

    pub fn from_document(document: Document, name: String) -> Self {
        let cycler = PaletteCycler::new(&document.palette);
        Self {
            id: Uuid::new_v4(),
            name,
            path: None,
            is_dirty: false,
            document,
            view: ViewState::default(),
            history: HistoryManager::default(),
            tools: ToolBox::default(),
            cycler,
            renderer: Renderer::new(),
        }
    }

    /// Open a `.swp` project.
    pub fn open(path: &Path) -> std::result::Result<Self, ProjectError> {
        let document = io::load_project(path)?;
        let mut session = Self::from_document(document, file_display_name(path));
        session.path = Some(path.to_path_buf());
        crate::log_info!("Opened {}", path.display());
        Ok(session)
    }

    /// Save to `path` and adopt it as the session's file.
    pub fn save_as(&mut self, path: &Path) -> std::result::Result<(), ProjectError> {
        io::save_project(&self.document, path)?;
        self.path = Some(path.to_path_buf());
        self.name = file_display_name(path);
        self.mark_clean();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Name with a trailing `*` when there are unsaved changes.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryManager {
        &mut self.history
    }

    // ------------------------------------------------------------------
    // Document replacement
    // ------------------------------------------------------------------

    /// Swap in a different document. History is dropped because its
    /// snapshots belong to the old one; the view is kept.
    fn replace_document(&mut self, document: Document) {
        self.tools.cancel(&mut self.document, &mut self.history);
        self.tools.reset();
        crate::log_info!(
            "Document replaced: {}x{} {} ({} undo steps dropped)",
            document.width(),
            document.height(),
            document.mode().label(),
            self.history.undo_count()
        );
        self.document = document;
        self.history.clear();
        self.cycler.reset(&self.document.palette);
    }

    pub fn new_document(&mut self, mode: BufferMode, width: u32, height: u32) -> Result<()> {
        let document = canvas_ops::new_document(mode, width, height)?;
        self.replace_document(document);
        self.path = None;
        self.mark_clean();
        Ok(())
    }

    /// Replace the document with an externally decoded one.
    pub fn load_document(&mut self, document: Document) -> Result<()> {
        document.validate()?;
        self.replace_document(document);
        self.mark_clean();
        Ok(())
    }

    /// Resize, keeping the top-left overlap. A rejected size changes nothing.
    pub fn resize_document(&mut self, width: u32, height: u32) -> Result<()> {
        let resized = canvas_ops::resize_document(&self.document, width, height)?;
        self.replace_document(resized);
        self.mark_dirty();
        Ok(())
    }

    pub fn clear_document(&mut self) -> String {
        self.tools.cancel(&mut self.document, &mut self.history);
        let label = canvas_ops::clear_document(&mut self.document, &mut self.history);
        self.mark_dirty();
        label
    }

    // ------------------------------------------------------------------
    // Tools and selection
    // ------------------------------------------------------------------

    pub fn active_tool(&self) -> Tool {
        self.tools.active_tool()
    }

    pub fn set_active_tool(&mut self, tool: Tool) {
        self.tools
            .set_active_tool(tool, &mut self.document, &mut self.history);
    }

    /// Select a tool by its id. Unknown ids are ignored.
    pub fn set_active_tool_id(&mut self, id: &str) -> bool {
        match Tool::from_id(id) {
            Some(tool) => {
                self.set_active_tool(tool);
                true
            }
            None => false,
        }
    }

    /// Keyboard shortcut for tool selection.
    pub fn handle_shortcut(&mut self, key: char) -> bool {
        match Tool::from_shortcut(key) {
            Some(tool) => {
                self.set_active_tool(tool);
                true
            }
            None => false,
        }
    }

    pub fn set_rectangle_filled(&mut self, filled: bool) {
        self.tools.options.rectangle_filled = filled;
    }

    pub fn set_foreground_index(&mut self, index: usize) {
        self.document.palette.set_foreground_index(index);
    }

    pub fn set_background_index(&mut self, index: usize) {
        self.document.palette.set_background_index(index);
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    pub fn set_zoom(&mut self, factor: u32) {
        self.view.set_zoom_factor(factor);
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom = self.view.zoom.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom = self.view.zoom.zoom_out();
    }

    pub fn set_view_offsets(&mut self, offset_x: i32, offset_y: i32) {
        self.view.set_offsets(offset_x, offset_y);
    }

    pub fn toggle_grid(&mut self, show: Option<bool>) {
        self.view.toggle_grid(show);
    }

    /// Turning animation on restarts it from the stored palette.
    pub fn set_cycle_animation_enabled(&mut self, enabled: bool) {
        if enabled && !self.view.cycle_animation_enabled {
            self.cycler.reset(&self.document.palette);
        }
        self.view.cycle_animation_enabled = enabled;
    }

    /// Document pixel under a surface-relative screen position.
    pub fn screen_to_document(&self, screen_x: f32, screen_y: f32) -> DocPoint {
        view::screen_to_document(
            screen_x,
            screen_y,
            &self.view,
            self.document.width(),
            self.document.height(),
        )
    }

    /// Top-left corner of a document pixel on the rendered surface.
    pub fn document_to_screen(&self, pos: DocPoint) -> (f32, f32) {
        view::document_to_screen(pos, &self.view)
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, pos: DocPoint, button: PointerButton) -> Option<String> {
        let label = self
            .tools
            .pointer_down(&mut self.document, &mut self.history, pos, button);
        self.after_gesture_event(label)
    }

    pub fn pointer_move(&mut self, pos: DocPoint) {
        self.tools
            .pointer_move(&mut self.document, &mut self.history, pos);
    }

    pub fn pointer_up(&mut self, pos: DocPoint) -> Option<String> {
        let label = self
            .tools
            .pointer_up(&mut self.document, &mut self.history, pos);
        self.after_gesture_event(label)
    }

    /// Escape: abandon the gesture in progress.
    pub fn cancel_gesture(&mut self) {
        self.tools.cancel(&mut self.document, &mut self.history);
    }

    fn after_gesture_event(&mut self, label: Option<String>) -> Option<String> {
        if label.is_some() {
            self.mark_dirty();
            if self.history.last_command().is_some_and(|c| c.is_palette_edit()) {
                self.cycler.reset(&self.document.palette);
            }
        }
        label
    }

    /// Screen-space corner of the line or rectangle anchor while a shape
    /// gesture is open, for preview overlays.
    pub fn shape_anchor_on_screen(&self) -> Option<(f32, f32)> {
        self.tools
            .shape_anchor()
            .map(|anchor| self.document_to_screen(anchor))
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Option<String> {
        self.tools.cancel(&mut self.document, &mut self.history);
        let (label, palette_edit) = self
            .history
            .undo(&mut self.document)
            .map(|c| (c.label(), c.is_palette_edit()))?;
        self.after_history_step(palette_edit);
        Some(label)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.tools.cancel(&mut self.document, &mut self.history);
        let (label, palette_edit) = self
            .history
            .redo(&mut self.document)
            .map(|c| (c.label(), c.is_palette_edit()))?;
        self.after_history_step(palette_edit);
        Some(label)
    }

    fn after_history_step(&mut self, palette_edit: bool) {
        if palette_edit {
            self.cycler.reset(&self.document.palette);
        }
        self.mark_dirty();
    }

    // ------------------------------------------------------------------
    // Palette editing (each change is one undo step)
    // ------------------------------------------------------------------

    fn edit_palette(&mut self, label: &str, edit: impl FnOnce(&mut Palette) -> bool) -> bool {
        let before = self.document.palette.clone();
        let mut after = before.clone();
        if !edit(&mut after) {
            return false;
        }
        let command = Command::new(CommandKind::Palette {
            label: label.to_string(),
            before,
            after,
        });
        self.history.execute(command, &mut self.document);
        self.cycler.reset(&self.document.palette);
        self.mark_dirty();
        true
    }

    pub fn set_palette_color(&mut self, index: usize, color: PaletteColor) -> bool {
        self.edit_palette("Set color", |p| p.set_color(index, color))
    }

    pub fn add_palette_color(&mut self, color: PaletteColor) -> bool {
        self.edit_palette("Add color", |p| p.add_color(color))
    }

    pub fn remove_palette_color(&mut self, index: usize) -> bool {
        self.edit_palette("Remove color", |p| p.remove_color(index))
    }

    pub fn add_cycle_range(&mut self, range: CycleRange) -> bool {
        self.edit_palette("Add cycle range", |p| {
            p.add_cycle_range(range);
            true
        })
    }

    pub fn remove_cycle_range(&mut self, index: usize) -> bool {
        self.edit_palette("Remove cycle range", |p| {
            p.remove_cycle_range(index).is_some()
        })
    }

    pub fn set_cycle_active(&mut self, index: usize, active: bool) -> bool {
        self.edit_palette("Toggle cycle range", |p| p.set_cycle_active(index, active))
    }

    pub fn toggle_cycling(&mut self) -> bool {
        self.edit_palette("Toggle cycling", |p| {
            p.toggle_cycling();
            true
        })
    }

    // ------------------------------------------------------------------
    // Animation and rendering
    // ------------------------------------------------------------------

    /// Feed elapsed time to the color cycler. Returns whether a redraw is
    /// needed.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.view.cycle_animation_enabled {
            return false;
        }
        self.cycler.tick(elapsed, &self.document)
    }

    /// Displayed colors: the rotated copy while animating indexed documents,
    /// the stored palette otherwise.
    pub fn display_colors(&self) -> &[PaletteColor] {
        if self.view.cycle_animation_enabled && self.document.is_indexed() {
            self.cycler.colors()
        } else {
            self.document.palette.colors()
        }
    }

    pub fn render(&mut self) -> &RgbaImage {
        let colors = if self.view.cycle_animation_enabled && self.document.is_indexed() {
            self.cycler.colors()
        } else {
            self.document.palette.colors()
        };
        self.renderer
            .render_with_colors(&self.document, &self.view, colors)
    }
}

fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
