use std::collections::VecDeque;
use std::time::SystemTime;

use uuid::Uuid;

use crate::canvas::{Document, PixelBuffer};
use crate::components::colors::Palette;
use crate::ops::draw::{draw_line_points, draw_rectangle, set_pixel};
use crate::ops::fill::flood_fill;
use crate::view::DocPoint;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// ============================================================================
// COMMANDS
// ============================================================================

/// Which stroke tool produced a [`CommandKind::Stroke`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeTool {
    Pencil,
    Eraser,
}

/// One reversible edit. Every variant carries the full buffer (or palette)
/// as it was before the edit, so `undo` is an exact restore and `apply`
/// replays the edit from the recorded parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Stroke {
        tool: StrokeTool,
        before: PixelBuffer,
        points: Vec<DocPoint>,
        value: u32,
    },
    Line {
        before: PixelBuffer,
        start: DocPoint,
        end: DocPoint,
        value: u32,
    },
    Rectangle {
        before: PixelBuffer,
        start: DocPoint,
        end: DocPoint,
        value: u32,
        filled: bool,
    },
    Fill {
        before: PixelBuffer,
        seed: DocPoint,
        value: u32,
    },
    Clear {
        before: PixelBuffer,
    },
    Palette {
        label: String,
        before: Palette,
        after: Palette,
    },
}

#[derive(Clone, Debug)]
pub struct Command {
    id: Uuid,
    created_at: SystemTime,
    kind: CommandKind,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            kind,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn label(&self) -> String {
        match &self.kind {
            CommandKind::Stroke {
                tool: StrokeTool::Pencil,
                ..
            } => "Pencil stroke".to_string(),
            CommandKind::Stroke {
                tool: StrokeTool::Eraser,
                ..
            } => "Erase stroke".to_string(),
            CommandKind::Line { .. } => "Line".to_string(),
            CommandKind::Rectangle { filled: true, .. } => "Filled rectangle".to_string(),
            CommandKind::Rectangle { .. } => "Rectangle".to_string(),
            CommandKind::Fill { .. } => "Fill".to_string(),
            CommandKind::Clear { .. } => "Clear document".to_string(),
            CommandKind::Palette { label, .. } => label.clone(),
        }
    }

    /// Perform the edit against the current document.
    pub fn apply(&self, doc: &mut Document) {
        match &self.kind {
            CommandKind::Stroke { points, value, .. } => {
                let buffer = &mut doc.buffer;
                if let Some(first) = points.first() {
                    set_pixel(buffer, first.x, first.y, *value);
                }
                for pair in points.windows(2) {
                    draw_line_points(buffer, pair[0], pair[1], *value);
                }
            }
            CommandKind::Line {
                start, end, value, ..
            } => draw_line_points(&mut doc.buffer, *start, *end, *value),
            CommandKind::Rectangle {
                start,
                end,
                value,
                filled,
                ..
            } => draw_rectangle(&mut doc.buffer, *start, *end, *value, *filled),
            CommandKind::Fill { seed, value, .. } => {
                flood_fill(&mut doc.buffer, seed.x, seed.y, *value);
            }
            CommandKind::Clear { .. } => doc.buffer.fill(0),
            CommandKind::Palette { after, .. } => doc.palette = after.clone(),
        }
    }

    /// Restore the state captured before the edit.
    pub fn undo(&self, doc: &mut Document) {
        match &self.kind {
            CommandKind::Stroke { before, .. }
            | CommandKind::Line { before, .. }
            | CommandKind::Rectangle { before, .. }
            | CommandKind::Fill { before, .. }
            | CommandKind::Clear { before } => doc.buffer = before.clone(),
            CommandKind::Palette { before, .. } => doc.palette = before.clone(),
        }
    }

    /// Approximate heap bytes held by the snapshot data.
    pub fn memory_size(&self) -> usize {
        match &self.kind {
            CommandKind::Stroke { before, points, .. } => {
                before.memory_bytes() + points.len() * std::mem::size_of::<DocPoint>()
            }
            CommandKind::Line { before, .. }
            | CommandKind::Rectangle { before, .. }
            | CommandKind::Fill { before, .. }
            | CommandKind::Clear { before } => before.memory_bytes(),
            CommandKind::Palette { before, after, .. } => {
                (before.len() + after.len()) * 4
                    + (before.cycles().len() + after.cycles().len())
                        * std::mem::size_of::<crate::components::colors::CycleRange>()
            }
        }
    }

    /// True for commands that only touch the palette.
    pub fn is_palette_edit(&self) -> bool {
        matches!(self.kind, CommandKind::Palette { .. })
    }
}

// ============================================================================
// HISTORY MANAGER - bounded undo/redo stacks
// ============================================================================

/// Undo/redo history. The undo stack never holds more than `limit` commands;
/// the oldest is dropped first.
pub struct HistoryManager {
    undo_stack: VecDeque<Command>,
    redo_stack: VecDeque<Command>,
    limit: usize,
    /// Optional memory cap in bytes. Off by default.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit,
            max_memory_bytes: None,
            total_memory: 0,
        }
    }

    pub fn with_memory_limit(mut self, max_bytes: usize) -> Self {
        self.max_memory_bytes = Some(max_bytes);
        self
    }

    /// Run `command` against `doc` and record it.
    pub fn execute(&mut self, command: Command, doc: &mut Document) -> String {
        command.apply(doc);
        self.push(command)
    }

    /// Record a command whose effect is already on the document (tools that
    /// draw live during the gesture). Clears the redo stack.
    pub fn push(&mut self, command: Command) -> String {
        for cmd in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(cmd.memory_size());
        }

        let label = command.label();
        self.total_memory += command.memory_size();
        self.undo_stack.push_back(command);
        self.prune();
        label
    }

    /// Revert the youngest command. `None` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Option<&Command> {
        let command = self.undo_stack.pop_back()?;
        command.undo(doc);
        self.redo_stack.push_back(command);
        self.redo_stack.back()
    }

    /// Re-apply the youngest undone command. `None` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Option<&Command> {
        let command = self.redo_stack.pop_back()?;
        command.apply(doc);
        self.undo_stack.push_back(command);
        self.undo_stack.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.label())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|c| c.label())
    }

    /// All undo labels, most recent first.
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|c| c.label()).collect()
    }

    /// The command the next undo would revert.
    pub fn last_command(&self) -> Option<&Command> {
        self.undo_stack.back()
    }

    pub fn undo_stack(&self) -> impl Iterator<Item = &Command> {
        self.undo_stack.iter()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the limit, evicting the oldest entries if the stack is now too long.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.prune();
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    fn prune(&mut self) {
        let mut evicted = 0;
        while self.undo_stack.len() > self.limit {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                evicted += 1;
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                    evicted += 1;
                }
            }
        }

        if evicted > 0 {
            crate::log_info!(
                "History: evicted {} oldest entr{} (limit {})",
                evicted,
                if evicted == 1 { "y" } else { "ies" },
                self.limit
            );
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BufferMode;

    fn doc() -> Document {
        Document::new(BufferMode::Indexed, 32, 32).unwrap()
    }

    fn line_command(doc: &Document, x: i32, value: u32) -> Command {
        Command::new(CommandKind::Line {
            before: doc.buffer.clone(),
            start: DocPoint::new(x, 0),
            end: DocPoint::new(x, 10),
            value,
        })
    }

    #[test]
    fn execute_undo_redo_round_trip() {
        let mut d = doc();
        let mut history = HistoryManager::default();
        let blank = d.buffer.clone();

        let cmd = line_command(&d, 3, 7);
        assert_eq!(history.execute(cmd, &mut d), "Line");
        let after = d.buffer.clone();
        assert_ne!(after, blank);

        let undone = history.undo(&mut d).map(|c| c.label());
        assert_eq!(undone.as_deref(), Some("Line"));
        assert_eq!(d.buffer, blank);
        assert!(history.can_redo());

        history.redo(&mut d);
        assert_eq!(d.buffer, after);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn empty_history_undo_and_redo_are_no_ops() {
        let mut d = doc();
        let mut history = HistoryManager::default();
        assert!(history.undo(&mut d).is_none());
        assert!(history.redo(&mut d).is_none());
        assert_eq!(d, doc());
    }

    #[test]
    fn limit_keeps_most_recent_entries() {
        let mut d = doc();
        let mut history = HistoryManager::new(3);
        let mut ids = Vec::new();
        for x in 0..5 {
            let cmd = line_command(&d, x, 1);
            ids.push(cmd.id());
            history.execute(cmd, &mut d);
        }
        assert_eq!(history.undo_count(), 3);
        let kept: Vec<Uuid> = history.undo_stack().map(|c| c.id()).collect();
        assert_eq!(kept, ids[2..].to_vec());
    }

    #[test]
    fn new_execute_after_undo_clears_redo() {
        let mut d = doc();
        let mut history = HistoryManager::default();
        let first = line_command(&d, 1, 1);
        history.execute(first, &mut d);
        history.undo(&mut d);
        assert!(history.can_redo());

        let second = line_command(&d, 2, 2);
        history.execute(second, &mut d);
        assert!(!history.can_redo());
        assert!(history.redo(&mut d).is_none());
    }

    #[test]
    fn clear_command_restores_previous_pixels() {
        let mut d = doc();
        d.buffer.fill(5);
        let mut history = HistoryManager::default();
        let cmd = Command::new(CommandKind::Clear {
            before: d.buffer.clone(),
        });
        history.execute(cmd, &mut d);
        assert!(d.buffer.as_indexed().unwrap().iter().all(|&v| v == 0));

        history.undo(&mut d);
        assert_eq!(d.buffer.get(0, 0), Some(5));
        history.redo(&mut d);
        assert_eq!(d.buffer.get(0, 0), Some(0));
    }

    #[test]
    fn palette_command_swaps_palettes() {
        let mut d = doc();
        let before = d.palette.clone();
        let mut after = before.clone();
        after.set_color(1, crate::components::colors::PaletteColor::rgba(128, 0, 0, 255));

        let mut history = HistoryManager::default();
        let cmd = Command::new(CommandKind::Palette {
            label: "Edit color 1".into(),
            before: before.clone(),
            after: after.clone(),
        });
        assert!(cmd.is_palette_edit());
        history.execute(cmd, &mut d);
        assert_eq!(d.palette, after);
        history.undo(&mut d);
        assert_eq!(d.palette, before);
    }

    #[test]
    fn memory_limit_never_evicts_the_newest_entry() {
        let mut d = doc();
        let mut history = HistoryManager::new(10).with_memory_limit(1);
        for x in 0..3 {
            let cmd = line_command(&d, x, 1);
            history.execute(cmd, &mut d);
        }
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.memory_usage(), 32 * 32);
    }

    #[test]
    fn shrinking_the_limit_prunes() {
        let mut d = doc();
        let mut history = HistoryManager::new(5);
        for x in 0..5 {
            let cmd = line_command(&d, x, 1);
            history.execute(cmd, &mut d);
        }
        history.set_limit(2);
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.limit(), 2);
    }
}
