// ============================================================================
// CANVAS-LEVEL OPERATIONS - new / resize / clear whole documents
// ============================================================================

use crate::canvas::{BufferMode, Document};
use crate::components::colors::Palette;
use crate::components::history::{Command, CommandKind, HistoryManager};
use crate::error::Result;

/// Fresh document with the default palette. Rejected sizes are logged and
/// returned to the caller.
pub fn new_document(mode: BufferMode, width: u32, height: u32) -> Result<Document> {
    Document::new(mode, width, height).inspect_err(|e| {
        crate::log_warn!("New document rejected: {}", e);
    })
}

/// New document of the given size keeping `palette` (selection and cycle
/// ranges included).
pub fn new_document_with_palette(
    mode: BufferMode,
    width: u32,
    height: u32,
    palette: Palette,
) -> Result<Document> {
    let mut doc = new_document(mode, width, height)?;
    doc.palette = palette;
    Ok(doc)
}

/// Copy of `doc` at a new size. The overlapping top-left region keeps its
/// pixels, new area is zero, and the palette carries over. `doc` itself is
/// never modified, so a rejected size leaves it intact.
pub fn resize_document(doc: &Document, width: u32, height: u32) -> Result<Document> {
    let buffer = doc.buffer.resize(width, height).inspect_err(|e| {
        crate::log_warn!("Resize rejected: {}", e);
    })?;
    Ok(Document {
        buffer,
        palette: doc.palette.clone(),
    })
}

/// Zero-fill every cell as one undoable step. Returns the history label.
pub fn clear_document(doc: &mut Document, history: &mut HistoryManager) -> String {
    let command = Command::new(CommandKind::Clear {
        before: doc.buffer.clone(),
    });
    history.execute(command, doc)
}
