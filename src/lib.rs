//! Bitmap paint engine: indexed and direct-color pixel buffers, drawing
//! tools with undo/redo, zoomed rendering and palette color cycling.

#[macro_use]
pub mod logger;

pub mod canvas;
pub mod cli;
pub mod components;
pub mod cycler;
pub mod error;
pub mod io;
pub mod ops;
pub mod renderer;
pub mod session;
pub mod view;

pub use canvas::{BufferMode, Document, PixelBuffer};
pub use error::{EngineError, Result};
pub use session::EditorSession;
