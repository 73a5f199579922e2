use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::Document;
use crate::error::EngineError;

// ============================================================================
// SWP PROJECT FILE FORMAT
// ============================================================================

/// Magic header of the native project format.
const SWP_MAGIC_V1: &str = "SWP1";

pub const PROJECT_EXTENSION: &str = "swp";

#[derive(Serialize, Deserialize)]
struct ProjectFileV1 {
    magic: String,
    document: Document,
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<Box<bincode::ErrorKind>> for ProjectError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectError::Serialize(e.to_string())
    }
}

/// Write `document` as a `.swp` project.
pub fn save_project(document: &Document, path: &Path) -> Result<(), ProjectError> {
    let project = ProjectFileV1 {
        magic: SWP_MAGIC_V1.to_string(),
        document: document.clone(),
    };
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &project).map_err(|e| {
        crate::log_err!("Saving {} failed: {}", path.display(), e);
        ProjectError::from(e)
    })?;
    crate::log_info!(
        "Saved {}x{} {} project to {}",
        document.width(),
        document.height(),
        document.mode().label(),
        path.display()
    );
    Ok(())
}

/// Read and validate a `.swp` project.
pub fn load_project(path: &Path) -> Result<Document, ProjectError> {
    let raw = std::fs::read(path)?;
    decode_project(&raw).inspect_err(|e| {
        crate::log_err!("Loading {} failed: {}", path.display(), e);
    })
}

/// Decode project bytes. Dimensions, pixel data length and palette size are
/// all checked before the document is handed out.
pub fn decode_project(raw: &[u8]) -> Result<Document, ProjectError> {
    if raw.len() < 12 {
        return Err(ProjectError::InvalidFormat("File too small".into()));
    }
    // bincode writes a String as an 8-byte length then the bytes; the
    // 4-char magic sits at 8..12.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != SWP_MAGIC_V1 {
        return Err(ProjectError::InvalidFormat(format!(
            "Unknown magic '{}'",
            magic
        )));
    }

    let project: ProjectFileV1 = bincode::deserialize(raw)?;
    project.document.validate()?;
    Ok(project.document)
}

/// Encode a document into project bytes (same layout as [`save_project`]).
pub fn encode_project(document: &Document) -> Result<Vec<u8>, ProjectError> {
    let project = ProjectFileV1 {
        magic: SWP_MAGIC_V1.to_string(),
        document: document.clone(),
    };
    Ok(bincode::serialize(&project)?)
}

/// Write a rendered surface as PNG.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<(), ProjectError> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
