use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced to the caller. The buffer is left untouched whenever one
/// of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid dimension {width}x{height}: both sides must be within 32..=4096")]
    InvalidDimension { width: u32, height: u32 },

    #[error("palette must hold 2..=256 colors (got {len})")]
    InvalidPaletteSize { len: usize },

    #[error("pixel data holds {actual} cells but {expected} were expected")]
    DataLength { expected: usize, actual: usize },

    #[error("selected palette index {index} is past the end of a {len}-color palette")]
    InvalidSelection { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn invalid_dimension_message_names_the_bounds() {
        let err = EngineError::InvalidDimension {
            width: 16,
            height: 64,
        };
        assert_eq!(
            err.to_string(),
            "invalid dimension 16x64: both sides must be within 32..=4096"
        );
    }
}
