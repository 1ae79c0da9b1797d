use thiserror::Error;

pub type Result<T> = std::result::Result<T, PuzzleError>;

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("puzzle dimensions must be positive and odd, got {cols}x{rows}")]
    InvalidGrid { cols: u32, rows: u32 },

    #[error("source image {width}x{height} is too small for a {cols}x{rows} grid")]
    SourceTooSmall {
        width: u32,
        height: u32,
        cols: u32,
        rows: u32,
    },

    #[error("invalid {name} mask: {reason}")]
    InvalidMask { name: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PuzzleError {
    #[must_use]
    pub fn invalid_mask(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidMask {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PuzzleError;

    #[test]
    fn invalid_grid_message_names_both_dimensions() {
        let err = PuzzleError::InvalidGrid { cols: 4, rows: 3 };
        assert_eq!(
            err.to_string(),
            "puzzle dimensions must be positive and odd, got 4x3"
        );
    }

    #[test]
    fn invalid_mask_constructor_keeps_reason() {
        let err = PuzzleError::invalid_mask("corner", "narrower than base cell");
        assert_eq!(
            err.to_string(),
            "invalid corner mask: narrower than base cell"
        );
    }
}
