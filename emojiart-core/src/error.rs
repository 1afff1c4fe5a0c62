//! Error types for document operations.

use thiserror::Error;

use crate::ElementId;

/// Result type for document operations.
pub type ArtResult<T> = Result<T, ArtError>;

/// Errors that can occur in document operations.
#[derive(Debug, Error)]
pub enum ArtError {
    /// Element not found in the artwork.
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// Persisted artwork bytes could not be decoded.
    #[error("Failed to decode artwork: {0}")]
    Decode(String),

    /// Artwork could not be encoded.
    #[error("Failed to encode artwork: {0}")]
    Encode(#[from] serde_json::Error),

    /// A background URL could not be parsed.
    #[error("Invalid background URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The named palette does not exist.
    #[error("Palette not found: {0}")]
    PaletteNotFound(String),

    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Undo was requested with an empty undo stack.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo was requested with an empty redo stack.
    #[error("Nothing to redo")]
    NothingToRedo,
}
