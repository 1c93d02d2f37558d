//! Error types for presenter operations.

use lectern_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur on the presenter surface.
#[derive(Error, Debug)]
pub enum PresenterError {
    /// No media entry at the requested position.
    #[error("invalid media index {index} (have {len})")]
    InvalidMediaIndex { index: usize, len: usize },

    /// The media entry cannot be shown on a display.
    #[error("media cannot be shown on a display: {0}")]
    UnsupportedMedia(String),

    /// Notes are not configured for this presenter.
    #[error("no notes store configured")]
    NotesUnavailable,

    /// Persistence error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for presenter operations.
pub type Result<T> = std::result::Result<T, PresenterError>;
