//! Error types for the display crate.

use thiserror::Error;

/// Errors that can occur on a display surface.
///
/// None of these are fatal: the controller turns them into degraded
/// surface state.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The playback engine could not be constructed.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// The passage service answered with something unusable.
    #[error("passage lookup failed: {0}")]
    Lookup(String),

    /// HTTP error talking to the passage service.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid passage service URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for display operations.
pub type Result<T> = std::result::Result<T, DisplayError>;
