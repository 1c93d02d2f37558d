//! Error type for CLI commands.

use lectern_display::DisplayError;
use lectern_persistence::PersistenceError;
use lectern_presenter::PresenterError;
use lectern_transport::TransportError;
use thiserror::Error;

/// Errors surfaced to the user by `lectern`.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Presenter(#[from] PresenterError),

    #[error("{0}")]
    Display(#[from] DisplayError),

    /// A file given on the command line does not exist.
    #[error("file not found: {0}")]
    MissingFile(String),
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
