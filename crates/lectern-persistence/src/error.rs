//! Error types for persistence operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing local state.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Creating a directory failed.
    #[error("failed to create directory {path:?}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed.
    #[error("failed to read {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a file failed.
    #[error("failed to write {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A class id that cannot be used in a file name.
    #[error("invalid class id: {0:?}")]
    InvalidClassId(String),

    /// The document does not have a supported shape.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
