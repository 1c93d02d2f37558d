//! Error types for transport operations.

use lectern_persistence::PersistenceError;
use thiserror::Error;

/// Errors raised by transport backends.
///
/// Publishing never surfaces these to callers; they are logged and the
/// message is dropped.
#[derive(Error, Debug)]
pub enum TransportError {
    /// A message could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] PersistenceError),

    /// Lock poisoned (thread panicked while holding lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
