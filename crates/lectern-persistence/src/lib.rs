//! Persistence layer for Lectern.
//!
//! This crate resolves class configurations from class documents and keeps
//! the presenter's local state using atomic file operations (write to temp
//! file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use lectern_persistence::{ConfigResolver, FileConfigSource};
//!
//! let resolver = ConfigResolver::new(FileConfigSource::new("assets/data/classes.json"));
//!
//! // Never fails: a missing or malformed document yields an empty config.
//! let config = resolver.resolve("1");
//! println!("{} pause points on {}", config.pause_points.len(), config.channel_key);
//! ```

pub mod atomic;
pub mod config_store;
pub mod error;
pub mod notes_store;

pub use config_store::{resolve_document, ConfigResolver, ConfigSource, FileConfigSource, StaticConfigSource};
pub use error::{PersistenceError, Result};
pub use notes_store::{NotesFile, NotesImport, NotesState, NotesStore, NOTES_FILE_VERSION};
