//! Lectern command-line library.
//!
//! Backs the `lectern` binary: class lookups, presenter commands sent
//! through the shared channel directory, a headless display that follows
//! a class, the HTTP hub, and local notes management.

pub mod cli;
pub mod commands;
pub mod error;
pub mod session;

pub use commands::{execute, Workspace};
pub use error::{CliError, Result};
