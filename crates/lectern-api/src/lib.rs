//! HTTP hub for Lectern.
//!
//! This crate exposes a small REST surface over a class document and a
//! channel transport:
//! - Status (`GET /api/status`)
//! - Class lookups: resolved config, outline jumps, pause list, media
//! - Command publishing to a channel or to a class's channel
//!
//! # Example
//!
//! ```ignore
//! use lectern_api::{ApiConfig, AppState, serve};
//! use lectern_persistence::{ConfigResolver, FileConfigSource};
//! use lectern_transport::NullTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = ConfigResolver::new(FileConfigSource::new("classes.json"));
//!     let state = AppState::new(ApiConfig::default(), resolver, Arc::new(NullTransport::new()));
//!
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::{ApiConfig, CorsPolicy};
pub use error::{ApiError, Result};
pub use router::{create_router, serve, serve_with_shutdown};
pub use state::AppState;
