//! Presenter surface for Lectern.
//!
//! The presenter sends remote-control commands to every display joined to
//! a class channel, maps outline sections onto pause points for one-tap
//! jumps, and keeps private notes and answers on the local machine.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lectern_models::{ClassConfig, Command, SurfaceId};
//! use lectern_presenter::PresenterController;
//! use lectern_transport::BroadcastHub;
//!
//! let hub = BroadcastHub::new();
//! let mut presenter = PresenterController::new(
//!     ClassConfig::empty("1"),
//!     Arc::new(hub.attach(SurfaceId::new())),
//! );
//! presenter.send(Command::Play);
//! assert_eq!(presenter.status(), "Sent: Play");
//! ```

pub mod controller;
pub mod error;
pub mod matcher;
pub mod outline;

pub use controller::{MediaAction, PresenterController, INITIAL_STATUS};
pub use error::{PresenterError, Result};
pub use matcher::{match_section, normalize, parse_time_from_summary, MatchReason, SectionMatch};
pub use outline::{
    media_entries, outline_affordances, pause_list, JumpTarget, MediaEntry, PauseEntry,
    SectionAffordance, NO_PAUSES_MESSAGE,
};
