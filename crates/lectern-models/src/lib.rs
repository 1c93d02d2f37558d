//! Core data models for Lectern.
//!
//! This crate provides the types shared by every surface: the resolved
//! class configuration, pause points, outline sections, media references
//! and the remote-control command vocabulary that travels between the
//! presenter and the display.

pub mod class;
pub mod command;
pub mod ids;
pub mod media;
pub mod pause;
pub mod time;

mod serde_helpers;

// Re-export main types
pub use class::{ClassConfig, ClassEntry, OutlineSection, Point, PointKind, Question};
pub use command::{Command, CommandMessage};
pub use ids::{is_valid_class_id, ChannelKey, SurfaceId};
pub use media::{extract_youtube_id, MediaItem, MediaKind, MediaRef, MediaSource};
pub use pause::{next_pause_after, normalize_pause_points, PausePoint, RawPausePoint};
pub use time::{format_time, parse_time_str, parse_time_value};
