//! Identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix appended to a channel key to form the durable fallback key.
const STORAGE_SUFFIX: &str = "-storage";

/// Whether `id` is usable as a class id: non-empty ASCII letters, digits,
/// `-` and `_`. Class ids end up in channel keys and file names.
pub fn is_valid_class_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Logical room identifier shared by a presenter and its displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Creates a channel key from any string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Default channel key derived from a class identifier.
    pub fn for_class(class_id: &str) -> Self {
        Self(format!("class{}-control", class_id))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the storage fallback writes serialized commands.
    pub fn storage_key(&self) -> String {
        format!("{}{}", self.0, STORAGE_SUFFIX)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ChannelKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifies one surface (a presenter or display window/context).
///
/// Transports use it so that a surface never observes its own publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    /// Creates a new random surface id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns a short form for log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
