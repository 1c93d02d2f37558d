//! Response DTOs for the API.

use serde::Serialize;

use lectern_models::CommandMessage;
use lectern_presenter::{MediaEntry, PauseEntry, SectionAffordance};

/// Hub status response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Kind of transport commands go out on.
    pub transport: String,
}

/// Outline affordances for a class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineResponse {
    pub class_id: String,
    pub sections: Vec<SectionAffordance>,
    pub total: usize,
}

/// Pause list for a class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseListResponse {
    pub class_id: String,
    pub pauses: Vec<PauseEntry>,
    pub total: usize,
    /// Placeholder text when there are no pauses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Media gallery for a class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListResponse {
    pub class_id: String,
    pub media: Vec<MediaEntry>,
    pub total: usize,
}

/// A command that was published.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedResponse {
    pub channel: String,
    pub message: CommandMessage,
    /// Presenter status line, for class-scoped sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Result of choosing a media entry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MediaActionResponse {
    /// Sent to the class's displays.
    Sent { channel: String, message: CommandMessage },
    /// The caller should open this link itself.
    OpenLocally { url: String },
}
