//! Display events and snapshots.

use lectern_models::MediaRef;
use serde::Serialize;

use crate::engine::EngineState;
use crate::passage::Passage;

/// Playback phase of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// The video platform has not initialized yet.
    Idle,
    /// Media is loaded; playback has not started (or no video is shown).
    Ready,
    Playing,
    Paused,
}

/// State of a displayed passage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PassageView {
    Loading,
    Loaded { passage: Passage, page: usize },
    /// Shown as "Unable to load passage".
    Failed,
}

/// What the display surface is rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Surface {
    /// Nothing to show.
    Empty,
    /// A video engine.
    Video { video_id: String },
    /// Image, pdf, audio or link media.
    Media { media: MediaRef },
    /// A scripture passage.
    Verse { reference: String, view: PassageView },
    /// Inline error in place of the player.
    Error { message: String },
}

/// Notable changes on a display, broadcast to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// The playback phase changed.
    PhaseChanged { phase: Phase },
    /// The monitor paused playback at a pause point.
    PauseReached { index: usize, label: String },
    /// Different media is shown.
    MediaChanged { media: Option<MediaRef>, overridden: bool },
    /// Presentation mode toggled.
    FullscreenChanged { active: bool },
    /// The engine could not be constructed.
    EngineFailed { message: String },
    /// Passage text arrived, failed, or was paged.
    PassageChanged { view: PassageView },
}

impl DisplayEvent {
    /// Returns true if this is a failure event.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DisplayEvent::EngineFailed { .. }
                | DisplayEvent::PassageChanged {
                    view: PassageView::Failed
                }
        )
    }
}

/// Point-in-time view of a display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub phase: Phase,
    pub surface: Surface,
    pub current_media: Option<MediaRef>,
    pub overridden: bool,
    pub pending_media: Option<MediaRef>,
    /// Index of the next pause point; `None` when no pauses remain.
    pub next_pause_index: Option<usize>,
    pub monitor_active: bool,
    pub fullscreen: bool,
    pub engine_state: Option<EngineState>,
    /// Playback position in seconds, when a video is loaded.
    pub position: Option<f64>,
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            surface: Surface::Empty,
            current_media: None,
            overridden: false,
            pending_media: None,
            next_pause_index: None,
            monitor_active: false,
            fullscreen: false,
            engine_state: None,
            position: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_error() {
        assert!(DisplayEvent::EngineFailed {
            message: "x".to_string()
        }
        .is_error());
        assert!(DisplayEvent::PassageChanged {
            view: PassageView::Failed
        }
        .is_error());
        assert!(!DisplayEvent::PhaseChanged { phase: Phase::Ready }.is_error());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let value = serde_json::to_value(DisplaySnapshot::default()).unwrap();
        assert_eq!(value["phase"], "idle");
        assert_eq!(value["surface"]["kind"], "empty");
        assert!(value["nextPauseIndex"].is_null());
    }
}
