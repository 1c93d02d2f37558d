//! Remote-control command vocabulary.
//!
//! Commands travel from the presenter to displays as
//! `{ "type": <kind>, ...fields, "sentAt": <epoch millis> }`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::media::MediaRef;

/// A remote-control command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Flip play/pause.
    Toggle,
    /// Force play.
    Play,
    /// Force pause.
    Pause,
    /// Seek to zero and play.
    Restart,
    /// Jump to the upcoming pause point.
    NextPause,
    /// Jump to a specific pause point (clamped to the valid range).
    JumpToPause { index: i64 },
    /// Toggle fullscreen on the display surface.
    Fullscreen,
    /// Replace the current media with an override.
    DisplayMedia { media: MediaRef },
    /// Return to the class's primary media.
    ClearScreen,
    /// Next page of a displayed passage.
    VerseNext,
    /// Previous page of a displayed passage.
    VersePrevious,
}

impl Command {
    /// Wire name of the command kind.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Toggle => "toggle",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Restart => "restart",
            Command::NextPause => "nextPause",
            Command::JumpToPause { .. } => "jumpToPause",
            Command::Fullscreen => "fullscreen",
            Command::DisplayMedia { .. } => "displayMedia",
            Command::ClearScreen => "clearScreen",
            Command::VerseNext => "verseNext",
            Command::VersePrevious => "versePrevious",
        }
    }
}

/// A command as sent on the wire, stamped with its send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(flatten)]
    pub command: Command,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "sentAt")]
    pub sent_at: i64,
}

impl CommandMessage {
    /// Creates a message with an explicit timestamp.
    pub fn new(command: Command, sent_at: i64) -> Self {
        Self { command, sent_at }
    }

    /// Creates a message stamped with the current time.
    pub fn now(command: Command) -> Self {
        Self::new(command, Utc::now().timestamp_millis())
    }

    /// Serialized form identifying this command instance (`sentAt` + content).
    pub fn instance_key(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let msg = CommandMessage::new(Command::JumpToPause { index: 2 }, 1_700_000_000_000);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({ "type": "jumpToPause", "index": 2, "sentAt": 1_700_000_000_000i64 })
        );
    }

    #[test]
    fn test_parse_display_media() {
        let msg: CommandMessage = serde_json::from_value(json!({
            "type": "displayMedia",
            "media": { "type": "verse", "locator": "Psalm 23" },
            "sentAt": 5
        }))
        .unwrap();

        match msg.command {
            Command::DisplayMedia { media } => {
                assert_eq!(media.kind, MediaKind::Verse);
                assert_eq!(media.locator, "Psalm 23");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(msg.sent_at, 5);
    }

    #[test]
    fn test_unit_commands_roundtrip_names() {
        for (command, name) in [
            (Command::Toggle, "toggle"),
            (Command::NextPause, "nextPause"),
            (Command::ClearScreen, "clearScreen"),
            (Command::VersePrevious, "versePrevious"),
        ] {
            let value = serde_json::to_value(CommandMessage::new(command.clone(), 1)).unwrap();
            assert_eq!(value["type"], name);
            assert_eq!(command.name(), name);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<CommandMessage, _> =
            serde_json::from_value(json!({ "type": "selfDestruct", "sentAt": 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_instance_key_distinguishes_sent_at() {
        let a = CommandMessage::new(Command::Toggle, 1);
        let b = CommandMessage::new(Command::Toggle, 2);
        assert_ne!(a.instance_key().unwrap(), b.instance_key().unwrap());
        assert_eq!(
            a.instance_key().unwrap(),
            CommandMessage::new(Command::Toggle, 1).instance_key().unwrap()
        );
    }
}
