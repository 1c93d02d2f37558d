//! Presenter controller.
//!
//! Turns presenter actions into [`CommandMessage`]s on the class channel
//! and keeps the presenter's status line. Notes and answers stay local.

use std::sync::Arc;

use lectern_models::{format_time, ClassConfig, Command, CommandMessage};
use lectern_persistence::{NotesFile, NotesImport, NotesState, NotesStore};
use lectern_transport::ChannelTransport;
use tracing::{debug, info};

use crate::error::{PresenterError, Result};
use crate::outline::{
    media_entries, outline_affordances, pause_list, MediaEntry, PauseEntry, SectionAffordance,
};

/// Status shown before anything has been sent.
pub const INITIAL_STATUS: &str = "Ready. Open the display on the main screen.";

/// Result of choosing a media gallery entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaAction {
    /// Sent to displays as `displayMedia`.
    Sent(CommandMessage),
    /// A link to open on the presenter's machine.
    OpenLocally(String),
}

/// Drives displays for one class.
pub struct PresenterController {
    class: ClassConfig,
    transport: Arc<dyn ChannelTransport>,
    notes: Option<NotesStore>,
    status: String,
}

impl PresenterController {
    pub fn new(class: ClassConfig, transport: Arc<dyn ChannelTransport>) -> Self {
        Self {
            class,
            transport,
            notes: None,
            status: INITIAL_STATUS.to_string(),
        }
    }

    /// Keeps notes and answers in `store`.
    pub fn with_notes(mut self, store: NotesStore) -> Self {
        self.notes = Some(store);
        self
    }

    pub fn class(&self) -> &ClassConfig {
        &self.class
    }

    /// Current status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Publishes `command` on the class channel.
    pub fn send(&mut self, command: Command) -> CommandMessage {
        let label = self.label_for(&command);
        let message = CommandMessage::now(command);

        self.transport.publish(&self.class.channel_key, &message);
        debug!(
            channel = %self.class.channel_key,
            command = message.command.name(),
            transport = %self.transport.kind(),
            "command sent"
        );

        self.status = format!("Sent: {}", label);
        message
    }

    /// Human-readable label for a command.
    pub fn label_for(&self, command: &Command) -> String {
        match command {
            Command::JumpToPause { index } => self.jump_label(*index),
            Command::NextPause => "Skip to next pause".to_string(),
            Command::Fullscreen => "Fullscreen display".to_string(),
            Command::Restart => "Restart video".to_string(),
            Command::Toggle => "Play / Pause".to_string(),
            other => capitalize(other.name()),
        }
    }

    fn jump_label(&self, index: i64) -> String {
        let point = usize::try_from(index)
            .ok()
            .and_then(|i| self.class.pause_points.get(i));

        let section = self.outline().into_iter().find(|section| {
            section
                .jump
                .as_ref()
                .is_some_and(|jump| i64::try_from(jump.index).is_ok_and(|i| i == index))
        });

        match (section, point) {
            (Some(section), Some(point)) => {
                format!("Jump to {} \u{00b7} {}", section.summary, format_time(point.time))
            }
            (Some(section), None) => format!("Jump to {}", section.summary),
            (None, Some(point)) => format!("Jump to {}", point.label),
            (None, None) => "Jump to pause".to_string(),
        }
    }

    /// Pause points with formatted times.
    pub fn pause_list(&self) -> Vec<PauseEntry> {
        pause_list(&self.class)
    }

    /// Outline sections with their jump targets.
    pub fn outline(&self) -> Vec<SectionAffordance> {
        outline_affordances(&self.class)
    }

    /// Media gallery entries.
    pub fn media(&self) -> Vec<MediaEntry> {
        media_entries(&self.class)
    }

    /// Sends the gallery entry at `index` to displays, or hands back a link.
    pub fn show_media(&mut self, index: usize) -> Result<MediaAction> {
        let entries = self.media();
        let len = entries.len();
        let entry = entries
            .into_iter()
            .nth(index)
            .ok_or(PresenterError::InvalidMediaIndex { index, len })?;

        if entry.opens_locally() {
            let url = entry
                .item
                .url()
                .ok_or_else(|| PresenterError::UnsupportedMedia("link without a url".to_string()))?
                .to_string();
            info!(url = %url, "opening link locally");
            self.status = format!("Opened: {}", entry.display_title());
            return Ok(MediaAction::OpenLocally(url));
        }

        let media = entry
            .item
            .to_media_ref()
            .ok_or_else(|| PresenterError::UnsupportedMedia(entry.item.kind.clone()))?;
        Ok(MediaAction::Sent(self.send(Command::DisplayMedia { media })))
    }

    fn notes_store(&self) -> Result<&NotesStore> {
        self.notes.as_ref().ok_or(PresenterError::NotesUnavailable)
    }

    /// Saved notes and answers for this class.
    pub fn notes(&self) -> Result<NotesState> {
        Ok(self.notes_store()?.load(&self.class.class_id)?)
    }

    pub fn set_notes_html(&mut self, html: impl Into<String>) -> Result<NotesState> {
        Ok(self.notes_store()?.set_notes_html(&self.class.class_id, html)?)
    }

    pub fn set_answer(
        &mut self,
        question_key: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<NotesState> {
        Ok(self
            .notes_store()?
            .set_answer(&self.class.class_id, question_key, answer)?)
    }

    /// Suggested file name for exported notes.
    pub fn export_file_name(&self) -> String {
        format!("class{}-notes.json", self.class.class_id)
    }

    /// Builds the notes export file.
    pub fn export_notes(&mut self) -> Result<NotesFile> {
        let file = self.notes_store()?.export(&self.class.class_id)?;
        self.status = format!("Exported notes ({})", self.export_file_name());
        Ok(file)
    }

    /// Imports a notes file, JSON or raw rich text.
    pub fn import_notes(&mut self, contents: &str) -> Result<NotesImport> {
        let kind = self.notes_store()?.import(&self.class.class_id, contents)?;
        self.status = match kind {
            NotesImport::Structured => "Imported notes and answers.".to_string(),
            NotesImport::RichText => "Imported notes (rich text).".to_string(),
        };
        Ok(kind)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::{MediaItem, OutlineSection, PausePoint, SurfaceId};
    use lectern_transport::{BroadcastHub, Subscription};
    use serde_json::json;
    use tempfile::TempDir;

    fn class() -> ClassConfig {
        let mut class = ClassConfig::empty("2");
        class.video_id = "vid".to_string();
        class.pause_points = vec![
            PausePoint::new(30.0, "Recognizing Scripture"),
            PausePoint::new(425.0, "Other gospels"),
        ];
        class.outline = vec![OutlineSection {
            id: "s1".to_string(),
            summary: "Recognizing Scripture".to_string(),
            media: vec![
                serde_json::from_value::<MediaItem>(
                    json!({"type": "link", "title": "Timeline", "url": "https://example.com/t"}),
                )
                .unwrap(),
                serde_json::from_value::<MediaItem>(json!({"type": "verse", "reference": "John 1:1"}))
                    .unwrap(),
                serde_json::from_value::<MediaItem>(json!({"type": "presentation", "url": "x.pptx"}))
                    .unwrap(),
            ],
            ..Default::default()
        }];
        class
    }

    fn presenter() -> (PresenterController, Subscription) {
        let hub = BroadcastHub::new();
        let display = hub.attach(SurfaceId::new());
        let subscription = display.subscribe(&class().channel_key);
        let presenter = PresenterController::new(class(), Arc::new(hub.attach(SurfaceId::new())));
        (presenter, subscription)
    }

    #[test]
    fn test_labels() {
        let (presenter, _sub) = presenter();

        assert_eq!(
            presenter.label_for(&Command::JumpToPause { index: 0 }),
            "Jump to Recognizing Scripture \u{00b7} 0:30"
        );
        assert_eq!(
            presenter.label_for(&Command::JumpToPause { index: 1 }),
            "Jump to Other gospels"
        );
        assert_eq!(presenter.label_for(&Command::JumpToPause { index: 9 }), "Jump to pause");
        assert_eq!(presenter.label_for(&Command::NextPause), "Skip to next pause");
        assert_eq!(presenter.label_for(&Command::Toggle), "Play / Pause");
        assert_eq!(presenter.label_for(&Command::Play), "Play");
        assert_eq!(presenter.label_for(&Command::ClearScreen), "ClearScreen");
    }

    #[test]
    fn test_send_reaches_display() {
        let (mut presenter, mut subscription) = presenter();
        assert_eq!(presenter.status(), INITIAL_STATUS);

        let sent = presenter.send(Command::Restart);
        assert_eq!(presenter.status(), "Sent: Restart video");

        let received = subscription.try_recv().unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn test_show_media() {
        let (mut presenter, mut subscription) = presenter();

        let action = presenter.show_media(0).unwrap();
        assert_eq!(action, MediaAction::OpenLocally("https://example.com/t".to_string()));
        assert!(subscription.try_recv().is_none());

        match presenter.show_media(1).unwrap() {
            MediaAction::Sent(message) => match message.command {
                Command::DisplayMedia { media } => assert_eq!(media.locator, "John 1:1"),
                other => panic!("unexpected command {:?}", other),
            },
            other => panic!("unexpected action {:?}", other),
        }
        assert!(subscription.try_recv().is_some());
        assert_eq!(presenter.status(), "Sent: DisplayMedia");

        assert!(matches!(
            presenter.show_media(2),
            Err(PresenterError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            presenter.show_media(7),
            Err(PresenterError::InvalidMediaIndex { index: 7, len: 3 })
        ));
    }

    #[test]
    fn test_notes_require_store() {
        let (presenter, _sub) = presenter();
        assert!(matches!(presenter.notes(), Err(PresenterError::NotesUnavailable)));
    }

    #[test]
    fn test_notes_round_trip() {
        let temp = TempDir::new().unwrap();
        let (presenter, _sub) = presenter();
        let mut presenter = presenter.with_notes(NotesStore::new(temp.path()));

        presenter.set_notes_html("<p>Open in prayer</p>").unwrap();
        presenter.set_answer("q1", "Sixty-six").unwrap();

        let file = presenter.export_notes().unwrap();
        assert_eq!(file.notes_html, "<p>Open in prayer</p>");
        assert_eq!(presenter.status(), "Exported notes (class2-notes.json)");

        assert_eq!(
            presenter.import_notes("<h1>Fresh</h1>").unwrap(),
            NotesImport::RichText
        );
        let notes = presenter.notes().unwrap();
        assert_eq!(notes.notes_html, "<h1>Fresh</h1>");
        assert_eq!(notes.questions.get("q1").map(String::as_str), Some("Sixty-six"));
    }
}
