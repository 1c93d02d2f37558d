//! Class configuration types.
//!
//! `ClassEntry` mirrors one class as authored in a class document;
//! `ClassConfig` is the resolved, normalized view a surface works with.

use serde::{Deserialize, Serialize};

use crate::ids::ChannelKey;
use crate::media::{MediaItem, MediaRef};
use crate::pause::PausePoint;

/// Kind of an outline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Verse,
    Question,
    Example,
    Note,
    Heading,
    #[default]
    #[serde(other)]
    Point,
}

/// One bullet in an outline section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Point {
    /// Plain text bullet.
    Text(String),
    /// Typed bullet.
    Typed {
        #[serde(rename = "type", default)]
        kind: PointKind,
        #[serde(default)]
        text: String,
    },
}

impl Point {
    /// Kind of the point (plain text bullets are `Point`).
    pub fn kind(&self) -> PointKind {
        match self {
            Point::Text(_) => PointKind::Point,
            Point::Typed { kind, .. } => *kind,
        }
    }

    /// Text of the point.
    pub fn text(&self) -> &str {
        match self {
            Point::Text(text) => text,
            Point::Typed { text, .. } => text,
        }
    }
}

/// A discussion question with an optional suggested answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable key used for locally stored answers.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// A section of the lesson outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSection {
    #[serde(default, deserialize_with = "crate::serde_helpers::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub default_open: bool,
}

/// One class as authored in a class document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::opt_string_or_number"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::opt_string_or_number"
    )]
    pub class_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub outline: Vec<OutlineSection>,
}

impl ClassEntry {
    /// Returns true if this entry answers to the given class identifier.
    pub fn matches(&self, class_id: &str) -> bool {
        self.class_number.as_deref() == Some(class_id) || self.id.as_deref() == Some(class_id)
    }

    /// The primary video item, if any.
    pub fn primary_video(&self) -> Option<&MediaItem> {
        self.media
            .iter()
            .find(|m| m.primary && m.kind.eq_ignore_ascii_case("video"))
    }
}

/// Resolved configuration of one class, immutable for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassConfig {
    /// Identifier the config was resolved for.
    pub class_id: String,
    /// Class title (empty when unknown).
    #[serde(default)]
    pub title: String,
    /// Channel key scoping presenter/display communication.
    pub channel_key: ChannelKey,
    /// Primary video id (empty when the class has no video).
    #[serde(default)]
    pub video_id: String,
    /// Pause points of the primary video, sorted by time.
    #[serde(default)]
    pub pause_points: Vec<PausePoint>,
    #[serde(default)]
    pub outline: Vec<OutlineSection>,
    /// Class-level media.
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl ClassConfig {
    /// Empty configuration for a class: no video, no pauses.
    pub fn empty(class_id: impl Into<String>) -> Self {
        let class_id = class_id.into();
        Self {
            channel_key: ChannelKey::for_class(&class_id),
            class_id,
            title: String::new(),
            video_id: String::new(),
            pause_points: Vec::new(),
            outline: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Returns true if the class has a primary video.
    pub fn has_video(&self) -> bool {
        !self.video_id.is_empty()
    }

    /// The primary media reference shown absent any override.
    ///
    /// A primary video always resolves to the config's video id and pause
    /// points; other primary media resolve from the first item marked
    /// primary.
    pub fn primary_media(&self) -> Option<MediaRef> {
        if self.has_video() {
            let mut media = MediaRef::video(self.video_id.clone());
            media.pause_points = self.pause_points.clone();
            media.title = self
                .media
                .iter()
                .find(|m| m.primary)
                .and_then(|m| m.title.clone());
            return Some(media);
        }
        self.media
            .iter()
            .filter(|m| m.primary)
            .find_map(MediaItem::to_media_ref)
    }
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            class_id: String::new(),
            title: String::new(),
            channel_key: ChannelKey::new("class-control"),
            video_id: String::new(),
            pause_points: Vec::new(),
            outline: Vec::new(),
            media: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use serde_json::json;

    #[test]
    fn test_points_accept_strings_and_objects() {
        let section: OutlineSection = serde_json::from_value(json!({
            "id": 4,
            "summary": "Names",
            "points": ["plain", { "type": "verse", "text": "John 1:1" }, { "type": "mystery", "text": "x" }]
        }))
        .unwrap();

        assert_eq!(section.id, "4");
        assert_eq!(section.points[0].kind(), PointKind::Point);
        assert_eq!(section.points[1].kind(), PointKind::Verse);
        assert_eq!(section.points[1].text(), "John 1:1");
        assert_eq!(section.points[2].kind(), PointKind::Point);
    }

    #[test]
    fn test_class_entry_matches_number_or_id() {
        let entry: ClassEntry = serde_json::from_value(json!({
            "id": "7f1c",
            "classNumber": 2
        }))
        .unwrap();

        assert!(entry.matches("2"));
        assert!(entry.matches("7f1c"));
        assert!(!entry.matches("3"));
    }

    #[test]
    fn test_primary_media_prefers_video() {
        let mut config = ClassConfig::empty("1");
        config.video_id = "abc".to_string();
        config.pause_points = vec![PausePoint::new(10.0, "Stop")];

        let media = config.primary_media().unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.locator, "abc");
        assert_eq!(media.pause_points.len(), 1);
    }

    #[test]
    fn test_primary_media_non_video() {
        let mut config = ClassConfig::empty("1");
        config.media = vec![MediaItem {
            kind: "image".to_string(),
            primary: true,
            url: Some("assets/images/map.png".to_string()),
            ..Default::default()
        }];

        let media = config.primary_media().unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.locator, "assets/images/map.png");
    }

    #[test]
    fn test_empty_config_has_no_primary() {
        let config = ClassConfig::empty("9");
        assert!(config.primary_media().is_none());
        assert_eq!(config.channel_key.as_str(), "class9-control");
    }
}
