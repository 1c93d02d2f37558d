//! Media items from class documents and the media references pushed to
//! displays.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pause::{deserialize_pause_points, PausePoint};

/// Kind of media a display can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    #[serde(alias = "images")]
    Image,
    #[serde(alias = "document")]
    Pdf,
    Audio,
    Link,
    Verse,
}

impl MediaKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
            MediaKind::Audio => "audio",
            MediaKind::Link => "link",
            MediaKind::Verse => "verse",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "image" | "images" => Ok(MediaKind::Image),
            "pdf" | "document" => Ok(MediaKind::Pdf),
            "audio" => Ok(MediaKind::Audio),
            "link" => Ok(MediaKind::Link),
            "verse" => Ok(MediaKind::Verse),
            other => Err(format!("unsupported media type: {}", other)),
        }
    }
}

/// Whatever is currently shown (or should be shown) on a display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    /// Kind of media.
    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Video id, URL, file path or passage reference depending on kind.
    #[serde(alias = "url", default)]
    pub locator: String,

    /// Optional display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Pause points belonging to this media (videos only).
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_pause_points"
    )]
    pub pause_points: Vec<PausePoint>,
}

impl MediaRef {
    /// Creates a media reference without title or pause points.
    pub fn new(kind: MediaKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.into(),
            title: None,
            pause_points: Vec::new(),
        }
    }

    /// Video reference.
    pub fn video(video_id: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, video_id)
    }

    /// Passage reference (e.g. `John 3:16-18`).
    pub fn verse(reference: impl Into<String>) -> Self {
        Self::new(MediaKind::Verse, reference)
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the pause points (sorted by time).
    pub fn with_pause_points(mut self, mut points: Vec<PausePoint>) -> Self {
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.pause_points = points;
        self
    }

    /// Returns true for video media.
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Returns the title, falling back to the kind name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.kind.as_str())
    }
}

/// One source entry of a document media item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A media item as authored in a class document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::opt_string_or_number"
    )]
    pub id: Option<String>,

    /// Raw type string; may name kinds a display cannot show.
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub primary: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Passage reference for verse items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default)]
    pub sources: Vec<MediaSource>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_pause_points"
    )]
    pub pause_points: Vec<PausePoint>,
}

impl MediaItem {
    /// Parsed media kind, if the display supports it.
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.kind.parse().ok()
    }

    /// First URL-like locator: `url`, then the first source's url or path.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.sources.first().and_then(|s| s.url.as_deref()))
            .or_else(|| self.sources.first().and_then(|s| s.path.as_deref()))
            .filter(|u| !u.trim().is_empty())
    }

    /// Video id from the first source, or extracted from a YouTube URL.
    pub fn video_id(&self) -> Option<String> {
        if let Some(id) = self
            .sources
            .first()
            .and_then(|s| s.video_id.as_deref())
            .filter(|id| !id.trim().is_empty())
        {
            return Some(id.to_string());
        }
        self.url().and_then(extract_youtube_id)
    }

    /// Converts this item into a reference a display can render.
    ///
    /// Returns `None` for unsupported kinds or items without a locator.
    pub fn to_media_ref(&self) -> Option<MediaRef> {
        let kind = self.media_kind()?;
        let locator = match kind {
            MediaKind::Video => self.video_id().or_else(|| self.url().map(str::to_string))?,
            MediaKind::Verse => self
                .reference
                .clone()
                .or_else(|| self.title.clone())
                .filter(|r| !r.trim().is_empty())?,
            _ => self.url()?.to_string(),
        };

        Some(MediaRef {
            kind,
            locator,
            title: self.title.clone(),
            pause_points: if kind == MediaKind::Video {
                self.pause_points.clone()
            } else {
                Vec::new()
            },
        })
    }
}

fn youtube_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:youtu\.be/|youtube\.com/(?:watch\?v=|shorts/))([^&?/]+)")
            .expect("valid youtube regex")
    })
}

/// Extracts a video id from `youtu.be/ID`, `youtube.com/watch?v=ID` or
/// `youtube.com/shorts/ID` URLs.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    youtube_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_youtube_id() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=QhVPBNBAGY0&t=3"),
            Some("QhVPBNBAGY0".to_string())
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/abc123?si=x"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/shorts/xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(extract_youtube_id("https://vimeo.com/42"), None);
    }

    #[test]
    fn test_media_kind_aliases() {
        let media: MediaRef =
            serde_json::from_value(json!({ "type": "images", "url": "a.png" })).unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.locator, "a.png");

        assert_eq!("document".parse::<MediaKind>().unwrap(), MediaKind::Pdf);
        assert!("presentation".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_media_item_video_ref() {
        let item: MediaItem = serde_json::from_value(json!({
            "type": "video",
            "primary": true,
            "title": "Session video",
            "sources": [{ "url": "https://youtu.be/vid42" }],
            "pausePoints": [{ "time": "2:00", "label": "Later" }, { "time": 30, "label": "Early" }]
        }))
        .unwrap();

        let media = item.to_media_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.locator, "vid42");
        assert_eq!(media.pause_points[0].label, "Early");
        assert_eq!(media.pause_points[1].time, 120.0);
    }

    #[test]
    fn test_media_item_without_locator() {
        let item = MediaItem {
            kind: "image".to_string(),
            ..Default::default()
        };
        assert!(item.to_media_ref().is_none());
    }

    #[test]
    fn test_verse_item_uses_reference() {
        let item = MediaItem {
            kind: "verse".to_string(),
            reference: Some("John 3:16".to_string()),
            ..Default::default()
        };
        let media = item.to_media_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Verse);
        assert_eq!(media.locator, "John 3:16");
    }
}
