//! Class configuration resolution.
//!
//! A class document holds every class of a lesson plan. Documents come in
//! three shapes, all accepted:
//!
//! ```text
//! { "classes": [ {...}, {...} ] }
//! [ {...}, {...} ]
//! { ...single class... }
//! ```
//!
//! Resolution never fails: an unreachable or malformed document degrades to
//! an empty configuration so surfaces can keep running without media.

use std::path::{Path, PathBuf};

use lectern_models::{ChannelKey, ClassConfig, ClassEntry};
use serde_json::Value;
use tracing::{debug, warn};

use crate::atomic::read_json;
use crate::error::{PersistenceError, Result};

/// External document store holding class documents.
pub trait ConfigSource: Send + Sync {
    /// Loads the raw class document.
    fn load_document(&self) -> Result<Value>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Class document stored as a JSON file (`classes.json`).
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Creates a source reading from the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load_document(&self) -> Result<Value> {
        read_json(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Class document held in memory.
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    document: Value,
}

impl StaticConfigSource {
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load_document(&self) -> Result<Value> {
        Ok(self.document.clone())
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}

/// Resolves class configurations from a [`ConfigSource`].
pub struct ConfigResolver {
    source: Box<dyn ConfigSource>,
}

impl ConfigResolver {
    /// Creates a resolver over the given source.
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Resolves the configuration for a class.
    ///
    /// Falls back to [`ClassConfig::empty`] when the source cannot be read
    /// or the document is malformed.
    pub fn resolve(&self, class_id: &str) -> ClassConfig {
        let document = match self.source.load_document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    class_id,
                    error = %e,
                    "class document unavailable, using empty config"
                );
                return ClassConfig::empty(class_id);
            }
        };

        match resolve_document(&document, class_id) {
            Ok(config) => {
                debug!(
                    class_id,
                    channel = %config.channel_key,
                    video_id = %config.video_id,
                    pause_points = config.pause_points.len(),
                    "resolved class config"
                );
                config
            }
            Err(e) => {
                warn!(class_id, error = %e, "malformed class document, using empty config");
                ClassConfig::empty(class_id)
            }
        }
    }
}

/// Splits a class document into its class entries.
fn class_entries(document: &Value) -> Result<Vec<ClassEntry>> {
    let list = match document {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("classes") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(PersistenceError::Malformed(
                    "`classes` is not an array".to_string(),
                ))
            }
            None => vec![document.clone()],
        },
        other => {
            return Err(PersistenceError::Malformed(format!(
                "expected object or array, found {}",
                json_kind(other)
            )))
        }
    };

    list.into_iter()
        .map(|item| serde_json::from_value(item).map_err(PersistenceError::from))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves one class out of a raw document.
///
/// Looks the class up by class number or id, falling back to the first
/// class in the document. Pause points come from the primary video and are
/// normalized to sorted seconds.
pub fn resolve_document(document: &Value, class_id: &str) -> Result<ClassConfig> {
    let entries = class_entries(document)?;

    let entry = match entries.iter().position(|e| e.matches(class_id)) {
        Some(idx) => &entries[idx],
        None => match entries.first() {
            Some(first) => {
                warn!(class_id, "class not found in document, using first class");
                first
            }
            None => return Ok(ClassConfig::empty(class_id)),
        },
    };

    let primary = entry.primary_video();
    let video_id = primary.and_then(|m| m.video_id()).unwrap_or_default();
    let pause_points = primary.map(|m| m.pause_points.clone()).unwrap_or_default();

    let channel_key = entry
        .channel_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(ChannelKey::new)
        .unwrap_or_else(|| ChannelKey::for_class(class_id));

    Ok(ClassConfig {
        class_id: class_id.to_string(),
        title: entry.title.clone().unwrap_or_default(),
        channel_key,
        video_id,
        pause_points,
        outline: entry.outline.clone(),
        media: entry.media.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::atomic_write;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_document() -> Value {
        json!({
            "classes": [
                {
                    "id": "c1",
                    "classNumber": 1,
                    "title": "Where the Bible came from",
                    "channelName": "class1-control",
                    "media": [
                        {
                            "type": "video",
                            "primary": true,
                            "sources": [{ "videoId": "QhVPBNBAGY0" }],
                            "pausePoints": [
                                { "label": "Other gospels (Thomas)", "time": "13:45" },
                                { "label": "Recognizing Scripture", "time": 362 },
                                { "label": "Broken", "time": "not-a-time" }
                            ]
                        }
                    ],
                    "outline": [{ "id": 1, "summary": "Recognizing Scripture", "points": [] }]
                },
                {
                    "classNumber": 2,
                    "title": "Second",
                    "media": [
                        { "type": "video", "primary": true, "sources": [{ "url": "https://youtu.be/second" }] }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_resolve_by_class_number() {
        let config = resolve_document(&sample_document(), "1").unwrap();

        assert_eq!(config.title, "Where the Bible came from");
        assert_eq!(config.channel_key.as_str(), "class1-control");
        assert_eq!(config.video_id, "QhVPBNBAGY0");
        assert_eq!(config.pause_points.len(), 2);
        assert_eq!(config.pause_points[0].time, 362.0);
        assert_eq!(config.pause_points[1].time, 825.0);
        assert_eq!(config.outline.len(), 1);
    }

    #[test]
    fn test_resolve_by_id() {
        let config = resolve_document(&sample_document(), "c1").unwrap();
        assert_eq!(config.video_id, "QhVPBNBAGY0");
    }

    #[test]
    fn test_channel_key_defaults_from_class_id() {
        let config = resolve_document(&sample_document(), "2").unwrap();
        assert_eq!(config.channel_key.as_str(), "class2-control");
        assert_eq!(config.video_id, "second");
    }

    #[test]
    fn test_unknown_class_falls_back_to_first() {
        let config = resolve_document(&sample_document(), "99").unwrap();
        assert_eq!(config.title, "Where the Bible came from");
        assert_eq!(config.class_id, "99");
    }

    #[test]
    fn test_array_and_single_shapes() {
        let array = json!([{ "classNumber": 5, "title": "Five" }]);
        assert_eq!(resolve_document(&array, "5").unwrap().title, "Five");

        let single = json!({ "classNumber": 6, "title": "Six" });
        assert_eq!(resolve_document(&single, "6").unwrap().title, "Six");
    }

    #[test]
    fn test_empty_document_yields_empty_config() {
        let config = resolve_document(&json!([]), "3").unwrap();
        assert_eq!(config, ClassConfig::empty("3"));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(resolve_document(&json!("nope"), "1").is_err());
        assert!(resolve_document(&json!({ "classes": 4 }), "1").is_err());
    }

    #[test]
    fn test_resolver_degrades_on_missing_file() {
        let dir = tempdir().unwrap();
        let resolver = ConfigResolver::new(FileConfigSource::new(dir.path().join("none.json")));

        let config = resolver.resolve("4");
        assert!(!config.has_video());
        assert!(config.pause_points.is_empty());
        assert_eq!(config.channel_key.as_str(), "class4-control");
    }

    #[test]
    fn test_resolver_degrades_on_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classes.json");
        atomic_write(&path, b"[1, 2").unwrap();

        let resolver = ConfigResolver::new(FileConfigSource::new(&path));
        assert_eq!(resolver.resolve("1"), ClassConfig::empty("1"));
    }

    #[test]
    fn test_resolver_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classes.json");
        atomic_write(&path, sample_document().to_string().as_bytes()).unwrap();

        let resolver = ConfigResolver::new(FileConfigSource::new(&path));
        assert_eq!(resolver.resolve("1").video_id, "QhVPBNBAGY0");
    }
}
