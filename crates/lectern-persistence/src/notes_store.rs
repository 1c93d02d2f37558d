//! Presenter notes store.
//!
//! Notes never leave the presenter's machine. They are kept per class as a
//! single JSON file:
//! ```text
//! base_path/
//! └── notes/
//!     ├── class1-teacher-notes.json
//!     └── class2-teacher-notes.json
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use lectern_models::is_valid_class_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::{PersistenceError, Result};

/// Version written into exported notes files.
pub const NOTES_FILE_VERSION: u32 = 1;

/// Local notes for one class: rich-text notes plus per-question answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesState {
    #[serde(default)]
    pub notes_html: String,
    /// Answers keyed by question key.
    #[serde(default)]
    pub questions: BTreeMap<String, String>,
}

/// Exported notes file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesFile {
    pub version: u32,
    pub class_number: String,
    pub notes_html: String,
    pub questions: BTreeMap<String, String>,
}

/// How an imported file was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesImport {
    /// A JSON notes file: notes and answers were applied.
    Structured,
    /// Anything else, taken verbatim as notes HTML.
    RichText,
}

/// Manages persistence of presenter notes.
pub struct NotesStore {
    base_path: PathBuf,
}

impl NotesStore {
    /// Creates a new NotesStore with the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn notes_path(&self, class_id: &str) -> Result<PathBuf> {
        if !is_valid_class_id(class_id) {
            return Err(PersistenceError::InvalidClassId(class_id.to_string()));
        }
        Ok(self
            .base_path
            .join("notes")
            .join(format!("class{}-teacher-notes.json", class_id)))
    }

    /// Loads notes for a class; missing notes yield an empty state.
    pub fn load(&self, class_id: &str) -> Result<NotesState> {
        Ok(read_json_optional(&self.notes_path(class_id)?)?.unwrap_or_default())
    }

    /// Saves notes for a class.
    pub fn save(&self, class_id: &str, state: &NotesState) -> Result<()> {
        debug!(class_id, answers = state.questions.len(), "saving notes");
        atomic_write_json(&self.notes_path(class_id)?, state)
    }

    /// Replaces the rich-text notes of a class.
    pub fn set_notes_html(&self, class_id: &str, html: impl Into<String>) -> Result<NotesState> {
        let mut state = self.load(class_id)?;
        state.notes_html = html.into();
        self.save(class_id, &state)?;
        Ok(state)
    }

    /// Records the answer for one question.
    pub fn set_answer(
        &self,
        class_id: &str,
        question_key: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<NotesState> {
        let mut state = self.load(class_id)?;
        state.questions.insert(question_key.into(), answer.into());
        self.save(class_id, &state)?;
        Ok(state)
    }

    /// Builds the export file for a class.
    pub fn export(&self, class_id: &str) -> Result<NotesFile> {
        let state = self.load(class_id)?;
        Ok(NotesFile {
            version: NOTES_FILE_VERSION,
            class_number: class_id.to_string(),
            notes_html: state.notes_html,
            questions: state.questions,
        })
    }

    /// Imports a previously exported file, or raw notes HTML.
    ///
    /// A JSON object replaces the notes when it carries non-empty
    /// `notesHtml` and merges string answers from `questions`. Any other
    /// content becomes the notes verbatim.
    pub fn import(&self, class_id: &str, contents: &str) -> Result<NotesImport> {
        let mut state = self.load(class_id)?;

        let outcome = match serde_json::from_str::<Value>(contents) {
            Ok(Value::Object(map)) => {
                if let Some(html) = map
                    .get("notesHtml")
                    .and_then(Value::as_str)
                    .filter(|h| !h.is_empty())
                {
                    state.notes_html = html.to_string();
                }
                if let Some(Value::Object(answers)) = map.get("questions") {
                    for (key, value) in answers {
                        if let Some(text) = value.as_str() {
                            state.questions.insert(key.clone(), text.to_string());
                        }
                    }
                }
                NotesImport::Structured
            }
            _ => {
                state.notes_html = contents.to_string();
                NotesImport::RichText
            }
        };

        self.save(class_id, &state)?;
        debug!(class_id, ?outcome, "imported notes");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());

        assert_eq!(store.load("1").unwrap(), NotesState::default());
    }

    #[test]
    fn test_answers_persist() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());

        store.set_answer("1", "q1", "Luke").unwrap();
        store.set_notes_html("1", "<p>Open in prayer</p>").unwrap();

        let reopened = NotesStore::new(dir.path());
        let state = reopened.load("1").unwrap();
        assert_eq!(state.questions.get("q1").map(String::as_str), Some("Luke"));
        assert_eq!(state.notes_html, "<p>Open in prayer</p>");
        assert!(dir.path().join("notes/class1-teacher-notes.json").exists());
    }

    #[test]
    fn test_class_id_must_be_file_safe() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());

        for bad in ["../../escape", "", "a/b"] {
            assert!(matches!(
                store.set_notes_html(bad, "x"),
                Err(PersistenceError::InvalidClassId(_))
            ));
            assert!(store.load(bad).is_err());
            assert!(store.import(bad, "<p>x</p>").is_err());
        }
        assert!(!dir.path().join("notes").exists());
    }

    #[test]
    fn test_classes_are_separate() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());

        store.set_notes_html("1", "one").unwrap();
        assert!(store.load("2").unwrap().notes_html.is_empty());
    }

    #[test]
    fn test_export_shape() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());
        store.set_answer("3", "q2", "Acts").unwrap();

        let file = store.export("3").unwrap();
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["classNumber"], "3");
        assert_eq!(value["questions"]["q2"], "Acts");
        assert_eq!(value["notesHtml"], "");
    }

    #[test]
    fn test_import_structured_merges_answers() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());
        store.set_answer("1", "keep", "kept").unwrap();

        let outcome = store
            .import(
                "1",
                r#"{"version":1,"notesHtml":"<b>hi</b>","questions":{"q1":"Mark","bad":3}}"#,
            )
            .unwrap();

        assert_eq!(outcome, NotesImport::Structured);
        let state = store.load("1").unwrap();
        assert_eq!(state.notes_html, "<b>hi</b>");
        assert_eq!(state.questions.get("q1").map(String::as_str), Some("Mark"));
        assert_eq!(state.questions.get("keep").map(String::as_str), Some("kept"));
        assert!(!state.questions.contains_key("bad"));
    }

    #[test]
    fn test_import_structured_keeps_notes_without_html() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());
        store.set_notes_html("1", "existing").unwrap();

        store.import("1", r#"{"questions":{}}"#).unwrap();
        assert_eq!(store.load("1").unwrap().notes_html, "existing");
    }

    #[test]
    fn test_import_raw_html() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path());

        let outcome = store.import("1", "<h1>Outline</h1>").unwrap();
        assert_eq!(outcome, NotesImport::RichText);
        assert_eq!(store.load("1").unwrap().notes_html, "<h1>Outline</h1>");

        // JSON that is not an object is still raw text
        store.import("1", "42").unwrap();
        assert_eq!(store.load("1").unwrap().notes_html, "42");
    }
}
