//! Atomic file operations.
//!
//! Every write goes to a temporary file in the target directory and is then
//! renamed over the destination, so readers (including other processes
//! polling the same directory) never observe a half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{PersistenceError, Result};

fn write_failed(path: &Path) -> impl FnOnce(io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    }
}

/// Creates `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes `data` to `path` atomically, creating parent directories.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    // Same directory keeps the rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed(path))?;
    temp.write_all(data).map_err(write_failed(path))?;
    temp.flush().map_err(write_failed(path))?;
    temp.persist(path)
        .map_err(|e| write_failed(path)(e.error))?;

    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

/// Reads a file to a string, returning `None` if it does not exist.
pub fn read_string_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistenceError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads and deserializes JSON from a file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&data)?)
}

/// Reads JSON from a file, returning `None` if the file doesn't exist.
pub fn read_json_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_string_optional(path)? {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Answer {
        key: String,
        text: String,
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.html");

        atomic_write(&path, b"<p>first</p>").unwrap();
        atomic_write(&path, b"<p>second</p>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>second</p>");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels/class1/message.json");

        atomic_write(&path, b"{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("answer.json");
        let answer = Answer {
            key: "q1".to_string(),
            text: "Luke".to_string(),
        };

        atomic_write_json(&path, &answer).unwrap();
        let loaded: Answer = read_json(&path).unwrap();

        assert_eq!(loaded, answer);
    }

    #[test]
    fn test_optional_reads_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(read_string_optional(&path).unwrap().is_none());
        let result: Option<Answer> = read_json_optional(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_json_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        atomic_write(&path, b"{ not json").unwrap();

        let result: Result<Answer> = read_json(&path);
        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }
}
