//! File-backed key-value store shared between processes.
//!
//! Every write is its own JSON file, named so that a key's entries sort in
//! write order:
//! ```text
//! dir/
//! ├── class1-control-storage.1767225600000-000000-3f2a9c1d.json
//! ├── class1-control-storage.1767225600000-000001-3f2a9c1d.json
//! └── class2-control-storage.1767225601234-000000-77b0e412.json
//! ```
//! Writes are atomic. Entries written by other processes are picked up by
//! polling the directory ([`FileStore::poll_changes`]), usually from the
//! background task started with [`FileStore::spawn_watcher`], and are
//! delivered oldest first. Writers remove their key's entries once they are
//! older than the retention window.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use lectern_models::SurfaceId;
use lectern_persistence::atomic::{atomic_write_json, ensure_dir, read_json};
use lectern_persistence::PersistenceError;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, trace, warn};

use crate::error::{Result, TransportError};
use crate::storage::{ChangeCallback, KeyValueStore, Observers};

/// Default age after which entries are pruned.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30);

/// On-disk form of one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    key: String,
    value: String,
    /// Milliseconds since the Unix epoch.
    written_at: i64,
    /// Per-writer sequence number.
    #[serde(default)]
    seq: u64,
}

/// Stamp of the last write, kept monotonic per store.
#[derive(Debug, Default)]
struct WriteClock {
    written_at: i64,
    seq: u64,
}

impl WriteClock {
    fn next(&mut self) -> (i64, u64) {
        let now = Utc::now().timestamp_millis();
        if now > self.written_at {
            self.written_at = now;
        }
        self.seq += 1;
        (self.written_at, self.seq)
    }
}

/// Directory of atomically written entries.
pub struct FileStore {
    dir: PathBuf,
    /// Distinguishes this store's files from other writers'.
    writer_tag: String,
    retention: Duration,
    clock: Mutex<WriteClock>,
    /// Entry files already delivered or written by us.
    seen: RwLock<HashSet<String>>,
    /// Last value seen per key, from our own writes or from polling.
    latest: RwLock<HashMap<String, String>>,
    observers: Observers,
}

fn lock_poisoned(e: impl std::fmt::Display) -> TransportError {
    TransportError::LockPoisoned(e.to_string())
}

fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl FileStore {
    /// Opens (creating if needed) a store in `dir`.
    ///
    /// Entries already present are treated as seen, so they are not replayed
    /// as changes.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::open_with_retention(dir, DEFAULT_RETENTION)?))
    }

    /// Like [`FileStore::open`] with a custom retention window.
    pub fn open_with_retention(dir: impl Into<PathBuf>, retention: Duration) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;

        let store = Self {
            dir,
            writer_tag: SurfaceId::new().short(),
            retention,
            clock: Mutex::new(WriteClock::default()),
            seen: RwLock::new(HashSet::new()),
            latest: RwLock::new(HashMap::new()),
            observers: Observers::default(),
        };

        let names = store.entry_names()?;
        let mut existing = Vec::new();
        for name in &names {
            if let Some(entry) = store.read_entry(name) {
                existing.push(entry);
            }
        }
        existing.sort_by_key(|e| (e.written_at, e.seq));
        {
            let mut latest = store.latest.write().map_err(lock_poisoned)?;
            for entry in existing {
                latest.insert(entry.key, entry.value);
            }
        }
        *store.seen.write().map_err(lock_poisoned)? = names.into_iter().collect();

        debug!(dir = %store.dir.display(), writer = %store.writer_tag, "opened file store");
        Ok(store)
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_file_name(&self, key: &str, written_at: i64, seq: u64) -> String {
        format!(
            "{}.{:013}-{:06}-{}.json",
            file_stem(key),
            written_at,
            seq,
            self.writer_tag
        )
    }

    /// File names of every entry currently in the directory.
    fn entry_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| PersistenceError::ReadError {
            path: self.dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PersistenceError::ReadError {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn read_entry(&self, name: &str) -> Option<StoredEntry> {
        let path = self.dir.join(name);
        match read_json::<StoredEntry>(&path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                // Pruned by another writer between listing and reading
                trace!(path = %path.display(), error = %e, "skipping unreadable entry");
                None
            }
        }
    }

    /// Checks the directory for entries written by other processes and
    /// notifies observers of each, oldest first. Returns the number of
    /// entries delivered.
    pub fn poll_changes(&self) -> Result<usize> {
        let mut fresh = Vec::new();
        {
            // Listing under the lock keeps local writes from racing the scan
            let mut seen = self.seen.write().map_err(lock_poisoned)?;
            let names = self.entry_names()?;
            // Forget pruned files so the set only tracks what is on disk
            let present: HashSet<&String> = names.iter().collect();
            seen.retain(|name| present.contains(name));

            for name in &names {
                if seen.contains(name) {
                    continue;
                }
                if let Some(entry) = self.read_entry(name) {
                    seen.insert(name.clone());
                    fresh.push((name.clone(), entry));
                }
            }
        }
        fresh.sort_by(|(a_name, a), (b_name, b)| {
            (a.written_at, a.seq, a_name).cmp(&(b.written_at, b.seq, b_name))
        });

        {
            let mut latest = self.latest.write().map_err(lock_poisoned)?;
            for (_, entry) in &fresh {
                latest.insert(entry.key.clone(), entry.value.clone());
            }
        }

        for (name, entry) in &fresh {
            trace!(key = %entry.key, file = %name, "external change");
            self.observers.notify(None, &entry.key, &entry.value);
        }
        Ok(fresh.len())
    }

    /// Deletes this key's entries older than the retention window, always
    /// keeping the newest one.
    fn prune(&self, key: &str, newest: &str, now: i64) -> Result<usize> {
        let prefix = format!("{}.", file_stem(key));
        let cutoff = now - self.retention.as_millis() as i64;

        let mut removed = 0;
        for name in self.entry_names()? {
            if !name.starts_with(&prefix) || name == newest {
                continue;
            }
            let Some(entry) = self.read_entry(&name) else {
                continue;
            };
            if entry.written_at < cutoff {
                let path = self.dir.join(&name);
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => trace!(path = %path.display(), error = %e, "entry already gone"),
                }
            }
        }
        if removed > 0 {
            debug!(key, removed, "pruned stale entries");
        }
        Ok(removed)
    }

    /// Polls for external changes every `every` until `shutdown` is set.
    pub fn spawn_watcher(
        self: &Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            debug!(poll_interval_ms = every.as_millis(), "starting file store watcher");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = store.poll_changes() {
                            warn!(error = %e, "file store poll failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("file store watcher stopped");
        })
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, writer: SurfaceId, key: &str, value: String) -> Result<()> {
        {
            let latest = self.latest.read().map_err(lock_poisoned)?;
            if latest.get(key) == Some(&value) {
                return Ok(());
            }
        }

        let (written_at, seq) = self.clock.lock().map_err(lock_poisoned)?.next();
        let entry = StoredEntry {
            key: key.to_string(),
            value: value.clone(),
            written_at,
            seq,
        };
        let name = self.entry_file_name(key, written_at, seq);
        {
            let mut seen = self.seen.write().map_err(lock_poisoned)?;
            atomic_write_json(&self.dir.join(&name), &entry)?;
            seen.insert(name.clone());
        }

        self.latest
            .write()
            .map_err(lock_poisoned)?
            .insert(key.to_string(), value.clone());

        if let Err(e) = self.prune(key, &name, written_at) {
            warn!(key, error = %e, "failed to prune entries");
        }

        // Surfaces in this process sharing the store
        self.observers.notify(Some(writer), key, &value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let prefix = format!("{}.", file_stem(key));
        let newest = self
            .entry_names()?
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .filter_map(|name| self.read_entry(&name))
            .filter(|entry| entry.key == key)
            .max_by_key(|entry| (entry.written_at, entry.seq));
        Ok(newest.map(|entry| entry.value))
    }

    fn on_change(&self, observer: SurfaceId, callback: ChangeCallback) {
        self.observers.add(observer, callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageTransport;
    use crate::transport::ChannelTransport;
    use lectern_models::{ChannelKey, Command, CommandMessage, MediaRef};
    use tempfile::tempdir;

    fn entry_count(dir: &Path, stem: &str) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(&format!("{}.", stem)))
            .count()
    }

    #[test]
    fn test_set_and_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set(SurfaceId::new(), "class1-control-storage", "{}".to_string()).unwrap();
        store.set(SurfaceId::new(), "class1-control-storage", "[]".to_string()).unwrap();

        assert_eq!(store.get("class1-control-storage").unwrap().as_deref(), Some("[]"));
        assert_eq!(entry_count(dir.path(), "class1-control-storage"), 2);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_cross_process_change_is_polled() {
        let dir = tempdir().unwrap();
        // Two handles on one directory stand in for two processes
        let presenter_store = FileStore::open(dir.path()).unwrap();
        let display_store = FileStore::open(dir.path()).unwrap();

        let presenter = StorageTransport::new(presenter_store.clone(), SurfaceId::new());
        let display = StorageTransport::new(display_store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("class1-control");
        let mut sub = display.subscribe(&channel);

        let msg = CommandMessage::new(Command::Restart, 77);
        presenter.publish(&channel, &msg);
        assert_eq!(sub.try_recv(), None);

        assert_eq!(display_store.poll_changes().unwrap(), 1);
        assert_eq!(sub.try_recv(), Some(msg));

        // Nothing new on the next poll
        assert_eq!(display_store.poll_changes().unwrap(), 0);
        // The writer never sees its own write as a change
        assert_eq!(presenter_store.poll_changes().unwrap(), 0);
    }

    #[test]
    fn test_writes_between_polls_are_all_delivered_in_order() {
        let dir = tempdir().unwrap();
        let presenter_store = FileStore::open(dir.path()).unwrap();
        let display_store = FileStore::open(dir.path()).unwrap();

        let presenter = StorageTransport::new(presenter_store, SurfaceId::new());
        let display = StorageTransport::new(display_store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("class1-control");
        let mut sub = display.subscribe(&channel);

        let swap = CommandMessage::new(
            Command::DisplayMedia {
                media: MediaRef::video("clip"),
            },
            1,
        );
        let fullscreen = CommandMessage::new(Command::Fullscreen, 2);
        let play = CommandMessage::new(Command::Play, 3);
        presenter.publish(&channel, &swap);
        presenter.publish(&channel, &fullscreen);
        presenter.publish(&channel, &play);

        assert_eq!(display_store.poll_changes().unwrap(), 3);
        assert_eq!(sub.try_recv(), Some(swap));
        assert_eq!(sub.try_recv(), Some(fullscreen));
        assert_eq!(sub.try_recv(), Some(play.clone()));
        assert_eq!(sub.try_recv(), None);
        let newest = display_store.get(&channel.storage_key()).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<CommandMessage>(&newest).unwrap(), play);
    }

    #[test]
    fn test_old_entries_are_pruned() {
        let dir = tempdir().unwrap();
        let store = FileStore::open_with_retention(dir.path(), Duration::ZERO).unwrap();
        let reader = FileStore::open(dir.path()).unwrap();

        store.set(SurfaceId::new(), "k", "1".to_string()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.set(SurfaceId::new(), "k", "2".to_string()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.set(SurfaceId::new(), "k", "3".to_string()).unwrap();

        assert_eq!(entry_count(dir.path(), "k"), 1);
        assert_eq!(reader.get("k").unwrap().as_deref(), Some("3"));
        // Only the surviving entry is delivered
        assert_eq!(reader.poll_changes().unwrap(), 1);
    }

    #[test]
    fn test_existing_entries_are_not_replayed() {
        let dir = tempdir().unwrap();
        let first = FileStore::open(dir.path()).unwrap();
        first.set(SurfaceId::new(), "k", "v".to_string()).unwrap();

        let second = FileStore::open(dir.path()).unwrap();
        assert_eq!(second.poll_changes().unwrap(), 0);
        // Rewriting the value it already knows is a no-op
        second.set(SurfaceId::new(), "k", "v".to_string()).unwrap();
        assert_eq!(entry_count(dir.path(), "k"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_delivers_and_stops() {
        let dir = tempdir().unwrap();
        let writer = FileStore::open(dir.path()).unwrap();
        let reader = FileStore::open(dir.path()).unwrap();
        let channel = ChannelKey::new("c");
        let mut sub = StorageTransport::new(reader.clone(), SurfaceId::new()).subscribe(&channel);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = reader.spawn_watcher(Duration::from_millis(250), shutdown_rx);

        let msg = CommandMessage::new(Command::Pause, 1);
        StorageTransport::new(writer, SurfaceId::new()).publish(&channel, &msg);

        assert_eq!(sub.recv().await, Some(msg));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
