//! Key-value storage fallback.
//!
//! Publishing writes the serialized message under the channel's storage key
//! (`<channel>-storage`). Other surfaces sharing the store observe the
//! change notification and parse the value back into a command.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lectern_models::{ChannelKey, CommandMessage, SurfaceId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::transport::{ChannelTransport, TransportKind};

/// Change notification callback: `(key, value)`, returns false to detach.
pub type ChangeCallback = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Shared key-value store with change notifications.
///
/// Like browser storage events, a writer is never notified of its own
/// writes, and rewriting an unchanged value notifies nobody.
pub trait KeyValueStore: Send + Sync {
    /// Writes `value` under `key` on behalf of `writer`.
    fn set(&self, writer: SurfaceId, key: &str, value: String) -> Result<()>;

    /// Reads the current value of `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Registers `observer`'s callback for changes made by other writers.
    fn on_change(&self, observer: SurfaceId, callback: ChangeCallback);
}

/// Registered change observers.
#[derive(Default)]
pub(crate) struct Observers {
    entries: RwLock<Vec<(SurfaceId, ChangeCallback)>>,
}

impl Observers {
    pub(crate) fn add(&self, observer: SurfaceId, callback: ChangeCallback) {
        match self.entries.write() {
            Ok(mut entries) => entries.push((observer, callback)),
            Err(e) => warn!(error = %e, "observer lock poisoned"),
        }
    }

    /// Notifies every observer except `writer` (all of them when `None`).
    pub(crate) fn notify(&self, writer: Option<SurfaceId>, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|(observer, callback)| {
                if Some(*observer) == writer {
                    return true;
                }
                callback(key, value)
            });
        }
    }
}

/// In-process key-value store.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    observers: Observers,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, writer: SurfaceId, key: &str, value: String) -> Result<()> {
        {
            let mut values = self
                .values
                .write()
                .map_err(|e| TransportError::LockPoisoned(e.to_string()))?;
            if values.get(key) == Some(&value) {
                return Ok(());
            }
            values.insert(key.to_string(), value.clone());
        }

        self.observers.notify(Some(writer), key, &value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| TransportError::LockPoisoned(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn on_change(&self, observer: SurfaceId, callback: ChangeCallback) {
        self.observers.add(observer, callback);
    }
}

/// Transport writing commands into a [`KeyValueStore`].
#[derive(Clone)]
pub struct StorageTransport {
    store: Arc<dyn KeyValueStore>,
    surface: SurfaceId,
}

impl StorageTransport {
    pub fn new(store: Arc<dyn KeyValueStore>, surface: SurfaceId) -> Self {
        Self { store, surface }
    }

    fn write(&self, channel: &ChannelKey, message: &CommandMessage) -> Result<()> {
        let value = serde_json::to_string(message)?;
        self.store.set(self.surface, &channel.storage_key(), value)
    }
}

impl ChannelTransport for StorageTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Storage
    }

    fn publish(&self, channel: &ChannelKey, message: &CommandMessage) {
        match self.write(channel, message) {
            Ok(()) => debug!(
                channel = %channel,
                command = message.command.name(),
                "stored command"
            ),
            Err(e) => warn!(channel = %channel, error = %e, "storage publish failed, dropping"),
        }
    }

    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        let storage_key = channel.storage_key();
        self.store.on_change(
            self.surface,
            Box::new(move |key, value| {
                if key != storage_key {
                    return !sink.is_closed();
                }
                match serde_json::from_str::<CommandMessage>(value) {
                    Ok(message) => sink.send(message).is_ok(),
                    Err(e) => {
                        warn!(key, error = %e, "ignoring unparseable stored command");
                        !sink.is_closed()
                    }
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::Command;

    #[test]
    fn test_publish_writes_storage_key() {
        let store = MemoryStore::new();
        let presenter = StorageTransport::new(store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("class1-control");

        let msg = CommandMessage::new(Command::Fullscreen, 9);
        presenter.publish(&channel, &msg);

        let stored = store.get("class1-control-storage").unwrap().unwrap();
        let parsed: CommandMessage = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_other_surfaces_observe_changes() {
        let store = MemoryStore::new();
        let presenter = StorageTransport::new(store.clone(), SurfaceId::new());
        let display = StorageTransport::new(store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("class1-control");

        let mut own = presenter.subscribe(&channel);
        let mut remote = display.subscribe(&channel);

        let msg = CommandMessage::new(Command::JumpToPause { index: 1 }, 2);
        presenter.publish(&channel, &msg);

        assert_eq!(remote.try_recv(), Some(msg));
        assert_eq!(own.try_recv(), None);
    }

    #[test]
    fn test_unchanged_value_does_not_notify() {
        let store = MemoryStore::new();
        let presenter = StorageTransport::new(store.clone(), SurfaceId::new());
        let display = StorageTransport::new(store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("c");
        let (tx, mut raw) = tokio::sync::mpsc::unbounded_channel();
        display.listen(&channel, tx);

        let msg = CommandMessage::new(Command::Play, 1);
        presenter.publish(&channel, &msg);
        presenter.publish(&channel, &msg);

        assert!(raw.try_recv().is_ok());
        assert!(raw.try_recv().is_err());
    }

    #[test]
    fn test_garbage_value_is_ignored() {
        let store = MemoryStore::new();
        let display = StorageTransport::new(store.clone(), SurfaceId::new());
        let channel = ChannelKey::new("c");
        let mut sub = display.subscribe(&channel);

        store
            .set(SurfaceId::new(), &channel.storage_key(), "{\"type\":\"bogus\"}".to_string())
            .unwrap();
        assert_eq!(sub.try_recv(), None);

        let msg = CommandMessage::new(Command::Pause, 4);
        store
            .set(SurfaceId::new(), &channel.storage_key(), serde_json::to_string(&msg).unwrap())
            .unwrap();
        assert_eq!(sub.try_recv(), Some(msg));
    }
}
