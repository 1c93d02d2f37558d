//! Desktop relay hub.
//!
//! In the desktop shell each window opens a [`RelayTransport`] on the shared
//! [`RelayHub`]. A publish sends a `{channel, data}` envelope to the hub,
//! which forwards it to every open window except the sender; each window
//! then dispatches to its listeners on that channel.

use std::sync::{Arc, RwLock};

use lectern_models::{ChannelKey, CommandMessage, SurfaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::subscription::ListenerSet;
use crate::transport::{ChannelTransport, TransportKind};

/// Message relayed between windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub channel: ChannelKey,
    pub data: Value,
}

struct Window {
    id: SurfaceId,
    listeners: Arc<ListenerSet>,
}

/// Hub process relaying envelopes between windows.
#[derive(Default)]
pub struct RelayHub {
    windows: RwLock<Vec<Window>>,
}

impl RelayHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens a window on the hub. The window closes when dropped.
    pub fn open_window(self: &Arc<Self>, id: SurfaceId) -> RelayTransport {
        let listeners = Arc::new(ListenerSet::new());
        match self.windows.write() {
            Ok(mut windows) => windows.push(Window {
                id,
                listeners: Arc::clone(&listeners),
            }),
            Err(e) => warn!(error = %e, "relay hub lock poisoned"),
        }
        debug!(window = %id.short(), "relay window opened");

        RelayTransport {
            hub: Arc::clone(self),
            id,
            listeners,
        }
    }

    /// Number of open windows.
    pub fn window_count(&self) -> usize {
        self.windows.read().map(|w| w.len()).unwrap_or(0)
    }

    /// Forwards an envelope to every window except `sender`.
    ///
    /// Returns the number of windows the envelope was relayed to.
    pub fn relay(&self, sender: SurfaceId, envelope: &RelayEnvelope) -> usize {
        let targets: Vec<Arc<ListenerSet>> = match self.windows.read() {
            Ok(windows) => windows
                .iter()
                .filter(|w| w.id != sender)
                .map(|w| Arc::clone(&w.listeners))
                .collect(),
            Err(_) => return 0,
        };

        let message = match serde_json::from_value::<CommandMessage>(envelope.data.clone()) {
            Ok(message) => message,
            Err(e) => {
                warn!(channel = %envelope.channel, error = %e, "relayed data is not a command");
                return targets.len();
            }
        };

        for listeners in &targets {
            listeners.dispatch(&envelope.channel, &message);
        }
        debug!(
            channel = %envelope.channel,
            sender = %sender.short(),
            windows = targets.len(),
            "relayed"
        );
        targets.len()
    }

    fn close(&self, id: SurfaceId) {
        if let Ok(mut windows) = self.windows.write() {
            windows.retain(|w| w.id != id);
        }
        debug!(window = %id.short(), "relay window closed");
    }
}

/// One window's connection to a [`RelayHub`].
pub struct RelayTransport {
    hub: Arc<RelayHub>,
    id: SurfaceId,
    listeners: Arc<ListenerSet>,
}

impl RelayTransport {
    /// Window id.
    pub fn id(&self) -> SurfaceId {
        self.id
    }
}

impl ChannelTransport for RelayTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Relay
    }

    fn publish(&self, channel: &ChannelKey, message: &CommandMessage) {
        let data = match serde_json::to_value(message) {
            Ok(data) => data,
            Err(e) => {
                warn!(channel = %channel, error = %e, "failed to serialize command, dropping");
                return;
            }
        };
        let envelope = RelayEnvelope {
            channel: channel.clone(),
            data,
        };
        self.hub.relay(self.id, &envelope);
    }

    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        self.listeners.add(channel, sink);
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.hub.close(self.id);
    }
}
