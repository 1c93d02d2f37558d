//! Combining transports and choosing one from the surface's capabilities.

use std::sync::Arc;

use lectern_models::{ChannelKey, CommandMessage, SurfaceId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::broadcast::BroadcastHub;
use crate::relay::RelayHub;
use crate::storage::{KeyValueStore, StorageTransport};
use crate::subscription::ListenerSet;
use crate::transport::{ChannelTransport, TransportKind};

/// Publishes on every inner transport and listens on all of them.
///
/// A subscription opened on a fanout sees each command once even when it
/// arrives over several inner transports.
pub struct FanoutTransport {
    inner: Vec<Arc<dyn ChannelTransport>>,
}

impl FanoutTransport {
    pub fn new(inner: Vec<Arc<dyn ChannelTransport>>) -> Self {
        Self { inner }
    }

    /// Kinds of the inner transports, in order.
    pub fn kinds(&self) -> Vec<TransportKind> {
        self.inner.iter().map(|t| t.kind()).collect()
    }
}

impl ChannelTransport for FanoutTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Fanout
    }

    fn publish(&self, channel: &ChannelKey, message: &CommandMessage) {
        for transport in &self.inner {
            transport.publish(channel, message);
        }
    }

    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        for transport in &self.inner {
            transport.listen(channel, sink.clone());
        }
    }
}

/// Transport used when nothing else is available: publishes are dropped
/// and subscriptions stay open but silent.
#[derive(Default)]
pub struct NullTransport {
    listeners: ListenerSet,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelTransport for NullTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Null
    }

    fn publish(&self, channel: &ChannelKey, message: &CommandMessage) {
        debug!(
            channel = %channel,
            command = message.command.name(),
            "no transport available, dropping"
        );
    }

    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        self.listeners.add(channel, sink);
    }
}

/// Mechanisms available to a surface.
#[derive(Clone, Default)]
pub struct TransportCapabilities {
    /// Live broadcast medium.
    pub broadcast: Option<Arc<BroadcastHub>>,
    /// Durable key-value store for the fallback path.
    pub storage: Option<Arc<dyn KeyValueStore>>,
    /// Desktop relay hub.
    pub relay: Option<Arc<RelayHub>>,
}

impl TransportCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broadcast(mut self, hub: Arc<BroadcastHub>) -> Self {
        self.broadcast = Some(hub);
        self
    }

    pub fn with_storage(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(store);
        self
    }

    pub fn with_relay(mut self, hub: Arc<RelayHub>) -> Self {
        self.relay = Some(hub);
        self
    }
}

/// Picks the transport for a surface.
///
/// The live path is the relay when present, otherwise broadcast. Storage is
/// added alongside as the fallback, so every publish also lands in the
/// store and listeners hear from both (duplicates are dropped per
/// subscription).
pub fn select_transport(
    capabilities: &TransportCapabilities,
    surface: SurfaceId,
) -> Arc<dyn ChannelTransport> {
    let mut selected: Vec<Arc<dyn ChannelTransport>> = Vec::new();

    if let Some(relay) = &capabilities.relay {
        selected.push(Arc::new(relay.open_window(surface)));
    } else if let Some(hub) = &capabilities.broadcast {
        selected.push(Arc::new(hub.attach(surface)));
    }

    if let Some(store) = &capabilities.storage {
        selected.push(Arc::new(StorageTransport::new(Arc::clone(store), surface)));
    }

    let transport: Arc<dyn ChannelTransport> = match selected.len() {
        0 => Arc::new(NullTransport::new()),
        1 => selected.remove(0),
        _ => Arc::new(FanoutTransport::new(selected)),
    };

    info!(surface = %surface.short(), transport = %transport.kind(), "selected transport");
    transport
}
