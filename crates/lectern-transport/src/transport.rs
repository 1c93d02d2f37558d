//! The transport abstraction.

use std::fmt;

use lectern_models::{ChannelKey, CommandMessage};
use tokio::sync::mpsc::UnboundedSender;

use crate::subscription::Subscription;

/// Which mechanism a transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Live in-process broadcast between attached surfaces.
    Broadcast,
    /// Durable key-value fallback with change notifications.
    Storage,
    /// Desktop hub relaying between windows.
    Relay,
    /// Several transports combined.
    Fanout,
    /// Nothing available.
    Null,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Broadcast => "broadcast",
            TransportKind::Storage => "storage",
            TransportKind::Relay => "relay",
            TransportKind::Fanout => "fanout",
            TransportKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// Channel-scoped pub/sub between surfaces.
///
/// Publishing is fire-and-forget: it never fails and never reaches the
/// publishing surface itself. Delivery is FIFO per publisher.
pub trait ChannelTransport: Send + Sync {
    /// Mechanism in use.
    fn kind(&self) -> TransportKind;

    /// Sends a message to every other surface subscribed to `channel`.
    fn publish(&self, channel: &ChannelKey, message: &CommandMessage);

    /// Forwards messages on `channel` from other surfaces into `sink`.
    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>);

    /// Opens an independent, deduplicating subscription to `channel`.
    fn subscribe(&self, channel: &ChannelKey) -> Subscription {
        let (sink, subscription) = Subscription::pair();
        self.listen(channel, sink);
        subscription
    }
}
