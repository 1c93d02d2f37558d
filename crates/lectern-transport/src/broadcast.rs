//! Live in-process broadcast.
//!
//! Every surface attaches to a shared [`BroadcastHub`] and gets its own
//! [`BroadcastTransport`]. A publish reaches every other attached surface
//! listening on the same channel, never the publisher.

use std::sync::{Arc, RwLock};

use lectern_models::{ChannelKey, CommandMessage, SurfaceId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::transport::{ChannelTransport, TransportKind};

struct Member {
    surface: SurfaceId,
    channel: ChannelKey,
    sink: UnboundedSender<CommandMessage>,
}

/// Shared broadcast medium.
#[derive(Default)]
pub struct BroadcastHub {
    members: RwLock<Vec<Member>>,
}

impl BroadcastHub {
    /// Creates a hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attaches a surface to the hub.
    pub fn attach(self: &Arc<Self>, surface: SurfaceId) -> BroadcastTransport {
        BroadcastTransport {
            hub: Arc::clone(self),
            surface,
        }
    }

    fn join(&self, surface: SurfaceId, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        match self.members.write() {
            Ok(mut members) => members.push(Member {
                surface,
                channel: channel.clone(),
                sink,
            }),
            Err(e) => warn!(error = %e, "broadcast hub lock poisoned"),
        }
    }

    fn deliver(&self, origin: SurfaceId, channel: &ChannelKey, message: &CommandMessage) -> usize {
        let mut delivered = 0;
        if let Ok(mut members) = self.members.write() {
            members.retain(|member| {
                if member.surface == origin || &member.channel != channel {
                    return !member.sink.is_closed();
                }
                let ok = member.sink.send(message.clone()).is_ok();
                if ok {
                    delivered += 1;
                }
                ok
            });
        }
        delivered
    }
}

/// One surface's view of a [`BroadcastHub`].
#[derive(Clone)]
pub struct BroadcastTransport {
    hub: Arc<BroadcastHub>,
    surface: SurfaceId,
}

impl BroadcastTransport {
    /// Surface this transport publishes as.
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }
}

impl ChannelTransport for BroadcastTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Broadcast
    }

    fn publish(&self, channel: &ChannelKey, message: &CommandMessage) {
        let delivered = self.hub.deliver(self.surface, channel, message);
        debug!(
            channel = %channel,
            surface = %self.surface.short(),
            command = message.command.name(),
            delivered,
            "broadcast"
        );
    }

    fn listen(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        self.hub.join(self.surface, channel, sink);
    }
}
