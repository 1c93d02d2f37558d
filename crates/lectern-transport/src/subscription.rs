//! Subscriptions, listener bookkeeping and duplicate suppression.

use std::collections::{HashSet, VecDeque};
use std::sync::RwLock;

use lectern_models::{ChannelKey, CommandMessage};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{trace, warn};

/// Number of recent command instances remembered for duplicate detection.
pub const DEFAULT_DEDUP_CAPACITY: usize = 64;

/// Remembers recently seen command instances (`sentAt` + content).
///
/// The same command may arrive once per transport when a surface listens on
/// several; only the first sighting is let through.
#[derive(Debug)]
pub struct Deduplicator {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl Deduplicator {
    /// Creates a deduplicator remembering up to `capacity` instances.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns true the first time a command instance is observed.
    pub fn first_sighting(&mut self, message: &CommandMessage) -> bool {
        let key = match message.instance_key() {
            Ok(key) => key,
            // Unkeyable messages are never treated as duplicates
            Err(_) => return true,
        };

        if self.seen.contains(&key) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.seen.insert(key);
        true
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

/// An independent subscription to one channel.
///
/// Yields messages in delivery order with duplicates removed. Dropping the
/// subscription unsubscribes: transports prune closed sinks on their next
/// delivery.
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiver<CommandMessage>,
    dedup: Deduplicator,
}

impl Subscription {
    /// Wraps a receiver.
    pub fn new(rx: UnboundedReceiver<CommandMessage>) -> Self {
        Self {
            rx,
            dedup: Deduplicator::default(),
        }
    }

    /// Creates a connected sink/subscription pair.
    pub fn pair() -> (UnboundedSender<CommandMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Waits for the next unseen message.
    ///
    /// Returns `None` once every sink feeding this subscription is gone.
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<CommandMessage> {
        while let Some(message) = self.rx.recv().await {
            if self.dedup.first_sighting(&message) {
                return Some(message);
            }
            trace!(command = message.command.name(), sent_at = message.sent_at, "dropping duplicate");
        }
        None
    }

    /// Returns the next unseen message if one is already queued.
    pub fn try_recv(&mut self) -> Option<CommandMessage> {
        while let Ok(message) = self.rx.try_recv() {
            if self.dedup.first_sighting(&message) {
                return Some(message);
            }
        }
        None
    }
}

/// Channel-filtered set of listener sinks.
#[derive(Debug, Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<(ChannelKey, UnboundedSender<CommandMessage>)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink for a channel, dropping sinks whose subscription is
    /// already gone.
    pub fn add(&self, channel: &ChannelKey, sink: UnboundedSender<CommandMessage>) {
        match self.listeners.write() {
            Ok(mut listeners) => {
                listeners.retain(|(_, existing)| !existing.is_closed());
                listeners.push((channel.clone(), sink));
            }
            Err(e) => warn!(error = %e, "listener lock poisoned, dropping listener"),
        }
    }

    /// Delivers a message to every live sink listening on `channel`.
    ///
    /// Closed sinks are removed. Returns the number of deliveries.
    pub fn dispatch(&self, channel: &ChannelKey, message: &CommandMessage) -> usize {
        let mut delivered = 0;
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.retain(|(key, sink)| {
                if key != channel {
                    return !sink.is_closed();
                }
                let ok = sink.send(message.clone()).is_ok();
                if ok {
                    delivered += 1;
                }
                ok
            });
        }
        delivered
    }

    /// Number of registered (possibly closed) sinks.
    pub fn len(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::Command;

    #[test]
    fn test_dedup_drops_replays() {
        let mut dedup = Deduplicator::new(4);
        let msg = CommandMessage::new(Command::Toggle, 10);

        assert!(dedup.first_sighting(&msg));
        assert!(!dedup.first_sighting(&msg));
        assert!(dedup.first_sighting(&CommandMessage::new(Command::Toggle, 11)));
    }

    #[test]
    fn test_dedup_forgets_oldest() {
        let mut dedup = Deduplicator::new(2);
        let first = CommandMessage::new(Command::Play, 1);

        assert!(dedup.first_sighting(&first));
        assert!(dedup.first_sighting(&CommandMessage::new(Command::Play, 2)));
        assert!(dedup.first_sighting(&CommandMessage::new(Command::Play, 3)));
        // Evicted, so seen again as new
        assert!(dedup.first_sighting(&first));
    }

    #[tokio::test]
    async fn test_subscription_skips_duplicates() {
        let (tx, mut sub) = Subscription::pair();
        let a = CommandMessage::new(Command::Pause, 1);
        let b = CommandMessage::new(Command::Play, 2);

        tx.send(a.clone()).unwrap();
        tx.send(a.clone()).unwrap();
        tx.send(b.clone()).unwrap();
        drop(tx);

        assert_eq!(sub.recv().await, Some(a));
        assert_eq!(sub.recv().await, Some(b));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_listener_set_filters_by_channel() {
        let set = ListenerSet::new();
        let (tx1, mut sub1) = Subscription::pair();
        let (tx2, mut sub2) = Subscription::pair();
        set.add(&ChannelKey::new("class1-control"), tx1);
        set.add(&ChannelKey::new("class2-control"), tx2);

        let msg = CommandMessage::new(Command::Restart, 5);
        assert_eq!(set.dispatch(&ChannelKey::new("class1-control"), &msg), 1);

        assert_eq!(sub1.try_recv(), Some(msg));
        assert_eq!(sub2.try_recv(), None);
    }

    #[test]
    fn test_listener_set_prunes_closed() {
        let set = ListenerSet::new();
        let channel = ChannelKey::new("c");
        let (tx, sub) = Subscription::pair();
        set.add(&channel, tx);
        drop(sub);

        assert_eq!(set.dispatch(&channel, &CommandMessage::new(Command::Play, 1)), 0);
        assert!(set.is_empty());
    }
}
