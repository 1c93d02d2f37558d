//! Channel-scoped pub/sub transports for Lectern.
//!
//! A presenter publishes [`CommandMessage`]s on a channel key and every
//! other surface subscribed to that key receives them. Several mechanisms
//! are provided:
//! - [`BroadcastHub`]: live in-process broadcast between attached surfaces
//! - [`StorageTransport`]: durable key-value fallback over a [`KeyValueStore`]
//!   ([`MemoryStore`] in-process, [`FileStore`] across processes)
//! - [`RelayHub`]: desktop hub relaying between windows
//!
//! [`select_transport`] combines what a surface has available.
//!
//! # Example
//!
//! ```no_run
//! use lectern_models::{ChannelKey, Command, CommandMessage, SurfaceId};
//! use lectern_transport::{select_transport, BroadcastHub, MemoryStore, TransportCapabilities};
//!
//! let caps = TransportCapabilities::new()
//!     .with_broadcast(BroadcastHub::new())
//!     .with_storage(MemoryStore::new());
//!
//! let presenter = select_transport(&caps, SurfaceId::new());
//! let display = select_transport(&caps, SurfaceId::new());
//!
//! let channel = ChannelKey::for_class("1");
//! let mut subscription = display.subscribe(&channel);
//! presenter.publish(&channel, &CommandMessage::now(Command::Toggle));
//! assert!(subscription.try_recv().is_some());
//! ```
//!
//! [`CommandMessage`]: lectern_models::CommandMessage

pub mod broadcast;
pub mod error;
pub mod file_store;
pub mod relay;
pub mod select;
pub mod storage;
pub mod subscription;
pub mod transport;

pub use broadcast::{BroadcastHub, BroadcastTransport};
pub use error::{Result, TransportError};
pub use file_store::FileStore;
pub use relay::{RelayEnvelope, RelayHub, RelayTransport};
pub use select::{select_transport, FanoutTransport, NullTransport, TransportCapabilities};
pub use storage::{ChangeCallback, KeyValueStore, MemoryStore, StorageTransport};
pub use subscription::{Deduplicator, ListenerSet, Subscription};
pub use transport::{ChannelTransport, TransportKind};
