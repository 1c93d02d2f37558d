//! Display surface for Lectern.
//!
//! This crate provides the display side of the remote-control protocol:
//! - `DisplayController` - the playback state machine (pause points,
//!   media overrides, pending media, passage pages)
//! - `PauseMonitor` - fixed-interval timer that runs only while playing
//! - `DisplayRuntime` - single task wiring the controller to a transport,
//!   a playback engine and a passage service
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lectern_display::{DisplayConfig, DisplayRuntime, HttpPassageLookup, SimulatedEngineFactory};
//! use lectern_models::{ClassConfig, SurfaceId};
//! use lectern_transport::BroadcastHub;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = BroadcastHub::new();
//!     let runtime = DisplayRuntime::new(
//!         DisplayConfig::default(),
//!         ClassConfig::empty("1"),
//!         Arc::new(hub.attach(SurfaceId::new())),
//!         Arc::new(SimulatedEngineFactory::new()),
//!         Arc::new(HttpPassageLookup::new()?),
//!     );
//!
//!     let mut display = runtime.start();
//!     display.platform_ready();
//!
//!     tokio::signal::ctrl_c().await?;
//!     display.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Pause points
//!
//! While playing, the monitor compares the position with the next pause
//! point every tick. Reaching it pauses playback and advances the cursor
//! by exactly one; points passed over by a seek or a slow tick are not
//! triggered afterwards. Restarting or resuming recomputes the cursor as
//! the first point strictly after the current position; a jump sets it to
//! the jump target.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod monitor;
pub mod passage;
pub mod runtime;

pub use config::DisplayConfig;
pub use controller::{DisplayController, PassageRequest};
pub use engine::{
    EngineEvent, EngineEventSender, EngineFactory, EngineState, PlaybackEngine, SimulatedEngine,
    SimulatedEngineFactory,
};
pub use error::{DisplayError, Result};
pub use event::{DisplayEvent, DisplaySnapshot, PassageView, Phase, Surface};
pub use monitor::PauseMonitor;
pub use passage::{HttpPassageLookup, Passage, PassageLookup, StaticPassageLookup, DEFAULT_PASSAGE_URL};
pub use runtime::{DisplayHandle, DisplayRuntime};
