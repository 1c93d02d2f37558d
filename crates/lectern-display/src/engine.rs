//! Playback engine abstraction.
//!
//! A real display embeds a third-party video player whose state changes
//! arrive asynchronously. [`PlaybackEngine`] is the slice of that player the
//! controller needs; state changes are reported as [`EngineEvent`]s tagged
//! with the generation of the engine that produced them, so events from a
//! torn-down engine can be told apart.

use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::trace;

use crate::error::{DisplayError, Result};

/// Player state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
}

/// A state change reported by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineEvent {
    /// Generation of the engine that emitted the event.
    pub generation: u64,
    pub state: EngineState,
}

/// Channel an engine reports its state changes on.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    generation: u64,
    tx: UnboundedSender<EngineEvent>,
}

impl EngineEventSender {
    pub fn new(generation: u64, tx: UnboundedSender<EngineEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation events are tagged with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports a state change. Dropped silently if nobody is listening.
    pub fn emit(&self, state: EngineState) {
        let _ = self.tx.send(EngineEvent {
            generation: self.generation,
            state,
        });
    }
}

/// The controllable surface of a video player.
pub trait PlaybackEngine: Send {
    /// Video loaded in this engine.
    fn video_id(&self) -> &str;

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Current player state.
    fn state(&self) -> EngineState;

    /// Starts or resumes playback.
    fn play(&mut self);

    /// Pauses playback.
    fn pause(&mut self);

    /// Seeks to a position in seconds.
    fn seek(&mut self, seconds: f64);
}

/// Constructs playback engines.
pub trait EngineFactory: Send + Sync {
    /// Creates an engine for `video_id` reporting on `events`.
    fn create(&self, video_id: &str, events: EngineEventSender) -> Result<Box<dyn PlaybackEngine>>;
}

/// Clock-driven engine used headless and in tests.
///
/// Position advances with [`tokio::time::Instant`] while playing, so paused
/// test clocks drive it deterministically.
pub struct SimulatedEngine {
    video_id: String,
    state: EngineState,
    /// Position at `resumed_at` (or the frozen position when not playing).
    base_position: f64,
    resumed_at: Option<Instant>,
    events: EngineEventSender,
}

impl SimulatedEngine {
    pub fn new(video_id: impl Into<String>, events: EngineEventSender) -> Self {
        Self {
            video_id: video_id.into(),
            state: EngineState::Unstarted,
            base_position: 0.0,
            resumed_at: None,
            events,
        }
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            trace!(video_id = %self.video_id, ?state, "simulated engine state");
            self.state = state;
            self.events.emit(state);
        }
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn video_id(&self) -> &str {
        &self.video_id
    }

    fn current_time(&self) -> f64 {
        match self.resumed_at {
            Some(at) => self.base_position + at.elapsed().as_secs_f64(),
            None => self.base_position,
        }
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn play(&mut self) {
        if self.state == EngineState::Playing {
            return;
        }
        self.resumed_at = Some(Instant::now());
        self.set_state(EngineState::Playing);
    }

    fn pause(&mut self) {
        if self.state != EngineState::Playing {
            return;
        }
        self.base_position = self.current_time();
        self.resumed_at = None;
        self.set_state(EngineState::Paused);
    }

    fn seek(&mut self, seconds: f64) {
        self.base_position = seconds.max(0.0);
        if self.resumed_at.is_some() {
            self.resumed_at = Some(Instant::now());
        }
    }
}

/// Factory producing [`SimulatedEngine`]s.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngineFactory {
    failing: HashSet<String>,
}

impl SimulatedEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes engine construction fail for `video_id`.
    pub fn with_failure(mut self, video_id: impl Into<String>) -> Self {
        self.failing.insert(video_id.into());
        self
    }
}

impl EngineFactory for SimulatedEngineFactory {
    fn create(&self, video_id: &str, events: EngineEventSender) -> Result<Box<dyn PlaybackEngine>> {
        if video_id.trim().is_empty() {
            return Err(DisplayError::EngineInit("no video id".to_string()));
        }
        if self.failing.contains(video_id) {
            return Err(DisplayError::EngineInit(format!(
                "video {} is unavailable",
                video_id
            )));
        }
        Ok(Box::new(SimulatedEngine::new(video_id, events)))
    }
}
