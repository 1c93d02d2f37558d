//! Display controller state machine.
//!
//! ```text
//!            platform ready
//!   Idle ─────────────────────▶ Ready ◀──▶ Playing ◀──▶ Paused
//!    │ displayMedia → pending slot   (engine state events)
//!    │ clearScreen  → empty slot
//! ```
//!
//! The controller owns everything a display mutates: the playback engine,
//! the pause points of the loaded video, the next-pause cursor, the
//! override flag and the pending-media slot. It is driven from a single
//! task (see [`crate::runtime`]) and never blocks: engine state changes,
//! monitor ticks and passage results are fed back in as method calls.

use std::sync::Arc;

use lectern_models::{next_pause_after, ClassConfig, Command, CommandMessage, MediaKind, MediaRef, PausePoint};
use lectern_transport::Deduplicator;
use tokio::sync::{broadcast, mpsc::UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::engine::{EngineEvent, EngineEventSender, EngineFactory, EngineState, PlaybackEngine};
use crate::error::Result;
use crate::event::{DisplayEvent, DisplaySnapshot, Phase, PassageView, Surface};
use crate::passage::Passage;

/// A passage lookup the runtime should perform.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageRequest {
    /// Identifies the request; results for older ids are discarded.
    pub id: u64,
    pub reference: String,
    pub translations: Vec<String>,
}

/// State machine of one display surface.
pub struct DisplayController {
    config: DisplayConfig,
    class: ClassConfig,
    factory: Arc<dyn EngineFactory>,
    engine_tx: UnboundedSender<EngineEvent>,
    engine: Option<Box<dyn PlaybackEngine>>,
    /// Bumped whenever an engine is torn down.
    generation: u64,
    phase: Phase,
    platform_ready: bool,
    surface: Surface,
    current_media: Option<MediaRef>,
    overridden: bool,
    pending_media: Option<MediaRef>,
    pause_points: Vec<PausePoint>,
    next_pause: Option<usize>,
    /// Set by a jump so the following Playing event keeps the jump target.
    anchored: bool,
    monitor_active: bool,
    fullscreen: bool,
    passage_seq: u64,
    passage_request: Option<PassageRequest>,
    dedup: Deduplicator,
    events: broadcast::Sender<DisplayEvent>,
}

impl DisplayController {
    /// Creates a controller in `Idle`.
    ///
    /// Engines report state changes on `engine_tx`; feed them back through
    /// [`DisplayController::on_engine_event`].
    pub fn new(
        config: DisplayConfig,
        class: ClassConfig,
        factory: Arc<dyn EngineFactory>,
        engine_tx: UnboundedSender<EngineEvent>,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            config,
            class,
            factory,
            engine_tx,
            engine: None,
            generation: 0,
            phase: Phase::Idle,
            platform_ready: false,
            surface: Surface::Empty,
            current_media: None,
            overridden: false,
            pending_media: None,
            pause_points: Vec::new(),
            next_pause: None,
            anchored: false,
            monitor_active: false,
            fullscreen: false,
            passage_seq: 0,
            passage_request: None,
            dedup: Deduplicator::default(),
            events,
        }
    }

    /// Subscribes to display events.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<DisplayEvent> {
        self.events.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Index of the next pause point, `None` when no pauses remain.
    pub fn next_pause_index(&self) -> Option<usize> {
        self.next_pause
    }

    /// Whether the pause monitor should be running.
    pub fn monitor_active(&self) -> bool {
        self.monitor_active
    }

    pub fn pending_media(&self) -> Option<&MediaRef> {
        self.pending_media.as_ref()
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn pause_points(&self) -> &[PausePoint] {
        &self.pause_points
    }

    /// Current playback position, when a video is loaded.
    pub fn position(&self) -> Option<f64> {
        self.engine.as_ref().map(|e| e.current_time())
    }

    /// Point-in-time view of the display.
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            phase: self.phase,
            surface: self.surface.clone(),
            current_media: self.current_media.clone(),
            overridden: self.overridden,
            pending_media: self.pending_media.clone(),
            next_pause_index: self.next_pause,
            monitor_active: self.monitor_active,
            fullscreen: self.fullscreen,
            engine_state: self.engine.as_ref().map(|e| e.state()),
            position: self.position(),
        }
    }

    fn emit(&self, event: DisplayEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "display phase");
            self.phase = phase;
            self.emit(DisplayEvent::PhaseChanged { phase });
        }
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// The video platform finished initializing.
    ///
    /// Shows the pending media if a `displayMedia` arrived while idle,
    /// otherwise the class's primary media.
    pub fn on_platform_ready(&mut self) {
        if self.platform_ready {
            return;
        }
        self.platform_ready = true;

        match self.pending_media.take() {
            Some(media) => {
                info!(media = %media.kind, locator = %media.locator, "showing media requested before ready");
                self.show(Some(media), true);
            }
            None => {
                let primary = self.class.primary_media();
                self.show(primary, false);
            }
        }
    }

    /// Stops the monitor and tears down the engine.
    pub fn shutdown(&mut self) {
        self.monitor_active = false;
        self.destroy_engine();
    }

    fn destroy_engine(&mut self) {
        // The monitor must never outlive the engine it polls
        self.monitor_active = false;
        if let Some(engine) = self.engine.take() {
            debug!(video_id = engine.video_id(), generation = self.generation, "destroying engine");
        }
        self.generation += 1;
    }

    fn show(&mut self, media: Option<MediaRef>, overridden: bool) {
        self.destroy_engine();
        self.pause_points.clear();
        self.next_pause = None;
        self.anchored = false;
        self.passage_request = None;
        self.overridden = overridden;

        let Some(media) = media else {
            self.surface = Surface::Empty;
            self.current_media = None;
            self.set_phase(Phase::Ready);
            self.emit(DisplayEvent::MediaChanged {
                media: None,
                overridden,
            });
            return;
        };

        match media.kind {
            MediaKind::Video => self.load_video(&media),
            MediaKind::Verse => {
                self.passage_seq += 1;
                self.passage_request = Some(PassageRequest {
                    id: self.passage_seq,
                    reference: media.locator.clone(),
                    translations: self.config.translations.clone(),
                });
                self.surface = Surface::Verse {
                    reference: media.locator.clone(),
                    view: PassageView::Loading,
                };
                self.set_phase(Phase::Ready);
            }
            MediaKind::Image | MediaKind::Pdf | MediaKind::Audio | MediaKind::Link => {
                self.surface = Surface::Media {
                    media: media.clone(),
                };
                self.set_phase(Phase::Ready);
            }
        }

        info!(media = %media.kind, locator = %media.locator, overridden, "media shown");
        self.current_media = Some(media.clone());
        self.emit(DisplayEvent::MediaChanged {
            media: Some(media),
            overridden,
        });
    }

    fn load_video(&mut self, media: &MediaRef) {
        let events = EngineEventSender::new(self.generation, self.engine_tx.clone());
        match self.create_engine(&media.locator, events) {
            Ok(engine) => {
                self.pause_points = media.pause_points.clone();
                self.pause_points.sort_by(|a, b| a.time.total_cmp(&b.time));
                self.next_pause = next_pause_after(&self.pause_points, engine.current_time());
                self.engine = Some(engine);
                self.surface = Surface::Video {
                    video_id: media.locator.clone(),
                };
            }
            Err(e) => {
                warn!(video_id = %media.locator, error = %e, "failed to construct playback engine");
                let message = e.to_string();
                self.surface = Surface::Error {
                    message: message.clone(),
                };
                self.emit(DisplayEvent::EngineFailed { message });
            }
        }
        self.set_phase(Phase::Ready);
    }

    fn create_engine(&self, video_id: &str, events: EngineEventSender) -> Result<Box<dyn PlaybackEngine>> {
        debug!(video_id, generation = events.generation(), "constructing engine");
        self.factory.create(video_id, events)
    }

    // ---------------------------------------------------------------
    // Engine and monitor
    // ---------------------------------------------------------------

    /// Applies a state change reported by an engine.
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        if event.generation != self.generation || self.engine.is_none() {
            debug!(generation = event.generation, current = self.generation, "ignoring stale engine event");
            return;
        }

        match event.state {
            EngineState::Playing => {
                if self.anchored {
                    self.anchored = false;
                } else {
                    self.reset_next_pause();
                }
                self.monitor_active = true;
                self.set_phase(Phase::Playing);
            }
            other => {
                self.monitor_active = false;
                match other {
                    EngineState::Paused | EngineState::Ended => self.set_phase(Phase::Paused),
                    EngineState::Unstarted => self.set_phase(Phase::Ready),
                    _ => {}
                }
            }
        }
    }

    /// One monitor tick. Pauses playback when the next pause point has
    /// been reached and advances the cursor by exactly one.
    ///
    /// Returns true if playback was paused.
    pub fn check_for_pause(&mut self) -> bool {
        if !self.monitor_active {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        let Some(index) = self.next_pause.filter(|i| *i < self.pause_points.len()) else {
            return false;
        };

        let current = engine.current_time();
        let target = &self.pause_points[index];
        if current < target.time || engine.state() != EngineState::Playing {
            return false;
        }

        engine.pause();
        let label = target.label.clone();
        self.next_pause = (index + 1 < self.pause_points.len()).then_some(index + 1);
        info!(index, label = %label, position = current, "reached pause point");
        self.emit(DisplayEvent::PauseReached { index, label });
        true
    }

    fn reset_next_pause(&mut self) {
        if let Some(engine) = &self.engine {
            self.next_pause = next_pause_after(&self.pause_points, engine.current_time());
        }
    }

    // ---------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------

    /// Applies an inbound command. Replayed instances are ignored.
    pub fn handle_message(&mut self, message: &CommandMessage) {
        if !self.dedup.first_sighting(message) {
            debug!(command = message.command.name(), sent_at = message.sent_at, "ignoring replayed command");
            return;
        }
        debug!(command = message.command.name(), phase = ?self.phase, "received command");
        self.apply(&message.command);
    }

    fn apply(&mut self, command: &Command) {
        match command {
            Command::Toggle => self.toggle(),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Restart => self.restart(),
            Command::NextPause => self.skip_to_next_pause(),
            Command::JumpToPause { index } => self.jump_to_pause(*index),
            Command::Fullscreen => self.toggle_fullscreen(),
            Command::DisplayMedia { media } => self.display_media(media.clone()),
            Command::ClearScreen => self.clear_screen(),
            Command::VerseNext => self.turn_page(1),
            Command::VersePrevious => self.turn_page(-1),
        }
    }

    fn engine_or_log(&mut self, command: &str) -> Option<&mut Box<dyn PlaybackEngine>> {
        if self.engine.is_none() {
            debug!(command, phase = ?self.phase, "no playback engine, ignoring");
        }
        self.engine.as_mut()
    }

    fn toggle(&mut self) {
        let Some(engine) = self.engine_or_log("toggle") else {
            return;
        };
        if engine.state() == EngineState::Playing {
            engine.pause();
        } else {
            engine.play();
        }
    }

    fn play(&mut self) {
        let Some(engine) = self.engine_or_log("play") else {
            return;
        };
        if engine.state() == EngineState::Playing {
            debug!("already playing");
            return;
        }
        engine.play();
    }

    fn pause(&mut self) {
        let Some(engine) = self.engine_or_log("pause") else {
            return;
        };
        if engine.state() != EngineState::Playing {
            debug!("already paused");
            return;
        }
        engine.pause();
    }

    fn restart(&mut self) {
        let Some(engine) = self.engine_or_log("restart") else {
            return;
        };
        engine.seek(0.0);
        engine.play();
        self.anchored = false;
        self.reset_next_pause();
    }

    fn skip_to_next_pause(&mut self) {
        match self.next_pause.filter(|i| *i < self.pause_points.len()) {
            Some(index) => self.jump_to(index),
            None => debug!("no more pauses ahead"),
        }
    }

    fn jump_to_pause(&mut self, index: i64) {
        if self.pause_points.is_empty() {
            debug!(index, "no pause points, ignoring jump");
            return;
        }
        let last = self.pause_points.len() - 1;
        let clamped = if index < 0 {
            0
        } else {
            usize::try_from(index).map_or(last, |i| i.min(last))
        };
        self.jump_to(clamped);
    }

    fn jump_to(&mut self, index: usize) {
        let lead_in = self.config.seek_lead_in;
        let Some(target) = self.pause_points.get(index).map(|p| p.time) else {
            return;
        };
        let Some(engine) = self.engine_or_log("jumpToPause") else {
            return;
        };

        engine.seek((target - lead_in).max(0.0));
        let was_playing = engine.state() == EngineState::Playing;
        engine.play();

        self.next_pause = Some(index);
        // A Playing event follows only when playback was stopped
        self.anchored = !was_playing;
        debug!(index, target, "jumped to pause point");
    }

    fn toggle_fullscreen(&mut self) {
        if self.config.embedded_preview {
            debug!("embedded preview, ignoring fullscreen");
            return;
        }
        self.fullscreen = !self.fullscreen;
        self.emit(DisplayEvent::FullscreenChanged {
            active: self.fullscreen,
        });
    }

    fn display_media(&mut self, media: MediaRef) {
        if !self.platform_ready {
            debug!(media = %media.kind, "platform not ready, holding media");
            self.pending_media = Some(media);
            return;
        }
        self.show(Some(media), true);
    }

    fn clear_screen(&mut self) {
        if !self.platform_ready {
            if self.pending_media.take().is_some() {
                debug!("discarded pending media");
            }
            return;
        }
        if !self.overridden {
            debug!("primary media already shown");
            return;
        }
        let primary = self.class.primary_media();
        self.show(primary, false);
    }

    fn turn_page(&mut self, delta: isize) {
        let per_page = self.config.verse_lines_per_page;
        let Surface::Verse {
            view: PassageView::Loaded { passage, page },
            ..
        } = &mut self.surface
        else {
            debug!("no passage shown, ignoring page turn");
            return;
        };

        let last = passage.page_count(per_page) - 1;
        let next = page.saturating_add_signed(delta).min(last);
        if next == *page {
            return;
        }
        *page = next;
        let view = PassageView::Loaded {
            passage: passage.clone(),
            page: next,
        };
        self.emit(DisplayEvent::PassageChanged { view });
    }

    // ---------------------------------------------------------------
    // Passages
    // ---------------------------------------------------------------

    /// Takes the outstanding passage lookup, if any.
    pub fn take_passage_request(&mut self) -> Option<PassageRequest> {
        self.passage_request.take()
    }

    /// Applies a finished passage lookup.
    ///
    /// Results for anything but the passage currently shown are discarded.
    pub fn passage_loaded(&mut self, request_id: u64, result: Result<Option<Passage>>) {
        if request_id != self.passage_seq {
            debug!(request_id, current = self.passage_seq, "discarding stale passage");
            return;
        }
        let Surface::Verse { reference, view } = &mut self.surface else {
            return;
        };

        *view = match result {
            Ok(Some(passage)) => PassageView::Loaded { passage, page: 0 },
            Ok(None) => {
                warn!(reference = %reference, "passage not found");
                PassageView::Failed
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "passage lookup failed");
                PassageView::Failed
            }
        };
        let view = view.clone();
        self.emit(DisplayEvent::PassageChanged { view });
    }
}
