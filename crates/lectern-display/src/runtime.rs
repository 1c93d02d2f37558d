//! Display runtime: one task owning a [`DisplayController`].

use std::sync::Arc;

use lectern_models::ClassConfig;
use lectern_transport::ChannelTransport;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::controller::{DisplayController, PassageRequest};
use crate::engine::EngineFactory;
use crate::error::{DisplayError, Result};
use crate::event::{DisplayEvent, DisplaySnapshot};
use crate::monitor::PauseMonitor;
use crate::passage::{Passage, PassageLookup};

type PassageResult = (u64, Result<Option<Passage>>);

/// Wires a controller to its transport, engine and passage service.
pub struct DisplayRuntime {
    config: DisplayConfig,
    class: ClassConfig,
    transport: Arc<dyn ChannelTransport>,
    factory: Arc<dyn EngineFactory>,
    lookup: Arc<dyn PassageLookup>,
}

impl DisplayRuntime {
    pub fn new(
        config: DisplayConfig,
        class: ClassConfig,
        transport: Arc<dyn ChannelTransport>,
        factory: Arc<dyn EngineFactory>,
        lookup: Arc<dyn PassageLookup>,
    ) -> Self {
        Self {
            config,
            class,
            transport,
            factory,
            lookup,
        }
    }

    /// Subscribes to the class channel and spawns the display loop.
    ///
    /// The display stays `Idle` until [`DisplayHandle::platform_ready`].
    pub fn start(self) -> DisplayHandle {
        let channel = self.class.channel_key.clone();
        let subscription = self.transport.subscribe(&channel);

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let controller = DisplayController::new(
            self.config.clone(),
            self.class,
            self.factory,
            engine_tx,
        );
        let events = controller.event_sender();

        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let (ready_tx, ready_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(channel = %channel, transport = %self.transport.kind(), "starting display");

        let display_loop = DisplayLoop {
            controller,
            subscription,
            engine_rx,
            monitor: PauseMonitor::new(self.config.poll_interval),
            lookup: self.lookup,
            snapshot_tx,
            ready_rx,
            shutdown_rx,
        };
        let task = tokio::spawn(display_loop.run());

        DisplayHandle {
            ready_tx,
            snapshot_rx,
            events,
            shutdown_tx,
            task: Some(task),
        }
    }
}

struct DisplayLoop {
    controller: DisplayController,
    subscription: lectern_transport::Subscription,
    engine_rx: mpsc::UnboundedReceiver<crate::engine::EngineEvent>,
    monitor: PauseMonitor,
    lookup: Arc<dyn PassageLookup>,
    snapshot_tx: watch::Sender<DisplaySnapshot>,
    ready_rx: watch::Receiver<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DisplayLoop {
    async fn run(mut self) {
        let (passage_tx, mut passage_rx) = mpsc::unbounded_channel::<PassageResult>();
        let mut subscribed = true;
        let mut ready_seen = false;

        loop {
            tokio::select! {
                message = self.subscription.recv(), if subscribed => match message {
                    Some(message) => self.controller.handle_message(&message),
                    None => {
                        warn!("transport closed, no more commands");
                        subscribed = false;
                    }
                },
                Some(event) = self.engine_rx.recv() => {
                    self.controller.on_engine_event(event);
                }
                _ = self.monitor.tick() => {
                    self.controller.check_for_pause();
                }
                Some((id, result)) = passage_rx.recv() => {
                    self.controller.passage_loaded(id, result);
                }
                changed = self.ready_rx.changed(), if !ready_seen => {
                    if changed.is_err() {
                        ready_seen = true;
                    } else if *self.ready_rx.borrow() {
                        ready_seen = true;
                        self.controller.on_platform_ready();
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        debug!("display received shutdown signal");
                        break;
                    }
                }
            }

            self.monitor.sync(self.controller.monitor_active());
            if let Some(request) = self.controller.take_passage_request() {
                self.spawn_lookup(request, passage_tx.clone());
            }
            self.snapshot_tx.send_replace(self.controller.snapshot());
        }

        // Stop before destroy
        self.monitor.stop();
        self.controller.shutdown();
        self.snapshot_tx.send_replace(self.controller.snapshot());
        debug!("display loop stopped");
    }

    fn spawn_lookup(&self, request: PassageRequest, results: mpsc::UnboundedSender<PassageResult>) {
        let lookup = Arc::clone(&self.lookup);
        debug!(reference = %request.reference, id = request.id, "looking up passage");
        tokio::spawn(async move {
            let result = lookup
                .passage_text(&request.reference, &request.translations)
                .await;
            let _ = results.send((request.id, result));
        });
    }
}

/// Handle to a running display.
pub struct DisplayHandle {
    ready_tx: watch::Sender<bool>,
    snapshot_rx: watch::Receiver<DisplaySnapshot>,
    events: broadcast::Sender<DisplayEvent>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl DisplayHandle {
    /// Signals that the video platform has initialized.
    pub fn platform_ready(&self) {
        self.ready_tx.send_replace(true);
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver observing every snapshot update.
    pub fn watch(&self) -> watch::Receiver<DisplaySnapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribes to display events.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.events.subscribe()
    }

    /// Whether the display loop is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the display loop and waits for it to finish.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("shutting down display");
        self.shutdown_tx.send_replace(true);

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| DisplayError::Shutdown(format!("display task panicked: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown_tx.send_replace(true);
        }
    }
}
