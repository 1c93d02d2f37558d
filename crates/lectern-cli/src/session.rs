//! Long-running commands: the headless display and the HTTP hub.

use std::sync::Arc;
use std::time::Duration;

use lectern_api::{serve_with_shutdown, ApiConfig, AppState, CorsPolicy};
use lectern_display::{
    DisplayConfig, DisplayEvent, DisplayRuntime, HttpPassageLookup, PassageLookup, PassageView,
    SimulatedEngineFactory, StaticPassageLookup,
};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::commands::{position_label, Workspace};
use crate::error::Result;

/// Options for `lectern display`.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub class: String,
    pub poll_ms: u64,
    pub watch_ms: u64,
    pub translations: Vec<String>,
    pub offline: bool,
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Runs a display following the class channel until Ctrl-C.
pub fn run_display(workspace: &Workspace, options: DisplayOptions) -> Result<()> {
    runtime()?.block_on(display_session(workspace.clone(), options))
}

async fn display_session(workspace: Workspace, options: DisplayOptions) -> Result<()> {
    let class = workspace.class(&options.class);
    let (store, transport) = workspace.storage_transport()?;

    let config = DisplayConfig::default()
        .with_poll_interval(Duration::from_millis(options.poll_ms.max(10)))
        .with_translations(options.translations.clone());
    let per_page = config.verse_lines_per_page;
    let lookup: Arc<dyn PassageLookup> = if options.offline {
        Arc::new(StaticPassageLookup::new())
    } else {
        Arc::new(HttpPassageLookup::new()?)
    };

    println!(
        "Display for class {} on {} ({})",
        class.class_id,
        class.channel_key,
        workspace.channels_dir().display()
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let watcher = store.spawn_watcher(Duration::from_millis(options.watch_ms.max(10)), stop_rx);

    let mut handle = DisplayRuntime::new(
        config,
        class,
        transport,
        Arc::new(SimulatedEngineFactory::new()),
        lookup,
    )
    .start();
    let mut events = handle.subscribe();
    handle.platform_ready();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event, handle.snapshot().position, per_page),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "display events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for ctrl-c");
                }
                break;
            }
        }
    }

    info!("stopping display");
    handle.shutdown().await?;
    stop_tx.send_replace(true);
    if let Err(e) = watcher.await {
        warn!(error = %e, "file store watcher ended abnormally");
    }
    Ok(())
}

fn print_event(event: &DisplayEvent, position: Option<f64>, per_page: usize) {
    let at = position_label(position);
    match event {
        DisplayEvent::PhaseChanged { phase } => println!("[{}] phase: {:?}", at, phase),
        DisplayEvent::PauseReached { index, label } => {
            println!("[{}] paused at #{}: {}", at, index, label)
        }
        DisplayEvent::MediaChanged { media, overridden } => match media {
            Some(media) if *overridden => println!(
                "[{}] showing {} {}",
                at,
                media.kind.as_str(),
                media.display_title()
            ),
            Some(media) => println!("[{}] primary {}", at, media.display_title()),
            None => println!("[{}] nothing to show", at),
        },
        DisplayEvent::FullscreenChanged { active } => {
            println!("[{}] fullscreen {}", at, if *active { "on" } else { "off" })
        }
        DisplayEvent::EngineFailed { message } => eprintln!("[{}] player error: {}", at, message),
        DisplayEvent::PassageChanged { view } => match view {
            PassageView::Loading => println!("[{}] loading passage...", at),
            PassageView::Loaded { passage, page } => {
                println!(
                    "[{}] {} ({}) page {}/{}",
                    at,
                    passage.title,
                    passage.source_label,
                    page + 1,
                    passage.page_count(per_page)
                );
                for line in passage.page(*page, per_page) {
                    println!("    {}", line);
                }
            }
            PassageView::Failed => println!("[{}] Unable to load passage", at),
        },
    }
}

/// Runs the HTTP hub until Ctrl-C.
pub fn run_hub(
    workspace: &Workspace,
    host: String,
    port: u16,
    cors_origins: Vec<String>,
) -> Result<()> {
    let config = ApiConfig::new(host, port).with_cors(CorsPolicy::from_origins(cors_origins));
    runtime()?.block_on(hub_session(workspace.clone(), config))
}

async fn hub_session(workspace: Workspace, config: ApiConfig) -> Result<()> {
    let (_store, transport) = workspace.storage_transport()?;
    let state = AppState::new(config, workspace.resolver(), transport);

    println!(
        "Serving {} on http://{}",
        workspace.data_path.display(),
        state.config.bind_address()
    );
    serve_with_shutdown(state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    })
    .await?;
    Ok(())
}
