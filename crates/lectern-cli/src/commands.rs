//! Command handlers for CLI subcommands.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lectern_models::{format_time, ClassConfig, Command, MediaRef, SurfaceId};
use lectern_persistence::{ConfigResolver, FileConfigSource, NotesImport, NotesStore};
use lectern_presenter::{MediaAction, PresenterController, NO_PAUSES_MESSAGE};
use lectern_transport::{select_transport, ChannelTransport, FileStore, TransportCapabilities};
use tracing::info;

use crate::cli::{expand_path, Cli, Commands, NotesAction, OutputFormat, SendAction};
use crate::error::{CliError, Result};
use crate::session;

/// Paths every command works from.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub state_dir: PathBuf,
    pub data_path: PathBuf,
}

impl Workspace {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            state_dir: cli.state_dir(),
            data_path: cli.data_path(),
        }
    }

    /// Directory shared by every process on this machine for commands.
    pub fn channels_dir(&self) -> PathBuf {
        self.state_dir.join("channels")
    }

    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(FileConfigSource::new(&self.data_path))
    }

    pub fn class(&self, class_id: &str) -> ClassConfig {
        self.resolver().resolve(class_id)
    }

    pub fn notes(&self) -> NotesStore {
        NotesStore::new(&self.state_dir)
    }

    /// Transport selected from what a CLI process has: the shared channel
    /// directory as its storage fallback.
    pub fn storage_transport(&self) -> Result<(Arc<FileStore>, Arc<dyn ChannelTransport>)> {
        let store = FileStore::open(self.channels_dir())?;
        let capabilities = TransportCapabilities::new().with_storage(store.clone());
        let transport = select_transport(&capabilities, SurfaceId::new());
        Ok((store, transport))
    }
}

/// Execute a CLI command.
pub fn execute(command: Commands, workspace: &Workspace, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Resolve { class, format } => cmd_resolve(workspace, &class, format, out),
        Commands::Outline { class, format } => cmd_outline(workspace, &class, format, out),
        Commands::Send { class, action } => cmd_send(workspace, &class, action, out),
        Commands::Display {
            class,
            poll_ms,
            watch_ms,
            translations,
            offline,
        } => session::run_display(
            workspace,
            session::DisplayOptions {
                class,
                poll_ms,
                watch_ms,
                translations,
                offline,
            },
        ),
        Commands::Serve {
            host,
            port,
            cors_origins,
        } => session::run_hub(workspace, host, port, cors_origins),
        Commands::Notes { class, action } => cmd_notes(workspace, &class, action, out),
    }
}

fn cmd_resolve(
    workspace: &Workspace,
    class_id: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let class = workspace.class(class_id);

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&class)?)?;
        }
        OutputFormat::Text => {
            let title = if class.title.is_empty() {
                "(untitled)"
            } else {
                class.title.as_str()
            };
            writeln!(out, "Class {}: {}", class.class_id, title)?;
            writeln!(out, "  Channel: {}", class.channel_key)?;
            if class.has_video() {
                writeln!(out, "  Video: {}", class.video_id)?;
            } else {
                writeln!(out, "  Video: none")?;
            }
            writeln!(out, "  Pause points: {}", class.pause_points.len())?;
            writeln!(out, "  Outline sections: {}", class.outline.len())?;
            writeln!(out, "  Media: {}", class.media.len())?;
        }
    }
    Ok(())
}

fn cmd_outline(
    workspace: &Workspace,
    class_id: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let class = workspace.class(class_id);
    let presenter = PresenterController::new(class, Arc::new(lectern_transport::NullTransport::new()));

    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "pauses": presenter.pause_list(),
            "outline": presenter.outline(),
            "media": presenter.media(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    writeln!(out, "Pauses:")?;
    let pauses = presenter.pause_list();
    if pauses.is_empty() {
        writeln!(out, "  {}", NO_PAUSES_MESSAGE)?;
    }
    for pause in &pauses {
        writeln!(out, "  [{}] {:>6}  {}", pause.index, pause.time_label, pause.label)?;
    }

    writeln!(out, "\nOutline:")?;
    for section in presenter.outline() {
        match &section.jump {
            Some(jump) => writeln!(
                out,
                "  {}  (jump {} \u{00b7} {})",
                section.summary, jump.index, jump.time_label
            )?,
            None => writeln!(out, "  {}", section.summary)?,
        }
    }

    let media = presenter.media();
    if !media.is_empty() {
        writeln!(out, "\nMedia:")?;
        for entry in &media {
            let origin = entry
                .section_title
                .as_deref()
                .map(|title| format!(" [{}]", title))
                .unwrap_or_default();
            writeln!(
                out,
                "  [{}] {} ({}){}",
                entry.index,
                entry.display_title(),
                entry.item.kind,
                origin
            )?;
        }
    }
    Ok(())
}

/// Maps a CLI action onto a wire command. Media entries are resolved by
/// the presenter instead.
pub fn command_for(action: &SendAction) -> Option<Command> {
    let command = match action {
        SendAction::Toggle => Command::Toggle,
        SendAction::Play => Command::Play,
        SendAction::Pause => Command::Pause,
        SendAction::Restart => Command::Restart,
        SendAction::NextPause => Command::NextPause,
        SendAction::Jump { index } => Command::JumpToPause { index: *index },
        SendAction::Fullscreen => Command::Fullscreen,
        SendAction::Verse { reference } => Command::DisplayMedia {
            media: MediaRef::verse(reference.trim()),
        },
        SendAction::Clear => Command::ClearScreen,
        SendAction::VerseNext => Command::VerseNext,
        SendAction::VersePrevious => Command::VersePrevious,
        SendAction::Media { .. } => return None,
    };
    Some(command)
}

fn cmd_send(
    workspace: &Workspace,
    class_id: &str,
    action: SendAction,
    out: &mut dyn Write,
) -> Result<()> {
    let class = workspace.class(class_id);
    let (_store, transport) = workspace.storage_transport()?;
    let mut presenter = PresenterController::new(class, transport);

    match (&action, command_for(&action)) {
        (_, Some(command)) => {
            let message = presenter.send(command);
            info!(
                class_id,
                command = message.command.name(),
                sent_at = message.sent_at,
                "sent"
            );
        }
        (SendAction::Media { index }, None) => match presenter.show_media(*index)? {
            MediaAction::Sent(_) => {}
            MediaAction::OpenLocally(url) => writeln!(out, "Open locally: {}", url)?,
        },
        (_, None) => {}
    }

    writeln!(out, "{}", presenter.status())?;
    Ok(())
}

fn cmd_notes(
    workspace: &Workspace,
    class_id: &str,
    action: NotesAction,
    out: &mut dyn Write,
) -> Result<()> {
    let class = workspace.class(class_id);
    let mut presenter =
        PresenterController::new(class, Arc::new(lectern_transport::NullTransport::new()))
            .with_notes(workspace.notes());

    match action {
        NotesAction::Show => {
            let notes = presenter.notes()?;
            if notes.notes_html.is_empty() && notes.questions.is_empty() {
                writeln!(out, "No notes saved for class {}.", class_id)?;
                return Ok(());
            }
            writeln!(out, "{}", notes.notes_html)?;
            for (key, answer) in &notes.questions {
                writeln!(out, "  {}: {}", key, answer)?;
            }
        }
        NotesAction::Export { output } => {
            let file = presenter.export_notes()?;
            let json = serde_json::to_string_pretty(&file)?;
            match output {
                Some(path) => {
                    let path = expand_path(&path);
                    fs::write(&path, json)?;
                    writeln!(out, "Wrote {}", path.display())?;
                }
                None => writeln!(out, "{}", json)?,
            }
        }
        NotesAction::Import { file } => {
            let path = expand_path(&file);
            let contents = read_existing(&path)?;
            let kind = presenter.import_notes(&contents)?;
            if kind == NotesImport::RichText {
                info!(path = %path.display(), "imported file as rich-text notes");
            }
            writeln!(out, "{}", presenter.status())?;
        }
    }
    Ok(())
}

fn read_existing(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::MissingFile(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Formats a playback position for status lines.
pub(crate) fn position_label(position: Option<f64>) -> String {
    position.map(format_time).unwrap_or_else(|| "-".to_string())
}
