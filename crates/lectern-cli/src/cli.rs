//! Command-line interface definition using clap.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Version with git revision and build date, e.g. `0.3.0 (abc1234, 2026-01-29)`.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("LECTERN_GIT_HASH");
    const BUILD_DATE: &str = env!("LECTERN_BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// Lectern - remote control for class videos, outlines and passages
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the class document (default: <state-dir>/classes.json)
    #[arg(long, env = "LECTERN_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Path to state directory
    #[arg(short, long, env = "LECTERN_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved configuration of a class
    Resolve {
        /// Class number or id
        class: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show outline sections, pause points and media of a class
    Outline {
        /// Class number or id
        class: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Send a remote-control command to a class's displays
    Send {
        /// Class number or id
        class: String,

        #[command(subcommand)]
        action: SendAction,
    },

    /// Run a headless display that follows a class channel
    Display {
        /// Class number or id
        class: String,

        /// Pause-monitor period in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,

        /// Check for commands from other processes every N milliseconds
        #[arg(long, default_value_t = 200)]
        watch_ms: u64,

        /// Passage translations to try, in order
        #[arg(long, value_delimiter = ',', default_value = "web,kjv")]
        translations: Vec<String>,

        /// Never contact the passage service
        #[arg(long)]
        offline: bool,
    },

    /// Run the HTTP hub
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = lectern_api::config::DEFAULT_PORT)]
        port: u16,

        /// Allowed CORS origin (repeatable; default any)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Manage local presenter notes
    Notes {
        /// Class number or id
        class: String,

        #[command(subcommand)]
        action: NotesAction,
    },
}

/// Commands a presenter can send.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SendAction {
    /// Play or pause
    Toggle,
    Play,
    Pause,
    /// Restart the primary video
    Restart,
    /// Seek to the next pause point
    NextPause,
    /// Seek to a pause point by index
    Jump {
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// Toggle presentation mode
    Fullscreen,
    /// Show a media gallery entry by index
    Media { index: usize },
    /// Show a scripture passage
    Verse { reference: String },
    /// Return to the primary media
    Clear,
    /// Next passage page
    VerseNext,
    /// Previous passage page
    VersePrevious,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum NotesAction {
    /// Print saved notes and answers
    Show,
    /// Write the notes file
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a notes file or rich-text notes
    Import {
        /// File to import
        file: PathBuf,
    },
}

/// Output format for lookup commands
#[derive(Debug, Clone, Copy, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Expands `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

impl Cli {
    /// Returns the state directory path, using default if not specified.
    pub fn state_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => expand_path(dir),
            None => dirs::home_dir()
                .map(|h| h.join(".lectern"))
                .unwrap_or_else(|| PathBuf::from(".lectern")),
        }
    }

    /// Returns the class document path.
    pub fn data_path(&self) -> PathBuf {
        match &self.data {
            Some(path) => expand_path(path),
            None => self.state_dir().join("classes.json"),
        }
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
