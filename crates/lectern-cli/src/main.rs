//! Lectern CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lectern_cli::cli::Cli;
use lectern_cli::{execute, Workspace};

fn main() {
    // Load .env.local if it exists (LECTERN_DATA, LECTERN_STATE_DIR, RUST_LOG)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt().with_env_filter(filter).with_target(false).init();

    let workspace = Workspace::from_cli(&cli);
    let mut stdout = std::io::stdout();

    if let Err(e) = execute(cli.command, &workspace, &mut stdout) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
