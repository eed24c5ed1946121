//! # roomsync
//!
//! CLI tool for simulating roomsync classroom sessions.
//!
//! ## Commands
//!
//! - `simulate`: Replay a scripted lesson across in-process clients and
//!   print every participant's final view
//!
//! ## Example
//!
//! ```bash
//! roomsync simulate --config lesson.toml
//!
//! # With debug logging
//! roomsync --verbose simulate --config lesson.toml
//! RUST_LOG=roomsync_client=debug roomsync simulate --config lesson.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod scenario;

use commands::simulate;

/// CLI tool for simulating roomsync classroom sessions.
#[derive(Parser, Debug)]
#[command(name = "roomsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scripted lesson
    Simulate {
        /// Scenario file
        #[arg(long, short, default_value = "scenario.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Simulate { config } => {
            simulate::run(&config).await?;
        }
    }

    Ok(())
}
