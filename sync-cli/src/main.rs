//! # kiosk-sync
//!
//! Command-line front end for the kiosk session sync engine. Useful for
//! commissioning a terminal and for poking a controller by hand.
//!
//! ## Commands
//!
//! - `status`: Fetch and print the current session
//! - `watch`: Follow notices and the session live
//! - `select`, `start`, `pause`, `finish`: Drive a program
//! - `credit`, `decline`: Settle the remaining balance
//!
//! ## Example
//!
//! ```bash
//! # One-off status
//! kiosk-sync --api http://10.0.0.5:8000 --push 10.0.0.5:8000 status
//!
//! # Endpoints from a file, with debug logs
//! RUST_LOG=kiosk_sync_client=debug kiosk-sync --config kiosk.toml watch
//!
//! # Start program 2
//! kiosk-sync --config kiosk.toml select 2
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::action::{self, Action};
use commands::{status, watch};

/// Command-line front end for the kiosk session sync engine.
#[derive(Parser, Debug)]
#[command(name = "kiosk-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Controller REST base URL (overrides config and KIOSK_CONTROLLER_API)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Controller push address, host:port or ws:// URL
    #[arg(long, global = true)]
    push: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and print the current session
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow notices and the session until Ctrl-C
    Watch {
        /// Seconds between snapshot prints
        #[arg(long, default_value = "5")]
        every: u64,

        /// Periodic resync interval in seconds (0 disables)
        #[arg(long)]
        poll: Option<u64>,
    },

    /// Select (and start) a program
    Select {
        /// Program id from the catalog
        program: String,
    },

    /// Start the selected program
    Start,

    /// Pause the running program
    Pause,

    /// Finish the session
    Finish,

    /// Credit the remaining balance to a loyalty card
    Credit {
        /// Loyalty card id
        card: String,
    },

    /// Decline the loyalty credit
    Decline,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut overrides = config::Overrides {
        api_base_url: cli.api,
        push_address: cli.push,
        poll_interval_secs: None,
    };
    if let Commands::Watch { poll, .. } = &cli.command {
        overrides.poll_interval_secs = *poll;
    }
    let engine_config = config::resolve(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Status { json } => status::run(engine_config, json).await?,
        Commands::Watch { every, .. } => {
            watch::run(engine_config, Duration::from_secs(every.max(1))).await?
        }
        Commands::Select { program } => action::run(engine_config, Action::Select(program)).await?,
        Commands::Start => action::run(engine_config, Action::Start).await?,
        Commands::Pause => action::run(engine_config, Action::Pause).await?,
        Commands::Finish => action::run(engine_config, Action::Finish).await?,
        Commands::Credit { card } => action::run(engine_config, Action::Credit(card)).await?,
        Commands::Decline => action::run(engine_config, Action::Decline).await?,
    }

    Ok(())
}
