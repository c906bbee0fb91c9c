//! peaksched command-line entry point.
//!
//! Intended to run from cron every few minutes. Each run assembles the
//! weekly program for the current instant and only contacts the thermostat
//! when the schedule actually needs to change.
//!
//! # Usage
//!
//! ```bash
//! # Report what would change without touching the device
//! peaksched --dry-run --verbose
//!
//! # Normal cron invocation
//! peaksched --config /etc/peaksched/config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info; `--verbose` forces debug)

use std::env;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use peaksched::app;

/// Assemble and upload the thermostat program for the current week.
#[derive(Debug, Parser)]
#[command(name = "peaksched", version, about)]
struct Cli {
    /// Config file location; defaults to ./peaksched.toml, then
    /// ~/.config/peaksched/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Peak-event cache file location.
    #[arg(long)]
    events_cache: Option<PathBuf>,

    /// Compute and report program changes without modifying the device.
    #[arg(long)]
    dry_run: bool,

    /// Print verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        env::var("RUST_LOG")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::INFO)
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    app::run(app::Options {
        config: cli.config,
        events_cache: cli.events_cache,
        dry_run: cli.dry_run,
    })
    .await
}
