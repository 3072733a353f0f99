//! cfgroll - version-folder roll-forward tool.
//!
//! Clones the latest version folder of every configured server under a new
//! version name and rewrites environment-specific values in the clone's
//! `.ini` files.
//!
//! Usage:
//! - Interactive: `cfgroll` (prompts for the new version and environment)
//! - Non-interactive: `cfgroll --release 3.8.0 --env A`
//! - Preview only: `cfgroll --release 3.8.0 --env A --dry-run`

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// cfgroll - roll a new configuration version folder across a server fleet
#[derive(Parser, Debug)]
#[command(name = "cfgroll")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the servers manifest
    #[arg(long, default_value = "servers.json")]
    servers: PathBuf,

    /// Path to the environment rules file
    #[arg(long, default_value = "environment.json")]
    rules: PathBuf,

    /// New version name (prompted for when omitted)
    #[arg(long)]
    release: Option<String>,

    /// Environment label (prompted for when omitted; uppercased)
    #[arg(long)]
    env: Option<String>,

    /// Resolve and report without cloning or rewriting anything
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    commands::roll::run(
        &cli.servers,
        &cli.rules,
        cli.release.as_deref(),
        cli.env.as_deref(),
        cli.dry_run,
    )
}
