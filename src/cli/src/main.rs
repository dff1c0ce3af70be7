//! Permgraph CLI
//!
//! Inspect and edit a permission dependency graph stored as a JSON snapshot:
//! - closure views and dependency paths
//! - guarded edge additions and removals
//! - convention-based dependency suggestions
//! - cycle sweeps and topological order
//! - authorization checks with grant paths

use anyhow::{Context, Result};
use clap::Parser;
use permgraph_authz::PermissionService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

mod commands;
mod config;
mod store;

use commands::Command;
use config::CliConfig;
use store::JsonFileStore;

/// Permgraph CLI
#[derive(Parser)]
#[command(name = "permgraph")]
#[command(about = "Permission dependency graph and authorization resolver")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "permgraph.toml", env = "PERMGRAPH_CONFIG")]
    config: PathBuf,

    /// Snapshot file (overrides config)
    #[arg(short, long, env = "PERMGRAPH_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load_or_default(&cli.config)?;
    if let Some(snapshot) = cli.snapshot {
        config.snapshot.path = snapshot;
    }
    config.validate()?;

    // Initialize logging; stdout is reserved for JSON output
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_ascii_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(config.logging.with_target)
        .with_writer(std::io::stderr)
        .init();

    debug!("Loaded configuration from {:?}", cli.config);

    let mut store = JsonFileStore::new(&config.snapshot.path);
    if !config.snapshot.pretty {
        store = store.compact();
    }
    info!(snapshot = ?store.path(), "Using permission snapshot");
    let store = Arc::new(store);
    let service = PermissionService::with_config(store.clone(), store, config.engine.clone())
        .context("Invalid engine configuration")?;

    let report = commands::execute(cli.command, &service).await?;

    let output = if cli.compact {
        serde_json::to_string(&report.body)
    } else {
        serde_json::to_string_pretty(&report.body)
    }
    .context("Failed to encode output")?;
    println!("{}", output);

    if report.failed {
        std::process::exit(1);
    }
    Ok(())
}
