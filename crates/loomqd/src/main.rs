//! `loomqd` -- the loomq message broker daemon.
//!
//! Loads the broker configuration, starts the configured plugin set, and
//! runs until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use loomq_broker::{PluginRegistry, Server};
use loomq_types::config::BrokerConfig;

/// loomq message broker daemon.
#[derive(Parser)]
#[command(name = "loomqd", about = "loomq message broker daemon", version)]
struct Cli {
    /// Config file path. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match &cli.config {
        Some(path) => BrokerConfig::load(path)?,
        None => BrokerConfig::default(),
    };
    let config = Arc::new(config);

    let server = Server::new(&config);
    server
        .init_plugins(&PluginRegistry::builtin(), &config)
        .await?;
    info!(plugins = ?server.plugin_names(), "broker up");

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");
    server.shutdown().await;

    Ok(())
}
