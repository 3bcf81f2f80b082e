//! procwatch API server entry point

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use procwatch_api::ApiServer;
use procwatch_config::{ConfigManager, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "procwatch-api", version, about = "Process monitoring and alerting API")]
struct Cli {
    /// Config file; defaults to the per-user procwatch/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", ConfigManager::render_default()?);
        return Ok(());
    }

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = manager
        .load()
        .with_context(|| format!("loading configuration from {}", manager.config_path().display()))?;

    init_tracing(&config.logging);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        completion_delay_ms = config.execution.completion_delay_ms,
        "Starting procwatch API"
    );

    ApiServer::new(config).run().await.context("serving HTTP")?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
