//! wardbuddy - clinical rotation and SMART goal tracker

use clap::Parser;
use tracing::warn;
use wardbuddy::cli::{self, Cli};
use wardbuddy::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A broken config file must not block `config init` from repairing it
    let (config, config_error) = Config::load_or_default();

    // RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!("Using default configuration: {:#}", e);
    }

    cli::run(cli, config)
}
