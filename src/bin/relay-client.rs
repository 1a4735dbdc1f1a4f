//! Client: posts a random payload to the proxy every few seconds.

use clap::Parser;
use std::path::PathBuf;

use relay_proxy::client::ClientDriver;
use relay_proxy::config::{self, RelayConfig};
use relay_proxy::lifecycle::{signals, Shutdown};
use relay_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "relay-client")]
#[command(about = "Sends random JSON payloads through the relay proxy", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy address, overrides the config file.
    #[arg(short, long)]
    target: Option<String>,

    /// Seconds between successful requests.
    #[arg(short, long)]
    interval: Option<u64>,
}

fn load(cli: &Cli) -> Result<RelayConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::from_env()?,
    };
    if let Some(target) = &cli.target {
        config.client.target_address = target.clone();
    }
    if let Some(interval) = cli.interval {
        config.client.interval_secs = interval;
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("relay-client v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let driver = ClientDriver::from_config(&config)?;
    driver.run(shutdown.subscribe()).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
