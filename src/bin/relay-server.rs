//! Backend server: echoes payloads on `POST /process`, or redirects once
//! a migration target is configured (`NEW_SERVER_ADDRESS`).

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use relay_proxy::backend::BackendServer;
use relay_proxy::config::{self, RelayConfig};
use relay_proxy::lifecycle::{signals, Shutdown};
use relay_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "relay-server")]
#[command(about = "Backend that processes relayed JSON payloads", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Redirect every request to this address.
    #[arg(long)]
    redirect_to: Option<String>,

    /// Arm the redirect only after this many seconds.
    #[arg(long)]
    migrate_after: Option<u64>,
}

fn load(cli: &Cli) -> Result<RelayConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::from_env()?,
    };
    if let Some(bind) = &cli.bind {
        config.backend.bind_address = bind.clone();
    }
    if let Some(target) = &cli.redirect_to {
        config.backend.redirect_to = Some(target.clone());
    }
    if let Some(secs) = cli.migrate_after {
        config.backend.migrate_after_secs = Some(secs);
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.backend.bind_address,
        path = %config.backend.path,
        redirect_to = ?config.backend.redirect_to,
        "relay-server v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.backend.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = BackendServer::new(config.backend.clone(), &config.timeouts);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
