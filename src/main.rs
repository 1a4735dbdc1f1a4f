//! Relay proxy (v1)
//!
//! Accepts JSON payloads on `POST /proxy` and forwards them to the current
//! backend, following 301/302 migrations.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   RELAY PROXY                     │
//!                         │                                                   │
//!   Client POST /proxy    │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │
//!   ──────────────────────┼─▶│ bridge │──▶│ follower │──▶│ forwarding     │──┼──▶ Backend
//!                         │  └────────┘   └────┬─────┘   │ client         │  │    POST /process
//!                         │                    │         └───────┬────────┘  │
//!                         │                    │ 301/302         │ get()     │
//!                         │                    ▼                 ▼           │
//!                         │               ┌──────────────────────────┐       │
//!                         │               │   address registry       │       │
//!                         │               └──────────────────────────┘       │
//!   ◀─────────────────────┼── verbatim status / content type / body          │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use relay_proxy::config::{self, RelayConfig};
use relay_proxy::http::HttpServer;
use relay_proxy::lifecycle::{signals, Shutdown};
use relay_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "relay-proxy")]
#[command(about = "Forwards JSON payloads to a migrating backend", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Initial backend address, overrides the config file.
    #[arg(short, long)]
    upstream: Option<String>,
}

fn load(cli: &Cli) -> Result<RelayConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::from_env()?,
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(upstream) = &cli.upstream {
        config.upstream.address = upstream.clone();
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("relay-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        max_redirects = config.upstream.max_redirects,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
