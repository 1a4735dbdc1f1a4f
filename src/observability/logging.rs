//! Structured logging.
//!
//! Uses the tracing crate with an `EnvFilter`: `RUST_LOG` wins, otherwise the
//! configured filter applies. JSON format for production, pretty format for
//! development.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Initialize the global subscriber.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}
