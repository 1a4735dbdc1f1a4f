//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure shared by the
//! proxy, backend server and client binaries. All types derive Serde traits
//! for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::forward::DEFAULT_MAX_REDIRECTS;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Proxy listener configuration.
    pub listener: ListenerConfig,

    /// Backend the proxy forwards to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Backend server settings (relay-server binary).
    pub backend: BackendConfig,

    /// Client loop settings (relay-client binary).
    pub client: ClientConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8082").
    pub bind_address: String,

    /// Largest inbound body accepted by the bridge.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8082".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Upstream (backend) addressing for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Initial backend address, `host:port` or a full `http://` URL.
    pub address: String,

    /// Fixed path appended to the backend address.
    pub path: String,

    /// Maximum number of redirects followed for a single forward.
    pub max_redirects: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8081".to_string(),
            path: "/process".to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for a single outbound call in seconds.
    pub upstream_secs: u64,

    /// Total time allowed for an inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address the Prometheus exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "relay_proxy=info,relay_server=info,relay_client=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Bind address of the backend server.
    pub bind_address: String,

    /// Path the backend processes payloads on.
    pub path: String,

    /// When set, requests are answered with a redirect to this address.
    pub redirect_to: Option<String>,

    /// Redirect status code (301 or 302).
    pub redirect_status: u16,

    /// Delay before the redirect is armed. `None` arms it immediately.
    pub migrate_after_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            path: "/process".to_string(),
            redirect_to: None,
            redirect_status: 301,
            migrate_after_secs: None,
        }
    }
}

/// Client loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Proxy address the client posts to.
    pub target_address: String,

    /// Path on the proxy.
    pub path: String,

    /// Pause after a successful exchange in seconds.
    pub interval_secs: u64,

    /// Pause after a failed exchange in seconds.
    pub error_backoff_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target_address: "localhost:8082".to_string(),
            path: "/proxy".to_string(),
            interval_secs: 3,
            error_backoff_secs: 5,
        }
    }
}
