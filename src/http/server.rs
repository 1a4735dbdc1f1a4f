//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the bridge and status handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Own the address registry shared by every in-flight forward
//! - Bind server to listener and stop on shutdown

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::forward::{ForwardingClient, MigrationFollower};
use crate::http::bridge::{proxy_handler, RequestBridge};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::recv_shutdown;
use crate::routing::{AddressError, AddressRegistry, BackendAddress};

/// Path of the client-facing bridge endpoint.
pub const PROXY_PATH: &str = "/proxy";

/// Slack between the follower deadline and the outer timeout layer.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: RequestBridge,
    pub registry: Arc<AddressRegistry>,
}

/// HTTP server for the relay proxy.
pub struct HttpServer {
    router: Router,
    registry: Arc<AddressRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, AddressError> {
        let initial = BackendAddress::parse(&config.upstream.address)?;
        let registry = Arc::new(AddressRegistry::new(initial));

        let client = ForwardingClient::from_config(registry.clone(), &config.upstream, &config.timeouts);
        let follower = MigrationFollower::from_config(client, &config.upstream, &config.timeouts);
        let bridge = RequestBridge::new(follower, config.listener.max_body_bytes);

        let state = AppState {
            bridge,
            registry: registry.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, registry })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The follower owns the request deadline and answers 504 with the error
    /// text; the layer only catches what happens outside it, such as a slow
    /// inbound body.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let backstop = Duration::from_secs(config.timeouts.request_secs) + DEADLINE_GRACE;
        Router::new()
            .route(PROXY_PATH, post(proxy_handler))
            .route("/status", get(status_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, backstop))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Handle to the registry, for inspection and tests.
    pub fn registry(&self) -> Arc<AddressRegistry> {
        self.registry.clone()
    }

    /// The router, without binding a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.registry.get(),
            "Proxy server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream: String,
}

async fn status_handler(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream: state.registry.get().to_string(),
    })
}
