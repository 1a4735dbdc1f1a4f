//! Backend server setup.

use axum::{http::StatusCode, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::backend::handler::{process_handler, BackendState};
use crate::backend::migration::MigrationSwitch;
use crate::config::{BackendConfig, TimeoutConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::recv_shutdown;

/// HTTP server for the backend tier.
pub struct BackendServer {
    router: Router,
    config: BackendConfig,
    migration: Arc<MigrationSwitch>,
}

impl BackendServer {
    pub fn new(config: BackendConfig, timeouts: &TimeoutConfig) -> Self {
        let status = StatusCode::from_u16(config.redirect_status)
            .ok()
            .filter(|s| s.is_redirection())
            .unwrap_or(StatusCode::MOVED_PERMANENTLY);
        let migration = Arc::new(MigrationSwitch::new(status));

        let router = Self::build_router(&config, timeouts, BackendState {
            migration: migration.clone(),
        });

        Self {
            router,
            config,
            migration,
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &BackendConfig, timeouts: &TimeoutConfig, state: BackendState) -> Router {
        Router::new()
            .route(&config.path, post(process_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Handle to the migration switch.
    pub fn migration(&self) -> Arc<MigrationSwitch> {
        self.migration.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = %self.config.path, "Backend server starting");

        if let Some(target) = self.config.redirect_to.clone() {
            let delay = self.config.migrate_after_secs.map(Duration::from_secs);
            self.migration.schedule(target, delay, shutdown.resubscribe());
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("Backend server stopped");
        Ok(())
    }
}
