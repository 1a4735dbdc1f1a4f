//! Outbound forwarding client.
//!
//! # Responsibilities
//! - Serialize the payload
//! - Compose `http://<current address><path>` from the registry
//! - POST the payload with an explicit deadline
//! - Hand back the raw response; redirects are never followed here
//!
//! # Design Decisions
//! - No connection pooling: every forward opens a fresh connection
//! - Timeout expiry is a transport failure, not a separate error class

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::forward::error::{ForwardError, TransportFailure};
use crate::forward::response::OutboundResponse;
use crate::http::X_REQUEST_ID;
use crate::payload::Payload;
use crate::routing::AddressRegistry;

/// Sends payloads to whatever backend the registry currently names.
#[derive(Clone)]
pub struct ForwardingClient {
    client: Client<HttpConnector, Body>,
    registry: Arc<AddressRegistry>,
    path: String,
    timeout: Duration,
}

impl ForwardingClient {
    /// Build a client that posts to `path` on the registry's address.
    pub fn new(registry: Arc<AddressRegistry>, path: impl Into<String>, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);

        Self {
            client,
            registry,
            path: path.into(),
            timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Build a client from the proxy's upstream section.
    pub fn from_config(
        registry: Arc<AddressRegistry>,
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self::new(registry, upstream.path.clone(), timeouts)
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL the next call will target.
    pub fn target_url(&self) -> String {
        self.registry.get().endpoint(&self.path)
    }

    /// Serialize `payload` and send it once.
    pub async fn send(&self, payload: &Payload) -> Result<OutboundResponse, ForwardError> {
        let body = payload.encode()?;
        self.dispatch(body, None).await
    }

    /// Send already-encoded payload bytes once.
    pub(crate) async fn dispatch(
        &self,
        body: Bytes,
        request_id: Option<&HeaderValue>,
    ) -> Result<OutboundResponse, ForwardError> {
        let url = self.target_url();

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id.clone());
        }
        let request = builder.body(Body::from(body)).map_err(|e| {
            ForwardError::transport(&url, TransportFailure::InvalidRequest(e.to_string()))
        })?;

        tracing::debug!(url = %url, "Forwarding request");

        match timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                tracing::debug!(url = %url, status = %response.status(), "Upstream responded");
                Ok(OutboundResponse::new(url, response))
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Upstream request failed");
                Err(ForwardError::transport(&url, TransportFailure::Connect(error_chain(&e))))
            }
            Err(_) => {
                tracing::warn!(url = %url, timeout = ?self.timeout, "Upstream request timed out");
                Err(ForwardError::transport(&url, TransportFailure::Timeout(self.timeout)))
            }
        }
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
