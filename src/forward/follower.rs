//! Redirect-driven backend migration.
//!
//! # State Transitions
//! ```text
//! Direct → Following: response status is 301 or 302
//! Direct → (done):    any other status, handed back untouched
//! Following → Direct: Location normalized, response released, registry updated
//! Following → (error): Location missing/invalid, or hop limit reached
//! ```
//!
//! The loop is bounded by `max_redirects` and, when set, by an overall
//! deadline covering every hop. Every re-send carries the exact bytes of the
//! first attempt, and the stale response is released before the next call
//! goes out.

use axum::body::Bytes;
use axum::http::HeaderValue;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::forward::client::ForwardingClient;
use crate::forward::error::{ForwardError, RedirectError, TransportFailure};
use crate::forward::response::OutboundResponse;
use crate::observability::metrics;
use crate::payload::Payload;
use crate::routing::BackendAddress;

/// Default hop limit when none is configured.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Where a forward is in the redirect protocol.
enum FollowState {
    /// No redirect pending; next step is a call to the current address.
    Direct,
    /// Redirect received; the stale response is read for its target, then
    /// released.
    Following(OutboundResponse),
}

/// Forwards a payload and follows backend migrations.
#[derive(Clone)]
pub struct MigrationFollower {
    client: ForwardingClient,
    max_redirects: u32,
    deadline: Option<Duration>,
}

impl MigrationFollower {
    pub fn new(client: ForwardingClient, max_redirects: u32) -> Self {
        Self {
            client,
            max_redirects,
            deadline: None,
        }
    }

    /// Follower bounded by the upstream hop limit and the request deadline.
    pub fn from_config(
        client: ForwardingClient,
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self::new(client, upstream.max_redirects)
            .with_deadline(Duration::from_secs(timeouts.request_secs))
    }

    /// Bound the whole redirect chain, not just a single call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn client(&self) -> &ForwardingClient {
        &self.client
    }

    /// Forward `payload`, following redirects until a terminal response.
    pub async fn forward(&self, payload: &Payload) -> Result<OutboundResponse, ForwardError> {
        self.forward_with_request_id(payload, None).await
    }

    /// Same as [`forward`](Self::forward), propagating `x-request-id`.
    pub async fn forward_with_request_id(
        &self,
        payload: &Payload,
        request_id: Option<HeaderValue>,
    ) -> Result<OutboundResponse, ForwardError> {
        let body = payload.encode()?;
        let Some(deadline) = self.deadline else {
            return self.follow(body, request_id.as_ref()).await;
        };

        match timeout(deadline, self.follow(body, request_id.as_ref())).await {
            Ok(result) => result,
            Err(_) => {
                let url = self.client.target_url();
                tracing::warn!(url = %url, deadline = ?deadline, "Redirect chain exceeded request deadline");
                Err(ForwardError::transport(&url, TransportFailure::Timeout(deadline)))
            }
        }
    }

    async fn follow(
        &self,
        body: Bytes,
        request_id: Option<&HeaderValue>,
    ) -> Result<OutboundResponse, ForwardError> {
        let mut hops = 0;
        let mut state = FollowState::Direct;

        loop {
            state = match state {
                FollowState::Direct => {
                    let response = self.client.dispatch(body.clone(), request_id).await?;
                    if !response.is_redirect() {
                        return Ok(response);
                    }
                    FollowState::Following(response)
                }
                FollowState::Following(stale) => {
                    let next = self.next_address(stale, hops)?;
                    self.client.registry().set(next);
                    metrics::record_redirect();
                    hops += 1;
                    FollowState::Direct
                }
            };
        }
    }

    /// Read and normalize the redirect target, consuming the stale response.
    fn next_address(&self, response: OutboundResponse, hops: u32) -> Result<BackendAddress, ForwardError> {
        let location = match response.location() {
            Ok(location) => location.to_string(),
            Err(e) => {
                tracing::warn!(url = %response.url(), status = %response.status(), error = %e, "Unusable redirect");
                response.release();
                return Err(e.into());
            }
        };

        tracing::info!(url = %response.url(), location = %location, "Redirect received from server");
        response.release();

        if hops >= self.max_redirects {
            tracing::warn!(limit = self.max_redirects, location = %location, "Redirect hop limit reached");
            return Err(RedirectError::TooManyHops {
                limit: self.max_redirects,
            }
            .into());
        }

        BackendAddress::parse(&location).map_err(|e| {
            RedirectError::InvalidLocation {
                location,
                reason: e.to_string(),
            }
            .into()
        })
    }
}
