//! Inbound-to-outbound request bridge.
//!
//! # Responsibilities
//! - Read and decode the inbound body before anything touches the backend
//! - Forward through the migration follower
//! - Relay the terminal response (status, content type, body) verbatim
//! - Turn failures into 400/413/5xx responses carrying the error text

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::time::Instant;

use crate::forward::{ForwardError, MigrationFollower, OutboundResponse};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::payload::Payload;

/// Turns an inbound request into a forwarded one.
#[derive(Clone)]
pub struct RequestBridge {
    follower: MigrationFollower,
    max_body_bytes: usize,
}

impl RequestBridge {
    pub fn new(follower: MigrationFollower, max_body_bytes: usize) -> Self {
        Self {
            follower,
            max_body_bytes,
        }
    }

    /// Decode `request` and forward its payload.
    pub async fn relay(&self, request: Request<Body>) -> Result<OutboundResponse, ForwardError> {
        let request_id = request_id(request.headers());

        let body = axum::body::to_bytes(request.into_body(), self.max_body_bytes)
            .await
            .map_err(|e| body_error(e, self.max_body_bytes))?;
        let payload = Payload::decode(&body)?;

        tracing::debug!(
            request_id = ?request_id,
            payload = %String::from_utf8_lossy(&body),
            "Proxy received request"
        );

        self.follower.forward_with_request_id(&payload, request_id).await
    }
}

fn body_error(err: axum::Error, limit: usize) -> ForwardError {
    if err.source().is_some_and(|cause| cause.is::<LengthLimitError>()) {
        ForwardError::PayloadTooLarge { limit }
    } else {
        ForwardError::Decode(format!("error reading request body: {err}"))
    }
}

/// `POST /proxy` handler.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());

    let response = match state.bridge.relay(request).await {
        Ok(outbound) => {
            tracing::debug!(
                request_id = ?request_id,
                status = %outbound.status(),
                upstream = %outbound.url(),
                "Relaying upstream response"
            );
            outbound.into_response()
        }
        Err(e) => {
            tracing::warn!(request_id = ?request_id, error = %e, "Forwarding failed");
            e.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start_time);
    response
}
