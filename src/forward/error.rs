//! Forwarding error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use thiserror::Error;

use crate::observability::metrics;

/// Why an outbound call failed at the transport level.
#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("{0}")]
    Connect(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("error reading response body: {0}")]
    Body(String),
}

/// Problems with a redirect response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("missing location")]
    MissingLocation,

    #[error("invalid location {location:?}: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("exceeded {limit} redirect hops")]
    TooManyHops { limit: u32 },
}

/// Errors that can occur while relaying a payload.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Payload could not be encoded.
    #[error("error marshalling request data: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Inbound bytes could not be read or decoded.
    #[error("{0}")]
    Decode(String),

    /// Inbound body is larger than the listener accepts.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Outbound call failed.
    #[error("error sending request to {url}: {failure}")]
    Transport {
        url: String,
        #[source]
        failure: TransportFailure,
    },

    /// Redirect response could not be followed.
    #[error("redirection failed: {0}")]
    Redirect(#[from] RedirectError),
}

impl ForwardError {
    pub(crate) fn transport(url: &str, failure: TransportFailure) -> Self {
        Self::Transport {
            url: url.to_string(),
            failure,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Serialization(_) => "serialization",
            ForwardError::Decode(_) => "decode",
            ForwardError::PayloadTooLarge { .. } => "payload_too_large",
            ForwardError::Transport { .. } => "transport",
            ForwardError::Redirect(_) => "redirect",
        }
    }

    /// Status returned to the original caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::Decode(_) => StatusCode::BAD_REQUEST,
            ForwardError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::Transport {
                failure: TransportFailure::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Transport { .. } | ForwardError::Redirect(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        metrics::record_forward_error(self.kind());
        let body = match &self {
            ForwardError::Decode(_) | ForwardError::PayloadTooLarge { .. } => self.to_string(),
            _ => format!("error forwarding request: {self}"),
        };
        (self.status_code(), body).into_response()
    }
}
