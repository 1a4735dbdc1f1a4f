//! Response returned by an outbound call.
//!
//! # Design Decisions
//! - The body stays unread until the caller asks for it
//! - Releasing is dropping: every exit path that lets the value go out of
//!   scope closes the body, `release` only makes the hand-off explicit
//! - Relaying to the original caller streams the body instead of buffering

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;

use crate::forward::error::{ForwardError, RedirectError, TransportFailure};

/// Status, headers and unread body of a backend response.
#[derive(Debug)]
pub struct OutboundResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Incoming,
}

impl OutboundResponse {
    pub(crate) fn new(url: String, response: hyper::Response<Incoming>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            url,
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// URL the request was sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.headers.get(header::CONTENT_TYPE)
    }

    /// True for 301 and 302, the two statuses that signal a backend migration.
    pub fn is_redirect(&self) -> bool {
        matches!(
            self.status,
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
        )
    }

    /// Non-empty `Location` header value.
    ///
    /// An absent or blank header is `MissingLocation`; a value that is not
    /// visible ASCII is `InvalidLocation`.
    pub fn location(&self) -> Result<&str, RedirectError> {
        let Some(value) = self.headers.get(header::LOCATION) else {
            return Err(RedirectError::MissingLocation);
        };
        let location = value
            .to_str()
            .map_err(|e| RedirectError::InvalidLocation {
                location: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                reason: e.to_string(),
            })?
            .trim();
        if location.is_empty() {
            return Err(RedirectError::MissingLocation);
        }
        Ok(location)
    }

    /// Close the body without reading it.
    pub fn release(self) {
        tracing::trace!(url = %self.url, status = %self.status, "Releasing response");
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, ForwardError> {
        let url = self.url;
        self.body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| ForwardError::transport(&url, TransportFailure::Body(e.to_string())))
    }
}

impl IntoResponse for OutboundResponse {
    /// Relay status, content type and the streamed body verbatim.
    fn into_response(self) -> Response {
        let content_type = self.content_type().cloned();
        let mut response = Response::new(Body::new(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}
