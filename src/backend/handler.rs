//! `/process` handler: echo the payload, or redirect while migrating.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::migration::MigrationSwitch;
use crate::observability::metrics;
use crate::payload::Payload;

/// State shared by backend handlers.
#[derive(Clone)]
pub struct BackendState {
    pub migration: Arc<MigrationSwitch>,
}

/// Body returned for a processed payload.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub status: &'static str,
    pub payload: Payload,
}

pub async fn process_handler(State(state): State<BackendState>, body: Bytes) -> Response {
    if let Some(target) = state.migration.target() {
        tracing::info!(location = %target, "Redirecting request to new address");
        metrics::record_backend_request("redirected");
        return (
            state.migration.status(),
            [(header::LOCATION, target.as_str())],
            "Server moved",
        )
            .into_response();
    }

    tracing::info!(body = %String::from_utf8_lossy(&body), "Server received request");

    let payload = match Payload::decode(&body) {
        Ok(payload) => payload,
        Err(e) => {
            metrics::record_backend_request("rejected");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    tracing::info!(payload = ?payload.0, "Server processed request");
    metrics::record_backend_request("processed");

    Json(ProcessResponse {
        status: "success",
        payload,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Router};
    use tower::ServiceExt;

    fn app(migration: Arc<MigrationSwitch>) -> Router {
        Router::new()
            .route("/process", post(process_handler))
            .with_state(BackendState { migration })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_echoes_payload() {
        let response = app(Arc::new(MigrationSwitch::default()))
            .oneshot(Request::post("/process").body(Body::from(r#"{"key": 42}"#)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            body_string(response).await,
            r#"{"status":"success","payload":{"key":42}}"#
        );
    }

    #[tokio::test]
    async fn test_rejects_malformed_body() {
        let response = app(Arc::new(MigrationSwitch::default()))
            .oneshot(Request::post("/process").body(Body::from("{oops")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_redirects_when_armed() {
        let migration = Arc::new(MigrationSwitch::new(StatusCode::FOUND));
        migration.arm("http://new-server:8081/process");

        let response = app(migration)
            .oneshot(Request::post("/process").body(Body::from(r#"{"key": 1}"#)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://new-server:8081/process"
        );
        assert_eq!(body_string(response).await, "Server moved");
    }
}
