//! Client loop: generate a payload, post it to the proxy, log the reply.
//!
//! The client keeps its own registry, so a proxy that answers with a
//! redirect moves the client just like a backend redirect moves the proxy.

use axum::body::Bytes;
use axum::http::StatusCode;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::RelayConfig;
use crate::forward::{ForwardError, ForwardingClient, MigrationFollower};
use crate::payload::Payload;
use crate::routing::{AddressError, AddressRegistry, BackendAddress};

/// Drives the request loop of the client tier.
pub struct ClientDriver {
    follower: MigrationFollower,
    interval: Duration,
    error_backoff: Duration,
}

impl ClientDriver {
    pub fn from_config(config: &RelayConfig) -> Result<Self, AddressError> {
        let target = BackendAddress::parse(&config.client.target_address)?;
        let registry = Arc::new(AddressRegistry::new(target));
        let client = ForwardingClient::new(registry, config.client.path.clone(), &config.timeouts);

        Ok(Self {
            follower: MigrationFollower::new(client, config.upstream.max_redirects),
            interval: Duration::from_secs(config.client.interval_secs),
            error_backoff: Duration::from_secs(config.client.error_backoff_secs),
        })
    }

    pub fn follower(&self) -> &MigrationFollower {
        &self.follower
    }

    /// Post `payload` once and read the full reply.
    pub async fn send_once(&self, payload: &Payload) -> Result<(StatusCode, Bytes), ForwardError> {
        let response = self.follower.forward(payload).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body))
    }

    /// Loop until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(proxy = %self.follower.client().target_url(), "Client loop starting");

        loop {
            let payload = random_payload();
            let pause = match self.send_once(&payload).await {
                Ok((status, body)) => {
                    tracing::info!(
                        status = %status,
                        body = %String::from_utf8_lossy(&body),
                        "Response received"
                    );
                    self.interval
                }
                Err(e) => {
                    tracing::error!(error = %e, "Request failed");
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Client loop received shutdown signal, exiting");
                    break;
                }
            }
        }
    }
}

/// Payload of the form `{"key": 0..100}`.
pub fn random_payload() -> Payload {
    let value: u32 = rand::thread_rng().gen_range(0..100);
    let mut payload = Payload::default();
    payload.insert("key", value);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(target: &str) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.client.target_address = target.to_string();
        config.client.interval_secs = 0;
        config.client.error_backoff_secs = 0;
        config
    }

    #[test]
    fn test_random_payload_shape() {
        for _ in 0..50 {
            let payload = random_payload();
            let key = payload.get("key").and_then(|v| v.as_u64()).unwrap();
            assert!(key < 100);
            assert_eq!(payload.0.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_send_once_posts_to_proxy_path() {
        let proxy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proxy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("relayed"))
            .expect(1)
            .mount(&proxy)
            .await;

        let driver = ClientDriver::from_config(&config_for(&proxy.address().to_string())).unwrap();
        let (status, body) = driver.send_once(&random_payload()).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "relayed");
    }

    #[tokio::test]
    async fn test_client_follows_proxy_migration() {
        let old = MockServer::start().await;
        let new = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(301).insert_header(
                "location",
                format!("http://{}/proxy", new.address()).as_str(),
            ))
            .mount(&old)
            .await;
        Mock::given(method("POST"))
            .and(path("/proxy"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&new)
            .await;

        let driver = ClientDriver::from_config(&config_for(&old.address().to_string())).unwrap();
        driver.send_once(&random_payload()).await.unwrap();
        assert_eq!(
            driver.follower().client().target_url(),
            format!("http://{}/proxy", new.address())
        );
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let proxy = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&proxy)
            .await;

        let mut config = config_for(&proxy.address().to_string());
        config.client.interval_secs = 60;
        let driver = ClientDriver::from_config(&config).unwrap();

        let shutdown = Shutdown::new();
        let task = tokio::spawn(driver.run(shutdown.subscribe()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("client loop did not stop")
            .unwrap();
        assert!(!proxy.received_requests().await.unwrap().is_empty());
    }
}
