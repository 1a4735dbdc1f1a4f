//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use relay_proxy::backend::BackendServer;
use relay_proxy::config::{BackendConfig, RelayConfig, TimeoutConfig};
use relay_proxy::http::HttpServer;
use relay_proxy::lifecycle::Shutdown;
use relay_proxy::routing::AddressRegistry;

/// A running proxy.
#[allow(dead_code)]
pub struct ProxyHandle {
    pub addr: SocketAddr,
    pub registry: Arc<AddressRegistry>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl ProxyHandle {
    pub fn url(&self) -> String {
        format!("http://{}/proxy", self.addr)
    }
}

/// Proxy config pointing at `upstream`.
#[allow(dead_code)]
pub fn proxy_config(upstream: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.address = upstream.to_string();
    config
}

/// Start a proxy on an ephemeral port.
#[allow(dead_code)]
pub async fn start_proxy(config: RelayConfig) -> ProxyHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let registry = server.registry();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    ProxyHandle {
        addr,
        registry,
        shutdown,
    }
}

/// Start a backend server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_backend(redirect_to: Option<String>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = BackendConfig {
        bind_address: addr.to_string(),
        redirect_to,
        ..BackendConfig::default()
    };
    let server = BackendServer::new(config, &TimeoutConfig::default());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // let the migration switch arm before traffic arrives
    tokio::time::sleep(Duration::from_millis(20)).await;
    (addr, shutdown)
}

/// Start a backend that reads the request and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        while let Ok(n) = socket.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that writes `response` verbatim on every connection and
/// then reports whether the peer closed the socket within a few seconds.
#[allow(dead_code)]
pub async fn start_raw_backend(response: String) -> (SocketAddr, mpsc::UnboundedReceiver<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_none() {
                    return;
                }
                socket.write_all(response.as_bytes()).await.unwrap();

                let mut buf = [0u8; 1024];
                let closed = matches!(
                    tokio::time::timeout(Duration::from_secs(5), socket.read(&mut buf)).await,
                    Ok(Ok(0)) | Ok(Err(_))
                );
                let _ = closed_tx.send(closed);
            });
        }
    });

    (addr, closed_rx)
}

/// Read one HTTP/1.1 request with a `Content-Length` body.
#[allow(dead_code)]
async fn read_request(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + length {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    }
    Some(data)
}
