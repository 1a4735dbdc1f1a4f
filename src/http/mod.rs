//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned)
//!     → bridge.rs (decode body, forward, relay response)
//!     → Send to client
//! ```

pub mod bridge;
pub mod request;
pub mod server;

pub use bridge::RequestBridge;
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, PROXY_PATH};
