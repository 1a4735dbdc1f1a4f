//! Three-tier JSON relay with redirect-driven backend migration.

pub mod backend;
pub mod client;
pub mod config;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payload;
pub mod routing;

pub use config::RelayConfig;
pub use forward::{ForwardError, ForwardingClient, MigrationFollower};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use payload::Payload;
pub use routing::{AddressRegistry, BackendAddress};
