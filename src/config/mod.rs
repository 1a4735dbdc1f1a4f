//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (RELAY_*, NEW_SERVER_ADDRESS)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to the proxy, backend or client at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the backend address mutates at
//!   runtime, and that lives in the routing registry, not here
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, ClientConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    TimeoutConfig, UpstreamConfig,
};
