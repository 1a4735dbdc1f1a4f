//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     upstream.address (config)
//!     → address.rs (normalize to host:port)
//!     → registry.rs (current address)
//!
//! Redirect (301/302 + Location):
//!     Location header
//!     → address.rs (normalize)
//!     → registry.rs (swap current address)
//!     → next forward targets the new backend
//! ```
//!
//! # Design Decisions
//! - Exactly one backend address at a time, no pools or failover lists
//! - Bare `host:port` and full URLs normalize to the same value
//! - Registry is owned by the server state, never a global

pub mod address;
pub mod registry;

pub use address::{AddressError, BackendAddress};
pub use registry::AddressRegistry;
