//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Payload
//!     → follower.rs (encode once, loop)
//!         → client.rs (registry.get() + path, POST with deadline)
//!         → response.rs (status, headers, unread body)
//!         → 301/302? release, registry.set(Location), re-send same bytes
//!     → terminal OutboundResponse or ForwardError
//! ```
//!
//! # Design Decisions
//! - The transport never follows redirects on its own
//! - Non-redirect statuses, 4xx/5xx included, are handed back untouched
//! - Errors stay local to the request; the registry only moves on a valid
//!   redirect

pub mod client;
pub mod error;
pub mod follower;
pub mod response;

pub use client::ForwardingClient;
pub use error::{ForwardError, RedirectError, TransportFailure};
pub use follower::{MigrationFollower, DEFAULT_MAX_REDIRECTS};
pub use response::OutboundResponse;
