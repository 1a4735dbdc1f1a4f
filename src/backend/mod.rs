//! Backend server tier.
//!
//! # Data Flow
//! ```text
//! POST /process
//!     → migration.rs armed? → 301/302 + Location, "Server moved"
//!     → handler.rs decode payload → {"status":"success","payload":...}
//! ```
//!
//! # Design Decisions
//! - Redirect target is sent exactly as configured; proxies normalize it
//! - Migration can be armed at startup or after a delay

pub mod handler;
pub mod migration;
pub mod server;

pub use migration::MigrationSwitch;
pub use server::BackendServer;
