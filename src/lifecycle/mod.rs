//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (binaries):
//!     Load config → Validate → Init logging/metrics → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → servers drain, client loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
