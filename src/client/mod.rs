//! Client tier.
//!
//! Posts generated payloads to the proxy on a fixed cadence, following
//! redirects the same way the proxy does towards its backend.

pub mod driver;

pub use driver::{random_payload, ClientDriver};
