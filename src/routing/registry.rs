//! Current backend address.
//!
//! # Responsibilities
//! - Hold the single "current" backend address for a forwarding client
//! - Serve lock-free reads to every in-flight forward
//! - Replace the address when a backend migrates
//!
//! # Design Decisions
//! - Stored behind `ArcSwap`: readers get a whole `Arc<BackendAddress>` and
//!   never observe a partially written value
//! - No I/O happens during the swap; logging runs after it

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::routing::address::BackendAddress;

/// Shared, mutable backend address.
#[derive(Debug)]
pub struct AddressRegistry {
    current: ArcSwap<BackendAddress>,
}

impl AddressRegistry {
    /// Create a registry pointing at `initial`.
    pub fn new(initial: BackendAddress) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current backend address.
    pub fn get(&self) -> Arc<BackendAddress> {
        self.current.load_full()
    }

    /// Replace the current address. Returns `true` if the value changed.
    pub fn set(&self, address: BackendAddress) -> bool {
        let next = Arc::new(address);
        let previous = self.current.swap(Arc::clone(&next));

        if *previous == *next {
            return false;
        }

        tracing::info!(
            previous = %previous,
            address = %next,
            "Server address updated"
        );
        metrics::record_address_change();
        true
    }
}
