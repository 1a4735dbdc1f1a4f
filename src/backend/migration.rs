//! Backend migration switch.
//!
//! When armed, the backend stops processing and answers every request with
//! a redirect to the new address. Arming can be delayed to simulate a live
//! migration.

use arc_swap::ArcSwapOption;
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Redirect target, once armed.
#[derive(Debug)]
pub struct MigrationSwitch {
    target: ArcSwapOption<String>,
    status: StatusCode,
}

impl MigrationSwitch {
    /// A disarmed switch that will answer with `status` once armed.
    pub fn new(status: StatusCode) -> Self {
        Self {
            target: ArcSwapOption::empty(),
            status,
        }
    }

    /// Start redirecting to `target`.
    pub fn arm(&self, target: impl Into<String>) {
        let target = target.into();
        tracing::info!(location = %target, status = %self.status, "Server is now redirecting requests");
        self.target.store(Some(Arc::new(target)));
    }

    /// Current redirect target, if armed.
    pub fn target(&self) -> Option<Arc<String>> {
        self.target.load_full()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Arm now, or after `delay` unless shutdown comes first.
    pub fn schedule(
        self: &Arc<Self>,
        target: String,
        delay: Option<Duration>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let Some(delay) = delay else {
            self.arm(target);
            return;
        };

        tracing::info!(location = %target, delay = ?delay, "Migration scheduled");
        let switch = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => switch.arm(target),
                _ = shutdown.recv() => {
                    tracing::debug!("Migration cancelled by shutdown");
                }
            }
        });
    }
}

impl Default for MigrationSwitch {
    fn default() -> Self {
        Self::new(StatusCode::MOVED_PERMANENTLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    #[test]
    fn test_arm_sets_target() {
        let switch = MigrationSwitch::new(StatusCode::FOUND);
        assert!(switch.target().is_none());

        switch.arm("new-server:8081");
        assert_eq!(switch.target().as_deref().map(String::as_str), Some("new-server:8081"));
        assert_eq!(switch.status(), StatusCode::FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_arming() {
        let shutdown = Shutdown::new();
        let switch = Arc::new(MigrationSwitch::default());
        switch.schedule("new-server:8081".into(), Some(Duration::from_secs(30)), shutdown.subscribe());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(switch.target().is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(switch.target().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_migration() {
        let shutdown = Shutdown::new();
        let switch = Arc::new(MigrationSwitch::default());
        switch.schedule("new-server:8081".into(), Some(Duration::from_secs(30)), shutdown.subscribe());

        tokio::task::yield_now().await;
        shutdown.trigger();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(switch.target().is_none());
    }
}
