use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counters for cross-thread session monitoring
#[derive(Clone, Default)]
pub struct SessionMetrics {
    pub wake_matches: Arc<AtomicU64>,
    pub commands_ready: Arc<AtomicU64>,
    pub resets: Arc<AtomicU64>,
    pub renewals: Arc<AtomicU64>,
    pub renewal_failures: Arc<AtomicU64>,
    pub delivery_errors: Arc<AtomicU64>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_wake_matches(&self) {
        self.wake_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commands_ready(&self) {
        self.commands_ready.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_resets(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_renewals(&self) {
        self.renewals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_renewal_failures(&self) {
        self.renewal_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivery_errors(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
    }
}
