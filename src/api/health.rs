//! Request counters for the /health endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Updated by the request-tracking middleware, read by /health.
pub struct HealthState {
    started_at: Instant,
    requests_served: AtomicU64,
    /// Responses with a 4xx or 5xx status.
    requests_failed: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, failed: bool) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
