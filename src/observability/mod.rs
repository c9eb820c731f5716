//! Observability for the Lark OpenAPI client.
//!
//! Log events are emitted through `tracing` at the call sites; this module
//! carries the crate-local counters a CLI-style caller can print as an
//! end-of-run summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for client and token-manager operations.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total API requests dispatched.
    requests_total: AtomicU64,
    /// API requests that ultimately failed.
    requests_failed: AtomicU64,
    /// Individual retry attempts across all operations.
    retries: AtomicU64,
    /// Successful token refreshes.
    token_refreshes: AtomicU64,
    /// Failed token refreshes.
    token_refresh_failures: AtomicU64,
    /// Token requests served from the in-memory cache.
    token_cache_hits: AtomicU64,
    /// Total request latency in microseconds.
    latency_total_us: AtomicU64,
    /// Request count backing the latency average.
    latency_count: AtomicU64,
}

impl Metrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a dispatched API request.
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an API request that failed after retries.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a single retry attempt.
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful token refresh.
    pub fn record_token_refresh(&self) {
        self.token_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed token refresh.
    pub fn record_token_refresh_failure(&self) {
        self.token_refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a token request served from cache.
    pub fn record_token_cache_hit(&self) {
        self.token_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records request latency.
    pub fn record_latency(&self, duration: Duration) {
        self.latency_total_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency_total = self.latency_total_us.load(Ordering::Relaxed);
        let latency_count = self.latency_count.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            token_refreshes: self.token_refreshes.load(Ordering::Relaxed),
            token_refresh_failures: self.token_refresh_failures.load(Ordering::Relaxed),
            token_cache_hits: self.token_cache_hits.load(Ordering::Relaxed),
            average_latency_us: if latency_count == 0 {
                0
            } else {
                latency_total / latency_count
            },
        }
    }
}

/// Point-in-time view of all metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total API requests dispatched.
    pub requests_total: u64,
    /// API requests that ultimately failed.
    pub requests_failed: u64,
    /// Individual retry attempts across all operations.
    pub retries: u64,
    /// Successful token refreshes.
    pub token_refreshes: u64,
    /// Failed token refreshes.
    pub token_refresh_failures: u64,
    /// Token requests served from the in-memory cache.
    pub token_cache_hits: u64,
    /// Average request latency in microseconds.
    pub average_latency_us: u64,
}
