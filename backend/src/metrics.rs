//! Counters for the selector crank.
//!
//! All counters are backed by atomics for lock-free concurrent access.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated crank and audit metrics.
///
/// Thread-safe via atomics; shared via `Arc<Metrics>`.
#[derive(Default)]
pub struct Metrics {
    /// Draw batches confirmed on-chain.
    pub batches_submitted: AtomicU64,
    /// Winners drawn by confirmed batches.
    pub winners_drawn: AtomicU64,
    /// Batches that failed after all retries or with a retryable error.
    pub batches_failed: AtomicU64,
    /// Batches rejected by the program with a selector error.
    pub batches_rejected: AtomicU64,
    /// Sum of batch confirmation latencies in milliseconds.
    pub batch_latency_sum_ms: AtomicU64,
    /// `WinnerSelected` events received by the listener.
    pub events_received: AtomicU64,
    /// Winners confirmed by the independent replay.
    pub audit_verified: AtomicU64,
    /// Winners that differ from the independent replay.
    pub audit_mismatches: AtomicU64,
    /// Auditor rebuilds from a fresh account snapshot.
    pub audit_resyncs: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed batch of `winners` draws.
    pub fn record_batch(&self, winners: u32, latency_ms: u64) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
        self.winners_drawn
            .fetch_add(u64::from(winners), Ordering::Relaxed);
        self.batch_latency_sum_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verified(&self, count: u64) {
        self.audit_verified.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_mismatches(&self, count: u64) {
        self.audit_mismatches.fetch_add(count, Ordering::Relaxed);
    }

    /// Replace audit totals after a full history replay.
    pub fn reset_audit(&self, verified: u64, mismatches: u64) {
        self.audit_verified.store(verified, Ordering::Relaxed);
        self.audit_mismatches.store(mismatches, Ordering::Relaxed);
    }

    pub fn record_resync(&self) {
        self.audit_resyncs.fetch_add(1, Ordering::Relaxed);
    }

    /// Average batch confirmation latency in milliseconds, or 0 if none.
    pub fn avg_batch_latency_ms(&self) -> u64 {
        let count = self.batches_submitted.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.batch_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    /// Serialize metrics as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "batches_submitted": self.batches_submitted.load(Ordering::Relaxed),
            "winners_drawn": self.winners_drawn.load(Ordering::Relaxed),
            "batches_failed": self.batches_failed.load(Ordering::Relaxed),
            "batches_rejected": self.batches_rejected.load(Ordering::Relaxed),
            "avg_batch_latency_ms": self.avg_batch_latency_ms(),
            "events_received": self.events_received.load(Ordering::Relaxed),
            "audit_verified": self.audit_verified.load(Ordering::Relaxed),
            "audit_mismatches": self.audit_mismatches.load(Ordering::Relaxed),
            "audit_resyncs": self.audit_resyncs.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_over_confirmed_batches() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_batch_latency_ms(), 0);

        metrics.record_batch(100, 400);
        metrics.record_batch(50, 800);
        metrics.record_failure();

        let json = metrics.to_json();
        assert_eq!(json["winners_drawn"], 150);
        assert_eq!(json["avg_batch_latency_ms"], 600);
        assert_eq!(json["batches_failed"], 1);
    }
}
