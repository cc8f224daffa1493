//! Counters describing what the auto-proposer has done.
//!
//! Recording is a relaxed atomic store and cannot fail, so it never changes
//! how the loop behaves.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    polls: AtomicU64,
    debounces_started: AtomicU64,
    proposals_attempted: AtomicU64,
    proposals_succeeded: AtomicU64,
    proposals_failed: AtomicU64,
    last_propose_latency_ms: AtomicU64,
}

/// Point-in-time copy of [`SchedulerMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub polls: u64,
    pub debounces_started: u64,
    pub proposals_attempted: u64,
    pub proposals_succeeded: u64,
    pub proposals_failed: u64,
    pub last_propose_latency_ms: u64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounce_started(&self) {
        self.debounces_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.proposals_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, succeeded: bool, latency_ms: u64) {
        if succeeded {
            self.proposals_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.proposals_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.last_propose_latency_ms
            .store(latency_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            debounces_started: self.debounces_started.load(Ordering::Relaxed),
            proposals_attempted: self.proposals_attempted.load(Ordering::Relaxed),
            proposals_succeeded: self.proposals_succeeded.load(Ordering::Relaxed),
            proposals_failed: self.proposals_failed.load(Ordering::Relaxed),
            last_propose_latency_ms: self.last_propose_latency_ms.load(Ordering::Relaxed),
        }
    }
}
