//! Per-topic event bus metrics.
//!
//! Four monotone counters per §4.1/§6: `queued` (on accept),
//! `scheduled` (on dequeue), `done` (on success), `failed` (on
//! exception/panic). All atomic, `Relaxed` ordering — these are
//! read-mostly counters with no ordering dependency on other memory.

use std::sync::atomic::{AtomicU64, Ordering};

/// Observability counters for one event bus topic.
#[derive(Debug, Default)]
pub struct TopicMetrics {
    queued: AtomicU64,
    scheduled: AtomicU64,
    done: AtomicU64,
    failed: AtomicU64,
}

impl TopicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let m = TopicMetrics::new();
        assert_eq!(m.queued(), 0);
        m.incr_queued();
        m.incr_queued();
        m.incr_scheduled();
        m.incr_done();
        m.incr_failed();
        assert_eq!(m.queued(), 2);
        assert_eq!(m.scheduled(), 1);
        assert_eq!(m.done(), 1);
        assert_eq!(m.failed(), 1);
    }
}
