//! Manager-level observable metrics (§6): counts and a boolean gauge,
//! alongside the per-topic `queued`/`scheduled`/`done`/`failed`
//! counters the event bus already tracks on its own.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Atomic counters for the Replication Manager loop, in the style of
/// `kimberlite-vsr`'s `instrumentation::Metrics`: plain atomics, no
/// locking, safe to read concurrently with the loop's own cycle.
#[derive(Debug, Default)]
pub struct ManagerMetrics {
    containers_under_replicated: AtomicU64,
    containers_over_replicated: AtomicU64,
    commands_issued: AtomicU64,
    cycle_latency_millis: AtomicU64,
    thread_waiting: AtomicBool,
}

impl ManagerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, under: u64, over: u64, commands_issued: u64, latency_millis: u64) {
        self.containers_under_replicated
            .store(under, Ordering::Relaxed);
        self.containers_over_replicated
            .store(over, Ordering::Relaxed);
        self.commands_issued
            .fetch_add(commands_issued, Ordering::Relaxed);
        self.cycle_latency_millis
            .store(latency_millis, Ordering::Relaxed);
    }

    pub fn set_thread_waiting(&self, waiting: bool) {
        self.thread_waiting.store(waiting, Ordering::Relaxed);
    }

    pub fn containers_under_replicated(&self) -> u64 {
        self.containers_under_replicated.load(Ordering::Relaxed)
    }

    pub fn containers_over_replicated(&self) -> u64 {
        self.containers_over_replicated.load(Ordering::Relaxed)
    }

    pub fn commands_issued(&self) -> u64 {
        self.commands_issued.load(Ordering::Relaxed)
    }

    pub fn cycle_latency_millis(&self) -> u64 {
        self.cycle_latency_millis.load(Ordering::Relaxed)
    }

    pub fn is_thread_waiting(&self) -> bool {
        self.thread_waiting.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_cycle_updates_gauges_and_accumulates_commands() {
        let metrics = ManagerMetrics::new();
        metrics.record_cycle(2, 1, 3, 15);
        metrics.record_cycle(1, 0, 2, 8);

        assert_eq!(metrics.containers_under_replicated(), 1);
        assert_eq!(metrics.containers_over_replicated(), 0);
        assert_eq!(metrics.commands_issued(), 5);
        assert_eq!(metrics.cycle_latency_millis(), 8);
    }

    #[test]
    fn thread_waiting_toggles() {
        let metrics = ManagerMetrics::new();
        assert!(!metrics.is_thread_waiting());
        metrics.set_thread_waiting(true);
        assert!(metrics.is_thread_waiting());
    }
}
