//! Single-thread-per-topic executor (§4.1, §5).
//!
//! Each topic owns exactly one worker task serving a bounded FIFO
//! queue; handlers on the same topic are strictly serialized and see
//! in-topic state in enqueue order. A handler's own error — or panic —
//! never escapes the worker: both only increment the `failed` counter,
//! so one bad payload can't poison the topic or take down the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::metrics::TopicMetrics;
use crate::queue::{BoundedQueue, PushResult};

/// Errors surfaced by [`EventBus`] itself (not by handlers — handler
/// failures are counted, never returned to the publisher).
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("event bus '{0}' is closed")]
    Closed(String),
    #[error("event bus '{0}' topic is full")]
    Full(String),
    #[error("event bus '{0}' did not drain within the configured timeout")]
    DrainTimeout(String),
}

/// A single-thread FIFO executor for one event topic.
///
/// `publish`/`try_publish` enqueue a payload; a dedicated worker task
/// dequeues and invokes the handler to completion before picking up
/// the next item. `close()` stops accepting new work; `shutdown()`
/// additionally waits (bounded by a timeout) for the worker to drain
/// and exit.
pub struct EventBus<T> {
    name: String,
    queue: Arc<BoundedQueue<T>>,
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
    metrics: Arc<TopicMetrics>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Spawns a new topic with the given queue `capacity`, running
    /// `handler` on its dedicated worker. `handler` returning `Err`
    /// counts as failed; it must not itself panic-unsafely capture
    /// state it needs after an `Err` since the worker discards the
    /// payload either way.
    pub fn spawn<F>(name: impl Into<String>, capacity: usize, mut handler: F) -> Self
    where
        F: FnMut(T) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let name = name.into();
        let queue: Arc<BoundedQueue<T>> = Arc::new(BoundedQueue::new(capacity));
        let notify = Arc::new(Notify::new());
        let closed = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(TopicMetrics::new());

        let worker_queue = queue.clone();
        let worker_notify = notify.clone();
        let worker_closed = closed.clone();
        let worker_metrics = metrics.clone();
        let worker_name = name.clone();

        let worker = tokio::spawn(async move {
            loop {
                // Drain everything currently queued before waiting again;
                // a single notify_one can represent many publishes.
                while let Some(payload) = worker_queue.try_pop() {
                    worker_metrics.incr_scheduled();
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        handler(payload)
                    }));
                    match outcome {
                        Ok(Ok(())) => worker_metrics.incr_done(),
                        Ok(Err(err)) => {
                            tracing::warn!(topic = %worker_name, error = %err, "handler failed");
                            worker_metrics.incr_failed();
                        }
                        Err(_) => {
                            tracing::error!(topic = %worker_name, "handler panicked");
                            worker_metrics.incr_failed();
                        }
                    }
                }

                if worker_closed.load(Ordering::Acquire) && worker_queue.is_empty() {
                    break;
                }
                worker_notify.notified().await;
            }
        });

        Self {
            name,
            queue,
            notify,
            closed,
            metrics,
            worker: Some(worker),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &TopicMetrics {
        &self.metrics
    }

    /// Enqueues `payload`. Fails with [`BusError::Closed`] after
    /// `close()`, or [`BusError::Full`] once the topic's backlog is at
    /// capacity.
    pub fn try_publish(&self, payload: T) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed(self.name.clone()));
        }
        match self.queue.try_push(payload) {
            PushResult::Ok => {
                self.metrics.incr_queued();
                self.notify.notify_one();
                Ok(())
            }
            PushResult::Backpressure(_) => Err(BusError::Full(self.name.clone())),
        }
    }

    /// Stops accepting new work. Already-queued payloads still drain.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the topic and waits up to `drain_timeout` for the worker
    /// to finish draining and exit (§5 cancellation/timeouts).
    pub async fn shutdown(mut self, drain_timeout: Duration) -> Result<(), BusError> {
        self.close();
        if let Some(handle) = self.worker.take() {
            match tokio::time::timeout(drain_timeout, handle).await {
                Ok(_) => Ok(()),
                Err(_) => Err(BusError::DrainTimeout(self.name.clone())),
            }
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    #[tokio::test]
    async fn handlers_run_in_enqueue_order() {
        let seen: Arc<parking_lot::Mutex<Vec<u64>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let bus = EventBus::spawn("test", 16, move |payload: u64| {
            seen2.lock().push(payload);
            Ok(())
        });
        for i in 0..5 {
            bus.try_publish(i).unwrap();
        }
        bus.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn handler_error_counts_as_failed_not_propagated() {
        let bus: EventBus<u64> = EventBus::spawn("test-fail", 16, |_payload| {
            Err("boom".into())
        });
        bus.try_publish(1).unwrap();
        bus.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn publish_after_close_is_rejected() {
        let bus: EventBus<u64> = EventBus::spawn("test-closed", 4, |_| Ok(()));
        bus.close();
        let err = bus.try_publish(1).unwrap_err();
        assert!(matches!(err, BusError::Closed(_)));
    }

    #[tokio::test]
    async fn metrics_count_queued_scheduled_done_and_failed() {
        let counter = Arc::new(AtomicU64::new(0));
        let counter2 = counter.clone();
        let bus = EventBus::spawn("test-metrics", 8, move |payload: u64| {
            counter2.fetch_add(payload, Ordering::Relaxed);
            if payload == 2 {
                Err("odd one out".into())
            } else {
                Ok(())
            }
        });
        for i in 0..3u64 {
            bus.try_publish(i).unwrap();
        }
        // Give the worker a moment to drain before asserting.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(bus.metrics().queued(), 3);
        assert_eq!(bus.metrics().done(), 2);
        assert_eq!(bus.metrics().failed(), 1);
        bus.shutdown(Duration::from_secs(1)).await.unwrap();
    }
}
