//! Bounded FIFO backlog for one event bus topic.
//!
//! Uses `crossbeam-queue::ArrayQueue` for a lock-free, bounded MPSC
//! queue. When the queue is full, `try_push` returns the item back to
//! the caller to signal backpressure instead of growing without bound.

use crossbeam_queue::ArrayQueue;

/// Result of attempting to push to a full queue.
#[derive(Debug)]
pub enum PushResult<T> {
    /// Item was successfully enqueued.
    Ok,
    /// Queue is full. Returns the item for the caller to handle.
    Backpressure(T),
}

/// A bounded, lock-free queue with backpressure signaling.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: ArrayQueue<T>,
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Attempts to push an item onto the queue.
    pub fn try_push(&self, item: T) -> PushResult<T> {
        match self.inner.push(item) {
            Ok(()) => PushResult::Ok,
            Err(item) => PushResult::Backpressure(item),
        }
    }

    /// Attempts to pop an item from the queue.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_push_pop() {
        let q = BoundedQueue::new(3);
        assert!(matches!(q.try_push(1), PushResult::Ok));
        assert!(matches!(q.try_push(2), PushResult::Ok));
        assert!(matches!(q.try_push(3), PushResult::Ok));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn backpressure_when_full() {
        let q = BoundedQueue::new(2);
        assert!(matches!(q.try_push(1), PushResult::Ok));
        assert!(matches!(q.try_push(2), PushResult::Ok));
        match q.try_push(3) {
            PushResult::Backpressure(v) => assert_eq!(v, 3),
            PushResult::Ok => panic!("expected backpressure"),
        }
    }

    #[test]
    #[should_panic(expected = "queue capacity must be positive")]
    fn zero_capacity_panics() {
        let _q: BoundedQueue<i32> = BoundedQueue::new(0);
    }
}
