//! # ozone-repl-bus
//!
//! Single-thread-per-topic event bus and executor (§4.1, §5). Each
//! topic is a [`EventBus`] serializing handler invocations over a
//! bounded FIFO backlog ([`queue::BoundedQueue`]), with monotone
//! `queued`/`scheduled`/`done`/`failed` counters ([`metrics::TopicMetrics`]).
//!
//! This replaces the inheritance-hierarchy `EventExecutor<P>` pattern
//! (§9 design notes) with a value type: an executor is just a
//! `submit`/`publish` method plus counters, constructed once per
//! topic rather than subclassed.

pub mod executor;
pub mod metrics;
pub mod queue;

pub use executor::{BusError, EventBus};
pub use metrics::TopicMetrics;
pub use queue::{BoundedQueue, PushResult};
