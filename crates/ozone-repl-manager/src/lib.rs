//! # ozone-repl-manager
//!
//! The Replication Manager event loop (§4.6), the container-report
//! reconciler (§4.7), and the command dispatcher collaborator
//! interface (§4.8). This crate wires [`ozone_repl_core`]'s
//! classification and placement logic to a real tick/notify loop
//! built on [`ozone_repl_bus`]'s single-thread-per-topic model.

mod command;
mod error;
mod ingest;
mod manager;
mod metrics;
mod state;

pub use command::{Command, CommandDispatcher, DispatchError};
pub use error::{Error, Result};
pub use ingest::{ReportBatch, ReportIngestTopic};
pub use manager::{DrainOutcome, LoopState, ManagerHandle, ReplicationManager};
pub use metrics::ManagerMetrics;
pub use state::{ClusterSnapshot, ClusterState, ReportEntry};

#[cfg(test)]
mod tests;
