//! Error kinds for the Replication Manager (§7).

use ozone_repl_types::ContainerId;
use thiserror::Error;

/// The five error kinds named in §7. None of these propagate out of
/// the manager loop: each is caught, logged, and counted at its
/// origin so one bad container cannot poison the cycle.
#[derive(Debug, Error)]
pub enum Error {
    /// Kind 1: dispatcher refused a command; retried next cycle.
    #[error("transient dispatch failure for container {container_id}: {reason}")]
    TransientDispatch {
        container_id: ContainerId,
        reason: String,
    },

    /// Kind 2: malformed report (negative counts, unknown state); drop and count.
    #[error("invalid report for container {container_id}: {reason}")]
    InvalidReport {
        container_id: ContainerId,
        reason: String,
    },

    /// Kind 3: `sequenceID` older than recorded; dropped silently save for counters.
    #[error("stale report for container {container_id}: sequence {reported} < recorded {recorded}")]
    StaleReport {
        container_id: ContainerId,
        reported: u64,
        recorded: u64,
    },

    /// Kind 4: zero usable sources; logged at WARN, revisited each cycle.
    #[error("unrecoverable container {container_id}: no healthy source replica")]
    Unrecoverable { container_id: ContainerId },

    /// Kind 5: internal invariant violation (e.g. over-replication with
    /// negative delta); logged at ERROR, this container is skipped.
    #[error("invariant violation for container {container_id}: {reason}")]
    InvariantViolation {
        container_id: ContainerId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
