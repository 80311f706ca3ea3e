//! Outbound commands and the dispatcher collaborator interface (§4.8, §6).

use ozone_repl_types::{CompressionType, ContainerId, DatanodeId};

/// A command emitted by the manager loop toward a datanode.
///
/// The dispatcher is opaque to the core: the core only requires that
/// accepted commands are either delivered, or their non-delivery
/// eventually surfaces as a replica still missing in a later report.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `REPLICATE(containerID, sourceDN, targetDN, compression)`.
    ReplicateContainer {
        container_id: ContainerId,
        source: DatanodeId,
        target: DatanodeId,
        compression: CompressionType,
    },

    /// `DELETE_REPLICA(containerID, targetDN)`.
    DeleteReplica {
        container_id: ContainerId,
        target: DatanodeId,
    },

    /// `CLOSE_CONTAINER(containerID, targetDN)`.
    CloseContainer {
        container_id: ContainerId,
        target: DatanodeId,
    },
}

impl Command {
    /// The datanode this command is addressed to.
    pub fn target(&self) -> DatanodeId {
        match self {
            Command::ReplicateContainer { target, .. }
            | Command::DeleteReplica { target, .. }
            | Command::CloseContainer { target, .. } => *target,
        }
    }

    pub fn container_id(&self) -> ContainerId {
        match self {
            Command::ReplicateContainer { container_id, .. }
            | Command::DeleteReplica { container_id, .. }
            | Command::CloseContainer { container_id, .. } => *container_id,
        }
    }

    /// Destructive commands are suppressed during the safe-mode exit
    /// window (§4.6) and deferred rather than dropped.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Command::DeleteReplica { .. })
    }
}

/// Push API a collaborator must implement to receive dispatched
/// commands. The core requires only that dispatch is fire-and-forget
/// and tolerant of duplicates (idempotence lives on the receiving
/// side) — it never blocks on delivery confirmation.
pub trait CommandDispatcher: Send + Sync {
    /// Accepts a command for delivery to `datanode_id`. Returning
    /// `Err` marks this as a transient source error (§7 kind 1); the
    /// manager retries the same command next cycle rather than
    /// treating it as fatal.
    fn send(&self, datanode_id: DatanodeId, command: Command) -> Result<(), DispatchError>;
}

/// A dispatcher refused a command outright (queue full, sink closed).
/// Distinct from delivery failure, which the dispatcher itself must
/// surface later via a container report showing the replica still
/// missing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("dispatcher refused command for {datanode_id}: {reason}")]
pub struct DispatchError {
    pub datanode_id: DatanodeId,
    pub reason: String,
}
