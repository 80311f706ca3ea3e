use crate::ContainerId;

/// How a container's data is replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReplicationScheme {
    /// Classic Ratis-based triple replication, steady state 3 in-service
    /// copies per origin (or 2 per origin once the container is
    /// quasi-closed-stuck with divergent origins).
    Ratis3,

    /// Erasure-coded replication with `data` data chunks and `parity`
    /// parity chunks; every one of `data + parity` indices needs a
    /// distinct healthy replica.
    Ec { data: u8, parity: u8 },
}

impl ReplicationScheme {
    /// Total number of data+parity indices for an EC scheme.
    pub fn ec_width(self) -> Option<u8> {
        match self {
            ReplicationScheme::Ratis3 => None,
            ReplicationScheme::Ec { data, parity } => Some(data + parity),
        }
    }
}

/// Lifecycle state of a container, owned exclusively by the container
/// manager; the replication core only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ContainerState {
    Open,
    Closing,
    QuasiClosed,
    Closed,
    Deleting,
    Deleted,
}

impl ContainerState {
    /// Whether this state can still be "resurrected" back to `Closed` by
    /// a non-empty replica report (see the reconciler, §4.7).
    pub fn is_presumed_deleted(self) -> bool {
        matches!(self, ContainerState::Deleting | ContainerState::Deleted)
    }

    /// Whether the replication loop should classify and dispatch work
    /// for containers in this state at all.
    pub fn is_replication_candidate(self) -> bool {
        matches!(self, ContainerState::QuasiClosed | ContainerState::Closed)
    }
}

/// A container: the unit of replication, a fixed-size shard of object data.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub scheme: ReplicationScheme,
    pub state: ContainerState,
    /// Monotone sequence number owned by the SCM; used to reject stale
    /// reports racing a concurrent state transition.
    pub owner_scm_sequence: u64,
}

impl Container {
    pub fn new(id: ContainerId, scheme: ReplicationScheme, state: ContainerState) -> Self {
        Self {
            id,
            scheme,
            state,
            owner_scm_sequence: 0,
        }
    }

    /// Returns a copy of this container with the lifecycle state
    /// transitioned, bumping the owner sequence number.
    #[must_use]
    pub fn with_state(&self, state: ContainerState) -> Self {
        Self {
            state,
            owner_scm_sequence: self.owner_scm_sequence + 1,
            ..self.clone()
        }
    }
}
