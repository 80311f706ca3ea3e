use crate::{ContainerId, DatanodeId};

/// Replication state of a single replica, as last reported by its
/// hosting datanode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReplicaState {
    Open,
    Closing,
    QuasiClosed,
    Closed,
    /// Corrupt or otherwise unusable; never counted toward in-service
    /// redundancy.
    Unhealthy,
    /// Failed to parse or validate; dropped by the reconciler before it
    /// ever reaches the counter.
    Invalid,
}

impl ReplicaState {
    pub fn is_healthy(self) -> bool {
        !matches!(self, ReplicaState::Unhealthy | ReplicaState::Invalid)
    }

    /// Whether a datanode reporting this state has surfaced usable data
    /// worth resurrecting a DELETING/DELETED container for (§4.7).
    pub fn implies_live_data(self) -> bool {
        matches!(self, ReplicaState::Closed | ReplicaState::QuasiClosed)
    }
}

/// Compression codec used when streaming a replica to a new target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompressionType {
    NoCompression,
    Gzip,
    Zstd,
    Snappy,
}

/// A single physical copy of a container on a specific datanode, as
/// reported by that datanode. Immutable: every transition (state
/// change, updated counts) produces a new `Replica`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Replica {
    pub container_id: ContainerId,
    pub datanode_id: DatanodeId,
    /// The datanode that originally accepted writes for this replica's
    /// content. Two replicas with the same origin share content; a
    /// container with multiple distinct origins is quasi-closed-stuck.
    pub origin_datanode_id: DatanodeId,
    pub state: ReplicaState,
    /// Monotone per-(container, datanode) sequence number; used to
    /// reject reports older than the last one recorded (§7 kind 3).
    pub sequence_id: u64,
    pub bytes_used: u64,
    pub key_count: u64,
    /// EC index for erasure-coded containers; `None` for Ratis-3
    /// replicas, which are grouped by origin instead.
    pub ec_index: Option<u8>,
}

impl Replica {
    pub fn new(
        container_id: ContainerId,
        datanode_id: DatanodeId,
        origin_datanode_id: DatanodeId,
        state: ReplicaState,
    ) -> Self {
        Self {
            container_id,
            datanode_id,
            origin_datanode_id,
            state,
            sequence_id: 0,
            bytes_used: 0,
            key_count: 0,
            ec_index: None,
        }
    }

    #[must_use]
    pub fn with_ec_index(mut self, index: u8) -> Self {
        self.ec_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence_id: u64) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    #[must_use]
    pub fn with_counts(mut self, bytes_used: u64, key_count: u64) -> Self {
        self.bytes_used = bytes_used;
        self.key_count = key_count;
        self
    }

    #[must_use]
    pub fn with_state(&self, state: ReplicaState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
