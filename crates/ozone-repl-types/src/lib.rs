//! # ozone-repl-types
//!
//! Core data model for the container replication control plane:
//! - Entity IDs ([`ContainerId`], [`DatanodeId`])
//! - Replication scheme ([`ReplicationScheme`])
//! - Lifecycle/operational state enums ([`ContainerState`], [`ReplicaState`], [`OpState`], [`HealthState`])
//! - Aggregate records ([`Container`], [`Replica`], [`Datanode`])
//! - Per-group replication deltas ([`GroupKey`], [`MisReplicatedOrigin`])
//!
//! Containers and replicas are modeled as immutable value records: every
//! state transition produces a new value rather than mutating one in place,
//! so the replication core never has to reason about a report being
//! mutated out from under it mid-cycle.

mod container;
mod datanode;
mod misreplicated;
mod replica;

pub use container::{Container, ContainerState, ReplicationScheme};
pub use datanode::{Datanode, HealthState, OpState};
pub use misreplicated::{GroupKey, MisReplicatedOrigin};
pub use replica::{CompressionType, Replica, ReplicaState};

use std::fmt;

/// Unique identifier for a container (a fixed-size shard of object data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ContainerId(u64);

impl ContainerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container-{}", self.0)
    }
}

impl From<u64> for ContainerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ContainerId> for u64 {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

/// Unique identifier for a datanode in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DatanodeId(u64);

impl DatanodeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatanodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dn-{}", self.0)
    }
}

impl From<u64> for DatanodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<DatanodeId> for u64 {
    fn from(id: DatanodeId) -> Self {
        id.0
    }
}
