//! Read-only cluster snapshots and the reconciler that keeps them
//! up to date from incoming reports (§4.7).
//!
//! The manager loop never holds a back-reference to a container or
//! node manager (§9 "cyclic references"): it only ever sees an
//! [`Arc<ClusterSnapshot>`] taken once per cycle. [`ClusterState`] is
//! the one mutable side of this boundary, guarded by a single lock
//! so a report-ingest call and a cycle's snapshot never tear.

use std::collections::HashMap;
use std::sync::Arc;

use ozone_repl_types::{Container, ContainerId, ContainerState, Datanode, DatanodeId, Replica, ReplicaState};
use parking_lot::RwLock;

use crate::error::Error;

/// An immutable view of containers, their replicas, and known
/// datanodes, as of the moment it was taken.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub containers: HashMap<ContainerId, Container>,
    pub replicas: HashMap<ContainerId, Vec<Replica>>,
    pub nodes: HashMap<DatanodeId, Datanode>,
}

impl ClusterSnapshot {
    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.containers.keys().copied().collect()
    }

    pub fn replicas_for(&self, container_id: ContainerId) -> &[Replica] {
        self.replicas
            .get(&container_id)
            .map_or(&[], Vec::as_slice)
    }
}

/// A single `(containerID, replicaState, originID, keyCount, bytesUsed,
/// sequenceID)` tuple from a container report (§6).
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub container_id: ContainerId,
    pub state: ReplicaState,
    pub origin_datanode_id: DatanodeId,
    pub key_count: u64,
    pub bytes_used: u64,
    pub sequence_id: u64,
}

/// The mutable store backing [`ClusterSnapshot`]s: containers,
/// per-container replica lists, known datanodes, and the last
/// recorded sequence number per `(container, datanode)` pair used to
/// reject stale reports (§7 kind 3).
pub struct ClusterState {
    snapshot: RwLock<Arc<ClusterSnapshot>>,
    recorded_sequence: RwLock<HashMap<(ContainerId, DatanodeId), u64>>,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterState {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(ClusterSnapshot::default())),
            recorded_sequence: RwLock::new(HashMap::new()),
        }
    }

    /// Takes a cheap, immutable snapshot for the current cycle to read.
    pub fn snapshot(&self) -> Arc<ClusterSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn upsert_node(&self, node: Datanode) {
        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();
        next.nodes.insert(node.id, node);
        *guard = Arc::new(next);
    }

    pub fn upsert_container(&self, container: Container) {
        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();
        next.containers.insert(container.id, container);
        *guard = Arc::new(next);
    }

    /// Applies one entry from a `CONTAINER_REPORT`/`INCREMENTAL_CONTAINER_REPORT`
    /// event (§4.7, §6). Returns `Ok(())` when the entry was applied
    /// (including the no-op case where it carried no new information),
    /// or the `Error` kind that caused it to be dropped.
    pub fn apply_report_entry(
        &self,
        reporting_datanode: DatanodeId,
        entry: ReportEntry,
    ) -> Result<(), Error> {
        if entry.state == ReplicaState::Invalid {
            return Err(Error::InvalidReport {
                container_id: entry.container_id,
                reason: "replica state failed validation".to_string(),
            });
        }

        {
            let mut recorded = self.recorded_sequence.write();
            let key = (entry.container_id, reporting_datanode);
            if let Some(&last) = recorded.get(&key) {
                if entry.sequence_id < last {
                    return Err(Error::StaleReport {
                        container_id: entry.container_id,
                        reported: entry.sequence_id,
                        recorded: last,
                    });
                }
            }
            recorded.insert(key, entry.sequence_id);
        }

        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();

        if let Some(container) = next.containers.get(&entry.container_id).cloned() {
            if container.state.is_presumed_deleted()
                && (entry.key_count > 0 || entry.state.implies_live_data())
            {
                tracing::info!(
                    container_id = %entry.container_id,
                    from_state = ?container.state,
                    "resurrecting container: live data reported after deletion"
                );
                next.containers
                    .insert(entry.container_id, container.with_state(ContainerState::Closed));
            }
        }

        let replica = Replica::new(
            entry.container_id,
            reporting_datanode,
            entry.origin_datanode_id,
            entry.state,
        )
        .with_sequence(entry.sequence_id)
        .with_counts(entry.bytes_used, entry.key_count);

        let bucket = next.replicas.entry(entry.container_id).or_default();
        match bucket
            .iter()
            .position(|r| r.datanode_id == reporting_datanode)
        {
            Some(idx) => bucket[idx] = replica,
            None => bucket.push(replica),
        }

        *guard = Arc::new(next);
        Ok(())
    }

    /// Whether `datanode_id` is still allowed to receive new placements
    /// (§4.7: decommissioned nodes are excluded from future placement
    /// even though their existing reports still count for presence).
    pub fn accepts_new_placements(&self, datanode_id: DatanodeId) -> bool {
        self.snapshot
            .read()
            .nodes
            .get(&datanode_id)
            .is_some_and(|n| n.persisted_op_state.accepts_new_placements())
    }
}
