//! Health evaluator (§4.4): lifts a container's replica classification
//! into one of `OK`, `UnderReplicated`, `OverReplicated`, `MisPlaced`,
//! or `Unrecoverable`, in that priority order so a container that is
//! both under-replicated and mis-placed is reported as under-replicated
//! first — fixing the count takes priority over fixing placement.

use std::collections::HashMap;

use ozone_repl_types::{Container, ContainerState, Datanode, DatanodeId, GroupKey, MisReplicatedOrigin, Replica};

use crate::{counter, ec};

/// A group of replicas that satisfy their replica-count target but
/// violate the placement policy (two or more share a failure domain).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MisPlacedGroup {
    pub key: GroupKey,
    pub sources: Vec<Replica>,
}

/// The outcome of evaluating one container's replication health.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum HealthStatus {
    Ok,
    UnderReplicated(Vec<MisReplicatedOrigin>),
    OverReplicated(Vec<MisReplicatedOrigin>),
    MisPlaced(Vec<MisPlacedGroup>),
    /// No healthy source exists to copy from for a group that needs
    /// more replicas — nothing the planner can do until a datanode
    /// surfaces a usable copy (see the reconciler's resurrection rule,
    /// §4.7).
    Unrecoverable,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}

/// Evaluates one container's replication health given its current
/// replica set and the node manager's view of the hosting datanodes.
///
/// Containers not yet eligible for replication management (`OPEN`,
/// `CLOSING`, `DELETING`, `DELETED`) are always `OK` — the manager loop
/// is expected to have already filtered these out, but the evaluator
/// is defensive about it since `OK` is always a safe answer for a
/// container it has no business touching.
pub fn evaluate(
    container: &Container,
    replicas: &[Replica],
    nodes: &HashMap<DatanodeId, Datanode>,
    min_healthy_for_maintenance: usize,
) -> HealthStatus {
    if !container.state.is_replication_candidate() {
        return HealthStatus::Ok;
    }

    let groups = match container.scheme {
        ozone_repl_types::ReplicationScheme::Ratis3 => {
            counter::classify_groups(replicas, nodes, min_healthy_for_maintenance)
        }
        ozone_repl_types::ReplicationScheme::Ec { .. } => {
            ec::classify_groups(container.scheme, replicas, nodes, min_healthy_for_maintenance)
        }
    };

    let under: Vec<_> = groups
        .iter()
        .filter(|g| g.is_under_replicated())
        .cloned()
        .collect();
    let over: Vec<_> = groups
        .iter()
        .filter(|g| g.is_over_replicated())
        .cloned()
        .collect();

    // An empty-sources group (an EC index with no reported replica at
    // all) is recoverable by reconstruction from the other indices, not
    // unrecoverable — that verdict is reserved for a group that *has*
    // reported replicas but every one of them is unhealthy.
    if under
        .iter()
        .any(|g| !g.sources.is_empty() && !g.has_healthy_replicas())
    {
        return HealthStatus::Unrecoverable;
    }
    if !under.is_empty() {
        return HealthStatus::UnderReplicated(under);
    }
    if !over.is_empty() {
        return HealthStatus::OverReplicated(over);
    }

    let misplaced = find_misplaced(&groups, nodes);
    if !misplaced.is_empty() {
        return HealthStatus::MisPlaced(misplaced);
    }

    // Closed container whose classifier found no origins at all (every
    // replica failed to report, or the container manager has no
    // replicas on record) is unrecoverable rather than silently OK.
    if groups.is_empty() && container.state == ContainerState::Closed {
        return HealthStatus::Unrecoverable;
    }

    HealthStatus::Ok
}

/// A group is mis-placed when it already satisfies its count target
/// but two or more of its in-service sources share a rack.
fn find_misplaced(
    groups: &[MisReplicatedOrigin],
    nodes: &HashMap<DatanodeId, Datanode>,
) -> Vec<MisPlacedGroup> {
    groups
        .iter()
        .filter(|g| g.replica_delta == 0)
        .filter_map(|g| {
            let mut racks = std::collections::HashSet::new();
            let mut duplicate_rack = false;
            for source in &g.sources {
                let Some(node) = nodes.get(&source.datanode_id) else {
                    continue;
                };
                if !node.persisted_op_state.is_in_service() {
                    continue;
                }
                if !racks.insert(node.rack.clone()) {
                    duplicate_rack = true;
                }
            }
            if duplicate_rack {
                Some(MisPlacedGroup {
                    key: g.key,
                    sources: g.sources.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}
