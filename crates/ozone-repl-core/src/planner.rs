//! Move / placement planner (§4.5): turns a mis-replicated group into
//! concrete source/target datanode selections. Deterministic given the
//! same container, replica set, and node manager snapshot — two
//! independent evaluations of the same state always emit the same
//! plan, which is what makes retries after a dropped command safe.

use std::collections::{HashMap, HashSet};

use ozone_repl_types::{ContainerId, Datanode, DatanodeId, MisReplicatedOrigin};

/// A concrete plan for one mis-replicated group: either grow it by
/// copying from `source` to `targets`, or shrink it by removing
/// `victims`.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Replicate {
        source: DatanodeId,
        targets: Vec<DatanodeId>,
    },
    Delete {
        victims: Vec<DatanodeId>,
    },
}

/// Datanode placement constraints the planner must honor in addition
/// to the raw in-service/healthy filter.
#[derive(Debug, Clone, Copy)]
pub struct PlacementPolicy {
    /// Datanodes at or above this utilization are never selected as
    /// new replication targets.
    pub utilization_threshold: f64,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            utilization_threshold: 0.9,
        }
    }
}

/// Plans work for one mis-replicated group.
///
/// `container_hosts` is the set of datanodes already hosting *any*
/// replica of this container (across all origins/indices) — a new
/// target must avoid all of them, not just the ones in `group`.
/// `container_racks` is the set of racks already occupied by an
/// in-service replica of this container.
pub fn plan_group(
    _container_id: ContainerId,
    group: &MisReplicatedOrigin,
    container_hosts: &HashSet<DatanodeId>,
    container_racks: &HashSet<String>,
    nodes: &HashMap<DatanodeId, Datanode>,
    policy: PlacementPolicy,
) -> Option<Plan> {
    if group.replica_delta > 0 {
        plan_replicate(group, container_hosts, container_racks, nodes, policy)
    } else if group.replica_delta < 0 {
        plan_delete(group, nodes)
    } else {
        None
    }
}

fn plan_replicate(
    group: &MisReplicatedOrigin,
    container_hosts: &HashSet<DatanodeId>,
    container_racks: &HashSet<String>,
    nodes: &HashMap<DatanodeId, Datanode>,
    policy: PlacementPolicy,
) -> Option<Plan> {
    let source = pick_source(group, nodes)?;
    let needed = group.replica_delta as usize;

    let mut candidates: Vec<&Datanode> = nodes
        .values()
        .filter(|n| n.is_in_service_and_healthy())
        .filter(|n| !container_hosts.contains(&n.id))
        .filter(|n| !container_racks.contains(&n.rack))
        .filter(|n| n.utilization < policy.utilization_threshold)
        .collect();
    candidates.sort_by(|a, b| {
        a.utilization
            .partial_cmp(&b.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut targets = Vec::with_capacity(needed);
    let mut used_racks: HashSet<String> = HashSet::new();
    for node in candidates {
        if targets.len() == needed {
            break;
        }
        if used_racks.contains(&node.rack) {
            continue;
        }
        used_racks.insert(node.rack.clone());
        targets.push(node.id);
    }

    if targets.is_empty() {
        None
    } else {
        Some(Plan::Replicate { source, targets })
    }
}

/// Prefers an in-service, healthy source; falls back to an
/// in-maintenance replica as a read-only source if no in-service copy
/// remains (§4.5). Ties broken by lowest utilization then lowest id.
fn pick_source(group: &MisReplicatedOrigin, nodes: &HashMap<DatanodeId, Datanode>) -> Option<DatanodeId> {
    let best = |filter: &dyn Fn(&Datanode) -> bool| -> Option<DatanodeId> {
        group
            .sources
            .iter()
            .filter_map(|r| nodes.get(&r.datanode_id))
            .filter(|n| filter(n))
            .min_by(|a, b| {
                a.utilization
                    .partial_cmp(&b.utilization)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|n| n.id)
    };

    best(&|n| n.is_in_service_and_healthy()).or_else(|| {
        best(&|n| n.persisted_op_state.is_maintenance() && n.health_state.is_healthy())
    })
}

/// Selects `|delta|` in-service victims, preferring the most
/// over-utilized node first. Maintenance copies are never chosen as
/// victims (over-replication ignores them entirely, §4.2).
fn plan_delete(group: &MisReplicatedOrigin, nodes: &HashMap<DatanodeId, Datanode>) -> Option<Plan> {
    let to_remove = (-group.replica_delta) as usize;

    let mut in_service: Vec<&Datanode> = group
        .sources
        .iter()
        .filter_map(|r| nodes.get(&r.datanode_id))
        .filter(|n| n.persisted_op_state.is_in_service())
        .collect();
    in_service.sort_by(|a, b| {
        b.utilization
            .partial_cmp(&a.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let victims: Vec<DatanodeId> = in_service.into_iter().take(to_remove).map(|n| n.id).collect();
    if victims.is_empty() {
        None
    } else {
        Some(Plan::Delete { victims })
    }
}
