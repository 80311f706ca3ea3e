//! Ratis-3 replica counting (§4.2): given the replicas of a single
//! container, grouped by origin, decide whether each origin-group is
//! under- or over-replicated.
//!
//! A container with a single origin targets 3 in-service replicas. A
//! quasi-closed-stuck container — one with multiple divergent origins
//! that can never be merged by copying — targets 2 in-service replicas
//! *per origin*, since the origins can't be pooled into one quorum.

use std::collections::BTreeMap;

use ozone_repl_types::{DatanodeId, GroupKey, MisReplicatedOrigin, Replica};

use crate::NodeOpStateLookup;

const SINGLE_ORIGIN_TARGET: usize = 3;
const MULTI_ORIGIN_TARGET: usize = 2;

/// Classifies every origin group in `replicas` against the Ratis-3
/// target, returning one [`MisReplicatedOrigin`] per origin whose
/// `replica_delta` is non-zero.
///
/// `replicas` must all belong to the same container. Origins are
/// distinguished by the `single_origin` flag the caller computes from
/// the container's lifecycle classification — the steady-state target
/// is 3 when there is exactly one origin and 2 per origin once the
/// container is quasi-closed-stuck with more than one.
pub fn classify(
    replicas: &[Replica],
    nodes: &impl NodeOpStateLookup,
    min_healthy_for_maintenance: usize,
) -> Vec<MisReplicatedOrigin> {
    classify_groups(replicas, nodes, min_healthy_for_maintenance)
        .into_iter()
        .filter(|g| g.replica_delta != 0)
        .collect()
}

/// Like [`classify`] but returns one group per origin regardless of
/// whether it is mis-replicated — used by the health evaluator to
/// detect mis-placement among origins that already satisfy their
/// replica-count target.
pub fn classify_groups(
    replicas: &[Replica],
    nodes: &impl NodeOpStateLookup,
    min_healthy_for_maintenance: usize,
) -> Vec<MisReplicatedOrigin> {
    let groups = group_by_origin(replicas);
    let single_origin = groups.len() <= 1;
    let target = if single_origin {
        SINGLE_ORIGIN_TARGET
    } else {
        MULTI_ORIGIN_TARGET
    };

    groups
        .into_iter()
        .map(|(origin, sources)| {
            let delta = if single_origin {
                single_origin_delta(&sources, nodes, min_healthy_for_maintenance)
            } else {
                multi_origin_delta(&sources, nodes)
            };
            debug_assert!(
                delta.unsigned_abs() as usize <= sources.len().max(target),
                "replica delta {delta} implausible for {} sources (target {target})",
                sources.len()
            );
            MisReplicatedOrigin::new(GroupKey::Origin(origin), sources, delta)
        })
        .collect()
}

/// Groups replicas by `origin_datanode_id`, in a `BTreeMap` so
/// iteration order (and thus the order of the returned plan) is
/// deterministic — §4.4 requires classification output to be stably
/// ordered so retries are idempotent.
fn group_by_origin(replicas: &[Replica]) -> BTreeMap<DatanodeId, Vec<Replica>> {
    let mut groups: BTreeMap<DatanodeId, Vec<Replica>> = BTreeMap::new();
    for replica in replicas {
        groups
            .entry(replica.origin_datanode_id)
            .or_default()
            .push(replica.clone());
    }
    groups
}

/// Counts in-service and maintenance replicas within one origin group,
/// by joining each replica to its host's current operational state.
/// Replicas whose host is unknown to the node manager are excluded
/// from both counts (treated as neither in-service nor maintenance) —
/// a replica the node manager has no record of cannot be trusted as a
/// live copy.
fn count_by_op_state(sources: &[Replica], nodes: &impl NodeOpStateLookup) -> (usize, usize) {
    let mut in_service = 0;
    let mut maintenance = 0;
    for replica in sources {
        match nodes.op_state(replica.datanode_id) {
            Some(op) if op.is_in_service() => in_service += 1,
            Some(op) if op.is_maintenance() => maintenance += 1,
            _ => {}
        }
    }
    (in_service, maintenance)
}

fn single_origin_delta(
    sources: &[Replica],
    nodes: &impl NodeOpStateLookup,
    min_healthy_for_maintenance: usize,
) -> i64 {
    let (in_service, maintenance) = count_by_op_state(sources, nodes);

    if maintenance > 0 && in_service < min_healthy_for_maintenance {
        (min_healthy_for_maintenance - in_service) as i64
    } else if maintenance == 0 && in_service < SINGLE_ORIGIN_TARGET {
        (SINGLE_ORIGIN_TARGET - in_service) as i64
    } else if in_service > SINGLE_ORIGIN_TARGET {
        -((in_service - SINGLE_ORIGIN_TARGET) as i64)
    } else {
        0
    }
}

fn multi_origin_delta(sources: &[Replica], nodes: &impl NodeOpStateLookup) -> i64 {
    let (in_service, maintenance) = count_by_op_state(sources, nodes);

    if in_service < MULTI_ORIGIN_TARGET && maintenance > 0 && in_service == 0 {
        1
    } else if in_service < MULTI_ORIGIN_TARGET && maintenance == 0 {
        (MULTI_ORIGIN_TARGET - in_service) as i64
    } else if in_service > MULTI_ORIGIN_TARGET {
        -((in_service - MULTI_ORIGIN_TARGET) as i64)
    } else {
        0
    }
}
