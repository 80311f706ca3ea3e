//! Erasure-coded replica classification (§4.3), the EC counterpart of
//! [`crate::counter`]. EC containers have no origin concept: every one
//! of the `k + m` data/parity indices needs exactly one distinct
//! healthy, in-service replica. Classification groups by
//! [`ozone_repl_types::GroupKey::EcIndex`] instead of by origin.

use std::collections::BTreeMap;

use ozone_repl_types::{MisReplicatedOrigin, GroupKey, Replica, ReplicationScheme};

use crate::NodeOpStateLookup;

/// Per-index target: exactly one in-service replica covers an index,
/// since EC redundancy already comes from the parity chunks rather
/// than from multiple copies of the same index.
const INDEX_TARGET: usize = 1;

/// Classifies every EC index of `scheme` against `replicas`, returning
/// one [`MisReplicatedOrigin`] per index that is missing (under) or
/// duplicated (over). Indices with no reported replica at all are
/// treated identically to indices whose only replicas are hosted on
/// non-in-service nodes: both are "missing" and under-replicated by 1.
///
/// `min_healthy_for_maintenance` is accepted for interface parity with
/// [`crate::counter::classify`] but is capped to the per-index target
/// of 1: an index can only ever need one more in-service copy, so a
/// maintenance replica alone satisfies it whenever the configured
/// floor is `0`.
pub fn classify(
    scheme: ReplicationScheme,
    replicas: &[Replica],
    nodes: &impl NodeOpStateLookup,
    min_healthy_for_maintenance: usize,
) -> Vec<MisReplicatedOrigin> {
    classify_groups(scheme, replicas, nodes, min_healthy_for_maintenance)
        .into_iter()
        .filter(|g| g.replica_delta != 0)
        .collect()
}

/// Like [`classify`] but returns one group per EC index regardless of
/// whether it is mis-replicated.
pub fn classify_groups(
    scheme: ReplicationScheme,
    replicas: &[Replica],
    nodes: &impl NodeOpStateLookup,
    min_healthy_for_maintenance: usize,
) -> Vec<MisReplicatedOrigin> {
    let width = match scheme.ec_width() {
        Some(w) => w,
        None => return Vec::new(),
    };
    let effective_min = min_healthy_for_maintenance.min(INDEX_TARGET);

    let groups = group_by_index(replicas, width);

    (0..width)
        .map(|index| {
            let sources = groups.get(&index).cloned().unwrap_or_default();
            let delta = index_delta(&sources, nodes, effective_min);
            MisReplicatedOrigin::new(GroupKey::EcIndex(index), sources, delta)
        })
        .collect()
}

fn group_by_index(replicas: &[Replica], width: u8) -> BTreeMap<u8, Vec<Replica>> {
    let mut groups: BTreeMap<u8, Vec<Replica>> = BTreeMap::new();
    for replica in replicas {
        if let Some(index) = replica.ec_index {
            if index < width {
                groups.entry(index).or_default().push(replica.clone());
            }
        }
    }
    groups
}

fn index_delta(sources: &[Replica], nodes: &impl NodeOpStateLookup, effective_min: usize) -> i64 {
    let mut in_service = 0usize;
    let mut maintenance = 0usize;
    for replica in sources {
        match nodes.op_state(replica.datanode_id) {
            Some(op) if op.is_in_service() => in_service += 1,
            Some(op) if op.is_maintenance() => maintenance += 1,
            _ => {}
        }
    }

    if maintenance > 0 && in_service < effective_min {
        (effective_min - in_service) as i64
    } else if maintenance == 0 && in_service < INDEX_TARGET {
        (INDEX_TARGET - in_service) as i64
    } else if in_service > INDEX_TARGET {
        -((in_service - INDEX_TARGET) as i64)
    } else {
        0
    }
}
