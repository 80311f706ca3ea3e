//! # ozone-repl-core
//!
//! The classification and planning half of the replication control
//! plane: given a container's replicas and the node manager's view of
//! the datanodes hosting them, decide whether the container is
//! correctly replicated and, if not, what to do about it.
//!
//! - [`counter`]: the Ratis-3 replica counter (single-origin and
//!   quasi-closed-stuck multi-origin).
//! - [`ec`]: the erasure-coded variant, classified by chunk index
//!   instead of origin.
//! - [`evaluator`]: lifts a container's classification into a
//!   [`HealthStatus`](evaluator::HealthStatus).
//! - [`planner`]: turns a non-OK health status into concrete source/target
//!   datanode selections.

pub mod counter;
pub mod ec;
pub mod evaluator;
pub mod planner;

use std::collections::HashMap;

use ozone_repl_types::{Datanode, DatanodeId, OpState};

/// Looks up a datanode's current operational state by id.
///
/// The replica model (§3) does not carry operational state on the
/// replica itself — that lives on the datanode, as tracked by the node
/// manager — so every classification function needs a lookup like this
/// to join a replica to its host's current state.
pub trait NodeOpStateLookup {
    fn op_state(&self, id: DatanodeId) -> Option<OpState>;
}

impl NodeOpStateLookup for HashMap<DatanodeId, Datanode> {
    fn op_state(&self, id: DatanodeId) -> Option<OpState> {
        self.get(&id).map(|n| n.persisted_op_state)
    }
}

impl NodeOpStateLookup for HashMap<DatanodeId, OpState> {
    fn op_state(&self, id: DatanodeId) -> Option<OpState> {
        self.get(&id).copied()
    }
}
