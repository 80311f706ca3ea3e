use crate::DatanodeId;

/// Operational state of a datanode, set administratively (decommission,
/// maintenance) and persisted by the node manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OpState {
    InService,
    EnteringMaintenance,
    InMaintenance,
    Decommissioning,
    Decommissioned,
}

impl OpState {
    pub fn is_in_service(self) -> bool {
        matches!(self, OpState::InService)
    }

    pub fn is_maintenance(self) -> bool {
        matches!(self, OpState::EnteringMaintenance | OpState::InMaintenance)
    }

    /// Whether a datanode in this state is eligible to receive new
    /// replica placements (planner sources, §4.5).
    pub fn accepts_new_placements(self) -> bool {
        matches!(self, OpState::InService)
    }
}

/// Liveness state of a datanode, derived from heartbeat recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HealthState {
    Healthy,
    Stale,
    Dead,
}

impl HealthState {
    pub fn is_healthy(self) -> bool {
        matches!(self, HealthState::Healthy)
    }
}

/// A datanode in the cluster, as known to the node manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Datanode {
    pub id: DatanodeId,
    pub host: String,
    /// Failure domain identifier (rack); the planner avoids placing two
    /// replicas of the same container in the same rack.
    pub rack: String,
    pub persisted_op_state: OpState,
    pub health_state: HealthState,
    /// Fraction of storage capacity used, in `[0.0, 1.0]`; the planner
    /// prefers lower-utilization targets and higher-utilization victims.
    pub utilization: f64,
}

impl Datanode {
    pub fn new(id: DatanodeId, host: impl Into<String>, rack: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            rack: rack.into(),
            persisted_op_state: OpState::InService,
            health_state: HealthState::Healthy,
            utilization: 0.0,
        }
    }

    /// Whether this node is a valid target for new replica placement:
    /// in service and healthy.
    pub fn is_in_service_and_healthy(&self) -> bool {
        self.persisted_op_state.is_in_service() && self.health_state.is_healthy()
    }
}
