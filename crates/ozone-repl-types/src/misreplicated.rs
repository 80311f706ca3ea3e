use crate::{DatanodeId, Replica};

/// The key a set of replicas is grouped by for replication counting.
///
/// Ratis-3 containers group by origin (two replicas with the same
/// origin are interchangeable copies of the same content); EC
/// containers have no origin concept and group by chunk index instead
/// (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum GroupKey {
    Origin(DatanodeId),
    EcIndex(u8),
}

/// A single origin/index group's replication delta: positive means
/// more in-service copies of `sources` are needed, negative means that
/// many copies should be deleted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MisReplicatedOrigin {
    pub key: GroupKey,
    pub sources: Vec<Replica>,
    pub replica_delta: i64,
}

impl MisReplicatedOrigin {
    pub fn new(key: GroupKey, sources: Vec<Replica>, replica_delta: i64) -> Self {
        Self {
            key,
            sources,
            replica_delta,
        }
    }

    pub fn is_under_replicated(&self) -> bool {
        self.replica_delta > 0
    }

    pub fn is_over_replicated(&self) -> bool {
        self.replica_delta < 0
    }

    /// `true` iff any source replica is not `Unhealthy`/`Invalid`.
    pub fn has_healthy_replicas(&self) -> bool {
        self.sources.iter().any(|r| r.state.is_healthy())
    }
}
