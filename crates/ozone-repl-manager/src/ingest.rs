//! The inbound `CONTAINER_REPORT` / `INCREMENTAL_CONTAINER_REPORT`
//! topic (§4.1, §6): a single-worker [`EventBus`] that serializes
//! report application against [`ClusterState`] so concurrent reports
//! from many datanodes never race the reconciler.

use std::sync::Arc;

use ozone_repl_bus::EventBus;
use ozone_repl_types::DatanodeId;

use crate::state::{ClusterState, ReportEntry};

/// One `(datanodeID, entries)` batch as it arrives off the wire.
pub struct ReportBatch {
    pub datanode_id: DatanodeId,
    pub entries: Vec<ReportEntry>,
}

/// Owns the `container-reports` topic. Publishing never blocks on
/// reconciliation: `try_publish` enqueues and returns immediately, and
/// the single worker applies entries in arrival order.
pub struct ReportIngestTopic {
    bus: EventBus<ReportBatch>,
}

impl ReportIngestTopic {
    pub fn spawn(cluster: Arc<ClusterState>, queue_capacity: usize) -> Self {
        let bus = EventBus::spawn("container-reports", queue_capacity, move |batch: ReportBatch| {
            for entry in batch.entries {
                let container_id = entry.container_id;
                if let Err(err) = cluster.apply_report_entry(batch.datanode_id, entry) {
                    tracing::debug!(
                        container_id = %container_id,
                        datanode_id = %batch.datanode_id,
                        error = %err,
                        "dropped report entry"
                    );
                }
            }
            Ok(())
        });
        Self { bus }
    }

    pub fn publish(&self, batch: ReportBatch) -> bool {
        self.bus.try_publish(batch).is_ok()
    }

    pub async fn shutdown(self, drain_timeout: std::time::Duration) {
        let _ = self.bus.shutdown(drain_timeout).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozone_repl_types::{Container, ContainerId, ContainerState, ReplicaState, ReplicationScheme};

    #[tokio::test]
    async fn published_reports_are_applied_in_order() {
        let cluster = Arc::new(ClusterState::new());
        cluster.upsert_container(Container::new(
            ContainerId::new(1),
            ReplicationScheme::Ratis3,
            ContainerState::Closed,
        ));

        let topic = ReportIngestTopic::spawn(Arc::clone(&cluster), 16);
        let dn = DatanodeId::new(1);
        assert!(topic.publish(ReportBatch {
            datanode_id: dn,
            entries: vec![ReportEntry {
                container_id: ContainerId::new(1),
                state: ReplicaState::Closed,
                origin_datanode_id: dn,
                key_count: 3,
                bytes_used: 30,
                sequence_id: 1,
            }],
        }));

        topic.shutdown(std::time::Duration::from_secs(5)).await;

        let snapshot = cluster.snapshot();
        assert_eq!(snapshot.replicas_for(ContainerId::new(1)).len(), 1);
    }
}
