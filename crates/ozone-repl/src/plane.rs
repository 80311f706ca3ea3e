//! Wires configuration, cluster state, the report-ingest topic, and
//! the Replication Manager loop into one handle.

use std::sync::Arc;
use std::time::Duration;

use ozone_repl_config::ReplicationConfig;
use ozone_repl_manager::{
    ClusterState, CommandDispatcher, DrainOutcome, ReplicationManager, ReportBatch,
    ReportIngestTopic,
};

/// A fully wired replication control plane: cluster state, the inbound
/// report topic, and the manager loop, sharing one [`ClusterState`].
pub struct ReplicationControlPlane<D> {
    cluster: Arc<ClusterState>,
    config: ReplicationConfig,
    dispatcher: Arc<D>,
}

impl<D: CommandDispatcher + 'static> ReplicationControlPlane<D> {
    pub fn new(config: ReplicationConfig, dispatcher: Arc<D>) -> Self {
        Self {
            cluster: Arc::new(ClusterState::new()),
            config,
            dispatcher,
        }
    }

    /// Direct access to cluster state for seeding containers/datanodes
    /// and for tests; production callers normally only publish reports
    /// through [`ControlPlaneHandle::ingest`].
    pub fn cluster(&self) -> Arc<ClusterState> {
        Arc::clone(&self.cluster)
    }

    /// Spawns the report-ingest topic and the manager loop.
    pub fn spawn(self) -> ControlPlaneHandle {
        let ingest = ReportIngestTopic::spawn(Arc::clone(&self.cluster), self.config.event_bus_queue_capacity);
        let manager = ReplicationManager::new(self.cluster, self.config.clone(), self.dispatcher);
        let manager_handle = manager.spawn();

        ControlPlaneHandle {
            ingest: Some(ingest),
            manager: manager_handle,
            drain_timeout: self.config.drain_timeout(),
        }
    }
}

/// The running control plane: publish reports, notify on administrative
/// action, and stop when done.
pub struct ControlPlaneHandle {
    ingest: Option<ReportIngestTopic>,
    manager: ozone_repl_manager::ManagerHandle,
    drain_timeout: Duration,
}

impl ControlPlaneHandle {
    /// Publishes a `CONTAINER_REPORT`/`INCREMENTAL_CONTAINER_REPORT`
    /// batch (§6). Returns `false` if the ingest topic rejected it
    /// (closed or at capacity).
    pub fn ingest(&self, batch: ReportBatch) -> bool {
        self.ingest
            .as_ref()
            .is_some_and(|topic| topic.publish(batch))
    }

    /// The `NOTIFY(containerID)` administrative event (§6): wakes the
    /// manager loop ahead of its next tick.
    pub fn notify(&self) {
        self.manager.notify();
    }

    pub fn enter_safe_mode_exit_window(&self, wait: Duration) {
        self.manager.enter_safe_mode_exit_window(wait);
    }

    /// Stops the manager loop, then drains and closes the ingest topic.
    pub async fn stop(mut self) -> DrainOutcome {
        let outcome = self.manager.stop().await;
        if let Some(ingest) = self.ingest.take() {
            ingest.shutdown(self.drain_timeout).await;
        }
        outcome
    }
}
