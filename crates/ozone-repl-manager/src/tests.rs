use std::sync::Arc;
use std::time::Duration;

use ozone_repl_config::ReplicationConfig;
use ozone_repl_types::{Container, ContainerId, ContainerState, Datanode, DatanodeId, OpState, ReplicaState, ReplicationScheme};
use parking_lot::Mutex;

use crate::command::{Command, CommandDispatcher, DispatchError};
use crate::manager::{DrainOutcome, ReplicationManager};
use crate::state::{ClusterState, ReportEntry};

#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<Command>>,
}

impl RecordingDispatcher {
    fn commands(&self) -> Vec<Command> {
        self.sent.lock().clone()
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn send(&self, _datanode_id: DatanodeId, command: Command) -> Result<(), DispatchError> {
        self.sent.lock().push(command);
        Ok(())
    }
}

fn node(id: u64, rack: &str) -> Datanode {
    let mut n = Datanode::new(DatanodeId::new(id), format!("h{id}"), rack.to_string());
    n.utilization = 0.1;
    n
}

fn fast_config() -> ReplicationConfig {
    let mut cfg = ReplicationConfig::default();
    cfg.interval_ms = 10;
    cfg.under_interval_ms = 1;
    cfg.over_interval_ms = 1;
    cfg.max_commands_per_cycle = 100;
    cfg
}

fn report(container_id: ContainerId, dn: DatanodeId, origin: DatanodeId, seq: u64) -> ReportEntry {
    ReportEntry {
        container_id,
        state: ReplicaState::Closed,
        origin_datanode_id: origin,
        key_count: 1,
        bytes_used: 10,
        sequence_id: seq,
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_a_close_then_kill_emits_one_replicate() {
    let cluster = Arc::new(ClusterState::new());
    for (id, rack) in [(2, "r2"), (3, "r3"), (4, "r4"), (5, "r5")] {
        cluster.upsert_node(node(id, rack));
    }
    let container_id = ContainerId::new(1);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Closed));

    let origin = DatanodeId::new(1);
    for dn in [DatanodeId::new(2), DatanodeId::new(3)] {
        cluster
            .apply_report_entry(dn, report(container_id, dn, origin, 1))
            .unwrap();
    }

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let manager = ReplicationManager::new(Arc::clone(&cluster), fast_config(), Arc::clone(&dispatcher));
    let handle = manager.spawn();

    tokio::time::advance(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;

    let sent = dispatcher.commands();
    let replicate_count = sent
        .iter()
        .filter(|c| matches!(c, Command::ReplicateContainer { .. }))
        .count();
    assert_eq!(replicate_count, 1, "expected exactly one REPLICATE, got {sent:?}");

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn p7_idempotent_after_replica_resolves() {
    let cluster = Arc::new(ClusterState::new());
    for (id, rack) in [(2, "r2"), (3, "r3"), (4, "r4")] {
        cluster.upsert_node(node(id, rack));
    }
    let container_id = ContainerId::new(1);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Closed));
    let origin = DatanodeId::new(2);
    cluster
        .apply_report_entry(DatanodeId::new(2), report(container_id, DatanodeId::new(2), origin, 1))
        .unwrap();
    cluster
        .apply_report_entry(DatanodeId::new(3), report(container_id, DatanodeId::new(3), origin, 1))
        .unwrap();

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let manager = ReplicationManager::new(Arc::clone(&cluster), fast_config(), Arc::clone(&dispatcher));
    let handle = manager.spawn();

    tokio::time::advance(Duration::from_millis(30)).await;
    tokio::task::yield_now().await;

    let target = dispatcher
        .commands()
        .into_iter()
        .find_map(|c| match c {
            Command::ReplicateContainer { target, .. } => Some(target),
            _ => None,
        })
        .expect("a replicate command should have been issued");

    cluster
        .apply_report_entry(target, report(container_id, target, origin, 1))
        .unwrap();

    tokio::time::advance(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;

    let total_after = dispatcher.commands().len();
    tokio::time::advance(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;
    assert_eq!(
        dispatcher.commands().len(),
        total_after,
        "classifier should settle at OK and stop re-issuing commands"
    );

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn p9_no_commands_after_stop() {
    let cluster = Arc::new(ClusterState::new());
    for (id, rack) in [(2, "r2"), (4, "r4")] {
        cluster.upsert_node(node(id, rack));
    }
    let container_id = ContainerId::new(1);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Closed));
    cluster
        .apply_report_entry(
            DatanodeId::new(2),
            report(container_id, DatanodeId::new(2), DatanodeId::new(2), 1),
        )
        .unwrap();

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let manager = ReplicationManager::new(Arc::clone(&cluster), fast_config(), Arc::clone(&dispatcher));
    let handle = manager.spawn();

    tokio::time::advance(Duration::from_millis(20)).await;
    tokio::task::yield_now().await;

    let outcome = handle.stop().await;
    assert_eq!(outcome, DrainOutcome::Drained);

    let count_at_stop = dispatcher.commands().len();
    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    assert_eq!(
        dispatcher.commands().len(),
        count_at_stop,
        "no further commands should be emitted once stopped"
    );
}

#[tokio::test(start_paused = true)]
async fn p10_safe_mode_window_suppresses_delete_replica() {
    let cluster = Arc::new(ClusterState::new());
    for (id, rack) in [(1, "r1"), (2, "r2"), (3, "r3"), (4, "r4")] {
        cluster.upsert_node(node(id, rack));
    }
    let container_id = ContainerId::new(1);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Closed));
    let origin = DatanodeId::new(1);
    for dn in [1, 2, 3, 4] {
        cluster
            .apply_report_entry(DatanodeId::new(dn), report(container_id, DatanodeId::new(dn), origin, 1))
            .unwrap();
    }

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let manager = ReplicationManager::new(Arc::clone(&cluster), fast_config(), Arc::clone(&dispatcher));
    let handle = manager.spawn();
    handle.enter_safe_mode_exit_window(Duration::from_millis(200));

    tokio::time::advance(Duration::from_millis(100)).await;
    tokio::task::yield_now().await;
    assert!(
        dispatcher
            .commands()
            .iter()
            .all(|c| !matches!(c, Command::DeleteReplica { .. })),
        "no DELETE_REPLICA should be emitted inside the safe-mode exit window"
    );

    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    assert!(
        dispatcher
            .commands()
            .iter()
            .any(|c| matches!(c, Command::DeleteReplica { .. })),
        "DELETE_REPLICA should be permitted once the window has elapsed"
    );

    handle.stop().await;
}

#[test]
fn scenario_d_resurrection_then_under_replication_is_classified_next_cycle() {
    let cluster = ClusterState::new();
    let container_id = ContainerId::new(9);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Deleted));
    cluster.upsert_node(node(7, "r7"));

    cluster
        .apply_report_entry(
            DatanodeId::new(7),
            ReportEntry {
                container_id,
                state: ReplicaState::Closed,
                origin_datanode_id: DatanodeId::new(7),
                key_count: 42,
                bytes_used: 4096,
                sequence_id: 1,
            },
        )
        .unwrap();

    let snapshot = cluster.snapshot();
    assert_eq!(snapshot.containers[&container_id].state, ContainerState::Closed);

    let status = ozone_repl_core::evaluator::evaluate(
        &snapshot.containers[&container_id],
        snapshot.replicas_for(container_id),
        &snapshot.nodes,
        2,
    );
    assert!(matches!(status, ozone_repl_core::evaluator::HealthStatus::UnderReplicated(_)));
}

#[test]
fn decommissioned_reporter_still_counts_for_presence() {
    let cluster = ClusterState::new();
    let mut decommissioned = node(1, "r1");
    decommissioned.persisted_op_state = OpState::Decommissioned;
    cluster.upsert_node(decommissioned);

    let container_id = ContainerId::new(1);
    cluster.upsert_container(Container::new(container_id, ReplicationScheme::Ratis3, ContainerState::Closed));
    cluster
        .apply_report_entry(
            DatanodeId::new(1),
            report(container_id, DatanodeId::new(1), DatanodeId::new(1), 1),
        )
        .unwrap();

    let snapshot = cluster.snapshot();
    assert_eq!(snapshot.replicas_for(container_id).len(), 1);
    assert!(!cluster.accepts_new_placements(DatanodeId::new(1)));
}
