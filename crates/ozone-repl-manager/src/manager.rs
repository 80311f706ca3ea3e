//! The Replication Manager event loop (§4.6).

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ozone_repl_core::evaluator::{self, HealthStatus};
use ozone_repl_core::planner::{self, Plan, PlacementPolicy};
use ozone_repl_types::{CompressionType, ContainerId, ReplicationScheme};
use ozone_repl_config::ReplicationConfig;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::command::{Command, CommandDispatcher};
use crate::metrics::ManagerMetrics;
use crate::state::ClusterState;

/// Observable lifecycle state of the manager loop (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    Waiting,
    Stopped,
}

/// Action kind used as the second half of the in-flight tracking key
/// `(containerID, action)` (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ActionKind {
    Replicate,
    Delete,
}

/// The Replication Manager: owns the tick/notify loop, the per-cycle
/// classification pass, and dispatch throttling. Construct with
/// [`ReplicationManager::new`] then [`ReplicationManager::spawn`] to
/// start the background worker.
pub struct ReplicationManager<D> {
    cluster: Arc<ClusterState>,
    config: ReplicationConfig,
    dispatcher: Arc<D>,
    metrics: Arc<ManagerMetrics>,
    notify: Arc<Notify>,
    stop_flag: Arc<AtomicBool>,
    loop_state: Arc<RwLock<LoopState>>,
    safe_mode_exit_at: Arc<RwLock<Option<Instant>>>,
}

impl<D: CommandDispatcher + 'static> ReplicationManager<D> {
    pub fn new(cluster: Arc<ClusterState>, config: ReplicationConfig, dispatcher: Arc<D>) -> Self {
        Self {
            cluster,
            config,
            dispatcher,
            metrics: Arc::new(ManagerMetrics::new()),
            notify: Arc::new(Notify::new()),
            stop_flag: Arc::new(AtomicBool::new(false)),
            loop_state: Arc::new(RwLock::new(LoopState::Init)),
            safe_mode_exit_at: Arc::new(RwLock::new(None)),
        }
    }

    pub fn metrics(&self) -> Arc<ManagerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Wakes the loop early (the `NOTIFY(containerID)` inbound event,
    /// §6). `Notify` naturally coalesces any number of calls that land
    /// before the loop observes them into a single extra cycle (§9).
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Opens a safe-mode exit window: destructive commands
    /// (`DELETE_REPLICA`) are suppressed until `wait` has elapsed.
    pub fn enter_safe_mode_exit_window(&self, wait: Duration) {
        *self.safe_mode_exit_at.write() = Some(Instant::now() + wait);
    }

    pub fn is_thread_waiting(&self) -> bool {
        *self.loop_state.read() == LoopState::Waiting
    }

    pub fn loop_state(&self) -> LoopState {
        *self.loop_state.read()
    }

    /// Spawns the background worker and returns its handle plus a
    /// cooperative stop signal.
    pub fn spawn(self) -> ManagerHandle {
        let cluster = Arc::clone(&self.cluster);
        let config = self.config.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let metrics = Arc::clone(&self.metrics);
        let notify = Arc::clone(&self.notify);
        let stop_flag = Arc::clone(&self.stop_flag);
        let loop_state = Arc::clone(&self.loop_state);
        let safe_mode_exit_at = Arc::clone(&self.safe_mode_exit_at);

        *loop_state.write() = LoopState::Running;

        let join = tokio::spawn(run_loop(RunLoopContext {
            cluster,
            config: config.clone(),
            dispatcher,
            metrics,
            notify: Arc::clone(&notify),
            stop_flag: Arc::clone(&stop_flag),
            loop_state,
            safe_mode_exit_at,
        }));

        ManagerHandle {
            notify,
            stop_flag,
            safe_mode_exit_at,
            join: Some(join),
            drain_timeout: config.drain_timeout(),
        }
    }
}

/// Whether `ManagerHandle::stop` observed the worker exit before its
/// drain timeout elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Drained,
    TimedOut,
}

/// A running manager's external handle: `notify()`, `stop()`, join.
pub struct ManagerHandle {
    notify: Arc<Notify>,
    stop_flag: Arc<AtomicBool>,
    safe_mode_exit_at: Arc<RwLock<Option<Instant>>>,
    join: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl ManagerHandle {
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Opens a safe-mode exit window on the running loop: destructive
    /// commands (`DELETE_REPLICA`) are suppressed until `wait` elapses.
    pub fn enter_safe_mode_exit_window(&self, wait: Duration) {
        *self.safe_mode_exit_at.write() = Some(Instant::now() + wait);
    }

    /// Signals the loop to stop and waits up to the configured drain
    /// timeout for it to return (§4.6, §5). Any partially computed
    /// plan in flight when the signal lands is discarded. A
    /// [`DrainOutcome::TimedOut`] result means the worker is still
    /// running in the background; the caller decides whether to force
    /// anything further.
    pub async fn stop(mut self) -> DrainOutcome {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.notify.notify_one();

        if let Some(join) = self.join.take() {
            match tokio::time::timeout(self.drain_timeout, join).await {
                Ok(Ok(())) => DrainOutcome::Drained,
                Ok(Err(_join_err)) => DrainOutcome::Drained,
                Err(_elapsed) => {
                    tracing::error!("manager loop did not drain within the configured timeout");
                    DrainOutcome::TimedOut
                }
            }
        } else {
            DrainOutcome::Drained
        }
    }
}

struct RunLoopContext<D> {
    cluster: Arc<ClusterState>,
    config: ReplicationConfig,
    dispatcher: Arc<D>,
    metrics: Arc<ManagerMetrics>,
    notify: Arc<Notify>,
    stop_flag: Arc<AtomicBool>,
    loop_state: Arc<RwLock<LoopState>>,
    safe_mode_exit_at: Arc<RwLock<Option<Instant>>>,
}

async fn run_loop<D: CommandDispatcher>(ctx: RunLoopContext<D>) {
    let mut tick = tokio::time::interval(ctx.config.interval());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut under_queue: VecDeque<Command> = VecDeque::new();
    let mut over_queue: VecDeque<Command> = VecDeque::new();
    let mut inflight: HashMap<(ContainerId, ActionKind), ()> = HashMap::new();
    let mut last_under_dispatch = Instant::now() - ctx.config.under_interval();
    let mut last_over_dispatch = Instant::now() - ctx.config.over_interval();

    loop {
        if ctx.stop_flag.load(Ordering::SeqCst) {
            break;
        }

        *ctx.loop_state.write() = LoopState::Waiting;
        ctx.metrics.set_thread_waiting(true);
        tokio::select! {
            _ = tick.tick() => {}
            () = ctx.notify.notified() => {}
        }
        ctx.metrics.set_thread_waiting(false);
        *ctx.loop_state.write() = LoopState::Running;

        if ctx.stop_flag.load(Ordering::SeqCst) {
            break;
        }

        let cycle_start = Instant::now();
        let span = tracing::info_span!("replication_cycle");
        let _enter = span.enter();

        let snapshot = ctx.cluster.snapshot();
        let safe_mode_suppressed = ctx
            .safe_mode_exit_at
            .read()
            .is_some_and(|deadline| Instant::now() < deadline);

        let mut under_count = 0u64;
        let mut over_count = 0u64;

        for container_id in snapshot.container_ids() {
            let Some(container) = snapshot.containers.get(&container_id) else {
                continue;
            };
            let replicas = snapshot.replicas_for(container_id);

            let status = evaluator::evaluate(
                container,
                replicas,
                &snapshot.nodes,
                ctx.config.min_healthy_for_maintenance,
            );

            tracing::debug!(container_id = %container_id, status = ?status, "classified container");

            match status {
                HealthStatus::Ok | HealthStatus::MisPlaced(_) => {
                    inflight.remove(&(container_id, ActionKind::Replicate));
                    inflight.remove(&(container_id, ActionKind::Delete));
                }
                HealthStatus::Unrecoverable => {
                    tracing::warn!(container_id = %container_id, "unrecoverable container: no healthy source replica");
                }
                HealthStatus::UnderReplicated(groups) => {
                    under_count += 1;
                    if inflight.contains_key(&(container_id, ActionKind::Replicate)) {
                        continue;
                    }
                    let hosts: HashSet<_> = replicas.iter().map(|r| r.datanode_id).collect();
                    let racks: HashSet<_> = hosts
                        .iter()
                        .filter_map(|id| snapshot.nodes.get(id))
                        .map(|n| n.rack.clone())
                        .collect();
                    let policy = PlacementPolicy {
                        utilization_threshold: ctx.config.utilization_threshold,
                    };
                    for group in groups {
                        match planner::plan_group(container_id, &group, &hosts, &racks, &snapshot.nodes, policy) {
                            Some(Plan::Replicate { source, targets }) => {
                                for target in targets {
                                    under_queue.push_back(Command::ReplicateContainer {
                                        container_id,
                                        source,
                                        target,
                                        compression: default_compression(container.scheme),
                                    });
                                }
                                inflight.insert((container_id, ActionKind::Replicate), ());
                            }
                            Some(Plan::Delete { .. }) | None => {}
                        }
                    }
                }
                HealthStatus::OverReplicated(groups) => {
                    over_count += 1;
                    if inflight.contains_key(&(container_id, ActionKind::Delete)) {
                        continue;
                    }
                    let hosts: HashSet<_> = replicas.iter().map(|r| r.datanode_id).collect();
                    let racks: HashSet<_> = hosts
                        .iter()
                        .filter_map(|id| snapshot.nodes.get(id))
                        .map(|n| n.rack.clone())
                        .collect();
                    let policy = PlacementPolicy {
                        utilization_threshold: ctx.config.utilization_threshold,
                    };
                    for group in groups {
                        match planner::plan_group(container_id, &group, &hosts, &racks, &snapshot.nodes, policy) {
                            Some(Plan::Delete { victims }) => {
                                for victim in victims {
                                    over_queue.push_back(Command::DeleteReplica {
                                        container_id,
                                        target: victim,
                                    });
                                }
                                inflight.insert((container_id, ActionKind::Delete), ());
                            }
                            Some(Plan::Replicate { .. }) | None => {}
                        }
                    }
                }
            }
        }

        let mut budget = ctx.config.max_commands_per_cycle;
        let mut dispatched = 0u64;

        if last_under_dispatch.elapsed() >= ctx.config.under_interval() {
            let mut any = false;
            while budget > 0 {
                let Some(cmd) = under_queue.pop_front() else {
                    break;
                };
                dispatch(&*ctx.dispatcher, cmd);
                budget -= 1;
                dispatched += 1;
                any = true;
            }
            if any {
                last_under_dispatch = Instant::now();
            }
        }

        if safe_mode_suppressed && !over_queue.is_empty() {
            tracing::debug!("safe-mode exit window active: deferring DELETE_REPLICA dispatch");
        } else if last_over_dispatch.elapsed() >= ctx.config.over_interval() {
            let mut any = false;
            while budget > 0 {
                let Some(cmd) = over_queue.pop_front() else {
                    break;
                };
                dispatch(&*ctx.dispatcher, cmd);
                budget -= 1;
                dispatched += 1;
                any = true;
            }
            if any {
                last_over_dispatch = Instant::now();
            }
        }

        ctx.metrics.record_cycle(
            under_count,
            over_count,
            dispatched,
            cycle_start.elapsed().as_millis() as u64,
        );
    }

    *ctx.loop_state.write() = LoopState::Stopped;
    ctx.metrics.set_thread_waiting(false);
}

fn dispatch<D: CommandDispatcher>(dispatcher: &D, command: Command) {
    let target = command.target();
    let container_id = command.container_id();
    if let Err(err) = dispatcher.send(target, command) {
        tracing::warn!(container_id = %container_id, target = %target, error = %err, "dispatcher refused command");
    }
}

fn default_compression(scheme: ReplicationScheme) -> CompressionType {
    match scheme {
        ReplicationScheme::Ratis3 => CompressionType::NoCompression,
        ReplicationScheme::Ec { .. } => CompressionType::Zstd,
    }
}
