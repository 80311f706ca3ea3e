//! # ozone-repl
//!
//! Replication control plane for an Apache Ozone-style object store:
//! decides when a container's replicas have drifted from their target
//! count or placement, and emits the commands that bring them back.
//!
//! - **Replica counting** ([`ozone_repl_core::counter`],
//!   [`ozone_repl_core::ec`]) - classic triple replication and
//!   erasure-coded containers, including maintenance-aware floors.
//! - **Health evaluation** ([`ozone_repl_core::evaluator`]) - lifts a
//!   classification into `OK` / `UnderReplicated` / `OverReplicated` /
//!   `MisPlaced` / `Unrecoverable`.
//! - **Placement** ([`ozone_repl_core::planner`]) - picks sources and
//!   targets under rack-exclusion and utilization constraints.
//! - **Event bus** ([`ozone_repl_bus`]) - single-thread-per-topic
//!   executor with bounded queues and monotone counters.
//! - **Replication Manager** ([`ozone_repl_manager`]) - the tick/notify
//!   loop, container-report reconciler, and command dispatch.
//!
//! # Quick Start
//!
//! ```ignore
//! use ozone_repl::{ReplicationControlPlane, ReplicationConfig};
//! use std::sync::Arc;
//!
//! let config = ReplicationConfig::default();
//! let dispatcher = Arc::new(my_dispatcher);
//! let plane = ReplicationControlPlane::new(config, dispatcher);
//!
//! plane.cluster().upsert_node(datanode);
//! plane.cluster().upsert_container(container);
//!
//! let handle = plane.spawn();
//! // ... feed CONTAINER_REPORT events via handle.ingest() ...
//! handle.stop().await;
//! ```

mod error;
mod logging;
mod plane;

pub use error::{Error, Result};
pub use logging::init_tracing;
pub use plane::{ControlPlaneHandle, ReplicationControlPlane};

pub use ozone_repl_config::{ConfigLoader, ReplicationConfig};
pub use ozone_repl_manager::{
    Command, CommandDispatcher, DispatchError, DrainOutcome, LoopState, ManagerMetrics,
    ReportBatch, ReportEntry,
};
pub use ozone_repl_bus::{BusError, EventBus, TopicMetrics};
pub use ozone_repl_core::evaluator::HealthStatus;
pub use ozone_repl_core::planner::Plan;
pub use ozone_repl_types::{
    Container, ContainerId, ContainerState, Datanode, DatanodeId, HealthState, OpState,
    Replica, ReplicaState, ReplicationScheme,
};
