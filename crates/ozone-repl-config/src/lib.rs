//! # ozone-repl-config
//!
//! Configuration for the replication control plane (§6), loaded in
//! increasing-precedence order:
//!
//! 1. Built-in defaults (this module)
//! 2. A project `ozone-repl.toml` file, if present
//! 3. Environment variables under the `OZONE_REPL_` prefix
//!
//! All interval-valued keys are stored in milliseconds (`_ms` suffix)
//! because the underlying `config` crate has no native `Duration`
//! deserializer; each has a `Duration`-typed accessor for use in code.

mod error;
mod loader;

pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Replication Manager configuration (§6 keys, with defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// `replication.interval` (default 1 s): the manager loop's tick period.
    pub interval_ms: u64,

    /// `replication.under.interval` (default 100 ms): minimum spacing
    /// between dispatches drawn from the under-replicated work list.
    pub under_interval_ms: u64,

    /// `replication.over.interval` (default 100 ms): minimum spacing
    /// between dispatches drawn from the over-replicated work list.
    pub over_interval_ms: u64,

    /// `min.healthy.for.maintenance` (default 2): the in-service floor
    /// required once any source is in maintenance (§4.2).
    pub min_healthy_for_maintenance: usize,

    /// `safe.mode.exit.wait` (default 0 s): destructive commands
    /// (`DELETE_REPLICA`) are suppressed for this long after safe mode
    /// exit (§4.6).
    pub safe_mode_exit_wait_ms: u64,

    /// `stale.node.interval`: heartbeat silence before a node is
    /// considered `STALE`.
    pub stale_node_interval_ms: u64,

    /// `dead.node.interval`: heartbeat silence before a node is
    /// considered `DEAD`; conventionally `2 * stale_node_interval_ms`.
    pub dead_node_interval_ms: u64,

    /// `max.commands.per.cycle`: per-cycle dispatch budget (§4.6, §5).
    pub max_commands_per_cycle: usize,

    /// Utilization above which a datanode is excluded as a new
    /// placement target (§4.5). Not one of the §6 keys verbatim, but
    /// required by the planner; defaulted conservatively.
    pub utilization_threshold: f64,

    /// Bounded queue capacity for each event bus topic (§4.1).
    pub event_bus_queue_capacity: usize,

    /// How long `stop()` waits for workers to drain before giving up
    /// (§5, default ~60 s).
    pub drain_timeout_ms: u64,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            under_interval_ms: 100,
            over_interval_ms: 100,
            min_healthy_for_maintenance: 2,
            safe_mode_exit_wait_ms: 0,
            stale_node_interval_ms: 90_000,
            dead_node_interval_ms: 180_000,
            max_commands_per_cycle: 10_000,
            utilization_threshold: 0.9,
            event_bus_queue_capacity: 4_096,
            drain_timeout_ms: 60_000,
        }
    }
}

impl ReplicationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn under_interval(&self) -> Duration {
        Duration::from_millis(self.under_interval_ms)
    }

    pub fn over_interval(&self) -> Duration {
        Duration::from_millis(self.over_interval_ms)
    }

    pub fn safe_mode_exit_wait(&self) -> Duration {
        Duration::from_millis(self.safe_mode_exit_wait_ms)
    }

    pub fn stale_node_interval(&self) -> Duration {
        Duration::from_millis(self.stale_node_interval_ms)
    }

    pub fn dead_node_interval(&self) -> Duration {
        Duration::from_millis(self.dead_node_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Validates cross-field invariants that a plain `Default` can't
    /// express: zero intervals would spin the manager loop hot, and a
    /// dead-node interval shorter than the stale-node interval would
    /// make a node skip straight past `STALE`.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "replication.interval must be non-zero".to_string(),
            ));
        }
        if self.dead_node_interval_ms < self.stale_node_interval_ms {
            return Err(ConfigError::Validation(
                "dead.node.interval must be >= stale.node.interval".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.utilization_threshold) {
            return Err(ConfigError::Validation(
                "utilization_threshold must be in [0.0, 1.0]".to_string(),
            ));
        }
        Ok(())
    }
}
