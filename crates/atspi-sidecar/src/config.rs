//! Command line and environment configuration

use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, FOCUS_SETTLE_MS, MAX_DEPTH_LIMIT, MAX_NODES_LIMIT,
};
use clap::Parser;
use std::time::Duration;

/// JSON-RPC sidecar exposing the desktop accessibility tree on stdin/stdout
#[derive(Debug, Clone, Parser)]
#[command(name = "atspi-sidecar", version, about)]
pub struct Cli {
    /// Traversal depth used when a snapshot request omits maxDepth
    #[arg(long, env = "ATSPI_SIDECAR_DEFAULT_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub default_max_depth: usize,

    /// Node budget used when a snapshot request omits maxNodes
    #[arg(long, env = "ATSPI_SIDECAR_DEFAULT_MAX_NODES", default_value_t = DEFAULT_MAX_NODES)]
    pub default_max_nodes: usize,

    /// Largest maxDepth a client may request
    #[arg(long, env = "ATSPI_SIDECAR_MAX_DEPTH_LIMIT", default_value_t = MAX_DEPTH_LIMIT)]
    pub max_depth_limit: usize,

    /// Largest maxNodes a client may request
    #[arg(long, env = "ATSPI_SIDECAR_MAX_NODES_LIMIT", default_value_t = MAX_NODES_LIMIT)]
    pub max_nodes_limit: usize,

    /// Delay between focusing a `type` target and typing, in milliseconds
    #[arg(long, env = "ATSPI_SIDECAR_FOCUS_SETTLE_MS", default_value_t = FOCUS_SETTLE_MS)]
    pub focus_settle_ms: u64,

    /// Log filter used when RUST_LOG is not set (logs go to stderr)
    #[arg(long, env = "ATSPI_SIDECAR_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn sidecar_config(&self) -> SidecarConfig {
        SidecarConfig {
            snapshot: SnapshotConfig::new(
                self.default_max_depth,
                self.default_max_nodes,
                self.max_depth_limit,
                self.max_nodes_limit,
            ),
            focus_settle: Duration::from_millis(self.focus_settle_ms),
        }
    }
}

/// Runtime configuration shared by all handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidecarConfig {
    pub snapshot: SnapshotConfig,
    pub focus_settle: Duration,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig::default(),
            focus_settle: Duration::from_millis(FOCUS_SETTLE_MS),
        }
    }
}

/// Defaults and ceilings for snapshot caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotConfig {
    pub default_max_depth: usize,
    pub default_max_nodes: usize,
    pub max_depth_limit: usize,
    pub max_nodes_limit: usize,
}

impl SnapshotConfig {
    /// Build a config; ceilings are at least 1 and defaults never exceed them
    pub fn new(
        default_max_depth: usize,
        default_max_nodes: usize,
        max_depth_limit: usize,
        max_nodes_limit: usize,
    ) -> Self {
        let max_depth_limit = max_depth_limit.max(1);
        let max_nodes_limit = max_nodes_limit.max(1);
        Self {
            default_max_depth: default_max_depth.clamp(1, max_depth_limit),
            default_max_nodes: default_max_nodes.clamp(1, max_nodes_limit),
            max_depth_limit,
            max_nodes_limit,
        }
    }

    /// Effective (maxDepth, maxNodes) for a request
    ///
    /// Missing values take the defaults; requested values are clamped to
    /// `1..=limit`.
    pub fn effective_limits(&self, max_depth: Option<i64>, max_nodes: Option<i64>) -> (usize, usize) {
        (
            clamp_request(max_depth, self.default_max_depth, self.max_depth_limit),
            clamp_request(max_nodes, self.default_max_nodes, self.max_nodes_limit),
        )
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_DEPTH,
            DEFAULT_MAX_NODES,
            MAX_DEPTH_LIMIT,
            MAX_NODES_LIMIT,
        )
    }
}

fn clamp_request(requested: Option<i64>, default: usize, limit: usize) -> usize {
    match requested {
        None => default,
        Some(value) if value < 1 => 1,
        Some(value) => usize::try_from(value).unwrap_or(limit).min(limit),
    }
}
