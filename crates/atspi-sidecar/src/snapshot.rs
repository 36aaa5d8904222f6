//! Bounded snapshot of the live accessibility tree
//!
//! The walk is pre-order and depth-first. Two caps bound it: depth below the
//! start node and the number of nodes visited. The visit counter lives in a
//! `Traversal` value created per snapshot, so concurrent walks never share
//! state.
//!
//! Every node that is visited counts against the budget, including nodes
//! that are then dropped because their role is `"invalid"` or their role or
//! name could not be read. The budget bounds the work done against the live
//! tree, so `nodeCount` reports visits and may exceed the emitted count.

use crate::active_window::WindowLocator;
use crate::backend::{AccessibilityBackend, NodeState};
use crate::config::SnapshotConfig;
use crate::constants::{INVALID_ROLE, MAX_CHILD_SCAN, MAX_VALUE_CHARS};
use crate::path::{Resolution, resolve};
use atspi_sidecar_protocol::{
    ActiveApp, Bounds, DriverDescriptor, NodePath, NodeStates, PlatformIds, Snapshot,
    SnapshotLimits, SnapshotNode,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Params of the `snapshot` method
///
/// Caps are read leniently: integers, floats and numeric strings are all
/// accepted, anything else falls back to the configured default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
    #[serde(default)]
    pub max_depth: Option<Value>,
    #[serde(default)]
    pub max_nodes: Option<Value>,
    /// Path of the node to start from instead of the root
    #[serde(default)]
    pub window_id: Option<Value>,
}

/// One bounded walk over the tree
pub struct Traversal<'a, B: AccessibilityBackend> {
    backend: &'a B,
    max_depth: usize,
    max_nodes: usize,
    visited: usize,
}

impl<'a, B: AccessibilityBackend> Traversal<'a, B> {
    pub fn new(backend: &'a B, max_depth: usize, max_nodes: usize) -> Self {
        Self {
            backend,
            max_depth,
            max_nodes,
            visited: 0,
        }
    }

    /// Nodes visited so far
    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn truncated(&self) -> bool {
        self.visited >= self.max_nodes
    }

    /// Serialize `node` (found at `path`, `depth` levels below the start)
    ///
    /// Returns `None` when a cap is hit or the node cannot be read. Children
    /// already completed when a cap is hit stay in their parent.
    pub fn visit(&mut self, node: &B::Node, path: &NodePath, depth: usize) -> Option<SnapshotNode> {
        if depth > self.max_depth || self.visited >= self.max_nodes {
            return None;
        }
        self.visited += 1;

        let role = match self.backend.role_name(node) {
            Ok(role) => role,
            Err(e) => {
                tracing::debug!("Skipping '{}': role unreadable: {}", path, e);
                return None;
            }
        };
        let name = match self.backend.name(node) {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!("Skipping '{}': name unreadable: {}", path, e);
                return None;
            }
        };
        if role == INVALID_ROLE {
            tracing::debug!("Skipping '{}': invalid role", path);
            return None;
        }

        let value = clip_value(self.backend.value(node).unwrap_or_default());
        let bounds = self.backend.extents(node).ok().filter(Bounds::has_area);
        let states = self.read_states(node);
        let children = if depth < self.max_depth {
            self.visit_children(node, path, depth)
        } else {
            Vec::new()
        };

        Some(SnapshotNode {
            id: path.id(),
            role,
            name,
            value,
            bounds,
            states,
            children,
            platform_ids: PlatformIds {
                atspi_path: (!path.is_root()).then(|| path.to_string()),
            },
        })
    }

    fn read_states(&self, node: &B::Node) -> NodeStates {
        match self.backend.states(node) {
            Ok(states) => {
                let has = |state| Some(states.contains(&state));
                NodeStates {
                    enabled: has(NodeState::Enabled),
                    focused: has(NodeState::Focused),
                    checked: has(NodeState::Checked),
                    selected: has(NodeState::Selected),
                    expanded: has(NodeState::Expanded),
                }
            }
            Err(e) => {
                tracing::debug!("State set unreadable: {}", e);
                NodeStates::default()
            }
        }
    }

    fn visit_children(&mut self, node: &B::Node, path: &NodePath, depth: usize) -> Vec<SnapshotNode> {
        let count = match self.backend.child_count(node) {
            Ok(count) => count.min(MAX_CHILD_SCAN),
            Err(e) => {
                tracing::debug!("Children of '{}' unreadable: {}", path, e);
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        for index in 0..count {
            if self.visited >= self.max_nodes {
                break;
            }
            let child = match self.backend.child_at(node, index) {
                Ok(child) => child,
                Err(e) => {
                    tracing::debug!("Child {} of '{}' unavailable: {}", index, path, e);
                    continue;
                }
            };
            if let Some(child) = self.visit(&child, &path.child(index), depth + 1) {
                children.push(child);
            }
        }
        children
    }
}

/// Cut `value` to at most `MAX_VALUE_CHARS` characters
fn clip_value(mut value: String) -> String {
    if let Some((cut, _)) = value.char_indices().nth(MAX_VALUE_CHARS) {
        value.truncate(cut);
    }
    value
}

fn read_limit(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Take a snapshot for the `snapshot` method
///
/// Always returns a well-formed snapshot. An unresolvable `windowId` or an
/// unreadable root yields `tree: null` with an explanatory note.
pub fn take_snapshot<B, L>(
    backend: &B,
    locator: &L,
    config: &SnapshotConfig,
    driver: &DriverDescriptor,
    params: SnapshotParams,
) -> Snapshot
where
    B: AccessibilityBackend,
    L: WindowLocator<B>,
{
    let (max_depth, max_nodes) = config.effective_limits(
        read_limit(params.max_depth.as_ref()),
        read_limit(params.max_nodes.as_ref()),
    );

    let mut snapshot = Snapshot {
        snapshot_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        active_app: ActiveApp::unknown(),
        tree: None,
        text_index: Vec::new(),
        screenshot: None,
        limits: SnapshotLimits {
            max_depth,
            max_nodes,
            node_count: 0,
            truncated: false,
        },
        notes: Vec::new(),
        driver: driver.clone(),
    };

    let start_path = match &params.window_id {
        None | Some(Value::Null) => NodePath::root(),
        Some(Value::String(id)) if id.is_empty() => NodePath::root(),
        Some(Value::String(id)) => match NodePath::parse(id) {
            Some(path) => path,
            None => {
                snapshot.notes.push(format!("Target window not found: {}", id));
                return snapshot;
            }
        },
        Some(other) => {
            snapshot.notes.push(format!("Target window not found: {}", other));
            return snapshot;
        }
    };

    let start_node = if start_path.is_root() {
        match backend.root() {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Accessibility root unavailable: {}", e);
                snapshot
                    .notes
                    .push(format!("Accessibility root unavailable: {}", e));
                return snapshot;
            }
        }
    } else {
        match resolve(backend, &start_path) {
            Resolution::Resolved(node) => node,
            Resolution::NotFound => {
                snapshot
                    .notes
                    .push(format!("Target window not found: {}", start_path));
                return snapshot;
            }
        }
    };

    snapshot.active_app = locator.active_app(backend);

    let mut traversal = Traversal::new(backend, max_depth, max_nodes);
    snapshot.tree = traversal.visit(&start_node, &start_path, 0);
    snapshot.limits.node_count = traversal.visited();
    snapshot.limits.truncated = traversal.truncated();
    if snapshot.tree.is_none() {
        snapshot.notes.push("Start node could not be read".to_string());
    }

    tracing::debug!(
        "Snapshot {} from '{}': {} nodes visited, truncated: {}",
        snapshot.snapshot_id,
        start_path.id(),
        snapshot.limits.node_count,
        snapshot.limits.truncated
    );
    snapshot
}
