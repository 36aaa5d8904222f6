//! Common protocol definitions for atspi-sidecar
//!
//! This crate defines the wire types exchanged between the sidecar and an
//! automation client: node paths, snapshot trees, action results and the
//! newline-delimited JSON-RPC envelopes that carry them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// JSON-RPC version string carried on every response
pub const JSONRPC_VERSION: &str = "2.0";

/// Serialized id of the tree root
pub const ROOT_ID: &str = "root";

/// Reserved JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Child-index path from the tree root, e.g. `2/0/5`
///
/// This is the only identity a node keeps across requests. It is never a
/// handle: resolving it means walking the live tree again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The empty path, denoting the root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps from the root
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    /// Parse a slash-joined path
    ///
    /// `""` and `"root"` both denote the root. Any empty, negative or
    /// non-numeric segment makes the whole path invalid.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || s == ROOT_ID {
            return Some(Self::root());
        }
        s.split('/')
            .map(|segment| segment.parse::<usize>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Id used in serialized snapshots (`"root"` for the root)
    pub fn id(&self) -> String {
        if self.is_root() {
            ROOT_ID.to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

/// A rectangle in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
    };

    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// True when both width and height are positive
    pub fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    /// Integer midpoint, rounding toward negative infinity
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.w.div_euclid(2)),
            self.y.saturating_add(self.h.div_euclid(2)),
        )
    }
}

/// Boolean state flags of a node; a flag that could not be read is omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
}

/// Platform-specific identifiers attached to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atspi_path: Option<String>,
}

/// A node in a serialized snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    /// Node path (`"root"` for the root)
    pub id: String,
    /// Role name as reported by the accessibility layer (e.g. "push button")
    pub role: String,
    /// Accessible name
    pub name: String,
    /// Textual value, empty when the node has none
    pub value: String,
    /// Screen bounds, present only with positive width and height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    pub states: NodeStates,
    pub children: Vec<SnapshotNode>,
    pub platform_ids: PlatformIds,
}

impl SnapshotNode {
    /// Number of nodes in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SnapshotNode::subtree_len).sum::<usize>()
    }
}

/// Best-effort description of the focused window and its application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveApp {
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    pub title: String,
    pub bounds: Bounds,
}

impl ActiveApp {
    /// Placeholder used when the active window cannot be determined
    pub fn unknown() -> Self {
        Self {
            pid: 0,
            app_id: None,
            title: "Unknown".to_string(),
            bounds: Bounds::ZERO,
        }
    }
}

/// Caps applied to a snapshot and what the traversal actually used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
    pub node_count: usize,
    pub truncated: bool,
}

/// A bounded, point-in-time serialization of the accessibility tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: String,
    pub timestamp: String,
    pub active_app: ActiveApp,
    pub tree: Option<SnapshotNode>,
    pub text_index: Vec<String>,
    pub screenshot: Option<String>,
    pub limits: SnapshotLimits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub driver: DriverDescriptor,
}

/// Actions the sidecar actually implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_snapshot: bool,
    pub can_click: bool,
    pub can_type: bool,
    pub can_key: bool,
    pub can_focus: bool,
    pub can_scroll: bool,
    pub can_ocr: bool,
    pub can_screenshot: bool,
    pub can_inject_input: bool,
}

/// Identity of the driver, attached to responses as provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDescriptor {
    pub name: String,
    pub kind: String,
    pub version: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Outcome of an input action
///
/// Resolution failures are reported here with `status: error` rather than
/// as JSON-RPC errors, so clients branch on `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
    pub driver: DriverDescriptor,
}

impl ActionResult {
    pub fn success(driver: &DriverDescriptor, message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            driver: driver.clone(),
        }
    }

    pub fn error(driver: &DriverDescriptor, message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            message: message.into(),
            driver: driver.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

/// A decoded JSON-RPC request
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub id: Value,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    /// Decode one input line
    ///
    /// Missing or null `params` become an empty object.
    pub fn from_line(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line)?;
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::InvalidRequest { id: Value::Null });
        };

        let id = object.remove("id").unwrap_or(Value::Null);
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(ProtocolError::InvalidRequest { id }),
        };
        let params = match object.remove("params") {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(params) => params,
        };

        Ok(Self { id, method, params })
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// A JSON-RPC response; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid request")]
    InvalidRequest { id: Value },
}

/// Write a response as a single line and flush it
pub fn write_response<W: Write>(writer: &mut W, response: &RpcResponse) -> Result<(), ProtocolError> {
    let data = serde_json::to_vec(response)?;
    writer.write_all(&data)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
