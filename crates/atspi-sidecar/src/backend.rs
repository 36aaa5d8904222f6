//! Native accessibility layer consumed by the sidecar
//!
//! Everything above this trait treats every call as fallible: the tree is
//! owned by another process and may change between any two calls.

use crate::errors::BackendError;
use atspi_sidecar_protocol::Bounds;

/// Node states the sidecar reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Active,
    Enabled,
    Focused,
    Checked,
    Selected,
    Expanded,
}

/// A keyboard event to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput<'a> {
    /// Press and release a single X keysym
    Sym(u32),
    /// Type a whole string in one synthesis request
    Text(&'a str),
}

/// Access to a live accessibility tree and input synthesis
///
/// `Node` is a short-lived handle. Callers must not keep one beyond the
/// request that obtained it.
pub trait AccessibilityBackend {
    type Node: Clone;

    /// The desktop root whose children are applications
    fn root(&self) -> Result<Self::Node, BackendError>;

    fn child_count(&self, node: &Self::Node) -> Result<usize, BackendError>;

    /// `index` must be below a `child_count` read during the same request
    fn child_at(&self, node: &Self::Node, index: usize) -> Result<Self::Node, BackendError>;

    /// Role name, e.g. "push button"; `"invalid"` marks a defunct node
    fn role_name(&self, node: &Self::Node) -> Result<String, BackendError>;

    fn name(&self, node: &Self::Node) -> Result<String, BackendError>;

    /// Text content; empty when the node exposes none
    fn value(&self, node: &Self::Node) -> Result<String, BackendError>;

    /// Extents in screen coordinates
    fn extents(&self, node: &Self::Node) -> Result<Bounds, BackendError>;

    fn states(&self, node: &Self::Node) -> Result<Vec<NodeState>, BackendError>;

    /// Trigger the node's default action; `false` if it has none
    fn do_default_action(&self, node: &Self::Node) -> Result<bool, BackendError>;

    /// Request input focus; `false` if the node refused
    fn grab_focus(&self, node: &Self::Node) -> Result<bool, BackendError>;

    /// Synthesize a left click at a screen coordinate
    fn click_at(&self, x: i32, y: i32) -> Result<(), BackendError>;

    fn synthesize_key(&self, input: KeyInput<'_>) -> Result<(), BackendError>;
}
