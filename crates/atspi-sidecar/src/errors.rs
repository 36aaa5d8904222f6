//! Error types for the sidecar
//!
//! Backend errors never reach the client directly: traversal omits what it
//! cannot read and actions fold failures into `status: error` results. Only
//! `HandlerError` surfaces as a JSON-RPC error.

use thiserror::Error;

/// Errors raised by the native accessibility layer
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to connect to the accessibility bus
    #[error("Failed to connect to accessibility bus: {0}")]
    Connection(String),

    /// A query or call on a node failed
    #[error("Accessibility call failed: {0}")]
    Call(String),

    /// The node does not implement the required interface
    #[error("{interface} interface not available on node")]
    InterfaceNotAvailable { interface: &'static str },

    /// A child index was outside the node's reported child count
    #[error("Child index {index} out of range (child count {count})")]
    ChildOutOfRange { index: usize, count: usize },

    /// Mouse or keyboard event synthesis failed
    #[error("Input synthesis failed: {0}")]
    Input(String),
}

impl BackendError {
    pub fn interface_not_available(interface: &'static str) -> Self {
        Self::InterfaceNotAvailable { interface }
    }
}

#[cfg(target_os = "linux")]
impl From<atspi::AtspiError> for BackendError {
    fn from(e: atspi::AtspiError) -> Self {
        Self::Call(e.to_string())
    }
}

#[cfg(target_os = "linux")]
impl From<atspi::zbus::Error> for BackendError {
    fn from(e: atspi::zbus::Error) -> Self {
        Self::Call(e.to_string())
    }
}

/// Errors returned by JSON-RPC method handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Params did not match the method's parameter shape
    #[error("Invalid params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    /// The handler result could not be encoded
    #[error("Failed to serialize result: {0}")]
    Serialize(#[source] serde_json::Error),
}
