//! Constants used throughout the sidecar
//!
//! This module centralizes magic numbers for better maintainability.

/// Default traversal depth for `snapshot`
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default node budget for `snapshot`
pub const DEFAULT_MAX_NODES: usize = 100;

/// Ceiling on any requested traversal depth (also bounds recursion)
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Ceiling on any requested node budget
pub const MAX_NODES_LIMIT: usize = 5000;

/// Upper bound on child indices scanned under a single node
pub const MAX_CHILD_SCAN: usize = 65_536;

/// Longest `value` emitted per snapshot node, in characters
pub const MAX_VALUE_CHARS: usize = 4096;

/// Pause after focusing a target before typing into it, in milliseconds
pub const FOCUS_SETTLE_MS: u64 = 100;

/// Role name AT-SPI reports for defunct objects
pub const INVALID_ROLE: &str = "invalid";

/// Driver identity advertised on every response
pub const DRIVER_NAME: &str = "linux-atspi";
pub const DRIVER_KIND: &str = "native";
