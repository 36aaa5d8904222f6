//! Path addressing: re-locating nodes by child-index path
//!
//! Nothing here caches a node. Every resolution walks from the root again,
//! which is how a stale path from an earlier snapshot gets detected.

use crate::backend::AccessibilityBackend;
use atspi_sidecar_protocol::NodePath;

/// Attribute carrying a path inside legacy locator strings
const LEGACY_PATH_ATTR: &str = "atspiPath=\"";

/// Result of re-locating a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<N> {
    Resolved(N),
    NotFound,
}

impl<N> Resolution<N> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn into_option(self) -> Option<N> {
        match self {
            Self::Resolved(node) => Some(node),
            Self::NotFound => None,
        }
    }
}

/// Walk `path` from the root one child index at a time
///
/// Fails fast on the first out-of-range index or failed step.
pub fn resolve<B: AccessibilityBackend>(backend: &B, path: &NodePath) -> Resolution<B::Node> {
    let mut current = match backend.root() {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!("Cannot resolve '{}': root unavailable: {}", path, e);
            return Resolution::NotFound;
        }
    };

    for (step, &index) in path.indices().iter().enumerate() {
        match backend.child_count(&current) {
            Ok(count) if index < count => {}
            Ok(count) => {
                tracing::debug!(
                    "Path '{}' stale at step {}: index {} >= child count {}",
                    path,
                    step,
                    index,
                    count
                );
                return Resolution::NotFound;
            }
            Err(e) => {
                tracing::debug!("Path '{}' unreadable at step {}: {}", path, step, e);
                return Resolution::NotFound;
            }
        }
        current = match backend.child_at(&current, index) {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Path '{}' broken at step {}: {}", path, step, e);
                return Resolution::NotFound;
            }
        };
    }

    Resolution::Resolved(current)
}

/// Parse and resolve a path string
pub fn resolve_str<B: AccessibilityBackend>(backend: &B, path: &str) -> Resolution<B::Node> {
    match NodePath::parse(path) {
        Some(path) => resolve(backend, &path),
        None => Resolution::NotFound,
    }
}

/// Pull the quoted path out of a legacy locator like `atspi:atspiPath="0/1/2"`
pub fn extract_legacy_path(locator: &str) -> Option<&str> {
    let start = locator.find(LEGACY_PATH_ATTR)? + LEGACY_PATH_ATTR.len();
    let rest = &locator[start..];
    let end = rest.find('"')?;
    let path = &rest[..end];
    (!path.is_empty()).then_some(path)
}

/// Resolve an action target
///
/// The target is tried as a plain path first. Only if that fails is it read
/// as a legacy locator string.
pub fn resolve_target<B: AccessibilityBackend>(backend: &B, target: &str) -> Resolution<B::Node> {
    let direct = resolve_str(backend, target);
    if direct.is_resolved() {
        return direct;
    }
    match extract_legacy_path(target) {
        Some(path) => resolve_str(backend, path),
        None => Resolution::NotFound,
    }
}
