//! Best-effort detection of the focused top-level window
//!
//! AT-SPI has no reliable notion of the foreground window or its process,
//! so this scans applications for a window in the active or focused state.
//! An application or window that cannot be read is skipped; the result is
//! labeled as unknown when the root is unreadable or nothing matches.

use crate::backend::{AccessibilityBackend, NodeState};
use crate::constants::MAX_CHILD_SCAN;
use crate::errors::BackendError;
use atspi_sidecar_protocol::ActiveApp;

/// Finds the window the user is currently working in
pub trait WindowLocator<B: AccessibilityBackend> {
    /// Never fails; returns `ActiveApp::unknown()` when nothing matches
    fn active_app(&self, backend: &B) -> ActiveApp;
}

/// Scans root → applications → top-level windows for an active window
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicLocator;

impl<B: AccessibilityBackend> WindowLocator<B> for HeuristicLocator {
    fn active_app(&self, backend: &B) -> ActiveApp {
        match find_active_window(backend) {
            Ok(Some(app)) => app,
            Ok(None) => {
                tracing::debug!("No active window found");
                ActiveApp::unknown()
            }
            Err(e) => {
                tracing::debug!("Active window lookup failed: {}", e);
                ActiveApp::unknown()
            }
        }
    }
}

fn find_active_window<B: AccessibilityBackend>(
    backend: &B,
) -> Result<Option<ActiveApp>, BackendError> {
    let root = backend.root()?;
    let app_count = backend.child_count(&root)?.min(MAX_CHILD_SCAN);

    for app_index in 0..app_count {
        let Ok(app) = backend.child_at(&root, app_index) else {
            continue;
        };
        let Ok(window_count) = backend.child_count(&app) else {
            continue;
        };

        for window_index in 0..window_count.min(MAX_CHILD_SCAN) {
            let Ok(window) = backend.child_at(&app, window_index) else {
                continue;
            };
            let Ok(states) = backend.states(&window) else {
                continue;
            };
            if !states.contains(&NodeState::Active) && !states.contains(&NodeState::Focused) {
                continue;
            }

            let Ok(bounds) = backend.extents(&window) else {
                continue;
            };
            return Ok(Some(ActiveApp {
                pid: 0,
                app_id: backend.name(&app).ok(),
                title: backend.name(&window).unwrap_or_default(),
                bounds,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDesktop, FakeNode, sample_desktop};
    use atspi_sidecar_protocol::Bounds;

    #[test]
    fn test_finds_active_window() {
        let app = HeuristicLocator.active_app(&sample_desktop());
        assert_eq!(app.title, "Untitled");
        assert_eq!(app.app_id.as_deref(), Some("Editor"));
        assert_eq!(app.bounds, Bounds::new(100, 50, 1024, 768));
        assert_eq!(app.pid, 0);
    }

    #[test]
    fn test_focused_window_also_matches() {
        let desktop = FakeDesktop::new(
            FakeNode::new("desktop frame", "main").child(
                FakeNode::new("application", "Term").child(
                    FakeNode::new("frame", "shell")
                        .bounds(1, 2, 3, 4)
                        .states(&[NodeState::Focused]),
                ),
            ),
        );
        let app = HeuristicLocator.active_app(&desktop);
        assert_eq!(app.title, "shell");
    }

    #[test]
    fn test_no_active_window_is_unknown() {
        let desktop = FakeDesktop::new(
            FakeNode::new("desktop frame", "main")
                .child(FakeNode::new("application", "Idle").child(FakeNode::new("frame", "w"))),
        );
        assert_eq!(HeuristicLocator.active_app(&desktop), ActiveApp::unknown());
    }

    #[test]
    fn test_failing_root_is_unknown() {
        let desktop = sample_desktop().failing_root();
        let app = HeuristicLocator.active_app(&desktop);
        assert_eq!(app.title, "Unknown");
        assert_eq!(app.bounds, Bounds::ZERO);
        assert_eq!(app.pid, 0);
    }

    #[test]
    fn test_unreadable_states_skip_window() {
        let desktop = FakeDesktop::new(
            FakeNode::new("desktop frame", "main").child(
                FakeNode::new("application", "App")
                    .child(FakeNode::new("frame", "broken").no_states())
                    .child(
                        FakeNode::new("frame", "good")
                            .bounds(0, 0, 10, 10)
                            .states(&[NodeState::Active]),
                    ),
            ),
        );
        assert_eq!(HeuristicLocator.active_app(&desktop).title, "good");
    }

    #[test]
    fn test_active_window_without_extents_is_skipped() {
        let ghost = FakeNode::new("frame", "ghost")
            .no_extents()
            .states(&[NodeState::Active]);
        let desktop = FakeDesktop::new(
            FakeNode::new("desktop frame", "main")
                .child(FakeNode::new("application", "Ghosts").child(ghost.clone()))
                .child(
                    FakeNode::new("application", "Real").child(
                        FakeNode::new("frame", "solid")
                            .bounds(5, 5, 50, 50)
                            .states(&[NodeState::Active]),
                    ),
                ),
        );
        let app = HeuristicLocator.active_app(&desktop);
        assert_eq!(app.title, "solid");
        assert_eq!(app.app_id.as_deref(), Some("Real"));

        let only_ghost = FakeDesktop::new(
            FakeNode::new("desktop frame", "main")
                .child(FakeNode::new("application", "Ghosts").child(ghost)),
        );
        assert_eq!(HeuristicLocator.active_app(&only_ghost), ActiveApp::unknown());
    }
}
