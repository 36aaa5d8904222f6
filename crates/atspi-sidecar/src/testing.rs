//! In-memory accessibility tree for tests

use crate::backend::{AccessibilityBackend, KeyInput, NodeState};
use crate::errors::BackendError;
use atspi_sidecar_protocol::{Bounds, NodePath};
use std::cell::{Cell, RefCell};

/// A node of the fake tree; every attribute can be made unreadable
#[derive(Debug, Clone)]
pub struct FakeNode {
    role: Option<String>,
    name: Option<String>,
    value: Option<String>,
    extents: Option<Bounds>,
    states: Option<Vec<NodeState>>,
    children: Vec<FakeNode>,
    reported_children: Option<usize>,
    has_action: bool,
    accepts_focus: bool,
    available: bool,
}

impl FakeNode {
    pub fn new(role: &str, name: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            name: Some(name.to_string()),
            value: Some(String::new()),
            extents: Some(Bounds::ZERO),
            states: Some(vec![NodeState::Enabled]),
            children: Vec::new(),
            reported_children: None,
            has_action: false,
            accepts_focus: true,
            available: true,
        }
    }

    pub fn bounds(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.extents = Some(Bounds::new(x, y, w, h));
        self
    }

    pub fn no_extents(mut self) -> Self {
        self.extents = None;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn unreadable_value(mut self) -> Self {
        self.value = None;
        self
    }

    pub fn states(mut self, states: &[NodeState]) -> Self {
        self.states = Some(states.to_vec());
        self
    }

    pub fn no_states(mut self) -> Self {
        self.states = None;
        self
    }

    pub fn unreadable_role(mut self) -> Self {
        self.role = None;
        self
    }

    pub fn unreadable_name(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn child(mut self, child: FakeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Report a child count that differs from the real one
    pub fn report_children(mut self, count: usize) -> Self {
        self.reported_children = Some(count);
        self
    }

    pub fn with_action(mut self) -> Self {
        self.has_action = true;
        self
    }

    pub fn refuse_focus(mut self) -> Self {
        self.accepts_focus = false;
        self
    }

    /// Make fetching this node from its parent fail
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

/// Side effects observed by the fake backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Click(i32, i32),
    Key(u32),
    Text(String),
    Focus(String),
    Action(String),
}

/// Fake backend; node handles are paths into the fake tree
///
/// The tree can be edited between calls to simulate an application
/// changing its UI.
pub struct FakeDesktop {
    root: RefCell<FakeNode>,
    events: RefCell<Vec<FakeEvent>>,
    root_lookups: Cell<usize>,
    fail_root: bool,
    fail_input: bool,
}

impl FakeDesktop {
    pub fn new(root: FakeNode) -> Self {
        Self {
            root: RefCell::new(root),
            events: RefCell::new(Vec::new()),
            root_lookups: Cell::new(0),
            fail_root: false,
            fail_input: false,
        }
    }

    pub fn failing_root(mut self) -> Self {
        self.fail_root = true;
        self
    }

    pub fn failing_input(mut self) -> Self {
        self.fail_input = true;
        self
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.events.borrow().clone()
    }

    /// How many times the tree root was requested
    pub fn root_lookups(&self) -> usize {
        self.root_lookups.get()
    }

    /// Remove the node at `path`; later siblings shift down one index
    pub fn remove(&self, path: &str) {
        let path = NodePath::parse(path).unwrap();
        let (&last, parent) = path.indices().split_last().unwrap();
        let mut root = self.root.borrow_mut();
        let mut current = &mut *root;
        for &index in parent {
            current = &mut current.children[index];
        }
        current.children.remove(last);
    }

    fn with_node<R>(
        &self,
        path: &NodePath,
        f: impl FnOnce(&FakeNode) -> R,
    ) -> Result<R, BackendError> {
        let root = self.root.borrow();
        let mut current = &*root;
        for &index in path.indices() {
            current = current.children.get(index).ok_or(BackendError::ChildOutOfRange {
                index,
                count: current.children.len(),
            })?;
        }
        Ok(f(current))
    }

    fn record(&self, event: FakeEvent) -> Result<(), BackendError> {
        if self.fail_input {
            return Err(BackendError::Input("no input device".to_string()));
        }
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

fn unreadable(what: &str) -> BackendError {
    BackendError::Call(format!("{} unreadable", what))
}

impl AccessibilityBackend for FakeDesktop {
    type Node = NodePath;

    fn root(&self) -> Result<NodePath, BackendError> {
        self.root_lookups.set(self.root_lookups.get() + 1);
        if self.fail_root {
            return Err(BackendError::Connection("bus unavailable".to_string()));
        }
        Ok(NodePath::root())
    }

    fn child_count(&self, node: &NodePath) -> Result<usize, BackendError> {
        self.with_node(node, |n| n.reported_children.unwrap_or(n.children.len()))
    }

    fn child_at(&self, node: &NodePath, index: usize) -> Result<NodePath, BackendError> {
        self.with_node(node, |parent| match parent.children.get(index) {
            Some(child) if child.available => Ok(node.child(index)),
            Some(_) => Err(BackendError::Call(format!("child {} vanished", index))),
            None => Err(BackendError::ChildOutOfRange {
                index,
                count: parent.children.len(),
            }),
        })?
    }

    fn role_name(&self, node: &NodePath) -> Result<String, BackendError> {
        self.with_node(node, |n| n.role.clone())?
            .ok_or_else(|| unreadable("role"))
    }

    fn name(&self, node: &NodePath) -> Result<String, BackendError> {
        self.with_node(node, |n| n.name.clone())?
            .ok_or_else(|| unreadable("name"))
    }

    fn value(&self, node: &NodePath) -> Result<String, BackendError> {
        self.with_node(node, |n| n.value.clone())?
            .ok_or_else(|| unreadable("value"))
    }

    fn extents(&self, node: &NodePath) -> Result<Bounds, BackendError> {
        self.with_node(node, |n| n.extents)?
            .ok_or_else(|| BackendError::interface_not_available("Component"))
    }

    fn states(&self, node: &NodePath) -> Result<Vec<NodeState>, BackendError> {
        self.with_node(node, |n| n.states.clone())?
            .ok_or_else(|| unreadable("state set"))
    }

    fn do_default_action(&self, node: &NodePath) -> Result<bool, BackendError> {
        if !self.with_node(node, |n| n.has_action)? {
            return Ok(false);
        }
        self.record(FakeEvent::Action(node.to_string()))?;
        Ok(true)
    }

    fn grab_focus(&self, node: &NodePath) -> Result<bool, BackendError> {
        if !self.with_node(node, |n| n.accepts_focus)? {
            return Ok(false);
        }
        self.record(FakeEvent::Focus(node.to_string()))?;
        Ok(true)
    }

    fn click_at(&self, x: i32, y: i32) -> Result<(), BackendError> {
        self.record(FakeEvent::Click(x, y))
    }

    fn synthesize_key(&self, input: KeyInput<'_>) -> Result<(), BackendError> {
        match input {
            KeyInput::Sym(sym) => self.record(FakeEvent::Key(sym)),
            KeyInput::Text(text) => self.record(FakeEvent::Text(text.to_string())),
        }
    }
}

/// Desktop with two applications; the second one owns the active window
///
/// ```text
/// root
/// ├── 0 application "Files"
/// │   └── 0/0 frame "Home"
/// └── 1 application "Editor"
///     ├── 1/0 frame "Untitled" (active)
///     │   ├── 1/0/0 push button "Save"
///     │   └── 1/0/1 text "Body"
///     └── 1/1 dialog "Prefs"
///         ├── 1/1/0 check box "Wrap"
///         ├── 1/1/1 label "Hidden" (zero size)
///         └── 1/1/2 push button "Apply" (no extents, has action)
/// ```
pub fn sample_desktop() -> FakeDesktop {
    let files = FakeNode::new("application", "Files")
        .child(FakeNode::new("frame", "Home").bounds(0, 0, 800, 600));
    let editor = FakeNode::new("application", "Editor")
        .child(
            FakeNode::new("frame", "Untitled")
                .bounds(100, 50, 1024, 768)
                .states(&[NodeState::Enabled, NodeState::Active])
                .child(FakeNode::new("push button", "Save").bounds(110, 60, 80, 30))
                .child(
                    FakeNode::new("text", "Body")
                        .bounds(110, 100, 900, 600)
                        .value("hello")
                        .states(&[NodeState::Enabled, NodeState::Focused]),
                ),
        )
        .child(
            FakeNode::new("dialog", "Prefs")
                .bounds(10, 20, 100, 50)
                .child(
                    FakeNode::new("check box", "Wrap")
                        .bounds(12, 22, 16, 16)
                        .states(&[NodeState::Enabled, NodeState::Checked]),
                )
                .child(FakeNode::new("label", "Hidden").bounds(5, 5, 0, 10))
                .child(FakeNode::new("push button", "Apply").no_extents().with_action()),
        );
    FakeDesktop::new(
        FakeNode::new("desktop frame", "main")
            .child(files)
            .child(editor),
    )
}
