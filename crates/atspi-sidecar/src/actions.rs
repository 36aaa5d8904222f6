//! Input action implementations (click, click_xy, type, key, focus, scroll)
//!
//! Actions never fail at the JSON-RPC level. Unresolvable targets and
//! native input failures come back as `status: error` results.

use crate::backend::{AccessibilityBackend, KeyInput};
use crate::keys::keysym;
use crate::path::resolve_target;
use atspi_sidecar_protocol::{ActionResult, Bounds, DriverDescriptor};
use serde::{Deserialize, Deserializer};
use std::thread;
use std::time::Duration;

/// Accept integer or fractional coordinates, flooring fractions
fn coord<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map(|v| v.floor() as i32))
}

/// Literal bounds supplied by the client
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundsParam {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<BoundsParam> for Bounds {
    fn from(b: BoundsParam) -> Self {
        Bounds::new(
            b.x.floor() as i32,
            b.y.floor() as i32,
            b.w.floor() as i32,
            b.h.floor() as i32,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClickParams {
    /// Node path, or a legacy locator containing `atspiPath="..."`
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub bounds: Option<BoundsParam>,
    #[serde(default, deserialize_with = "coord")]
    pub x: Option<i32>,
    #[serde(default, deserialize_with = "coord")]
    pub y: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClickXyParams {
    #[serde(default, deserialize_with = "coord")]
    pub x: Option<i32>,
    #[serde(default, deserialize_with = "coord")]
    pub y: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TypeParams {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyParams {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FocusParams {
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrollParams {
    #[serde(default)]
    pub target: Option<String>,
}

/// Executes input actions against a backend
pub struct ActionDispatcher<'a, B: AccessibilityBackend> {
    backend: &'a B,
    driver: &'a DriverDescriptor,
    focus_settle: Duration,
}

impl<'a, B: AccessibilityBackend> ActionDispatcher<'a, B> {
    pub fn new(backend: &'a B, driver: &'a DriverDescriptor, focus_settle: Duration) -> Self {
        Self {
            backend,
            driver,
            focus_settle,
        }
    }

    fn success(&self, message: impl Into<String>) -> ActionResult {
        ActionResult::success(self.driver, message)
    }

    fn error(&self, message: impl Into<String>) -> ActionResult {
        ActionResult::error(self.driver, message)
    }

    /// Resolve an optional target; empty strings count as absent
    fn target_node(&self, target: Option<&str>) -> Option<B::Node> {
        let target = target.filter(|t| !t.is_empty())?;
        let node = resolve_target(self.backend, target).into_option();
        if node.is_none() {
            tracing::debug!("Target '{}' did not resolve", target);
        }
        node
    }

    fn click_point(&self, x: i32, y: i32) -> ActionResult {
        match self.backend.click_at(x, y) {
            Ok(()) => self.success(format!("Clicked at {}, {}", x, y)),
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Click a target, falling back to literal bounds, then coordinates
    ///
    /// A resolved target without usable geometry gets its default action
    /// invoked, but only after the coordinate fallbacks are exhausted.
    pub fn click(&self, params: ClickParams) -> ActionResult {
        let node = self.target_node(params.target.as_deref());

        if let Some(node) = &node {
            match self.backend.extents(node) {
                Ok(bounds) if bounds.has_area() => {
                    let (x, y) = bounds.center();
                    return self.click_point(x, y);
                }
                Ok(_) => tracing::debug!("Click target has no area"),
                Err(e) => tracing::debug!("Click target extents unreadable: {}", e),
            }
        }

        if let Some(bounds) = params.bounds {
            let (x, y) = Bounds::from(bounds).center();
            return self.click_point(x, y);
        }

        if let (Some(x), Some(y)) = (params.x, params.y) {
            return self.click_point(x, y);
        }

        if let Some(node) = &node {
            match self.backend.do_default_action(node) {
                Ok(true) => return self.success("Invoked default action on target"),
                Ok(false) => tracing::debug!("Click target has no default action"),
                Err(e) => tracing::debug!("Default action failed: {}", e),
            }
        }

        self.error("Click target not found or no bounds provided")
    }

    /// Click a literal point without resolving anything
    pub fn click_xy(&self, params: ClickXyParams) -> ActionResult {
        match (params.x, params.y) {
            (Some(x), Some(y)) => self.click_point(x, y),
            _ => self.error("click_xy requires x and y"),
        }
    }

    /// Type text, focusing the target first when it resolves
    pub fn type_text(&self, params: TypeParams) -> ActionResult {
        if let Some(node) = self.target_node(params.target.as_deref()) {
            match self.backend.grab_focus(&node) {
                Ok(_) => thread::sleep(self.focus_settle),
                Err(e) => tracing::debug!("Focus before typing failed: {}", e),
            }
        }

        if params.text.is_empty() {
            return self.success("Nothing to type");
        }

        match self.backend.synthesize_key(KeyInput::Text(&params.text)) {
            Ok(()) => self.success(format!("Typed {} characters", params.text.chars().count())),
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Press each key in order
    ///
    /// All names are translated before anything is sent, so an unknown key
    /// sends nothing.
    pub fn press_key(&self, params: KeyParams) -> ActionResult {
        if params.keys.is_empty() {
            return self.error("No keys provided");
        }

        let mut syms = Vec::with_capacity(params.keys.len());
        for key in &params.keys {
            match keysym(key) {
                Some(sym) => syms.push(sym),
                None => return self.error(format!("Unknown key: {}", key)),
            }
        }

        for (key, sym) in params.keys.iter().zip(syms) {
            if let Err(e) = self.backend.synthesize_key(KeyInput::Sym(sym)) {
                return self.error(format!("Failed to send key '{}': {}", key, e));
            }
        }
        self.success(format!("Pressed {}", params.keys.join(", ")))
    }

    pub fn focus(&self, params: FocusParams) -> ActionResult {
        let Some(node) = self.target_node(Some(&params.target)) else {
            return self.error("Element not found for focus");
        };

        match self.backend.grab_focus(&node) {
            Ok(true) => self.success(format!("Focused {}", params.target)),
            Ok(false) => self.error(format!("Element {} refused focus", params.target)),
            Err(e) => self.error(format!("Failed to focus: {}", e)),
        }
    }

    /// Scrolling is not implemented; capabilities report `canScroll: false`
    pub fn scroll(&self, params: ScrollParams) -> ActionResult {
        tracing::debug!("Scroll requested for {:?}; not implemented", params.target);
        self.success("Scroll not implemented natively yet")
    }
}
