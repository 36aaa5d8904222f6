//! AT-SPI implementation of the accessibility backend
//!
//! AT-SPI is asynchronous (zbus). The backend owns a current-thread tokio
//! runtime and blocks on every call, so callers see a synchronous API and
//! requests stay strictly sequential.

use crate::backend::{AccessibilityBackend, KeyInput, NodeState};
use crate::constants::MAX_VALUE_CHARS;
use crate::errors::BackendError;
use atspi::connection::AccessibilityConnection;
use atspi::proxy::accessible::{AccessibleProxy, ObjectRefExt};
use atspi::proxy::device_event_controller::{DeviceEventControllerProxy, KeySynthType};
use atspi::proxy::proxy_ext::ProxyExt;
use atspi::{CoordType, ObjectRefOwned, State};
use atspi_sidecar_protocol::Bounds;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

const REGISTRY_DESTINATION: &str = "org.a11y.atspi.Registry";
const DESKTOP_ROOT_PATH: &str = "/org/a11y/atspi/accessible/root";

/// Mouse event name for a left button click
const LEFT_CLICK: &str = "b1c";

/// Handle to an accessible object
#[derive(Debug, Clone)]
pub enum AtspiNode {
    /// The registry's desktop root
    Root,
    Object(ObjectRefOwned),
}

/// Backend talking to the AT-SPI registry over the accessibility bus
pub struct AtspiBackend {
    runtime: Runtime,
    connection: AccessibilityConnection,
}

impl AtspiBackend {
    /// Connect to the accessibility bus
    pub fn connect() -> Result<Self, BackendError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let connection = runtime
            .block_on(AccessibilityConnection::new())
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        tracing::info!("Connected to AT-SPI accessibility bus");
        Ok(Self {
            runtime,
            connection,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn accessible<'a>(
        &'a self,
        node: &'a AtspiNode,
    ) -> Result<AccessibleProxy<'a>, BackendError> {
        let connection = self.connection.connection();
        let proxy = match node {
            AtspiNode::Root => {
                AccessibleProxy::builder(connection)
                    .destination(REGISTRY_DESTINATION)?
                    .path(DESKTOP_ROOT_PATH)?
                    .build()
                    .await?
            }
            AtspiNode::Object(object) => object.as_accessible_proxy(connection).await?,
        };
        Ok(proxy)
    }

    async fn input_controller(&self) -> Result<DeviceEventControllerProxy<'_>, BackendError> {
        DeviceEventControllerProxy::new(self.connection.connection())
            .await
            .map_err(|e| BackendError::Input(e.to_string()))
    }
}

impl AccessibilityBackend for AtspiBackend {
    type Node = AtspiNode;

    fn root(&self) -> Result<AtspiNode, BackendError> {
        Ok(AtspiNode::Root)
    }

    fn child_count(&self, node: &AtspiNode) -> Result<usize, BackendError> {
        self.block_on(async {
            let proxy = self.accessible(node).await?;
            let count = proxy.child_count().await?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    fn child_at(&self, node: &AtspiNode, index: usize) -> Result<AtspiNode, BackendError> {
        self.block_on(async {
            // Callers check `index` against `child_count`; an index gone stale
            // since then yields a null reference whose calls fail later
            let raw_index = i32::try_from(index)
                .map_err(|_| BackendError::Call(format!("Child index {} out of range", index)))?;
            let proxy = self.accessible(node).await?;
            let child = proxy.get_child_at_index(raw_index).await?;
            Ok(AtspiNode::Object(child))
        })
    }

    fn role_name(&self, node: &AtspiNode) -> Result<String, BackendError> {
        self.block_on(async { Ok(self.accessible(node).await?.get_role_name().await?) })
    }

    fn name(&self, node: &AtspiNode) -> Result<String, BackendError> {
        self.block_on(async { Ok(self.accessible(node).await?.name().await?) })
    }

    fn value(&self, node: &AtspiNode) -> Result<String, BackendError> {
        self.block_on(async {
            let proxy = self.accessible(node).await?;
            let proxies = proxy.proxies().await?;
            // Nodes without a Text interface have no value
            let Ok(text) = proxies.text().await else {
                return Ok(String::new());
            };
            let cap = i32::try_from(MAX_VALUE_CHARS).unwrap_or(i32::MAX);
            let length = text.character_count().await?.min(cap);
            if length <= 0 {
                return Ok(String::new());
            }
            Ok(text.get_text(0, length).await?)
        })
    }

    fn extents(&self, node: &AtspiNode) -> Result<Bounds, BackendError> {
        self.block_on(async {
            let proxy = self.accessible(node).await?;
            let proxies = proxy.proxies().await?;
            let component = proxies
                .component()
                .await
                .map_err(|_| BackendError::interface_not_available("Component"))?;
            let (x, y, w, h) = component.get_extents(CoordType::Screen).await?;
            Ok(Bounds::new(x, y, w, h))
        })
    }

    fn states(&self, node: &AtspiNode) -> Result<Vec<NodeState>, BackendError> {
        self.block_on(async {
            let set = self.accessible(node).await?.get_state().await?;
            let states = [
                (State::Active, NodeState::Active),
                (State::Enabled, NodeState::Enabled),
                (State::Focused, NodeState::Focused),
                (State::Checked, NodeState::Checked),
                (State::Selected, NodeState::Selected),
                (State::Expanded, NodeState::Expanded),
            ]
            .into_iter()
            .filter(|(atspi_state, _)| set.contains(*atspi_state))
            .map(|(_, state)| state)
            .collect();
            Ok(states)
        })
    }

    fn do_default_action(&self, node: &AtspiNode) -> Result<bool, BackendError> {
        self.block_on(async {
            let proxy = self.accessible(node).await?;
            let proxies = proxy.proxies().await?;
            let Ok(action) = proxies.action().await else {
                return Ok(false);
            };
            // Action 0 is the default action
            Ok(action.do_action(0).await?)
        })
    }

    fn grab_focus(&self, node: &AtspiNode) -> Result<bool, BackendError> {
        self.block_on(async {
            let proxy = self.accessible(node).await?;
            let proxies = proxy.proxies().await?;
            let component = proxies
                .component()
                .await
                .map_err(|_| BackendError::interface_not_available("Component"))?;
            Ok(component.grab_focus().await?)
        })
    }

    fn click_at(&self, x: i32, y: i32) -> Result<(), BackendError> {
        self.block_on(async {
            self.input_controller()
                .await?
                .generate_mouse_event(x, y, LEFT_CLICK)
                .await
                .map_err(|e| BackendError::Input(e.to_string()))
        })
    }

    fn synthesize_key(&self, input: KeyInput<'_>) -> Result<(), BackendError> {
        self.block_on(async {
            let controller = self.input_controller().await?;
            let sent = match input {
                KeyInput::Sym(sym) => {
                    let keysym = i32::try_from(sym)
                        .map_err(|_| BackendError::Input(format!("Keysym {:#x} out of range", sym)))?;
                    controller
                        .generate_keyboard_event(keysym, "", KeySynthType::Sym)
                        .await
                }
                KeyInput::Text(text) => {
                    controller
                        .generate_keyboard_event(0, text, KeySynthType::String)
                        .await
                }
            };
            sent.map_err(|e| BackendError::Input(e.to_string()))
        })
    }
}
