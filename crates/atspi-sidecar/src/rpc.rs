//! Line-delimited JSON-RPC loop
//!
//! One request is read, handled and answered before the next line is read.
//! Handler failures, including panics, become JSON-RPC errors and never end
//! the loop; only end of input or a transport error does.

use crate::actions::{
    ActionDispatcher, ClickParams, ClickXyParams, FocusParams, KeyParams, ScrollParams, TypeParams,
};
use crate::active_window::WindowLocator;
use crate::backend::AccessibilityBackend;
use crate::config::SidecarConfig;
use crate::driver::driver_descriptor;
use crate::errors::HandlerError;
use crate::snapshot::{SnapshotParams, take_snapshot};
use atspi_sidecar_protocol::{
    DriverDescriptor, ProtocolError, RpcRequest, RpcResponse, codes, write_response,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

/// Methods understood by the sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    GetCapabilities,
    Snapshot,
    Click,
    ClickXy,
    Type,
    Key,
    Scroll,
    Focus,
}

impl Method {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "get_capabilities" => Self::GetCapabilities,
            "snapshot" => Self::Snapshot,
            "click" => Self::Click,
            "click_xy" => Self::ClickXy,
            "type" => Self::Type,
            "key" => Self::Key,
            "scroll" => Self::Scroll,
            "focus" => Self::Focus,
            _ => return None,
        })
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, HandlerError> {
    serde_json::from_value(params).map_err(HandlerError::InvalidParams)
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, HandlerError> {
    serde_json::to_value(value).map_err(HandlerError::Serialize)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// The sidecar: a backend, a window locator and the immutable driver info
pub struct Sidecar<B, L> {
    backend: B,
    locator: L,
    config: SidecarConfig,
    driver: DriverDescriptor,
}

impl<B, L> Sidecar<B, L>
where
    B: AccessibilityBackend,
    L: WindowLocator<B>,
{
    pub fn new(backend: B, locator: L, config: SidecarConfig) -> Self {
        Self {
            backend,
            locator,
            config,
            driver: driver_descriptor(),
        }
    }

    /// Serve requests until `reader` reaches end of input
    ///
    /// Lines that are not valid UTF-8 are answered with a parse error.
    pub fn serve<R: BufRead, W: Write>(
        &self,
        reader: R,
        writer: &mut W,
    ) -> Result<(), ProtocolError> {
        tracing::info!("Sidecar ready ({} {})", self.driver.name, self.driver.version);

        for chunk in reader.split(b'\n') {
            let bytes = chunk?;
            let response = match std::str::from_utf8(&bytes) {
                Ok(line) => self.handle_line(line),
                Err(e) => Some(RpcResponse::error(
                    Value::Null,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            };
            if let Some(response) = response {
                write_response(writer, &response)?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one input line; blank lines produce no response
    pub fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match RpcRequest::from_line(line) {
            Ok(request) => self.handle_request(request),
            Err(ProtocolError::InvalidRequest { id }) => {
                RpcResponse::error(id, codes::INVALID_REQUEST, "Invalid request")
            }
            Err(e) => {
                tracing::debug!("Unparseable request: {}", e);
                RpcResponse::error(Value::Null, codes::PARSE_ERROR, format!("Parse error: {}", e))
            }
        };
        Some(response)
    }

    pub fn handle_request(&self, request: RpcRequest) -> RpcResponse {
        let RpcRequest { id, method, params } = request;
        let Some(parsed) = Method::from_name(&method) else {
            tracing::debug!("Unknown method '{}'", method);
            return RpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            );
        };

        tracing::debug!("Handling '{}'", method);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(parsed, params)));
        match outcome {
            Ok(Ok(result)) => RpcResponse::success(id, result),
            Ok(Err(e @ HandlerError::InvalidParams(_))) => {
                RpcResponse::error(id, codes::INVALID_PARAMS, e.to_string())
            }
            Ok(Err(e)) => {
                tracing::warn!("'{}' failed: {}", method, e);
                RpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!("'{}' panicked: {}", method, message);
                RpcResponse::error(id, codes::INTERNAL_ERROR, message)
            }
        }
    }

    fn dispatch(&self, method: Method, params: Value) -> Result<Value, HandlerError> {
        let actions = || ActionDispatcher::new(&self.backend, &self.driver, self.config.focus_settle);
        match method {
            Method::GetCapabilities => to_result(&self.driver.capabilities),
            Method::Snapshot => to_result(&take_snapshot(
                &self.backend,
                &self.locator,
                &self.config.snapshot,
                &self.driver,
                parse_params::<SnapshotParams>(params)?,
            )),
            Method::Click => to_result(&actions().click(parse_params::<ClickParams>(params)?)),
            Method::ClickXy => to_result(&actions().click_xy(parse_params::<ClickXyParams>(params)?)),
            Method::Type => to_result(&actions().type_text(parse_params::<TypeParams>(params)?)),
            Method::Key => to_result(&actions().press_key(parse_params::<KeyParams>(params)?)),
            Method::Scroll => to_result(&actions().scroll(parse_params::<ScrollParams>(params)?)),
            Method::Focus => to_result(&actions().focus(parse_params::<FocusParams>(params)?)),
        }
    }
}
