//! Driver identity and capability advertisement

use crate::constants::{DRIVER_KIND, DRIVER_NAME};
use atspi_sidecar_protocol::{Capabilities, DriverDescriptor};

/// What this sidecar actually implements
///
/// Scrolling, OCR and screenshots are not implemented and must stay
/// `false` until they are.
pub const CAPABILITIES: Capabilities = Capabilities {
    can_snapshot: true,
    can_click: true,
    can_type: true,
    can_key: true,
    can_focus: true,
    can_scroll: false,
    can_ocr: false,
    can_screenshot: false,
    can_inject_input: true,
};

pub fn driver_descriptor() -> DriverDescriptor {
    DriverDescriptor {
        name: DRIVER_NAME.to_string(),
        kind: DRIVER_KIND.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: CAPABILITIES,
    }
}
