//! Render model and collaborator traits
//!
//! The session core does not draw pixels. Once per tick it hands the
//! renderer one [`Frame`] describing the current screen; what becomes of
//! it (SPI display, desktop window, terminal) is the renderer's business.

use serde_json::Value;
use visor_link::LinkDescriptor;

/// One history entry as shown on the device list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub endpoint: String,
}

impl DeviceSummary {
    pub fn from_link(link: &LinkDescriptor) -> Self {
        Self {
            id: link.id().to_string(),
            name: link.display_name().to_string(),
            endpoint: link.endpoint(),
        }
    }
}

/// Everything the renderer needs for one screen.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Waiting for a link scan
    Scanning,
    /// Numeric credential challenge
    PinEntry {
        device: String,
        hint: Option<String>,
        digits: Vec<u8>,
        cursor: usize,
        error: Option<String>,
    },
    /// Wire handshake in progress
    Connecting { device: String },
    /// Live data view; `sample` is the latest received data object
    Streaming {
        descriptor: LinkDescriptor,
        sample: Option<Value>,
    },
    /// Known-device picker
    DeviceList {
        devices: Vec<DeviceSummary>,
        selected: usize,
        active: Option<String>,
    },
    /// Blocking error, dismissed by confirm/cancel
    Error { message: String },
}

impl Frame {
    /// Stable name of the frame variant, for logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Scanning => "scanning",
            Frame::PinEntry { .. } => "pin-entry",
            Frame::Connecting { .. } => "connecting",
            Frame::Streaming { .. } => "streaming",
            Frame::DeviceList { .. } => "device-list",
            Frame::Error { .. } => "error",
        }
    }
}

/// Display-side collaborator. Consumes frames, produces nothing back.
pub trait Renderer: Send {
    fn show(&mut self, frame: &Frame);
}

/// Camera/decoder-side collaborator: yields a raw candidate link string
/// when one has been scanned. The session only consumes its output
/// through the link parser.
pub trait LinkSource: Send {
    /// Non-blocking check for a newly scanned link.
    fn poll_link(&mut self) -> Option<String>;
}
