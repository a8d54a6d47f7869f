//! Visor HUD - Transports and Connection Management
//!
//! The wire side of a device session:
//!
//! - [`Transport`] - one live connection to one device, implemented today
//!   by [`MqttTransport`] (pub/sub over MQTT). New kinds plug in as new
//!   implementations behind the same trait and factory.
//! - [`DeviceHistory`] - ordered, deduplicated record of connected devices
//!   for quick re-selection.
//! - [`ConnectionManager`] - owns at most one active transport, routes
//!   connects through the right transport kind, and exposes next/previous
//!   device switching over the history.
//!
//! Transports deliver data and metadata through callbacks from their own
//! background task; the only state they share with the rest of the system
//! is the descriptor they update with device metadata.

pub mod error;
pub mod history;
pub mod manager;
pub mod mqtt;
pub mod transport;

pub use error::{Result, TransportError};
pub use history::DeviceHistory;
pub use manager::{ConnectionManager, TransportFactory, DEFAULT_CONNECT_TIMEOUT};
pub use mqtt::MqttTransport;
pub use transport::{transport_for, DataCallback, MetaCallback, Transport};
