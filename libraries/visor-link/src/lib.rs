//! Visor HUD - Link Grammar
//!
//! The `visor://` link format and the device descriptor it parses into.
//!
//! A link is the compact URL a device displays (usually as a QR code) so a
//! HUD can find and connect to it:
//!
//! ```text
//! visor://v1/{device-id}/{transport}/{host}:{port}[?auth={method}&t={topic}]
//! ```
//!
//! This crate provides:
//! - `parse()` - fail-closed validation of a raw link string
//! - `LinkDescriptor` - immutable connection identity plus device metadata
//!   that is filled in later from the device's retained metadata message
//! - `TransportKind` / `AuthMethod` - the closed sets of supported tokens
//!
//! # Example
//!
//! ```rust
//! use visor_link::{parse, AuthMethod, TransportKind};
//!
//! let link = parse("visor://v1/pump-7/mqtt/10.0.0.5:1883?auth=pin&t=plant/pump7").unwrap();
//! assert_eq!(link.id(), "pump-7");
//! assert_eq!(link.transport(), TransportKind::Mqtt);
//! assert_eq!(link.auth(), AuthMethod::Pin);
//! assert_eq!(link.topic(), Some("plant/pump7"));
//! assert_eq!(link.meta_topic().as_deref(), Some("plant/pump7/$meta"));
//! ```

pub mod descriptor;
pub mod error;
pub mod parse;

pub use descriptor::{
    AuthMethod, DeviceMeta, FieldSchema, LinkDescriptor, MetadataUpdate, TransportKind,
    LINK_SCHEME, MAX_LINK_LEN, PROTOCOL_VERSION,
};
pub use error::{LinkParseError, Result};
pub use parse::parse;
