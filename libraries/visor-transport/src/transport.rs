//! The transport seam: one live wire connection to one device

use crate::error::{Result, TransportError};
use crate::mqtt::MqttTransport;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use visor_link::{LinkDescriptor, MetadataUpdate, TransportKind};

/// Delivered every data-channel message, in arrival order, from the
/// transport's background worker. The payload is always a JSON object.
pub type DataCallback = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Delivered every metadata-channel message, after the shared descriptor
/// has been updated with it.
pub type MetaCallback = Arc<dyn Fn(&MetadataUpdate) + Send + Sync>;

/// A live wire connection to one device.
///
/// Implementations own whatever background worker the wire needs and must
/// guarantee:
/// - a failed [`connect`] leaves no dangling connection behind
/// - data messages reach `on_data` in arrival order, malformed payloads
///   are logged and dropped
/// - metadata messages update the shared descriptor before `on_meta` runs
/// - [`disconnect`] is idempotent and returns within a bounded time even
///   while the worker is mid-operation
///
/// Transports never reconnect on their own; a dead connection just flips
/// [`is_connected`] and waits for the session to decide.
///
/// [`connect`]: Transport::connect
/// [`disconnect`]: Transport::disconnect
/// [`is_connected`]: Transport::is_connected
#[async_trait]
pub trait Transport: Send {
    /// Which link transport kind this implementation serves.
    fn kind(&self) -> TransportKind;

    /// Establish the connection and subscribe to the device's channels.
    ///
    /// Blocks up to `timeout` for the wire handshake. After the handshake
    /// a short bounded wait gives a retained metadata message the chance
    /// to arrive first, but its absence does not fail the connect.
    async fn connect(
        &mut self,
        on_data: DataCallback,
        on_meta: MetaCallback,
        timeout: Duration,
    ) -> Result<()>;

    /// Tear down the connection and stop the background worker.
    async fn disconnect(&mut self);

    /// Whether the wire is currently up.
    fn is_connected(&self) -> bool;
}

/// Build the transport for the descriptor's kind.
///
/// The descriptor is shared because the transport writes device metadata
/// into it as messages arrive.
pub fn transport_for(link: Arc<RwLock<LinkDescriptor>>) -> Result<Box<dyn Transport>> {
    let kind = read_link(&link).transport();
    match kind {
        TransportKind::Mqtt => Ok(Box::new(MqttTransport::new(link))),
        other => Err(TransportError::Unsupported(other)),
    }
}

/// Read the shared descriptor, surviving a poisoned lock (a panicked
/// writer cannot leave the descriptor half-updated; updates are atomic
/// field stores).
pub(crate) fn read_link(link: &Arc<RwLock<LinkDescriptor>>) -> std::sync::RwLockReadGuard<'_, LinkDescriptor> {
    link.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub(crate) fn write_link(link: &Arc<RwLock<LinkDescriptor>>) -> std::sync::RwLockWriteGuard<'_, LinkDescriptor> {
    link.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}
