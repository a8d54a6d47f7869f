//! Connection manager: one active transport plus switchable history

use crate::error::Result;
use crate::history::DeviceHistory;
use crate::transport::{self, read_link, DataCallback, MetaCallback, Transport};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{error, info};
use visor_link::LinkDescriptor;

/// Default bound on the wire handshake during connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds a transport for a shared descriptor. Swappable so tests can
/// substitute a scripted transport.
pub type TransportFactory =
    Box<dyn Fn(Arc<RwLock<LinkDescriptor>>) -> Result<Box<dyn Transport>> + Send>;

/// Owns at most one active transport and the device history behind
/// next/previous switching.
pub struct ConnectionManager {
    factory: TransportFactory,
    transport: Option<Box<dyn Transport>>,
    active: Option<Arc<RwLock<LinkDescriptor>>>,
    history: DeviceHistory,
    connect_timeout: Duration,
}

impl ConnectionManager {
    /// Manager using the real transport implementations.
    pub fn new() -> Self {
        Self::with_factory(Box::new(transport::transport_for))
    }

    /// Manager with a custom transport factory (used by tests).
    pub fn with_factory(factory: TransportFactory) -> Self {
        Self {
            factory,
            transport: None,
            active: None,
            history: DeviceHistory::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the handshake timeout (builder style).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect to a device, tearing down any existing connection first.
    ///
    /// On success the descriptor is recorded into history (dedup-by-id,
    /// move-to-end) and becomes the active device. On failure history and
    /// the active pointer are left as the teardown left them - nothing is
    /// recorded and no transport dangles.
    pub async fn connect(
        &mut self,
        link: LinkDescriptor,
        on_data: DataCallback,
        on_meta: MetaCallback,
    ) -> Result<()> {
        // Exactly one active transport at a time.
        self.disconnect().await;

        let device_id = link.id().to_string();
        let shared = Arc::new(RwLock::new(link));
        let mut transport = (self.factory)(Arc::clone(&shared))?;

        match transport
            .connect(on_data, on_meta, self.connect_timeout)
            .await
        {
            Ok(()) => {
                self.history.record(&read_link(&shared));
                self.transport = Some(transport);
                self.active = Some(shared);
                info!(device = %device_id, "device connected");
                Ok(())
            }
            Err(e) => {
                error!(device = %device_id, error = %e, "connect failed");
                Err(e)
            }
        }
    }

    /// Tear down the active transport, keeping history so the device can
    /// be re-selected later.
    pub async fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect().await;
        }
        self.active = None;
    }

    /// Rotate the history selection forward and return the target for the
    /// caller to re-run the connect flow. Does not reconnect by itself.
    /// `None` (no-op) with fewer than two known devices.
    pub fn switch_next(&mut self) -> Option<LinkDescriptor> {
        self.history.switch_next()
    }

    /// Rotate the history selection backward; see [`switch_next`].
    ///
    /// [`switch_next`]: ConnectionManager::switch_next
    pub fn switch_prev(&mut self) -> Option<LinkDescriptor> {
        self.history.switch_prev()
    }

    /// Whether the active transport currently has the wire up.
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_connected())
    }

    /// Snapshot of the active descriptor, metadata included.
    pub fn active_descriptor(&self) -> Option<LinkDescriptor> {
        self.active.as_ref().map(|link| read_link(link).clone())
    }

    /// Number of devices in history.
    pub fn device_count(&self) -> usize {
        self.history.len()
    }

    /// History snapshot, oldest first, with the active entry refreshed
    /// from the live descriptor so its metadata is current.
    pub fn known_devices(&self) -> Vec<LinkDescriptor> {
        let mut list = self.history.entries().to_vec();
        if let Some(active) = &self.active {
            let live = read_link(active).clone();
            if let Some(entry) = list.iter_mut().find(|d| d.id() == live.id()) {
                *entry = live;
            }
        }
        list
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
