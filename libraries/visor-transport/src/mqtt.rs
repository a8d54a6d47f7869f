//! MQTT transport: the pub/sub wire implementation
//!
//! Connects to the broker named by the descriptor, subscribes to the
//! retained metadata channel (`{topic}/$meta`, QoS 1) and the data channel
//! (`{topic}`, QoS 0), and streams both back through callbacks from a
//! background event-loop task.

use crate::error::{Result, TransportError};
use crate::transport::{read_link, write_link, DataCallback, MetaCallback, Transport};
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use visor_link::{LinkDescriptor, MetadataUpdate, TransportKind};

/// How long to wait for the retained metadata message after subscribing.
/// Absence is not an error; streaming may start metadata-less.
const META_WAIT: Duration = Duration::from_secs(3);

/// Bound on joining the event-loop task during disconnect.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// MQTT connection to a single device.
pub struct MqttTransport {
    link: Arc<RwLock<LinkDescriptor>>,
    client: Option<AsyncClient>,
    worker: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
}

impl MqttTransport {
    /// Wrap a shared descriptor; nothing connects until [`Transport::connect`].
    pub fn new(link: Arc<RwLock<LinkDescriptor>>) -> Self {
        Self {
            link,
            client: None,
            worker: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Mqtt
    }

    async fn connect(
        &mut self,
        on_data: DataCallback,
        on_meta: MetaCallback,
        timeout: Duration,
    ) -> Result<()> {
        let (host, port, endpoint, device_id, data_topic, meta_topic) = {
            let link = read_link(&self.link);
            (
                link.host().to_string(),
                link.port(),
                link.endpoint(),
                link.id().to_string(),
                link.topic().map(str::to_string),
                link.meta_topic(),
            )
        };

        // Unique client id per connection so a stale session on the broker
        // never kicks the new one.
        let client_id = format!("visor-hud-{}-{}", device_id, Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(60));

        let (client, eventloop) = AsyncClient::new(options, 64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (meta_tx, meta_rx) = oneshot::channel();

        self.worker = Some(tokio::spawn(run_event_loop(
            eventloop,
            Arc::clone(&self.link),
            Arc::clone(&self.connected),
            Channels {
                data_topic: data_topic.clone(),
                meta_topic: meta_topic.clone(),
            },
            on_data,
            on_meta,
            ready_tx,
            meta_tx,
        )));
        self.client = Some(client.clone());

        match tokio::time::timeout(timeout, ready_rx).await {
            Ok(Ok(true)) => {}
            Ok(_) => {
                self.disconnect().await;
                return Err(TransportError::Refused(endpoint));
            }
            Err(_) => {
                warn!(endpoint = %endpoint, "broker handshake timed out");
                self.disconnect().await;
                return Err(TransportError::HandshakeTimeout(timeout));
            }
        }

        // Metadata first so the retained message lands before data starts.
        if let Some(topic) = &meta_topic {
            client.subscribe(topic.as_str(), QoS::AtLeastOnce).await?;
        }
        if let Some(topic) = &data_topic {
            client.subscribe(topic.as_str(), QoS::AtMostOnce).await?;
        }

        if meta_topic.is_some() {
            // Bounded wait; connect succeeds either way.
            if tokio::time::timeout(META_WAIT, meta_rx).await.is_err() {
                debug!(device = %device_id, "no retained metadata, streaming without it");
            }
        }

        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            // Fails when the event loop is already gone; either way the
            // worker unblocks.
            let _ = client.disconnect().await;
        }
        if let Some(worker) = self.worker.take() {
            let abort = worker.abort_handle();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, worker).await.is_err() {
                warn!("event loop did not stop in time, aborting");
                abort.abort();
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// The two logical channels derived from the link topic.
struct Channels {
    data_topic: Option<String>,
    meta_topic: Option<String>,
}

#[allow(clippy::too_many_arguments)]
async fn run_event_loop(
    mut eventloop: EventLoop,
    link: Arc<RwLock<LinkDescriptor>>,
    connected: Arc<AtomicBool>,
    channels: Channels,
    on_data: DataCallback,
    on_meta: MetaCallback,
    ready_tx: oneshot::Sender<bool>,
    meta_tx: oneshot::Sender<()>,
) {
    let endpoint = read_link(&link).endpoint();
    let mut ready = Some(ready_tx);
    let mut first_meta = Some(meta_tx);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!(endpoint = %endpoint, "connected to broker");
                    connected.store(true, Ordering::SeqCst);
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(true);
                    }
                } else {
                    warn!(endpoint = %endpoint, code = ?ack.code, "broker refused connection");
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(false);
                    }
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_publish(
                    &publish.topic,
                    &publish.payload,
                    &link,
                    &channels,
                    &on_data,
                    &on_meta,
                    &mut first_meta,
                );
            }
            Ok(_) => {}
            Err(e) => {
                // The normal exit path for disconnect(); anything earlier
                // is a dropped link. No automatic reconnect either way.
                if connected.swap(false, Ordering::SeqCst) {
                    warn!(endpoint = %endpoint, error = %e, "connection lost");
                } else {
                    debug!(endpoint = %endpoint, error = %e, "event loop ended");
                }
                if let Some(tx) = ready.take() {
                    let _ = tx.send(false);
                }
                break;
            }
        }
    }
}

fn handle_publish(
    topic: &str,
    payload: &[u8],
    link: &Arc<RwLock<LinkDescriptor>>,
    channels: &Channels,
    on_data: &DataCallback,
    on_meta: &MetaCallback,
    first_meta: &mut Option<oneshot::Sender<()>>,
) {
    let value: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(topic = %topic, error = %e, "dropping malformed payload");
            return;
        }
    };

    if channels.meta_topic.as_deref() == Some(topic) {
        let update: MetadataUpdate = match serde_json::from_value(value) {
            Ok(u) => u,
            Err(e) => {
                warn!(topic = %topic, error = %e, "dropping malformed metadata");
                return;
            }
        };
        {
            write_link(link).apply_metadata(&update);
        }
        debug!(device = %read_link(link).id(), "metadata applied");
        on_meta(&update);
        if let Some(tx) = first_meta.take() {
            let _ = tx.send(());
        }
    } else if channels.data_topic.as_deref() == Some(topic) {
        if !value.is_object() {
            warn!(topic = %topic, "dropping non-object data payload");
            return;
        }
        on_data(value);
    }
}
