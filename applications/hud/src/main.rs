//! Visor HUD - wearable display session runner
//!
//! Wires the session core to the desktop collaborators: terminal
//! renderer, stdin keyboard, remote-control listener and file link
//! source. Two modes mirror how the HUD is actually used: `scan` waits
//! for a link, `demo` connects straight to a known device.

mod config;
mod input;
mod render;
mod scan;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::HudConfig;
use input::{KeyboardBackend, RemoteBackend};
use render::TermRenderer;
use scan::FileLinkSource;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visor_auth::AuthGate;
use visor_input::InputManager;
use visor_link::{AuthMethod, LinkDescriptor, TransportKind};
use visor_session::{Session, SessionConfig};
use visor_transport::ConnectionManager;

#[derive(Parser)]
#[command(name = "visor-hud")]
#[command(about = "Wearable HUD: scan a device link, stream its data", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VISOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a device link (from a file or the remote control)
    Scan {
        /// File containing a decoded link (stands in for the camera)
        #[arg(long)]
        link_file: Option<PathBuf>,
    },
    /// Connect directly to a known device without scanning
    Demo {
        /// Device id
        device_id: String,
        /// Broker endpoint as host:port
        #[arg(long, default_value = "localhost:1883")]
        broker: String,
        /// Data topic
        #[arg(long)]
        topic: String,
        /// Auth method (open, pin, token, mtls, mfa)
        #[arg(long, default_value = "open")]
        auth: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visor_hud=info,visor_session=info,visor_transport=info,visor_auth=info,visor_input=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = HudConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let mut auth = AuthGate::new().with_pins(config.auth.pins.clone());
    for (device_id, token) in &config.auth.tokens {
        auth.store_token(device_id.clone(), token.clone());
    }

    let conn = ConnectionManager::new()
        .with_connect_timeout(Duration::from_secs(config.session.connect_timeout_secs));

    let mut input = InputManager::new();
    input.add_backend(Box::new(KeyboardBackend::new()));
    if config.remote.enabled {
        input.add_backend(Box::new(RemoteBackend::new(config.remote.port)));
    }

    let session_config = SessionConfig {
        tick: Duration::from_millis(config.session.tick_ms),
        pin_length: config.session.pin_length,
    };
    let mut session = Session::new(
        conn,
        auth,
        input,
        Box::new(TermRenderer::new()),
        session_config,
    );

    match cli.command {
        Commands::Scan { link_file } => {
            if let Some(path) = link_file {
                session = session.with_link_source(Box::new(FileLinkSource::new(path)));
            }
            session.run().await;
        }
        Commands::Demo {
            device_id,
            broker,
            topic,
            auth,
        } => {
            let link = demo_link(&device_id, &broker, &topic, &auth)?;
            session.start_with(link).await;
            session.run().await;
        }
    }

    Ok(())
}

/// Build a descriptor for demo mode, the same shape a scanned link yields.
fn demo_link(
    device_id: &str,
    broker: &str,
    topic: &str,
    auth: &str,
) -> anyhow::Result<LinkDescriptor> {
    let (host, port) = broker
        .rsplit_once(':')
        .context("broker must be host:port")?;
    let port: u16 = port.parse().context("invalid broker port")?;
    let method = AuthMethod::from_token(auth)
        .with_context(|| format!("unknown auth method {auth:?}"))?;

    Ok(LinkDescriptor::new(device_id, TransportKind::Mqtt, host, port)
        .with_auth(method)
        .with_topic(topic))
}
