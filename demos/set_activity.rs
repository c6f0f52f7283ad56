//! Set Activity - connect, handshake, and publish a presence.
//!
//! This example demonstrates:
//! - Building a connection with a listener
//! - Sending the handshake for an application id
//! - Publishing and then clearing an activity
//!
//! # Running
//!
//! With the desktop client running:
//!
//! ```sh
//! RUST_LOG=presence_ipc=debug cargo run --example set_activity -- <client-id>
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use presence_ipc::{Activity, Connection, Packet, SocketListener};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Logs everything the application sends back.
struct LoggingListener;

impl SocketListener for LoggingListener {
    fn on_packet(&self, packet: Packet) {
        match packet {
            Packet::Dispatch(dispatch) => {
                info!(cmd = %dispatch.command, evt = ?dispatch.event, "dispatch")
            }
            Packet::Error(error) => warn!(code = error.code, message = %error.message, "error"),
            other => info!(?other, "packet"),
        }
    }

    fn on_closed(&self, reason: &str) {
        warn!(%reason, "connection closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client_id = std::env::args()
        .nth(1)
        .ok_or("usage: set_activity <client-id>")?;

    let connection = Connection::builder().listener(LoggingListener).build();
    info!(endpoint = %connection.endpoint().display(), "connecting");

    connection.connect().await?;
    connection.handshake(client_id).await?;

    let started = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    let activity = Activity::new("Writing Rust", "presence-ipc")
        .with_timestamps(started, None)
        .with_large_image("ferris", Some("Ferris"))
        .with_button("Repository", "https://example.com/presence-ipc");
    connection.set_activity(Some(activity)).await?;

    tokio::time::sleep(Duration::from_secs(15)).await;

    // Clear before leaving
    connection.set_activity(None).await?;
    connection.disconnect().await?;

    Ok(())
}
