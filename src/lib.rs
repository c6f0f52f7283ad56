//! # presence-ipc
//!
//! Client transport for the local rich-presence IPC protocol.
//!
//! A desktop chat client listens on a local endpoint (`discord-ipc-0`, a Unix
//! Domain Socket or a Windows Named Pipe). This crate connects to it, sends
//! handshake and activity updates, and hands inbound packets to a listener.
//!
//! ## Architecture
//!
//! - **Protocol**: 8-byte little-endian header (opcode, length) + UTF-8 JSON
//! - **Handlers**: one handler per (capability, opcode) projects packets to
//!   and from JSON
//! - **Connection**: background reader task, serialized writes, first-wins
//!   teardown
//!
//! ## Example
//!
//! ```ignore
//! use presence_ipc::{Activity, Connection, Packet, SocketListener};
//!
//! struct Printer;
//!
//! impl SocketListener for Printer {
//!     fn on_packet(&self, packet: Packet) {
//!         println!("{packet:?}");
//!     }
//!
//!     fn on_closed(&self, reason: &str) {
//!         println!("closed: {reason}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> presence_ipc::Result<()> {
//!     let connection = Connection::builder().listener(Printer).build();
//!
//!     connection.connect().await?;
//!     connection.handshake("1234567890").await?;
//!     connection
//!         .set_activity(Some(Activity::new("Editing", "lib.rs")))
//!         .await?;
//!     connection.disconnect().await
//! }
//! ```

pub mod activity;
pub mod codec;
pub mod error;
pub mod handler;
pub mod packet;
pub mod protocol;
pub mod transport;
pub mod validation;

mod connection;
mod listener;

pub use activity::Activity;
pub use connection::{
    Connection, ConnectionBuilder, ConnectionConfig, ConnectionState, ReadMode,
    DEFAULT_READ_BUFFER_SIZE,
};
pub use error::{IpcError, Result};
pub use listener::SocketListener;
pub use packet::Packet;
