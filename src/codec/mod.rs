//! Codec module - payload serialization and packet framing.
//!
//! - [`JsonCodec`] - JSON payloads using `serde_json`
//! - [`PacketCodec`] - typed packets to frames and back, via the handler registry
//!
//! # Example
//!
//! ```
//! use presence_ipc::codec::PacketCodec;
//! use presence_ipc::packet::{HandshakePacket, Packet};
//!
//! let codec = PacketCodec::new();
//! let frame = codec
//!     .encode(&Packet::from(HandshakePacket::new("1234567890")))
//!     .unwrap()
//!     .expect("handshake is encodable");
//!
//! assert_eq!(&frame[0..4], &[0, 0, 0, 0]);
//! ```

mod json;
mod packet;

pub use json::JsonCodec;
pub use packet::PacketCodec;
