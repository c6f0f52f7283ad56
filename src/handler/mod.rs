//! Handler module - per-opcode encode/decode logic.
//!
//! Provides:
//! - [`PacketHandler`] - one packet kind's projection to and from JSON
//! - [`HandlerRegistry`] - `(capability, opcode)` lookup table
//! - the built-in handlers for the presence protocol
//!
//! The frame codec never names packet fields; it asks the registry for the
//! handler owning an opcode. Supporting a new packet kind means registering
//! a new handler.
//!
//! # Example
//!
//! ```
//! use presence_ipc::handler::{Capability, HandlerRegistry};
//! use presence_ipc::protocol::opcodes;
//!
//! let registry = HandlerRegistry::new();
//! assert!(registry.get(Capability::Encode, opcodes::HANDSHAKE).is_some());
//! assert!(registry.get(Capability::Decode, opcodes::HANDSHAKE).is_none());
//! ```

mod builtin;
mod registry;

pub use builtin::{
    builtin_handlers, DispatchHandler, ErrorHandler, HandshakeHandler, SetActivityHandler,
};
pub use registry::HandlerRegistry;

use serde_json::{Map, Value};

use crate::packet::Packet;

/// What a handler can do for its opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Project an outbound packet to a JSON value.
    Encode,
    /// Rebuild an inbound packet from a JSON object.
    Decode,
}

/// Encode and/or decode logic for exactly one opcode.
///
/// Both conversion methods default to `None`, so a handler only implements
/// the directions listed in [`capabilities`](PacketHandler::capabilities).
pub trait PacketHandler: Send + Sync + 'static {
    /// The opcode this handler owns.
    fn opcode(&self) -> u32;

    /// Directions this handler supports.
    fn capabilities(&self) -> &'static [Capability];

    /// Project `packet` to the JSON sent on the wire.
    ///
    /// Returns `None` if the packet is not a kind this handler understands.
    fn encode(&self, _packet: &Packet) -> Option<Value> {
        None
    }

    /// Rebuild a packet from a decoded payload.
    ///
    /// Returns `None` if a required key is missing or has the wrong type.
    fn decode(&self, _data: &Map<String, Value>) -> Option<Packet> {
        None
    }

    /// Check whether `capability` is supported.
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}
