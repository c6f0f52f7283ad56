//! Handshake packet (serverbound, opcode 0).

use crate::protocol::opcodes;
use crate::validation::{validate_text, Validate, ValidationError};

/// RPC protocol version sent in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// First packet on every connection; identifies the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePacket {
    /// Protocol version, `v` on the wire.
    pub version: u32,
    /// Application id, `client_id` on the wire.
    pub client_id: String,
}

impl HandshakePacket {
    pub const OPCODE: u32 = opcodes::HANDSHAKE;

    /// Handshake for the current protocol version.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            client_id: client_id.into(),
        }
    }
}

impl Validate for HandshakePacket {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("client_id", &self.client_id)
    }
}
