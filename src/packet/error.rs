//! Error packet (clientbound, opcode 2).

use crate::protocol::opcodes;

/// Sent by the application when it rejects the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPacket {
    pub code: i64,
    pub message: String,
}

impl ErrorPacket {
    pub const OPCODE: u32 = opcodes::CLOSE;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
