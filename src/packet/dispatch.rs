//! Dispatch packet (clientbound, opcode 1).

use serde_json::{Map, Value};

use crate::protocol::opcodes;

/// Command response or event pushed by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPacket {
    /// `cmd`: the command this answers, or `DISPATCH` for events.
    pub command: String,
    /// `evt`: event name, when present.
    pub event: Option<String>,
    /// `data`: command- or event-specific payload.
    pub data: Map<String, Value>,
}

impl DispatchPacket {
    pub const OPCODE: u32 = opcodes::FRAME;

    pub fn new(command: impl Into<String>, event: Option<String>, data: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            event,
            data,
        }
    }
}
