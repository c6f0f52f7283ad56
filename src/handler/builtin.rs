//! Built-in handlers for the presence protocol.

use serde_json::{json, Map, Value};

use super::{Capability, PacketHandler};
use crate::packet::{
    DispatchPacket, ErrorPacket, HandshakePacket, Packet, SetActivityPacket, SET_ACTIVITY_COMMAND,
};

const ENCODE_ONLY: &[Capability] = &[Capability::Encode];
const DECODE_ONLY: &[Capability] = &[Capability::Decode];

/// The default handler set: handshake, set-activity, dispatch, error.
pub fn builtin_handlers() -> Vec<Box<dyn PacketHandler>> {
    vec![
        Box::new(HandshakeHandler),
        Box::new(SetActivityHandler),
        Box::new(DispatchHandler),
        Box::new(ErrorHandler),
    ]
}

/// `{"v": <version>, "client_id": <id>}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandshakeHandler;

impl PacketHandler for HandshakeHandler {
    fn opcode(&self) -> u32 {
        HandshakePacket::OPCODE
    }

    fn capabilities(&self) -> &'static [Capability] {
        ENCODE_ONLY
    }

    fn encode(&self, packet: &Packet) -> Option<Value> {
        let Packet::Handshake(packet) = packet else {
            return None;
        };
        Some(json!({
            "v": packet.version,
            "client_id": packet.client_id,
        }))
    }
}

/// `{"cmd": "SET_ACTIVITY", "args": {"pid": .., "activity": ..}, "nonce": ..}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetActivityHandler;

impl PacketHandler for SetActivityHandler {
    fn opcode(&self) -> u32 {
        SetActivityPacket::OPCODE
    }

    fn capabilities(&self) -> &'static [Capability] {
        ENCODE_ONLY
    }

    fn encode(&self, packet: &Packet) -> Option<Value> {
        let Packet::SetActivity(packet) = packet else {
            return None;
        };
        // An unset activity is sent as `null`, which clears the presence.
        let activity = match &packet.activity {
            Some(activity) => serde_json::to_value(activity).ok()?,
            None => Value::Null,
        };
        Some(json!({
            "cmd": SET_ACTIVITY_COMMAND,
            "args": {
                "pid": packet.pid,
                "activity": activity,
            },
            "nonce": packet.nonce,
        }))
    }
}

/// Requires `cmd` (string) and `data` (object); `evt` may be absent or
/// null but must otherwise be a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchHandler;

impl PacketHandler for DispatchHandler {
    fn opcode(&self) -> u32 {
        DispatchPacket::OPCODE
    }

    fn capabilities(&self) -> &'static [Capability] {
        DECODE_ONLY
    }

    fn decode(&self, data: &Map<String, Value>) -> Option<Packet> {
        let command = data.get("cmd")?.as_str()?;
        let event = match data.get("evt") {
            None | Some(Value::Null) => None,
            Some(evt) => Some(evt.as_str()?.to_string()),
        };
        let payload = data.get("data")?.as_object()?;

        Some(Packet::Dispatch(DispatchPacket::new(
            command,
            event,
            payload.clone(),
        )))
    }
}

/// Requires `code` (number) and `message` (string).
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

impl PacketHandler for ErrorHandler {
    fn opcode(&self) -> u32 {
        ErrorPacket::OPCODE
    }

    fn capabilities(&self) -> &'static [Capability] {
        DECODE_ONLY
    }

    fn decode(&self, data: &Map<String, Value>) -> Option<Packet> {
        let code = data.get("code")?;
        let code = code.as_i64().or_else(|| code.as_f64().map(|c| c as i64))?;
        let message = data.get("message")?.as_str()?;

        Some(Packet::Error(ErrorPacket::new(code, message)))
    }
}
