//! Packet codec - typed packets to frames and back.
//!
//! The codec only knows the header layout and that payloads are JSON. Field
//! names live in the handlers it looks up by opcode.

use std::sync::Arc;

use tracing::debug;

use super::JsonCodec;
use crate::error::{IpcError, Result};
use crate::handler::HandlerRegistry;
use crate::packet::Packet;
use crate::protocol::{build_frame, Frame};
use crate::validation::Validate;

/// Encodes and decodes packets through a [`HandlerRegistry`].
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    registry: Arc<HandlerRegistry>,
}

impl PacketCodec {
    /// Codec over the built-in handlers.
    pub fn new() -> Self {
        Self::with_registry(HandlerRegistry::new())
    }

    /// Codec over a custom handler set.
    pub fn with_registry(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Encode a packet into a complete frame.
    ///
    /// Returns `Ok(None)` when no handler can encode this packet.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] if the packet fails validation;
    /// nothing is serialized in that case.
    pub fn encode(&self, packet: &Packet) -> Result<Option<Vec<u8>>> {
        let opcode = packet.opcode();
        let Some(handler) = self.registry.encoder(opcode) else {
            return Ok(None);
        };

        packet.validate()?;

        let Some(value) = handler.encode(packet) else {
            return Ok(None);
        };
        let payload = JsonCodec::encode(&value)?;

        Ok(Some(build_frame(opcode, &payload)))
    }

    /// Decode one raw read into a packet.
    ///
    /// Everything after the 8-byte header is taken as the payload; the
    /// declared length is not checked against it. Returns `Ok(None)` for an
    /// unknown opcode or a payload missing required keys.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Protocol`] if the buffer is shorter than a header
    /// or the payload is not a JSON object.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<Packet>> {
        let frame = Frame::parse(bytes).ok_or_else(|| {
            IpcError::Protocol(format!(
                "frame of {} bytes is shorter than the header",
                bytes.len()
            ))
        })?;
        self.decode_frame(&frame)
    }

    /// Decode an already de-framed [`Frame`].
    pub fn decode_frame(&self, frame: &Frame) -> Result<Option<Packet>> {
        if !frame.is_length_consistent() {
            debug!(
                declared = frame.header.payload_length,
                actual = frame.payload_len(),
                "frame length field disagrees with payload"
            );
        }

        // Unknown opcodes are skipped without parsing the payload.
        let Some(handler) = self.registry.decoder(frame.opcode()) else {
            return Ok(None);
        };

        let data = JsonCodec::decode_object(frame.payload())?;
        Ok(handler.decode(&data))
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, Secrets};
    use crate::handler::{builtin_handlers, Capability, PacketHandler};
    use crate::packet::{DispatchPacket, ErrorPacket, HandshakePacket, SetActivityPacket};
    use crate::protocol::{opcodes, HEADER_SIZE};
    use serde_json::{json, Map, Value};

    fn frame(opcode: u32, payload: Value) -> Vec<u8> {
        build_frame(opcode, &serde_json::to_vec(&payload).unwrap())
    }

    #[test]
    fn test_header_exactness() {
        let codec = PacketCodec::new();
        let packet = Packet::from(SetActivityPacket::new(
            1234,
            Some(Activity::new("details", "state")),
        ));

        let bytes = codec.encode(&packet).unwrap().unwrap();
        let payload_len = bytes.len() - HEADER_SIZE;

        assert_eq!(&bytes[0..4], &opcodes::FRAME.to_le_bytes());
        assert_eq!(&bytes[4..8], &(payload_len as u32).to_le_bytes());

        let payload: Value = serde_json::from_slice(&bytes[HEADER_SIZE..]).unwrap();
        assert_eq!(payload["cmd"], "SET_ACTIVITY");
        assert_eq!(payload["args"]["pid"], 1234);
        assert_eq!(payload["nonce"], "0");
    }

    #[test]
    fn test_handshake_wire_bytes() {
        let codec = PacketCodec::new();
        let bytes = codec
            .encode(&HandshakePacket::new("42424242").into())
            .unwrap()
            .unwrap();

        let payload = br#"{"client_id":"42424242","v":1}"#;
        let mut expected = vec![0, 0, 0, 0];
        expected.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        expected.extend_from_slice(payload);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_null_activity_on_the_wire() {
        let codec = PacketCodec::new();
        let bytes = codec
            .encode(&SetActivityPacket::new(1, None).into())
            .unwrap()
            .unwrap();
        let payload = std::str::from_utf8(&bytes[HEADER_SIZE..]).unwrap();
        assert!(payload.contains(r#""activity":null"#));
    }

    #[test]
    fn test_encode_without_handler_returns_none() {
        let codec = PacketCodec::new();
        let packet = Packet::from(ErrorPacket::new(1, "nope"));
        assert!(codec.encode(&packet).unwrap().is_none());
    }

    #[test]
    fn test_encode_handler_rejecting_kind_returns_none() {
        // Opcode 1 has an encoder, but it only projects SET_ACTIVITY.
        let codec = PacketCodec::new();
        let packet = Packet::from(DispatchPacket::new("DISPATCH", None, Map::new()));
        assert!(codec.encode(&packet).unwrap().is_none());
    }

    #[test]
    fn test_validation_gate_blocks_encoding() {
        let codec = PacketCodec::new();
        let activity = Activity::new("details", "state")
            .with_secrets(Secrets {
                join: Some("join".to_string()),
                ..Secrets::default()
            })
            .with_button("Site", "https://example.com");

        let result = codec.encode(&SetActivityPacket::new(1, Some(activity)).into());

        match result {
            Err(IpcError::Validation(err)) => {
                assert_eq!(err.field(), "args.activity.buttons");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_pid_fails_validation() {
        let codec = PacketCodec::new();
        let result = codec.encode(&SetActivityPacket::new(-1, None).into());
        assert!(matches!(result, Err(IpcError::Validation(_))));
    }

    #[test]
    fn test_short_client_id_fails_validation() {
        let codec = PacketCodec::new();
        let result = codec.encode(&HandshakePacket::new("1").into());
        assert!(matches!(result, Err(IpcError::Validation(_))));
    }

    #[test]
    fn test_decode_dispatch() {
        let codec = PacketCodec::new();
        let bytes = frame(
            opcodes::FRAME,
            json!({ "cmd": "DISPATCH", "evt": "READY", "data": { "v": 1 } }),
        );

        let Some(Packet::Dispatch(packet)) = codec.decode(&bytes).unwrap() else {
            panic!("expected dispatch packet");
        };
        assert_eq!(packet.event.as_deref(), Some("READY"));
    }

    #[test]
    fn test_decode_error() {
        let codec = PacketCodec::new();
        let bytes = frame(
            opcodes::CLOSE,
            json!({ "code": 4000, "message": "Invalid Client ID" }),
        );
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Some(Packet::Error(ErrorPacket::new(4000, "Invalid Client ID")))
        );
    }

    #[test]
    fn test_unknown_opcode_decodes_to_none() {
        let codec = PacketCodec::new();
        let bytes = frame(99, json!({ "anything": true }));
        assert!(codec.decode(&bytes).unwrap().is_none());

        // Payload is not even looked at
        let bytes = build_frame(99, b"\xff garbage");
        assert!(codec.decode(&bytes).unwrap().is_none());

        // Opcode 0 only has an encoder
        let bytes = frame(opcodes::HANDSHAKE, json!({ "v": 1, "client_id": "ab" }));
        assert!(codec.decode(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_dispatch_without_data_decodes_to_none() {
        let codec = PacketCodec::new();
        let bytes = frame(opcodes::FRAME, json!({ "cmd": "DISPATCH", "evt": "READY" }));
        assert!(codec.decode(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_decode_ignores_declared_length() {
        let codec = PacketCodec::new();
        let payload = br#"{"code":1,"message":"bye"}"#;
        let mut bytes = crate::protocol::Header::new(opcodes::CLOSE, 3).encode().to_vec();
        bytes.extend_from_slice(payload);

        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Some(Packet::Error(ErrorPacket::new(1, "bye")))
        );
    }

    #[test]
    fn test_decode_short_buffer_is_protocol_error() {
        let codec = PacketCodec::new();
        assert!(matches!(
            codec.decode(&[1, 0, 0, 0]),
            Err(IpcError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_malformed_json_is_protocol_error() {
        let codec = PacketCodec::new();
        let bytes = build_frame(opcodes::FRAME, b"{not json");
        assert!(matches!(codec.decode(&bytes), Err(IpcError::Protocol(_))));
    }

    /// Decodes handshakes so opcode 0 has both directions registered.
    struct HandshakeDecoder;

    impl PacketHandler for HandshakeDecoder {
        fn opcode(&self) -> u32 {
            opcodes::HANDSHAKE
        }

        fn capabilities(&self) -> &'static [Capability] {
            &[Capability::Decode]
        }

        fn decode(&self, data: &Map<String, Value>) -> Option<Packet> {
            let version = u32::try_from(data.get("v")?.as_u64()?).ok()?;
            let client_id = data.get("client_id")?.as_str()?;
            Some(Packet::Handshake(HandshakePacket {
                version,
                client_id: client_id.to_string(),
            }))
        }
    }

    #[test]
    fn test_round_trip_with_bidirectional_registry() {
        let mut handlers = builtin_handlers();
        handlers.push(Box::new(HandshakeDecoder));
        let codec = PacketCodec::with_registry(HandlerRegistry::with_handlers(handlers).unwrap());

        for client_id in ["12", "1234567890", "client-with-dashes"] {
            let packet = Packet::from(HandshakePacket::new(client_id));
            let bytes = codec.encode(&packet).unwrap().unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), Some(packet));
        }
    }
}
