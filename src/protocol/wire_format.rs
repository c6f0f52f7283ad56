//! Wire format encoding and decoding.
//!
//! Implements the 8-byte header format:
//! ```text
//! ┌──────────┬──────────┬─────────────────────┐
//! │ Opcode   │ Length   │ Payload (JSON)      │
//! │ 4 bytes  │ 4 bytes  │ `Length` bytes      │
//! │ uint32 LE│ uint32 LE│ UTF-8               │
//! └──────────┴──────────┴─────────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use crate::error::{IpcError, Result};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size accepted by [`FrameBuffer`](super::FrameBuffer) (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Opcodes used by the presence protocol.
pub mod opcodes {
    /// Client hello carrying the protocol version and client id.
    pub const HANDSHAKE: u32 = 0x00;
    /// Command frames: serverbound commands, clientbound dispatches.
    pub const FRAME: u32 = 0x01;
    /// Sent by the peer when it closes the channel, with an error code.
    pub const CLOSE: u32 = 0x02;
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Packet kind.
    pub opcode: u32,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl Header {
    /// Create a new header.
    pub fn new(opcode: u32, payload_length: u32) -> Self {
        Self {
            opcode,
            payload_length,
        }
    }

    /// Encode header to bytes (Little Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use presence_ipc::protocol::Header;
    ///
    /// let bytes = Header::new(1, 100).encode();
    /// assert_eq!(bytes, [1, 0, 0, 0, 100, 0, 0, 0]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..4].copy_from_slice(&self.opcode.to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_length.to_le_bytes());
    }

    /// Decode header from bytes (Little Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            opcode: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            payload_length: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Check the declared payload length against a limit.
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.payload_length > max_payload_size {
            return Err(IpcError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                self.payload_length, max_payload_size
            )));
        }
        Ok(())
    }
}
