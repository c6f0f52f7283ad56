//! Frame struct.
//!
//! Represents a complete protocol frame with header and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use presence_ipc::protocol::{build_frame, opcodes, Frame, HEADER_SIZE};
//!
//! let bytes = build_frame(opcodes::FRAME, b"{}");
//! assert_eq!(bytes.len(), HEADER_SIZE + 2);
//!
//! let frame = Frame::parse(&bytes).unwrap();
//! assert_eq!(frame.opcode(), opcodes::FRAME);
//! assert_eq!(frame.payload(), b"{}");
//! ```

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Split a raw buffer into header and everything after it.
    ///
    /// The payload is the whole remainder of `buf`; the declared length is
    /// not consulted. Returns `None` if the buffer is shorter than a header.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let header = Header::decode(buf)?;
        Some(Self {
            header,
            payload: Bytes::copy_from_slice(&buf[HEADER_SIZE..]),
        })
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the opcode.
    #[inline]
    pub fn opcode(&self) -> u32 {
        self.header.opcode
    }

    /// Whether the declared length matches the payload actually carried.
    #[inline]
    pub fn is_length_consistent(&self) -> bool {
        self.header.payload_length as usize == self.payload.len()
    }
}

/// Build a complete frame as a single byte vector.
///
/// The header's length field is always the byte length of `payload`.
pub fn build_frame(opcode: u32, payload: &[u8]) -> Vec<u8> {
    let header = Header::new(opcode, payload.len() as u32);
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}
