//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the binary framing for the IPC channel:
//! - 8-byte little-endian header encoding/decoding
//! - Frame struct and builder
//! - Frame buffer for the length-delimited read mode

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{opcodes, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
