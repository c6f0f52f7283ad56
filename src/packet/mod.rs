//! Packet model.
//!
//! A [`Packet`] is an immutable, directioned record. Serverbound kinds are
//! built by the caller and encoded by [`PacketCodec`](crate::codec::PacketCodec);
//! clientbound kinds are produced by decoding frames read from the socket.
//!
//! | Kind          | Direction   | Opcode |
//! |---------------|-------------|--------|
//! | `Handshake`   | serverbound | 0      |
//! | `SetActivity` | serverbound | 1      |
//! | `Dispatch`    | clientbound | 1      |
//! | `Error`       | clientbound | 2      |

mod dispatch;
mod error;
mod handshake;
mod set_activity;

pub use dispatch::DispatchPacket;
pub use error::ErrorPacket;
pub use handshake::{HandshakePacket, PROTOCOL_VERSION};
pub use set_activity::{SetActivityPacket, DEFAULT_NONCE, SET_ACTIVITY_COMMAND};

use crate::validation::{validate_nested, Validate, ValidationError};

/// Which side of the channel a packet travels towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketDirection {
    /// Client to application.
    Serverbound,
    /// Application to client.
    Clientbound,
    /// Either way.
    Both,
}

/// Every packet kind the codec knows about.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Handshake(HandshakePacket),
    SetActivity(SetActivityPacket),
    Dispatch(DispatchPacket),
    Error(ErrorPacket),
}

impl Packet {
    /// Wire opcode of this packet kind.
    pub fn opcode(&self) -> u32 {
        match self {
            Packet::Handshake(_) => HandshakePacket::OPCODE,
            Packet::SetActivity(_) => SetActivityPacket::OPCODE,
            Packet::Dispatch(_) => DispatchPacket::OPCODE,
            Packet::Error(_) => ErrorPacket::OPCODE,
        }
    }

    pub fn direction(&self) -> PacketDirection {
        match self {
            Packet::Handshake(_) | Packet::SetActivity(_) => PacketDirection::Serverbound,
            Packet::Dispatch(_) | Packet::Error(_) => PacketDirection::Clientbound,
        }
    }
}

impl Validate for Packet {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Packet::Handshake(p) => p.validate(),
            Packet::SetActivity(p) => validate_nested("args", p),
            // Inbound packets are never encoded by this client.
            Packet::Dispatch(_) | Packet::Error(_) => Ok(()),
        }
    }
}

impl From<HandshakePacket> for Packet {
    fn from(packet: HandshakePacket) -> Self {
        Packet::Handshake(packet)
    }
}

impl From<SetActivityPacket> for Packet {
    fn from(packet: SetActivityPacket) -> Self {
        Packet::SetActivity(packet)
    }
}

impl From<DispatchPacket> for Packet {
    fn from(packet: DispatchPacket) -> Self {
        Packet::Dispatch(packet)
    }
}

impl From<ErrorPacket> for Packet {
    fn from(packet: ErrorPacket) -> Self {
        Packet::Error(packet)
    }
}
