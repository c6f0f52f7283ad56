//! Error types for presence-ipc.

use std::path::PathBuf;

use thiserror::Error;

use crate::handler::Capability;
use crate::validation::ValidationError;

/// Main error type for all IPC operations.
#[derive(Debug, Error)]
pub enum IpcError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint could not be opened.
    #[error("failed to connect to {}: {source}", endpoint.display())]
    Connection {
        endpoint: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Closing the transport failed.
    #[error("failed to disconnect: {0}")]
    Disconnection(#[source] std::io::Error),

    /// Operation needs a live connection.
    #[error("not connected")]
    NotConnected,

    /// `connect()` called while a connection is live or being opened.
    #[error("already connected")]
    AlreadyConnected,

    /// Packet failed its own correctness contract before encoding.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No handler is registered to encode the given opcode.
    #[error("no encode handler for opcode {0}")]
    Unencodable(u32),

    /// Two handlers claim the same (capability, opcode) slot.
    #[error("duplicate {capability:?} handler for opcode {opcode}")]
    DuplicateHandler { capability: Capability, opcode: u32 },

    /// Protocol error (short frame, malformed payload, oversized frame).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using IpcError.
pub type Result<T> = std::result::Result<T, IpcError>;
