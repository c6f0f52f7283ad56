//! SET_ACTIVITY command (serverbound, opcode 1).

use crate::activity::Activity;
use crate::protocol::opcodes;
use crate::validation::{validate_non_negative, validate_optional, Validate, ValidationError};

/// `cmd` value for this command.
pub const SET_ACTIVITY_COMMAND: &str = "SET_ACTIVITY";

/// Nonce used when the caller does not correlate responses.
pub const DEFAULT_NONCE: &str = "0";

/// Sets (or with `activity: None`, clears) the presence of a process.
#[derive(Debug, Clone, PartialEq)]
pub struct SetActivityPacket {
    /// Process the presence belongs to.
    pub pid: i64,
    pub activity: Option<Activity>,
    /// Echoed back by the peer in its response.
    pub nonce: String,
}

impl SetActivityPacket {
    pub const OPCODE: u32 = opcodes::FRAME;

    pub fn new(pid: i64, activity: Option<Activity>) -> Self {
        Self {
            pid,
            activity,
            nonce: DEFAULT_NONCE.to_string(),
        }
    }

    /// Presence for the calling process.
    pub fn for_current_process(activity: Option<Activity>) -> Self {
        Self::new(i64::from(std::process::id()), activity)
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }
}

impl Validate for SetActivityPacket {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("pid", self.pid)?;
        validate_optional("activity", self.activity.as_ref())
    }
}
