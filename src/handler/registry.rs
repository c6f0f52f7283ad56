//! Handler registry for dispatching packets by opcode.
//!
//! The registry maps `(capability, opcode)` to at most one handler. The
//! invariant is checked when a handler is registered, so lookups are
//! deterministic and never fail on ambiguity.
//!
//! Encode and decode for one opcode may live on different handlers: opcode 1
//! is encoded by [`SetActivityHandler`](super::SetActivityHandler) and
//! decoded by [`DispatchHandler`](super::DispatchHandler).

use std::collections::HashMap;

use super::{builtin_handlers, Capability, PacketHandler};
use crate::error::{IpcError, Result};

/// Registry mapping `(capability, opcode)` to handlers.
pub struct HandlerRegistry {
    /// Registered handlers, in registration order.
    handlers: Vec<Box<dyn PacketHandler>>,
    /// Slot to index into `handlers`.
    slots: HashMap<(Capability, u32), usize>,
}

impl HandlerRegistry {
    /// Create a registry holding the built-in handlers.
    pub fn new() -> Self {
        Self::with_handlers(builtin_handlers()).expect("built-in handlers claim distinct slots")
    }

    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Create a registry from a handler set.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::DuplicateHandler`] if two handlers claim the same
    /// capability for the same opcode.
    pub fn with_handlers(handlers: Vec<Box<dyn PacketHandler>>) -> Result<Self> {
        let mut registry = Self::empty();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    /// Register a handler.
    ///
    /// Nothing is registered if any of the handler's slots is taken.
    pub fn register(&mut self, handler: Box<dyn PacketHandler>) -> Result<()> {
        let opcode = handler.opcode();

        for &capability in handler.capabilities() {
            if self.slots.contains_key(&(capability, opcode)) {
                return Err(IpcError::DuplicateHandler { capability, opcode });
            }
        }

        let index = self.handlers.len();
        for &capability in handler.capabilities() {
            self.slots.insert((capability, opcode), index);
        }
        self.handlers.push(handler);

        Ok(())
    }

    /// Get the handler owning `capability` for `opcode`.
    pub fn get(&self, capability: Capability, opcode: u32) -> Option<&dyn PacketHandler> {
        self.slots
            .get(&(capability, opcode))
            .map(|&index| self.handlers[index].as_ref())
    }

    /// Get the encoder for an opcode.
    pub fn encoder(&self, opcode: u32) -> Option<&dyn PacketHandler> {
        self.get(Capability::Encode, opcode)
    }

    /// Get the decoder for an opcode.
    pub fn decoder(&self, opcode: u32) -> Option<&dyn PacketHandler> {
        self.get(Capability::Decode, opcode)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut slots: Vec<_> = self.slots.keys().copied().collect();
        slots.sort_by_key(|&(capability, opcode)| (opcode, capability == Capability::Decode));
        f.debug_struct("HandlerRegistry")
            .field("slots", &slots)
            .finish()
    }
}
