//! Callbacks for inbound packets and connection loss.

use crate::packet::Packet;

/// Receives events from a [`Connection`](crate::Connection).
///
/// Both callbacks run on the background reader task (or, for a failed
/// write, on the task calling `send`). Keep them short; a slow callback
/// delays the next read.
pub trait SocketListener: Send + Sync + 'static {
    /// Called once per successfully decoded inbound frame, in arrival order.
    fn on_packet(&self, packet: Packet);

    /// Called at most once per connection when it drops because of an I/O
    /// failure. Not called for a caller-initiated `disconnect()`.
    fn on_closed(&self, reason: &str);
}
