//! The push transport seam.

use carechat_shared::protocol::{InboundEvent, OutboundEvent};

use crate::error::TransportError;

/// Notifications delivered *from* a transport to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotification {
    /// The connection is (re-)established.
    Connected,
    /// The connection dropped; the transport keeps trying to reconnect.
    Disconnected,
    /// A validated inbound event.
    Event(InboundEvent),
    /// An event that was accepted by [`PushTransport::publish`] but never
    /// written, because the connection dropped first.
    Undelivered(OutboundEvent),
}

/// Outbound half of a persistent, bidirectional event channel.
///
/// Inbound traffic arrives separately as a stream of
/// [`TransportNotification`]s, so implementations only need a non-blocking
/// publish and an explicit shutdown.
pub trait PushTransport: Send + Sync {
    /// Queue an event for delivery.
    ///
    /// `Ok` means accepted, not delivered: an accepted event lost to a
    /// dropped connection comes back as
    /// [`TransportNotification::Undelivered`].
    fn publish(&self, event: OutboundEvent) -> Result<(), TransportError>;

    /// Close the connection and stop reconnecting.
    fn disconnect(&self);
}
