//! Connection events
//!
//! The event vocabulary delivered to delegates and broadcast subscribers.

use bytes::Bytes;

use crate::error::ConnectionError;

/// An event observed on a connection
///
/// Events are produced by the transport driver behind the connection and
/// fanned out to every registered delegate and broadcast subscriber.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The link was established and is ready for traffic
    Opened,
    /// A payload arrived from the peer
    Message(Bytes),
    /// The link reported a failure without closing
    Error(ConnectionError),
    /// The link was torn down
    Closed {
        /// Optional close reason supplied by the peer or driver
        reason: Option<String>,
    },
}

impl ConnectionEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::Closed { .. } => "closed",
        }
    }
}
