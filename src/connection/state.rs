//! Connection lifecycle state

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocate the next process-unique identifier
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create from raw u64
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No link is established
    Disconnected,
    /// The transport driver is dialing
    Connecting,
    /// Link is established and ready
    Connected,
    /// Link is going down gracefully
    Closing,
}

impl ConnectionPhase {
    /// Whether moving to `next` is a legal lifecycle step
    ///
    /// Failure shortcuts back to `Disconnected` are allowed from any
    /// non-terminal phase.
    pub fn can_transition(self, next: ConnectionPhase) -> bool {
        use ConnectionPhase::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Closing)
                | (Connected, Disconnected)
                | (Closing, Disconnected)
        )
    }
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        f.write_str(s)
    }
}

/// Per-connection bookkeeping
#[derive(Debug)]
pub struct ConnectionState {
    /// Unique identifier
    pub id: ConnectionId,
    /// Current lifecycle phase
    pub phase: ConnectionPhase,
    /// Creation time
    pub created_at: Instant,
    /// Last event time
    pub last_active: Instant,
    /// Messages received from the peer
    pub messages_rx: u64,
    /// Payload bytes received from the peer
    pub bytes_rx: u64,
    /// Errors observed on the link
    pub errors: u64,
}

impl ConnectionState {
    /// Create bookkeeping for a fresh connection
    pub fn new(id: ConnectionId) -> Self {
        let now = Instant::now();
        Self {
            id,
            phase: ConnectionPhase::Disconnected,
            created_at: now,
            last_active: now,
            messages_rx: 0,
            bytes_rx: 0,
            errors: 0,
        }
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Record an inbound message
    pub fn record_message(&mut self, bytes: u64) {
        self.messages_rx = self.messages_rx.saturating_add(1);
        self.bytes_rx = self.bytes_rx.saturating_add(bytes);
        self.touch();
    }

    /// Record an error observed on the link
    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
        self.touch();
    }

    /// Time since the connection object was created
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Time since the last event
    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_active.elapsed()
    }

    /// Check if the link is established
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Convert to serializable info
    pub fn to_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: format!("{}", self.id),
            phase: format!("{}", self.phase),
            age_secs: self.age().as_secs_f64(),
            idle_secs: self.idle_duration().as_secs_f64(),
            messages_rx: self.messages_rx,
            bytes_rx: self.bytes_rx,
            errors: self.errors,
        }
    }
}

/// Serializable connection information for monitoring surfaces
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    /// Connection ID (hex string)
    pub id: String,
    /// Lifecycle phase
    pub phase: String,
    /// Age in seconds
    pub age_secs: f64,
    /// Idle time in seconds
    pub idle_secs: f64,
    /// Messages received
    pub messages_rx: u64,
    /// Payload bytes received
    pub bytes_rx: u64,
    /// Errors observed
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocation_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_phase_transitions() {
        use ConnectionPhase::*;
        assert!(Disconnected.can_transition(Connecting));
        assert!(Connecting.can_transition(Connected));
        assert!(Connected.can_transition(Closing));
        assert!(Closing.can_transition(Disconnected));

        // Failure shortcuts
        assert!(Connecting.can_transition(Disconnected));
        assert!(Connected.can_transition(Disconnected));

        // Illegal steps
        assert!(!Disconnected.can_transition(Connected));
        assert!(!Closing.can_transition(Connected));
        assert!(!Connected.can_transition(Connecting));
    }

    #[test]
    fn test_record_message() {
        let mut state = ConnectionState::new(ConnectionId::from_raw(7));
        state.record_message(128);
        state.record_message(64);
        assert_eq!(state.messages_rx, 2);
        assert_eq!(state.bytes_rx, 192);

        let info = state.to_info();
        assert_eq!(info.id, "00000007");
        assert_eq!(info.phase, "disconnected");
        assert_eq!(info.messages_rx, 2);
    }
}
