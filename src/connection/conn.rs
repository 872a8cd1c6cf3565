//! The connection object
//!
//! Owns a fixed configuration, a weakly-held delegate set, and the
//! lifecycle bookkeeping for a single logical link.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfiguration;
use crate::error::ConnectionError;
use crate::metrics::METRICS;

use super::delegates::{ConnectionDelegate, DelegateSet};
use super::events::ConnectionEvent;
use super::state::{ConnectionId, ConnectionInfo, ConnectionPhase, ConnectionState};

/// A single logical link to a realtime messaging peer
///
/// The connection holds exactly one configuration, fixed at construction,
/// and a set of weakly-held delegates. It performs no transport I/O of
/// its own: the transport driver behind it calls [`dispatch`](Self::dispatch)
/// (and the phase marks) to feed lifecycle and traffic events in, and the
/// connection fans them out to delegates and broadcast subscribers.
pub struct Connection {
    id: ConnectionId,
    configuration: ConnectionConfiguration,
    delegates: DelegateSet,
    state: Mutex<ConnectionState>,
    events_tx: broadcast::Sender<ConnectionEvent>,
}

impl Connection {
    /// Create a connection with the given configuration
    ///
    /// The configuration is validated and then fixed for the connection's
    /// lifetime; it cannot be swapped afterwards. The connection starts
    /// in [`ConnectionPhase::Disconnected`].
    pub fn new(configuration: ConnectionConfiguration) -> Result<Self, ConnectionError> {
        configuration.validate()?;

        let id = ConnectionId::next();
        let (events_tx, _) = broadcast::channel(configuration.event_buffer());

        METRICS.connection_created();
        debug!(conn_id = %id, options = configuration.len(), "Connection created");

        Ok(Self {
            id,
            configuration,
            delegates: DelegateSet::new(),
            state: Mutex::new(ConnectionState::new(id)),
            events_tx,
        })
    }

    /// Unique identifier of this connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The configuration fixed at construction
    pub fn configuration(&self) -> &ConnectionConfiguration {
        &self.configuration
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ConnectionPhase {
        self.state.lock().phase
    }

    /// Serializable snapshot for monitoring surfaces
    pub fn info(&self) -> ConnectionInfo {
        self.state.lock().to_info()
    }

    /// Register a delegate for receiving connection events
    ///
    /// The delegate is held weakly; registration does not extend its
    /// lifetime. Re-adding an already-registered instance is a no-op.
    pub fn add_delegate(&self, delegate: Arc<dyn ConnectionDelegate>) {
        if self.delegates.add(&delegate) {
            METRICS.delegate_added();
            debug!(conn_id = %self.id, delegates = self.delegates.len(), "Delegate registered");
        }
    }

    /// Unregister a previously added delegate
    ///
    /// No-op when the instance is not currently registered.
    pub fn remove_delegate(&self, delegate: Arc<dyn ConnectionDelegate>) {
        if self.delegates.remove(&delegate) {
            METRICS.delegate_removed();
            debug!(conn_id = %self.id, delegates = self.delegates.len(), "Delegate removed");
        }
    }

    /// Number of live delegate registrations
    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }

    /// Subscribe to the connection's event stream
    ///
    /// The async counterpart to delegate registration. The channel drops
    /// the oldest events for receivers that fall behind the configured
    /// `event_buffer` capacity.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }

    /// Mark the transport driver as dialing
    pub fn mark_connecting(&self) {
        self.transition(ConnectionPhase::Connecting);
    }

    /// Mark the link as entering graceful teardown
    pub fn mark_closing(&self) {
        self.transition(ConnectionPhase::Closing);
    }

    /// Feed an event into the connection
    ///
    /// The integration seam for transport drivers. Updates bookkeeping,
    /// then fans the event out to broadcast subscribers and to every live
    /// delegate, in registration order. Delegates dropped elsewhere are
    /// pruned, not dispatched to.
    pub fn dispatch(&self, event: ConnectionEvent) {
        self.apply(&event);
        METRICS.event_dispatched();

        // Snapshot first: callbacks run without the state lock held and
        // each delegate stays alive until its callback returns.
        let _ = self.events_tx.send(event.clone());
        let delegates = self.delegates.snapshot();
        for delegate in &delegates {
            match &event {
                ConnectionEvent::Opened => delegate.connection_opened(self.id),
                ConnectionEvent::Message(payload) => delegate.message_received(self.id, payload),
                ConnectionEvent::Error(error) => delegate.connection_error(self.id, error),
                ConnectionEvent::Closed { reason } => {
                    delegate.connection_closed(self.id, reason.as_deref())
                }
            }
        }
    }

    /// Update bookkeeping for an event
    fn apply(&self, event: &ConnectionEvent) {
        let mut state = self.state.lock();
        match event {
            ConnectionEvent::Opened => {
                Self::transition_locked(&mut state, ConnectionPhase::Connected);
                info!(conn_id = %self.id, "Connection opened");
            }
            ConnectionEvent::Message(payload) => {
                state.record_message(payload.len() as u64);
                METRICS.message_received(payload.len() as u64);
            }
            ConnectionEvent::Error(error) => {
                state.record_error();
                METRICS.error();
                warn!(conn_id = %self.id, error = %error, "Connection error");
            }
            ConnectionEvent::Closed { reason } => {
                Self::transition_locked(&mut state, ConnectionPhase::Disconnected);
                info!(
                    conn_id = %self.id,
                    reason = reason.as_deref().unwrap_or("none"),
                    "Connection closed"
                );
            }
        }
    }

    fn transition(&self, next: ConnectionPhase) {
        let mut state = self.state.lock();
        Self::transition_locked(&mut state, next);
    }

    fn transition_locked(state: &mut ConnectionState, next: ConnectionPhase) {
        if state.phase == next {
            return;
        }
        if !state.phase.can_transition(next) {
            warn!(
                conn_id = %state.id,
                from = %state.phase,
                to = %next,
                "Ignoring invalid phase transition"
            );
            return;
        }
        debug!(conn_id = %state.id, from = %state.phase, to = %next, "Phase transition");
        state.phase = next;
        state.touch();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        METRICS.connection_dropped();
        let state = self.state.lock();
        debug!(
            conn_id = %self.id,
            age_secs = state.age().as_secs_f64(),
            messages_rx = state.messages_rx,
            bytes_rx = state.bytes_rx,
            "Connection released"
        );
    }
}
