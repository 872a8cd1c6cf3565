//! Delegate registry
//!
//! Weakly-held, identity-deduplicated set of connection observers.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

use crate::error::ConnectionError;
use crate::metrics::METRICS;

use super::state::ConnectionId;

/// Receives events from a connection
///
/// Every method has a default empty body, so implementors override only
/// the callbacks they care about. Delegates are held weakly by the
/// connection: registration does not extend a delegate's lifetime, and a
/// delegate dropped elsewhere simply stops receiving events.
pub trait ConnectionDelegate: Send + Sync {
    /// The link was established
    fn connection_opened(&self, id: ConnectionId) {
        let _ = id;
    }

    /// A payload arrived from the peer
    fn message_received(&self, id: ConnectionId, payload: &Bytes) {
        let _ = (id, payload);
    }

    /// The link reported a failure without closing
    fn connection_error(&self, id: ConnectionId, error: &ConnectionError) {
        let _ = (id, error);
    }

    /// The link was torn down
    fn connection_closed(&self, id: ConnectionId, reason: Option<&str>) {
        let _ = (id, reason);
    }
}

/// Weakly-held set of delegates
///
/// Entries are deduplicated by instance identity. All operations are safe
/// to call from any thread; dispatch works on a snapshot so delegates may
/// be added, removed, or dropped while events are in flight.
pub struct DelegateSet {
    entries: Mutex<Vec<Weak<dyn ConnectionDelegate>>>,
}

/// Identity of a delegate instance, independent of its vtable
fn data_ptr(delegate: &Weak<dyn ConnectionDelegate>) -> *const () {
    delegate.as_ptr() as *const ()
}

impl DelegateSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register a delegate
    ///
    /// Idempotent: re-adding an instance already present keeps a single
    /// entry. Returns `false` for such duplicate adds.
    pub fn add(&self, delegate: &Arc<dyn ConnectionDelegate>) -> bool {
        let incoming = Arc::downgrade(delegate);
        let mut entries = self.entries.lock();
        Self::prune_locked(&mut entries);

        let already_present = entries
            .iter()
            .any(|entry| data_ptr(entry) == data_ptr(&incoming));
        if already_present {
            trace!("Delegate already registered, ignoring duplicate add");
            return false;
        }

        entries.push(incoming);
        true
    }

    /// Unregister a delegate
    ///
    /// No-op when the instance is not currently registered. Returns
    /// whether an entry was removed.
    pub fn remove(&self, delegate: &Arc<dyn ConnectionDelegate>) -> bool {
        let target = Arc::downgrade(delegate);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| data_ptr(entry) != data_ptr(&target));
        Self::prune_locked(&mut entries);
        entries.len() < before
    }

    /// Snapshot the live delegates for dispatch
    ///
    /// Dead entries are pruned; the returned strong references keep each
    /// delegate alive for the duration of its callbacks.
    pub fn snapshot(&self) -> Vec<Arc<dyn ConnectionDelegate>> {
        let mut entries = self.entries.lock();
        let mut live = Vec::with_capacity(entries.len());
        let before = entries.len();
        entries.retain(|entry| match entry.upgrade() {
            Some(strong) => {
                live.push(strong);
                true
            }
            None => false,
        });
        let pruned = before - entries.len();
        if pruned > 0 {
            METRICS.delegate_pruned(pruned as u64);
            trace!(pruned, "Pruned dead delegates");
        }
        live
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::prune_locked(&mut entries);
        entries.len()
    }

    /// Check whether no live delegates are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune_locked(entries: &mut Vec<Weak<dyn ConnectionDelegate>>) {
        let before = entries.len();
        entries.retain(|entry| entry.strong_count() > 0);
        let pruned = before - entries.len();
        if pruned > 0 {
            METRICS.delegate_pruned(pruned as u64);
        }
    }
}

impl Default for DelegateSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;
    impl ConnectionDelegate for Probe {}

    fn probe() -> Arc<dyn ConnectionDelegate> {
        Arc::new(Probe)
    }

    #[test]
    fn test_add_is_idempotent() {
        let set = DelegateSet::new();
        let delegate = probe();

        assert!(set.add(&delegate));
        assert!(!set.add(&delegate));
        assert_eq!(set.len(), 1);

        assert!(set.remove(&delegate));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_remove_unregistered_is_noop() {
        let set = DelegateSet::new();
        let registered = probe();
        let stranger = probe();

        set.add(&registered);
        assert!(!set.remove(&stranger));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_weak_holding() {
        let set = DelegateSet::new();
        let delegate = probe();
        set.add(&delegate);

        // Registration must not extend the delegate's lifetime.
        assert_eq!(Arc::strong_count(&delegate), 1);

        drop(delegate);
        assert!(set.snapshot().is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_snapshot_keeps_registration_order() {
        let set = DelegateSet::new();
        let first = probe();
        let second = probe();
        set.add(&first);
        set.add(&second);

        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(Arc::ptr_eq(&snapshot[0], &first));
        assert!(Arc::ptr_eq(&snapshot[1], &second));
    }

    #[test]
    fn test_distinct_instances_of_same_type() {
        let set = DelegateSet::new();
        let a = probe();
        let b = probe();

        assert!(set.add(&a));
        assert!(set.add(&b));
        assert_eq!(set.len(), 2);
    }
}
