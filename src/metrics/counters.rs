//! Atomic counters for hot-path metrics
//!
//! Lock-free counters that can be safely updated from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics instance
pub static METRICS: Metrics = Metrics::new();

/// Atomic metrics counters
pub struct Metrics {
    // Connection metrics
    pub connections_created: AtomicU64,
    pub connections_active: AtomicU64,

    // Delegate metrics
    pub delegates_added: AtomicU64,
    pub delegates_removed: AtomicU64,
    pub delegates_pruned: AtomicU64,

    // Event metrics
    pub events_dispatched: AtomicU64,
    pub messages_received: AtomicU64,
    pub bytes_received: AtomicU64,

    // Error metrics
    pub errors_total: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            connections_created: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            delegates_added: AtomicU64::new(0),
            delegates_removed: AtomicU64::new(0),
            delegates_pruned: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
        }
    }

    // Connection tracking
    #[inline]
    pub fn connection_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_dropped(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    // Delegate tracking
    #[inline]
    pub fn delegate_added(&self) {
        self.delegates_added.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn delegate_removed(&self) {
        self.delegates_removed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn delegate_pruned(&self, count: u64) {
        self.delegates_pruned.fetch_add(count, Ordering::Relaxed);
    }

    // Event tracking
    #[inline]
    pub fn event_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn message_received(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    // Error tracking
    #[inline]
    pub fn error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            delegates_added: self.delegates_added.load(Ordering::Relaxed),
            delegates_removed: self.delegates_removed.load(Ordering::Relaxed),
            delegates_pruned: self.delegates_pruned.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics for reporting
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub connections_created: u64,
    pub connections_active: u64,
    pub delegates_added: u64,
    pub delegates_removed: u64,
    pub delegates_pruned: u64,
    pub events_dispatched: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub errors_total: u64,
}
