//! Hub and store metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for the daily store worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Commands filtered out before persistence
    skipped_count: AtomicU64,
    /// Completed resets
    reset_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Increment write count
    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get skipped command count
    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    /// Increment skipped command count
    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get reset count
    pub fn reset_count(&self) -> u64 {
        self.reset_count.load(Ordering::Relaxed)
    }

    /// Increment reset count
    pub fn inc_reset_count(&self) {
        self.reset_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> SinkSnapshot {
        SinkSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            skipped_count: self.skipped_count(),
            reset_count: self.reset_count(),
        }
    }
}

/// Snapshot of store metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub reset_count: u64,
}

/// Metrics for the dispatch hub
#[derive(Debug, Default)]
pub struct HubMetrics {
    clients: AtomicUsize,
    items_broadcast: AtomicU64,
    deliveries: AtomicU64,
    deliveries_dropped: AtomicU64,
    clients_registered: AtomicU64,
    clients_unregistered: AtomicU64,
}

impl HubMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently registered clients
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub(crate) fn set_client_count(&self, count: usize) {
        self.clients.store(count, Ordering::Relaxed);
        observability::record_client_count(count);
    }

    pub(crate) fn inc_items_broadcast(&self) {
        self.items_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_deliveries(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_deliveries_dropped(&self) {
        self.deliveries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_registered(&self) {
        self.clients_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_unregistered(&self) {
        self.clients_unregistered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            clients: self.clients.load(Ordering::Relaxed),
            items_broadcast: self.items_broadcast.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
            clients_registered: self.clients_registered.load(Ordering::Relaxed),
            clients_unregistered: self.clients_unregistered.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of hub metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubSnapshot {
    pub clients: usize,
    pub items_broadcast: u64,
    pub deliveries: u64,
    pub deliveries_dropped: u64,
    pub clients_registered: u64,
    pub clients_unregistered: u64,
}
