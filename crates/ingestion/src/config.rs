//! Ingestion loop configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::IngestionConfig;
pub use contracts::ThrottlePolicy;

/// Runtime configuration of the ingestion loop
#[derive(Debug, Clone)]
pub struct IngestionLoopConfig {
    /// Period of the gate between scan sessions
    pub gate_period: Duration,

    /// Output channel capacity
    pub channel_capacity: usize,

    /// How the gate limits scanning
    pub throttle: ThrottlePolicy,
}

impl Default for IngestionLoopConfig {
    fn default() -> Self {
        Self::from(&IngestionConfig::default())
    }
}

impl From<&IngestionConfig> for IngestionLoopConfig {
    fn from(config: &IngestionConfig) -> Self {
        Self {
            gate_period: Duration::from_millis(config.gate_period_ms),
            channel_capacity: config.channel_capacity,
            throttle: config.throttle,
        }
    }
}

impl IngestionLoopConfig {
    /// Create a new configuration
    pub fn new(gate_period: Duration, channel_capacity: usize, throttle: ThrottlePolicy) -> Self {
        Self {
            gate_period,
            channel_capacity,
            throttle,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Lines read from the source and emitted
    pub items_received: AtomicU64,

    /// Scan sessions ended by a source error
    pub source_errors: AtomicU64,

    /// Scan sessions started
    pub sessions: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one emitted line
    pub fn record_received(&self) {
        self.items_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record source error
    pub fn record_source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record session start
    pub fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_received: self.items_received.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            sessions: self.sessions.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Lines read from the source and emitted
    pub items_received: u64,

    /// Scan sessions ended by a source error
    pub source_errors: u64,

    /// Scan sessions started
    pub sessions: u64,
}
