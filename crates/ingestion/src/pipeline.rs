//! Ingestion loop main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{Item, LineSource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{IngestionLoopConfig, IngestionMetrics, ThrottlePolicy};
use crate::error::{IngestionError, Result};
use crate::gate::Gate;

/// Why a scan session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Source reported end-of-data
    Exhausted,
    /// Source read failed
    Failed,
    /// Per-item throttle: one line emitted
    Yielded,
    /// Output channel has no receiver left
    Closed,
    /// Shutdown requested
    Cancelled,
}

/// Ingestion loop
///
/// Scans a blocking [`LineSource`] under a periodic gate and emits each line
/// as an [`Item`] on a single bounded output stream. Other producers (the
/// flush trigger) may inject into the same stream through [`Self::sender`].
pub struct IngestionLoop {
    config: IngestionLoopConfig,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Output sender
    tx: Sender<Item>,

    /// Output receiver
    rx: Option<Receiver<Item>>,
}

impl IngestionLoop {
    /// Create a new ingestion loop
    ///
    /// # Errors
    /// Zero channel capacity or zero gate period.
    pub fn new(config: IngestionLoopConfig) -> Result<Self> {
        if config.channel_capacity == 0 {
            return Err(IngestionError::InvalidConfig {
                field: "channel_capacity",
                message: "must be > 0".into(),
            });
        }
        if config.gate_period.is_zero() {
            return Err(IngestionError::InvalidConfig {
                field: "gate_period",
                message: "must be > 0".into(),
            });
        }

        let (tx, rx) = bounded(config.channel_capacity);

        Ok(Self {
            config,
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
        })
    }

    /// Another handle onto the output stream
    pub fn sender(&self) -> Sender<Item> {
        self.tx.clone()
    }

    /// Get output stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<Item>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Start scanning `source`
    ///
    /// The task ends on cancellation or once the output stream has no
    /// receiver. Each scan session runs on the blocking pool.
    pub fn spawn<S>(self, source: S, cancel: CancellationToken) -> JoinHandle<()>
    where
        S: LineSource + 'static,
    {
        let Self {
            config,
            metrics,
            tx,
            rx,
        } = self;
        // An untaken receiver would keep the stream open with nobody reading
        drop(rx);

        tokio::spawn(run(source, tx, config, metrics, cancel))
    }
}

#[instrument(
    name = "ingestion_loop",
    skip_all,
    fields(source = %source.name(), throttle = ?config.throttle)
)]
async fn run<S>(
    source: S,
    tx: Sender<Item>,
    config: IngestionLoopConfig,
    metrics: Arc<IngestionMetrics>,
    cancel: CancellationToken,
) where
    S: LineSource + 'static,
{
    info!(gate_period = ?config.gate_period, "ingestion loop started");

    let mut gate = Gate::new(config.gate_period);
    let mut source = source;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = gate.tick() => {}
        }

        metrics.record_session();

        let session = {
            let tx = tx.clone();
            let metrics = metrics.clone();
            let cancel = cancel.clone();
            let throttle = config.throttle;
            tokio::task::spawn_blocking(move || {
                let end = scan_session(&mut source, &tx, &metrics, &cancel, throttle);
                (source, end)
            })
        };

        let (returned, end) = tokio::select! {
            // The blocking thread notices cancellation after its current read
            _ = cancel.cancelled() => break,
            joined = session => match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "scan session panicked, stopping ingestion");
                    break;
                }
            },
        };
        source = returned;

        debug!(end = ?end, "scan session ended");
        match end {
            SessionEnd::Exhausted | SessionEnd::Failed | SessionEnd::Yielded => {}
            SessionEnd::Closed => {
                info!("output stream closed");
                break;
            }
            SessionEnd::Cancelled => break,
        }
    }

    info!(stats = ?metrics.snapshot(), "ingestion loop stopped");
}

/// Run one scan session on the current (blocking) thread
fn scan_session<S: LineSource>(
    source: &mut S,
    tx: &Sender<Item>,
    metrics: &IngestionMetrics,
    cancel: &CancellationToken,
    throttle: ThrottlePolicy,
) -> SessionEnd {
    loop {
        if cancel.is_cancelled() {
            return SessionEnd::Cancelled;
        }

        match source.next_line() {
            Ok(Some(line)) => {
                metrics.record_received();
                observability::record_item_ingested(source.name());

                if tx.send_blocking(Item::from(line)).is_err() {
                    return SessionEnd::Closed;
                }
                if throttle == ThrottlePolicy::PerItem {
                    return SessionEnd::Yielded;
                }
            }
            Ok(None) => return SessionEnd::Exhausted,
            Err(e) => {
                warn!(source = %source.name(), error = %e, "source read failed, waiting for next tick");
                metrics.record_source_error();
                observability::record_source_error(source.name());
                return SessionEnd::Failed;
            }
        }
    }
}
