//! StoreHandle - owns the daily store with an isolated queue and worker task
//!
//! The worker is the only context that touches the sink. Appends and resets
//! travel over the same queue, so a reset is serialized with the writes
//! around it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace};

use contracts::{DataSink, Item};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Request processed by the store worker
#[derive(Debug, Clone)]
pub enum StoreRequest {
    /// Persist an item (commands are filtered out)
    Append(Item),
    /// Truncate the store (day boundary)
    Reset,
}

/// Cloneable sending side of a store queue
#[derive(Debug, Clone)]
pub struct StoreSender {
    name: Arc<str>,
    tx: mpsc::Sender<StoreRequest>,
}

impl StoreSender {
    /// Queue an item, waiting while the queue is full
    pub async fn append(&self, item: Item) -> Result<(), DispatcherError> {
        self.send(StoreRequest::Append(item)).await
    }

    /// Queue a reset, waiting while the queue is full
    pub async fn reset(&self) -> Result<(), DispatcherError> {
        self.send(StoreRequest::Reset).await
    }

    async fn send(&self, request: StoreRequest) -> Result<(), DispatcherError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| DispatcherError::store_closed(self.name.as_ref()))
    }
}

/// Handle to a running store worker
pub struct StoreHandle {
    /// Sink name
    name: String,
    /// Sender kept by the handle itself
    sender: StoreSender,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl StoreHandle {
    /// Create a new StoreHandle and spawn the worker task
    pub fn spawn<S: DataSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            store_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            sender: StoreSender {
                name: Arc::from(name.as_str()),
                tx,
            },
            name,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Another sender onto the store queue
    pub fn sender(&self) -> StoreSender {
        self.sender.clone()
    }

    /// Shutdown the store worker gracefully
    ///
    /// The worker drains its queue once every sender (this handle's and
    /// all clones) has been dropped, then flushes and closes the sink.
    #[instrument(name = "store_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.sender);
        // Wait for worker to finish
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "StoreHandle shutdown complete");
    }
}

/// Worker task that consumes requests and drives the sink
#[instrument(
    name = "store_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn store_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<StoreRequest>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Store worker started");

    while let Some(request) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match request {
            StoreRequest::Append(item) => {
                if item.is_command() {
                    trace!(sink = %name, payload = %item, "Command not persisted");
                    metrics.inc_skipped_count();
                    observability::record_command_skipped();
                    continue;
                }

                match sink.write(&item).await {
                    Ok(()) => {
                        metrics.inc_write_count();
                        observability::record_store_write(true);
                    }
                    Err(e) => {
                        metrics.inc_failure_count();
                        observability::record_store_write(false);
                        error!(
                            sink = %name,
                            len = item.len(),
                            error = %e,
                            "Write failed, record dropped"
                        );
                        // Continue processing - don't crash on single failure
                    }
                }
            }
            StoreRequest::Reset => match sink.reset().await {
                Ok(()) => {
                    metrics.inc_reset_count();
                    observability::record_store_reset(true);
                    info!(sink = %name, "Store reset");
                }
                Err(e) => {
                    observability::record_store_reset(false);
                    error!(sink = %name, error = %e, "Reset failed");
                }
            },
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Store worker stopped");
}
