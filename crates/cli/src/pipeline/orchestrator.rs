//! Server orchestrator - wires and supervises every task.
//!
//! Ingestion loop -> hub -> {viewers, daily store}, plus the flush trigger
//! and the HTTP gateway. One cancellation token stops them all; the store
//! drains within the configured timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{LineSource, ServerBlueprint};
use dispatcher::{DailyFileSink, FlushTrigger, Hub, StoreHandle};
use ingestion::{IngestionLoop, IngestionLoopConfig, RedisLineSource, DEFAULT_IO_TIMEOUT};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::PipelineStats;

/// Server configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated blueprint (CLI overrides applied)
    pub blueprint: ServerBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main server orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new server with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Connect to Redis and run until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let source_config = &self.config.blueprint.source;
        info!(
            url = %source_config.redis_url(),
            queue = %source_config.queue,
            "Connecting to Redis..."
        );

        let source = RedisLineSource::open(source_config, DEFAULT_IO_TIMEOUT)
            .with_context(|| format!("Failed to connect to Redis at {}", source_config.redis_url()))?;

        let listener = bind(&self.config.blueprint.http.bind).await?;
        self.run_with(source, listener, shutdown).await
    }

    /// Run with an explicit event source and listener
    pub async fn run_with<S, F>(
        self,
        source: S,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<PipelineStats>
    where
        S: LineSource + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let cancel = CancellationToken::new();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Daily store
        let sink = DailyFileSink::open(&blueprint.store.path)
            .with_context(|| format!("Failed to open daily store {}", blueprint.store.path))?;
        let store = StoreHandle::spawn(sink, blueprint.store.queue_capacity);
        let store_metrics = Arc::clone(store.metrics());
        info!(path = %blueprint.store.path, "Daily store started");

        // Ingestion loop
        let mut ingestion = IngestionLoop::new(IngestionLoopConfig::from(&blueprint.ingestion))
            .context("Invalid ingestion configuration")?;
        let input_rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;
        let input_tx = ingestion.sender();
        let ingestion_metrics = ingestion.metrics();

        // Hub
        let (hub, hub_handle) = Hub::new(&blueprint.hub, input_rx, store.sender());
        let hub_metrics = hub_handle.metrics();
        let hub_task = hub.spawn(cancel.clone());
        info!(policy = ?blueprint.hub.delivery_policy, "Hub started");

        // Flush trigger
        let trigger_task = if blueprint.rollover.enabled {
            let at = blueprint
                .rollover
                .time_of_day()
                .with_context(|| format!("Invalid rollover time '{}'", blueprint.rollover.at))?;
            let trigger = FlushTrigger::new(at, input_tx);
            Some(trigger.spawn(cancel.clone()))
        } else {
            info!("Rollover disabled");
            drop(input_tx);
            None
        };

        let ingestion_task = ingestion.spawn(source, cancel.clone());

        // Gateway
        let app = gateway::router(&blueprint.http, hub_handle.clone());
        let mut gateway_task =
            tokio::spawn(gateway::serve_listener(listener, app, cancel.clone()));

        info!("Server running");

        // Run until shutdown or the gateway stops by itself
        let early_exit = tokio::select! {
            _ = shutdown => {
                warn!("Received shutdown signal, stopping server...");
                None
            }
            result = &mut gateway_task => Some(result),
        };

        // Shutdown
        cancel.cancel();
        drop(hub_handle);

        let drain_timeout = Duration::from_millis(blueprint.shutdown.drain_timeout_ms);
        let drain = async {
            join_logged("ingestion", ingestion_task).await;
            join_logged("hub", hub_task).await;
            if let Some(task) = trigger_task {
                join_logged("flush trigger", task).await;
            }
            store.shutdown().await;
        };
        if tokio::time::timeout(drain_timeout, drain).await.is_err() {
            warn!(timeout_ms = blueprint.shutdown.drain_timeout_ms, "Drain timed out");
        }

        let gateway_result = match early_exit {
            Some(result) => result,
            None => match tokio::time::timeout(drain_timeout, gateway_task).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("HTTP server did not stop in time");
                    Ok(Ok(()))
                }
            },
        };

        let stats = PipelineStats {
            ingestion: ingestion_metrics.snapshot(),
            hub: hub_metrics.snapshot(),
            store: store_metrics.snapshot(),
            duration: start_time.elapsed(),
        };

        gateway_result
            .context("HTTP server task panicked")?
            .context("HTTP server failed")?;

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            items = stats.hub.items_broadcast,
            "Server shutdown complete"
        );

        Ok(stats)
    }
}

/// Bind the HTTP listener
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))
}

async fn join_logged(name: &str, task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!(task = name, error = %e, "Task ended abnormally");
    }
}
