//! FlushTrigger - day-boundary rollover
//!
//! At the configured local time of day: inject a flush command into the hub
//! input. The hub broadcasts it to every client, then queues the store
//! reset behind every event that arrived before it.

use std::time::Duration;

use async_channel::Sender;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use contracts::{Command, Item};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::DispatcherError;

/// Pause after firing before the next wait is computed
const MIN_REARM: Duration = Duration::from_secs(1);

/// Scheduled flush trigger
pub struct FlushTrigger {
    at: NaiveTime,
    input: Sender<Item>,
}

impl FlushTrigger {
    /// Create a trigger firing daily at `at` (local time)
    pub fn new(at: NaiveTime, input: Sender<Item>) -> Self {
        Self { at, input }
    }

    /// Fire once, now
    #[instrument(name = "flush_trigger_fire", skip(self))]
    pub async fn fire(&self) -> Result<(), DispatcherError> {
        info!("sending flush command");
        self.input
            .send(Item::command(Command::flush()))
            .await
            .map_err(|_| DispatcherError::InputClosed)
    }

    /// Spawn the daily schedule
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(at = %self.at, "flush trigger scheduled");
            loop {
                let wait = duration_until(Local::now().naive_local(), self.at);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                if let Err(e) = self.fire().await {
                    error!(error = %e, "flush trigger failed, stopping");
                    break;
                }

                // Step past the boundary so an early wake-up cannot fire twice
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(MIN_REARM) => {}
                }
            }
            info!("flush trigger stopped");
        })
    }
}

/// Time from `now` to the next occurrence of `at`
///
/// If `now` is exactly `at`, the next occurrence is tomorrow.
pub fn duration_until(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let mut next = now.date().and_time(at);
    if next <= now {
        next += TimeDelta::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
