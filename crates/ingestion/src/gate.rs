//! Periodic gate between scan sessions

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Periodic gate
///
/// The first tick fires one full period after creation. Ticks missed while a
/// session was running are not replayed: the next tick is a full period after
/// the late one.
pub struct Gate {
    interval: Interval,
}

impl Gate {
    /// Create a gate with the given period
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
