//! Server run statistics.

use std::time::Duration;

use dispatcher::{HubSnapshot, SinkSnapshot};
use ingestion::MetricsSnapshot;

/// Statistics from a server run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Ingestion loop counters
    pub ingestion: MetricsSnapshot,

    /// Hub counters
    pub hub: HubSnapshot,

    /// Daily store counters
    pub store: SinkSnapshot,

    /// Total duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Items broadcast per second
    pub fn items_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.hub.items_broadcast as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Items broadcast: {}", self.hub.items_broadcast);
        println!("   └─ Items/s: {:.2}", self.items_per_sec());

        println!("\nIngestion");
        println!("   ├─ Lines received: {}", self.ingestion.items_received);
        println!("   ├─ Scan sessions: {}", self.ingestion.sessions);
        println!("   └─ Source errors: {}", self.ingestion.source_errors);

        println!("\nHub");
        println!("   ├─ Deliveries: {}", self.hub.deliveries);
        println!("   ├─ Deliveries dropped: {}", self.hub.deliveries_dropped);
        println!("   ├─ Clients registered: {}", self.hub.clients_registered);
        println!("   └─ Clients unregistered: {}", self.hub.clients_unregistered);

        println!("\nDaily store");
        println!("   ├─ Writes: {}", self.store.write_count);
        println!("   ├─ Failures: {}", self.store.failure_count);
        println!("   ├─ Commands skipped: {}", self.store.skipped_count);
        println!("   └─ Resets: {}", self.store.reset_count);

        println!();
    }
}
