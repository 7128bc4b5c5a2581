//! # Ingestion Loop
//!
//! Event ingestion module.
//!
//! Responsibilities:
//! - Scan a blocking line source (Redis `LPOP` or Mock) under a periodic gate
//! - Emit each line as an `Item` onto a single bounded stream
//! - Treat source errors as end of session, never as fatal
//! - Let other producers inject into the same stream
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionLoop, IngestionLoopConfig, RedisLineSource, DEFAULT_IO_TIMEOUT};
//! use tokio_util::sync::CancellationToken;
//!
//! let source = RedisLineSource::open(&blueprint.source, DEFAULT_IO_TIMEOUT)?;
//! let mut ingestion = IngestionLoop::new(IngestionLoopConfig::from(&blueprint.ingestion))?;
//! let rx = ingestion.take_receiver().unwrap();
//! let handle = ingestion.spawn(source, CancellationToken::new());
//!
//! while let Ok(item) = rx.recv().await {
//!     // Broadcast item
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockLineSource;
//!
//! let source = MockLineSource::with_lines("mock", ["E1", "E2"]);
//! source.handle().push_eof();
//! ```

mod config;
mod error;
mod gate;
mod mock;
mod pipeline;
mod redis_source;

// Re-exports
pub use config::{IngestionLoopConfig, IngestionMetrics, MetricsSnapshot, ThrottlePolicy};
pub use contracts::{Item, LineSource};
pub use error::{IngestionError, Result};
pub use gate::Gate;
pub use mock::{MockHandle, MockLineSource, MockStep};
pub use pipeline::IngestionLoop;
pub use redis_source::{RedisLineSource, DEFAULT_IO_TIMEOUT};
