//! DataSink trait - persistence output interface
//!
//! Defines the abstract interface for the daily store.

use crate::{ContractError, Item};

/// Data output trait
///
/// All sink implementations must implement this trait. The sink worker
/// filters out commands before calling [`LocalDataSink::write`].
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one event
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, item: &Item) -> Result<(), ContractError>;

    /// Truncate everything written so far (day boundary)
    async fn reset(&mut self) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
