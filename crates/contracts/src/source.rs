//! LineSource trait - blocking event source abstraction
//!
//! Decouples the ingestion loop from the concrete queue client. Real
//! (Redis) and mock sources implement the same interface.

use crate::ContractError;

/// Result of a single read: `Some(line)`, `None` at end-of-data, or an error
pub type SourceRead = Result<Option<String>, ContractError>;

/// Blocking line-oriented source
///
/// Implementations may block indefinitely inside [`LineSource::next_line`];
/// callers must run them off the async executor (e.g. `spawn_blocking`).
///
/// End-of-data is not terminal: a later call may yield new lines once the
/// backing queue has been refilled.
pub trait LineSource: Send {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Read the next line, without its trailing newline
    fn next_line(&mut self) -> SourceRead;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_line(&mut self) -> SourceRead {
        (**self).next_line()
    }
}
