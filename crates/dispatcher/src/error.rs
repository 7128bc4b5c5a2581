//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Hub is no longer accepting registrations
    #[error("hub is not accepting registrations")]
    RegistrationClosed,

    /// Hub did not accept the registration in time
    #[error("registration timed out after {timeout_ms}ms")]
    RegistrationTimeout { timeout_ms: u64 },

    /// Hub input stream has no receiver
    #[error("hub input stream closed")]
    InputClosed,

    /// Store worker has stopped
    #[error("store '{name}' is closed")]
    StoreClosed { name: String },
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a store closed error
    pub fn store_closed(name: impl Into<String>) -> Self {
        Self::StoreClosed { name: name.into() }
    }
}
