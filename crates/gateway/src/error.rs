//! Gateway error types

use thiserror::Error;

/// HTTP surface errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Listen address does not parse
    #[error("invalid listen address '{addr}': {message}")]
    InvalidAddress { addr: String, message: String },

    /// Could not bind the listener
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server stopped with an error
    #[error("http server error")]
    Serve(#[source] std::io::Error),
}
