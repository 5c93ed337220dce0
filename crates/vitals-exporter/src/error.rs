//! Error types for the vitals-exporter crate.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while serving the exposition endpoint.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Binding the listener socket failed.
    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, #[source] std::io::Error),

    /// The HTTP server stopped with an error.
    #[error("exporter server error: {0}")]
    Internal(String),

    /// A metrics operation failed.
    #[error(transparent)]
    Metrics(#[from] vitals_core::MetricsError),
}

/// Result type for exporter operations.
pub type ExporterResult<T> = std::result::Result<T, ExporterError>;
