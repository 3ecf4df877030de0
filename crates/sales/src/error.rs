//! Startup error types.

use sales_store::StoreError;
use thiserror::Error;

/// Errors that can occur while starting the backend.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The database could not be reached.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be prepared.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A tracing subscriber was already installed.
    #[error("Tracing setup failed: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),

    /// The metrics exporter could not be installed.
    #[error("Metrics setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
