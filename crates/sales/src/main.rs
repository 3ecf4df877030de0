//! Backend process entry point.
//!
//! Connects to the database, applies migrations and keeps the wired services
//! and the metrics endpoint alive until a shutdown signal arrives.

use sales::{Config, SalesServices, SetupError, telemetry};
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), SetupError> {
    let config = Config::from_env();

    telemetry::init_tracing(&config)?;
    telemetry::install_metrics(&config)?;

    let services = SalesServices::connect(&config).await?;
    tracing::info!("sales backend ready");

    shutdown_signal().await;

    services.store().pool().close().await;
    tracing::info!("database pool closed");
    Ok(())
}
