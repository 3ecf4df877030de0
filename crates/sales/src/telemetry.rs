//! Tracing subscriber and Prometheus exporter setup.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogFormat};
use crate::error::SetupError;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` directives win over [`Config::log_level`]. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<(), SetupError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }
    Ok(())
}

/// Installs the Prometheus recorder and its scrape listener.
///
/// Does nothing when no metrics address is configured. Must run inside a
/// tokio runtime.
pub fn install_metrics(config: &Config) -> Result<(), SetupError> {
    let Some(addr) = config.metrics_addr else {
        tracing::debug!("metrics exporter disabled");
        return Ok(());
    };

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
