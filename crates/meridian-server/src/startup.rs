//! Server startup utilities.

use meridian_config::ObservabilityConfig;
use meridian_core::{MeridianError, MeridianResult};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},meridian=debug,tower_http=debug", config.log_level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

/// Installs the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: &str) -> MeridianResult<()> {
    let addr: SocketAddr = addr.parse().map_err(|e| {
        MeridianError::configuration(format!("Invalid metrics address '{}': {}", addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            MeridianError::internal(format!("Failed to install metrics exporter: {}", e))
        })?;

    info!("Prometheus metrics exported on http://{}/metrics", addr);
    Ok(())
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
    __  ___          _     ___
   /  |/  /__  _____(_)___/ (_)___ _____
  / /|_/ / _ \/ ___/ / __  / / __ `/ __ \
 / /  / /  __/ /  / / /_/ / / /_/ / / / /
/_/  /_/\___/_/  /_/\__,_/_/\__,_/_/ /_/
    "#
    );
}

/// Prints server startup information.
pub fn print_startup_info(addr: &str, cache_backend: &str) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}", addr);
    info!("Health:    http://{}/health", addr);
    info!("Caches:    http://{}/caches ({})", addr, cache_backend);
    info!("{}", separator);
}
