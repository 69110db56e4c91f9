//! # Meridian Server
//!
//! Main entry point: loads configuration, wires repositories, the caching
//! engine and services, and serves the REST API until a shutdown signal.

use meridian_config::{AppConfig, ConfigLoader, ObservabilityConfig};
use meridian_core::{MeridianError, MeridianResult};
use meridian_repository::create_pool;
use meridian_rest::create_router;
use meridian_server::{app, startup};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            startup::init_logging(&ObservabilityConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    startup::init_logging(&config.observability);
    startup::print_banner();

    info!("Starting Meridian Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> MeridianResult<()> {
    if config.observability.metrics_enabled {
        startup::init_metrics(&config.observability.metrics_addr)?;
    }

    let db_pool = create_pool(&config.database).await?;

    let factory = app::store_factory(&config)?;
    let engine = app::build_engine(&config.cache, factory)?;
    let cache_manager = Arc::clone(engine.manager());
    let state = app::build_state(engine, Arc::clone(&db_pool))?;

    let router = create_router(state, &config.server);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MeridianError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    startup::print_startup_info(&addr, cache_manager.backend());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MeridianError::Internal(format!("REST server error: {}", e)))?;

    cache_manager.shutdown();
    db_pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
