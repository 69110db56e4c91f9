//! Main application router.

use crate::{
    controllers::{cache_controller, dept_controller, emp_controller, health_controller},
    middleware::logging_middleware,
    state::AppState,
};
use axum::{middleware, routing::get, Router};
use meridian_config::ServerConfig;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Creates the main application router.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let cors = if server_config.cors_enabled {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let router = Router::new()
        .merge(health_controller::router())
        .nest("/emp", emp_controller::router())
        .nest("/dept", dept_controller::router())
        .nest("/caches", cache_controller::router())
        .route("/", get(root))
        .with_state(state)
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!("Router created with employee, department and cache endpoints");
    router
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Meridian API"
}
