//! Cache diagnostics controller.

use crate::{
    responses::{no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use meridian_core::MeridianError;
use serde::Serialize;
use tracing::info;

/// Registered caches.
#[derive(Debug, Serialize)]
pub struct CacheListResponse {
    /// Store backend name.
    pub backend: String,
    /// Names of the stores created so far, sorted.
    pub caches: Vec<String>,
}

/// Creates the cache diagnostics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_caches))
        .route("/:name", delete(clear_cache))
}

async fn list_caches(State(state): State<AppState>) -> ApiResult<CacheListResponse> {
    let manager = &state.cache_manager;
    ok(CacheListResponse {
        backend: manager.backend().to_string(),
        caches: manager
            .cache_names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect(),
    })
}

/// Clears a cache that already exists; never creates one.
async fn clear_cache(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = state
        .cache_manager
        .get_store_if_exists(&name)
        .ok_or_else(|| MeridianError::not_found("Cache", &name))?;

    store.clear().await?;

    info!("Cache '{}' cleared", name);
    Ok(no_content())
}
