//! Department controller.

use crate::{
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use meridian_core::Department;
use tracing::debug;

/// Creates the department router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:id", get(get_dept))
}

async fn get_dept(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Department> {
    debug!("Get department request: {}", id);
    ok(state.dept_service.get_dept_by_id(id).await?)
}
