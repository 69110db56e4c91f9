//! Employee controller.

use crate::{
    responses::{no_content, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use meridian_core::Employee;
use tracing::debug;

/// Creates the employee router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(update_emp))
        .route("/:id", get(get_emp).delete(delete_emp))
        .route("/lastname/:last_name", get(get_emp_by_last_name))
}

/// Get an employee by ID.
async fn get_emp(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Employee> {
    debug!("Get employee request: {}", id);
    ok(state.employee_service.get_emp(id).await?)
}

/// Update an employee.
async fn update_emp(
    State(state): State<AppState>,
    Json(employee): Json<Employee>,
) -> ApiResult<Employee> {
    debug!("Update employee request: {}", employee.id);
    ok(state.employee_service.update_emp(employee).await?)
}

/// Delete an employee.
async fn delete_emp(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    debug!("Delete employee request: {}", id);
    state.employee_service.delete_emp(id).await?;
    Ok(no_content())
}

/// Get an employee by last name.
async fn get_emp_by_last_name(
    State(state): State<AppState>,
    Path(last_name): Path<String>,
) -> ApiResult<Employee> {
    debug!("Get employee by last name request: {}", last_name);
    ok(state.employee_service.get_emp_by_last_name(&last_name).await?)
}
