//! Application state for Axum handlers.

use meridian_cache::CacheManager;
use meridian_service::{DeptService, EmployeeService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub employee_service: Arc<dyn EmployeeService>,
    pub dept_service: Arc<dyn DeptService>,
    pub cache_manager: Arc<CacheManager>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        employee_service: Arc<dyn EmployeeService>,
        dept_service: Arc<dyn DeptService>,
        cache_manager: Arc<CacheManager>,
    ) -> Self {
        Self {
            employee_service,
            dept_service,
            cache_manager,
        }
    }
}
