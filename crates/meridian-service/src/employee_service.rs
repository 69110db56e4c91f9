//! Employee service trait definition.

use async_trait::async_trait;
use meridian_core::{Employee, MeridianResult};

/// Employee service trait.
#[async_trait]
pub trait EmployeeService: Send + Sync {
    /// Gets an employee by ID; served from the `emp` cache when present.
    async fn get_emp(&self, id: i32) -> MeridianResult<Employee>;

    /// Updates an employee and refreshes its `emp` entry.
    async fn update_emp(&self, employee: Employee) -> MeridianResult<Employee>;

    /// Deletes an employee and evicts its `emp` entry.
    async fn delete_emp(&self, id: i32) -> MeridianResult<()>;

    /// Gets an employee by last name, indexing the result by id and email.
    async fn get_emp_by_last_name(&self, last_name: &str) -> MeridianResult<Employee>;
}
