//! Repository trait definitions.

use async_trait::async_trait;
use meridian_core::{Department, Employee, MeridianResult};

/// Employee repository trait.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Finds an employee by ID.
    async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Employee>>;

    /// Finds the first employee with the given last name.
    async fn find_by_last_name(&self, last_name: &str) -> MeridianResult<Option<Employee>>;

    /// Updates an existing employee; returns `None` if no row has its id.
    async fn update(&self, employee: &Employee) -> MeridianResult<Option<Employee>>;

    /// Deletes an employee by ID; returns true if a row was removed.
    async fn delete(&self, id: i32) -> MeridianResult<bool>;
}

/// Department repository trait.
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Finds a department by ID.
    async fn find_by_id(&self, id: i32) -> MeridianResult<Option<Department>>;
}
