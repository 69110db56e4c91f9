//! MySQL repository implementations.

mod department_repository;
mod employee_repository;

pub use department_repository::MySqlDepartmentRepository;
pub use employee_repository::MySqlEmployeeRepository;
