//! Service implementations.
//!
//! Trait definitions live in the parent module (e.g. `employee_service.rs`).

pub mod dept_service_impl;
pub mod employee_service_impl;

pub use dept_service_impl::DeptServiceImpl;
pub use employee_service_impl::EmployeeServiceImpl;
