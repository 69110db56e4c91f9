//! # Meridian Repository
//!
//! The authoritative data collaborators behind the caching engine:
//!
//! ```text
//! Service (cache-aware)
//!   ↓  Arc<dyn EmployeeRepository> / Arc<dyn DepartmentRepository>
//! MySqlEmployeeRepository / MySqlDepartmentRepository
//!   ↓
//! MySQL
//! ```
//!
//! Repositories know nothing about caching.

pub mod mysql;
pub mod pool;
pub mod traits;

pub use mysql::*;
pub use pool::*;
pub use traits::*;
