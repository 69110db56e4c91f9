//! REST API controllers.

pub mod cache_controller;
pub mod dept_controller;
pub mod emp_controller;
pub mod health_controller;

pub use health_controller::*;
