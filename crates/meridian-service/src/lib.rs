//! # Meridian Service
//!
//! The domain operations, each declared together with its caching policy.
//! Services own the policy; repositories stay cache-agnostic.

pub mod caching;
pub mod dept_service;
pub mod employee_service;
pub mod service_impl;

pub use caching::*;
pub use dept_service::*;
pub use employee_service::*;
pub use service_impl::*;

#[cfg(test)]
pub(crate) mod test_support;
