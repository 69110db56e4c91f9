//! # Meridian Core
//!
//! Core types, traits, and error definitions for Meridian.
//! This crate provides the domain entities and the unified error type
//! shared by the cache engine, repositories, services and transport.

pub mod domain;
pub mod error;
pub mod result;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use result::*;
pub use traits::*;
pub use validation::*;
