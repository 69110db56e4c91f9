//! # Meridian REST
//!
//! Thin Axum transport over the cache-aware services, plus cache
//! diagnostics and health endpoints.

pub mod controllers;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
