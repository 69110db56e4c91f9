//! # Meridian Server Library
//!
//! Wiring and startup utilities for the Meridian server binary.

pub mod app;
pub mod startup;
