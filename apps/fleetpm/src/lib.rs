//! # fleetpm Library
//!
//! This library exposes the fleetpm application modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod error;
pub mod session;

// Re-export fleetpm_core for convenience
pub use fleetpm_core;
