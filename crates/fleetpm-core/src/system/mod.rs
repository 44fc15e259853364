//! # System Module
//!
//! Fleet status assessment.
//!
//! Alert classification, the operation block predicate, notifications and the
//! dashboard overview are pure functions over machine and supply records, so
//! they live in the core next to the engine they report on.

mod alerts;
mod overview;

pub use alerts::*;
pub use overview::*;
