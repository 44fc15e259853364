//! # Formats Module
//!
//! Binary encoding of fleet records.
//!
//! This module contains:
//! - Record encoding for the redb store (postcard + header)
//! - Snapshot framing for whole-fleet export
//!
//! File I/O stays in the app layer (apps/fleetpm).
//! This module only handles format conversion (pure transformations).

mod persistence;

pub use persistence::*;
