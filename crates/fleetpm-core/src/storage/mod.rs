//! # Storage Module
//!
//! Persistent record store for the fleet using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions (one write transaction per composite mutation)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

mod redb_fleet;

pub use redb_fleet::RedbFleet;
