//! # Errors
//!
//! Every rejection in fleetpm is a pre-commit validation failure or a storage
//! failure. The cycle engine itself never fails.

use crate::types::{MachineId, SupplyId};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = FleetError> = std::result::Result<T, E>;

/// Errors raised by validation steps and by the record store.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A completion or closing reading is below the recorded hour-meter.
    #[error("hour-meter regression: {provided} h is below the recorded {current} h")]
    HourMeterRegression { current: u64, provided: u64 },

    /// A fuel percentage outside `[0, 100]`.
    #[error("invalid fuel level {0}: must be between 0 and 100")]
    InvalidFuelLevel(u64),

    /// Refuelling must raise the level.
    #[error("refuel level {requested}% must be greater than the current {current}%")]
    RefuelNotIncreasing { current: u8, requested: u8 },

    /// A scheduled maintenance omitted a mandatory kit item.
    #[error("missing mandatory supply: {name}")]
    MissingMandatorySupply { supply_id: SupplyId, name: String },

    /// Consumption exceeds what is on hand.
    #[error("insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        supply_id: SupplyId,
        name: String,
        available: u64,
        requested: u64,
    },

    /// A referenced supply is not in the inventory.
    #[error("supply {0} not found in inventory")]
    UnknownSupply(SupplyId),

    /// The same supply appears twice in one consumption list.
    #[error("supply {0} is listed more than once")]
    DuplicateSupply(SupplyId),

    /// Quantities are whole units, at least one.
    #[error("invalid quantity {0}: must be at least 1")]
    InvalidQuantity(u64),

    /// The machine is too far past its due PM to start a job.
    #[error("machine {machine_id} is blocked: PM overdue by {overdue_by} h (tolerance {threshold} h)")]
    MachineBlocked {
        machine_id: MachineId,
        overdue_by: u64,
        threshold: u64,
    },

    /// The machine already has an open job.
    #[error("machine {0} is in use")]
    MachineInUse(MachineId),

    /// The operator already has an open job.
    #[error("operator {0} already has an open job")]
    JobAlreadyOpen(String),

    /// The operator has no job to close.
    #[error("operator {0} has no open job")]
    NoOpenJob(String),

    /// Fuel dropped by more than the allowed points without confirmation.
    #[error("fuel dropped from {start}% to {end}% in one job; confirmation required")]
    HighFuelConsumption { start: u8, end: u8 },

    /// Usernames are unique.
    #[error("username {0} already exists")]
    DuplicateUsername(String),

    /// Unparseable role name.
    #[error("unknown role: {0}")]
    InvalidRole(String),

    /// Unparseable PM type name.
    #[error("unknown PM type: {0}")]
    InvalidPmType(String),

    /// Unparseable maintenance kind.
    #[error("unknown maintenance kind: {0}")]
    InvalidMaintenanceKind(String),

    /// A looked-up entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Malformed persisted bytes (bad header or version).
    #[error("format error: {0}")]
    Format(String),

    /// postcard encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    /// The underlying redb database failed.
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),
}

impl FleetError {
    /// Shorthand for [`FleetError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<redb::DatabaseError> for FleetError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TransactionError> for FleetError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TableError> for FleetError {
    fn from(err: redb::TableError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::StorageError> for FleetError {
    fn from(err: redb::StorageError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::CommitError> for FleetError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(err.into())
    }
}
