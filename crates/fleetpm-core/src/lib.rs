//! # fleetpm-core
//!
//! The deterministic maintenance engine behind fleetpm.
//!
//! A fleet of machines moves through a repeating 2000-hour preventive-maintenance
//! cycle of eight steps (PM1/PM2/PM1/PM3/PM1/PM2/PM3/PM4). This crate owns:
//!
//! - the **PM cycle engine** ([`cycle`]): recommendation from a raw hour-meter and
//!   cycle advance after a completed scheduled maintenance;
//! - the **domain model** ([`machine`], [`supply`], [`kit`], [`access`]);
//! - **pre-commit validation** for maintenance events ([`maintenance`]) and
//!   operation jobs ([`ledger`]);
//! - **fleet status** ([`system`]): alert bands, block predicate, notifications;
//! - the **record store** ([`storage`]) and its binary format ([`formats`], [`export`]).
//!
//! ## Design Principles
//!
//! - Integer-only arithmetic, `BTreeMap` only, no wall clock: callers pass
//!   timestamps in, so every function is reproducible.
//! - The engine functions are total and never fail; every rejection is a
//!   [`FleetError`] raised by a validation step before anything is written.
//! - Every composite mutation is one redb write transaction.

pub mod access;
pub mod cycle;
pub mod error;
pub mod export;
pub mod formats;
pub mod kit;
pub mod ledger;
pub mod machine;
pub mod maintenance;
pub mod primitives;
pub mod storage;
pub mod supply;
pub mod system;
pub mod types;

pub use access::{Action, Role, User};
pub use cycle::{
    CycleIndex, CycleStep, NextPmStep, PM_CYCLE, PmType, advance_cycle, recommended_cycle_index,
};
pub use error::{FleetError, Result};
pub use kit::{KitConfig, KitItem, PmKit};
pub use ledger::{JobClose, OpenJob, UsageRecord};
pub use machine::{LastPm, Machine, MachineDraft, MachineEdit};
pub use maintenance::{
    MaintenanceKind, MaintenancePlan, MaintenanceRecord, MaintenanceRequest, StockUpdate,
    SupplyUsage, UsageLine,
};
pub use storage::RedbFleet;
pub use supply::{Supply, SupplyDraft, SupplyEdit};
pub use system::{AlertLevel, FleetOverview, Notification, NotificationSubject};
pub use types::{FuelLevel, MachineId, RecordId, SupplyId, TimestampMs, UserId};
