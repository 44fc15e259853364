//! # Machine Registry
//!
//! The machine record and its lifecycle outside of maintenance and jobs:
//! registration, editing and refuelling.

use crate::cycle::{CycleIndex, PmType, due_after, recommended_cycle_index};
use crate::error::{FleetError, Result};
use crate::primitives::BLOCK_THRESHOLD_HOURS;
use crate::system::{AlertLevel, classify_alert, hours_overdue, is_blocked_from_operation};
use crate::types::{FuelLevel, MachineId, TimestampMs};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The last preventive maintenance performed on a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastPm {
    /// Registered, no PM recorded yet.
    New,
    /// The PM type of the last completed scheduled maintenance.
    Done(PmType),
}

impl fmt::Display for LastPm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastPm::New => f.write_str("new"),
            LastPm::Done(pm) => write!(f, "{pm}"),
        }
    }
}

/// A machine in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub model: String,
    pub plate: String,
    pub series: String,

    /// Cumulative operating hours.
    pub current_hm: u64,

    /// Position in the PM cycle.
    pub cycle_index: CycleIndex,

    /// Derived from `cycle_index`.
    pub next_pm_type: PmType,

    /// 250 h above the reading at which the step was last (re)computed.
    pub next_pm_due_hm: u64,

    pub last_pm: LastPm,
    pub last_pm_hm: u64,

    /// True while an operation job is open.
    pub is_in_use: bool,

    pub fuel_level: FuelLevel,
}

/// Input for registering a machine.
///
/// When `cycle_index` is `None` the index is inferred from `current_hm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDraft {
    pub name: String,
    pub model: String,
    pub plate: String,
    pub current_hm: u64,
    pub cycle_index: Option<CycleIndex>,
    pub fuel_level: FuelLevel,
}

/// Partial update of a machine; `None` fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineEdit {
    pub name: Option<String>,
    pub model: Option<String>,
    pub plate: Option<String>,
    pub current_hm: Option<u64>,
    pub cycle_index: Option<CycleIndex>,
    pub fuel_level: Option<FuelLevel>,
}

impl Machine {
    /// Build a newly registered machine.
    ///
    /// The series number is derived from the registration timestamp.
    #[must_use]
    pub fn register(id: MachineId, draft: MachineDraft, created_at: TimestampMs) -> Self {
        let cycle_index = draft
            .cycle_index
            .unwrap_or_else(|| recommended_cycle_index(draft.current_hm));

        let mut machine = Self {
            id,
            name: draft.name,
            model: draft.model,
            plate: draft.plate,
            series: format!("S/N {:06}", created_at % 1_000_000),
            current_hm: draft.current_hm,
            cycle_index,
            next_pm_type: cycle_index.pm_type(),
            next_pm_due_hm: 0,
            last_pm: LastPm::New,
            last_pm_hm: 0,
            is_in_use: false,
            fuel_level: draft.fuel_level,
        };
        machine.reschedule();
        machine
    }

    /// Apply an edit. The cycle index is carried over unless the edit sets it,
    /// and the due reading is recomputed from the (possibly edited) hour-meter.
    pub fn apply_edit(&mut self, edit: MachineEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(model) = edit.model {
            self.model = model;
        }
        if let Some(plate) = edit.plate {
            self.plate = plate;
        }
        if let Some(hm) = edit.current_hm {
            self.current_hm = hm;
        }
        if let Some(index) = edit.cycle_index {
            self.cycle_index = index;
        }
        if let Some(fuel) = edit.fuel_level {
            self.fuel_level = fuel;
        }
        self.reschedule();
    }

    /// Refuel to a strictly higher level.
    pub fn refuel(&mut self, level: FuelLevel) -> Result<()> {
        if level <= self.fuel_level {
            return Err(FleetError::RefuelNotIncreasing {
                current: self.fuel_level.value(),
                requested: level.value(),
            });
        }
        self.fuel_level = level;
        Ok(())
    }

    /// Current alert band.
    #[must_use]
    pub fn alert_level(&self) -> AlertLevel {
        classify_alert(self.current_hm, self.next_pm_due_hm)
    }

    /// Whether the machine may not start a job under `block_threshold`.
    #[must_use]
    pub fn is_blocked_with(&self, block_threshold: u64) -> bool {
        is_blocked_from_operation(self.current_hm, self.next_pm_due_hm, block_threshold)
    }

    /// Whether the machine may not start a job under the standard threshold.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_blocked_with(BLOCK_THRESHOLD_HOURS)
    }

    /// Hours past due, zero when not yet due.
    #[must_use]
    pub fn hours_overdue(&self) -> u64 {
        hours_overdue(self.current_hm, self.next_pm_due_hm)
    }

    fn reschedule(&mut self) {
        self.next_pm_type = self.cycle_index.pm_type();
        self.next_pm_due_hm = due_after(self.current_hm);
    }
}

// =============================================================================
// TESTS
// =============================================================================
