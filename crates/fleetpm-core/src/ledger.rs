//! # Operation Ledger
//!
//! Opening and closing operation jobs. A job records who ran a machine, for
//! how long, and how far the hour-meter and fuel moved. While a job is open the
//! machine is in use and no other job may start on it.

use crate::error::{FleetError, Result};
use crate::machine::Machine;
use crate::primitives::HIGH_FUEL_DROP_POINTS;
use crate::types::{FuelLevel, MachineId, RecordId, TimestampMs};
use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: u64 = 60_000;

/// A job that has started but not yet closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenJob {
    pub machine_id: MachineId,
    pub machine_name: String,
    pub operator: String,
    pub start_hm: u64,
    pub start_fuel: FuelLevel,
    pub start_time_ms: TimestampMs,
}

/// Closing readings for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobClose {
    pub end_hm: u64,
    /// Raw fuel percentage; validated on close.
    pub end_fuel: u64,
    /// Accept a fuel drop above the high-consumption limit.
    pub confirm_high_consumption: bool,
}

/// A closed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: RecordId,
    pub machine_id: MachineId,
    pub machine_name: String,
    pub operator: String,
    pub start_hm: u64,
    pub end_hm: u64,
    pub hours_added: u64,
    pub start_fuel: FuelLevel,
    pub end_fuel: FuelLevel,
    pub start_time_ms: TimestampMs,
    pub end_time_ms: TimestampMs,
    /// Elapsed minutes, rounded to the nearest minute.
    pub duration_minutes: u64,
    pub duration_text: String,
}

/// Open a job on `machine` for `operator`.
///
/// On success the machine is marked in use; on failure it is untouched.
pub fn begin_job(
    machine: &mut Machine,
    operator: &str,
    now_ms: TimestampMs,
    operator_has_open_job: bool,
    block_threshold: u64,
) -> Result<OpenJob> {
    if operator_has_open_job {
        return Err(FleetError::JobAlreadyOpen(operator.to_string()));
    }
    if machine.is_in_use {
        return Err(FleetError::MachineInUse(machine.id));
    }
    if machine.is_blocked_with(block_threshold) {
        return Err(FleetError::MachineBlocked {
            machine_id: machine.id,
            overdue_by: machine.hours_overdue(),
            threshold: block_threshold,
        });
    }

    machine.is_in_use = true;
    Ok(OpenJob {
        machine_id: machine.id,
        machine_name: machine.name.clone(),
        operator: operator.to_string(),
        start_hm: machine.current_hm,
        start_fuel: machine.fuel_level,
        start_time_ms: now_ms,
    })
}

/// Close `job`, updating `machine` with the closing readings.
///
/// On failure the machine is untouched and the job stays open.
pub fn close_job(
    machine: &mut Machine,
    job: &OpenJob,
    close: &JobClose,
    record_id: RecordId,
    now_ms: TimestampMs,
) -> Result<UsageRecord> {
    // Maintenance may have raised the reading while the job was open.
    let floor = job.start_hm.max(machine.current_hm);
    if close.end_hm < floor {
        return Err(FleetError::HourMeterRegression {
            current: floor,
            provided: close.end_hm,
        });
    }
    let end_fuel = FuelLevel::new(close.end_fuel)?;
    let drop = job.start_fuel.value().saturating_sub(end_fuel.value());
    if drop > HIGH_FUEL_DROP_POINTS && !close.confirm_high_consumption {
        return Err(FleetError::HighFuelConsumption {
            start: job.start_fuel.value(),
            end: end_fuel.value(),
        });
    }

    machine.is_in_use = false;
    machine.current_hm = close.end_hm;
    machine.fuel_level = end_fuel;

    let elapsed_ms = now_ms.saturating_sub(job.start_time_ms);
    Ok(UsageRecord {
        id: record_id,
        machine_id: job.machine_id,
        machine_name: job.machine_name.clone(),
        operator: job.operator.clone(),
        start_hm: job.start_hm,
        end_hm: close.end_hm,
        hours_added: close.end_hm - job.start_hm,
        start_fuel: job.start_fuel,
        end_fuel,
        start_time_ms: job.start_time_ms,
        end_time_ms: now_ms,
        duration_minutes: duration_minutes(elapsed_ms),
        duration_text: format_duration(elapsed_ms),
    })
}

/// Elapsed milliseconds rounded to the nearest minute.
#[must_use]
pub fn duration_minutes(elapsed_ms: u64) -> u64 {
    elapsed_ms.saturating_add(MS_PER_MINUTE / 2) / MS_PER_MINUTE
}

/// `"<h>h <m>m"` for an hour or more, `"<m> min"` below. Minutes are floored.
#[must_use]
pub fn format_duration(elapsed_ms: u64) -> String {
    let minutes = elapsed_ms / MS_PER_MINUTE;
    let (hours, rest) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest} min")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::MachineDraft;
    use crate::primitives::BLOCK_THRESHOLD_HOURS;

    fn excavator(current_hm: u64, fuel: u64) -> Machine {
        Machine::register(
            MachineId(3),
            MachineDraft {
                name: "Excavator 320".to_string(),
                model: "320D".to_string(),
                plate: "CAT-001".to_string(),
                current_hm,
                cycle_index: None,
                fuel_level: FuelLevel::new(fuel).unwrap_or_default(),
            },
            0,
        )
    }

    fn close(end_hm: u64, end_fuel: u64) -> JobClose {
        JobClose {
            end_hm,
            end_fuel,
            confirm_high_consumption: false,
        }
    }

    #[test]
    fn job_round_trip_updates_machine() {
        let mut machine = excavator(1000, 90);
        let job = begin_job(&mut machine, "ana", 1_000, false, BLOCK_THRESHOLD_HOURS);
        let Ok(job) = job else {
            unreachable!("job should open: {job:?}");
        };
        assert!(machine.is_in_use);
        assert_eq!(job.start_hm, 1000);

        let end = 1_000 + 90 * 60_000 + 20_000;
        let record = close_job(&mut machine, &job, &close(1006, 70), RecordId(1), end);
        let Ok(record) = record else {
            unreachable!("job should close: {record:?}");
        };
        assert!(!machine.is_in_use);
        assert_eq!(machine.current_hm, 1006);
        assert_eq!(machine.fuel_level.value(), 70);
        assert_eq!(record.hours_added, 6);
        assert_eq!(record.duration_minutes, 90);
        assert_eq!(record.duration_text, "1h 30m");
    }

    #[test]
    fn second_job_rejected() {
        let mut machine = excavator(1000, 90);
        assert!(begin_job(&mut machine, "ana", 0, false, 15).is_ok());
        assert!(matches!(
            begin_job(&mut machine, "luis", 0, false, 15),
            Err(FleetError::MachineInUse(MachineId(3)))
        ));

        let mut other = excavator(10, 90);
        assert!(matches!(
            begin_job(&mut other, "ana", 0, true, 15),
            Err(FleetError::JobAlreadyOpen(ref name)) if name == "ana"
        ));
        assert!(!other.is_in_use);
    }

    #[test]
    fn blocked_machine_cannot_start() {
        let mut machine = excavator(1000, 90);
        machine.current_hm = machine.next_pm_due_hm + 16;
        assert!(matches!(
            begin_job(&mut machine, "ana", 0, false, 15),
            Err(FleetError::MachineBlocked { overdue_by: 16, threshold: 15, .. })
        ));
        assert!(!machine.is_in_use);

        machine.current_hm = machine.next_pm_due_hm + 15;
        assert!(begin_job(&mut machine, "ana", 0, false, 15).is_ok());
    }

    #[test]
    fn close_rejects_regression_and_bad_fuel() {
        let mut machine = excavator(1000, 90);
        let Ok(job) = begin_job(&mut machine, "ana", 0, false, 15) else {
            unreachable!("job should open");
        };
        assert!(matches!(
            close_job(&mut machine, &job, &close(999, 80), RecordId(1), 0),
            Err(FleetError::HourMeterRegression { current: 1000, provided: 999 })
        ));
        assert!(matches!(
            close_job(&mut machine, &job, &close(1001, 120), RecordId(1), 0),
            Err(FleetError::InvalidFuelLevel(120))
        ));
        assert!(machine.is_in_use);
    }

    #[test]
    fn close_below_reading_raised_during_job_rejected() {
        let mut machine = excavator(1000, 90);
        let Ok(job) = begin_job(&mut machine, "ana", 0, false, 15) else {
            unreachable!("job should open");
        };
        // Corrective work recorded mid-job at 1100.
        machine.current_hm = 1100;
        machine.last_pm_hm = 1100;

        assert!(matches!(
            close_job(&mut machine, &job, &close(1050, 80), RecordId(1), 0),
            Err(FleetError::HourMeterRegression { current: 1100, provided: 1050 })
        ));
        assert_eq!(machine.current_hm, 1100);

        let record = close_job(&mut machine, &job, &close(1120, 80), RecordId(1), 0);
        assert_eq!(record.map(|r| r.hours_added).ok(), Some(120));
    }

    #[test]
    fn high_fuel_drop_needs_confirmation() {
        let mut machine = excavator(1000, 90);
        let Ok(job) = begin_job(&mut machine, "ana", 0, false, 15) else {
            unreachable!("job should open");
        };
        assert!(matches!(
            close_job(&mut machine, &job, &close(1002, 39), RecordId(1), 0),
            Err(FleetError::HighFuelConsumption { start: 90, end: 39 })
        ));
        // Exactly 50 points is allowed.
        let mut at_limit = machine.clone();
        assert!(close_job(&mut at_limit, &job, &close(1002, 40), RecordId(1), 0).is_ok());

        let confirmed = JobClose {
            confirm_high_consumption: true,
            ..close(1002, 10)
        };
        assert!(close_job(&mut machine, &job, &confirmed, RecordId(1), 0).is_ok());
        assert_eq!(machine.fuel_level.value(), 10);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(59 * 60_000 + 59_000), "59 min");
        assert_eq!(format_duration(60 * 60_000), "1h 0m");
        assert_eq!(format_duration(125 * 60_000), "2h 5m");
        assert_eq!(duration_minutes(29_999), 0);
        assert_eq!(duration_minutes(30_000), 1);
    }
}
