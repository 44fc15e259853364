//! Alert bands, the operation block predicate and notifications.

use crate::machine::Machine;
use crate::primitives::{BLOCK_THRESHOLD_HOURS, WARNING_THRESHOLD_HOURS};
use crate::supply::Supply;
use crate::types::{MachineId, SupplyId};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ALERT LEVEL
// =============================================================================

/// Maintenance urgency of a machine relative to its due reading.
///
/// The three bands are disjoint and cover every reading:
///
/// ```text
///   Ok          | Warning               | Critical
/// --------------+-----------------------+------------------>
///          due - 50                    due           hour-meter
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Ok,
    Warning,
    Critical,
}

impl AlertLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Ok => "ok",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a reading against its due reading with the standard 50 h warning band.
#[must_use]
pub fn classify_alert(current_hm: u64, next_pm_due_hm: u64) -> AlertLevel {
    classify_alert_with(current_hm, next_pm_due_hm, WARNING_THRESHOLD_HOURS)
}

/// Classify a reading with an explicit warning band width.
#[must_use]
pub fn classify_alert_with(current_hm: u64, next_pm_due_hm: u64, warning_hours: u64) -> AlertLevel {
    if current_hm >= next_pm_due_hm {
        AlertLevel::Critical
    } else if current_hm >= next_pm_due_hm.saturating_sub(warning_hours) {
        AlertLevel::Warning
    } else {
        AlertLevel::Ok
    }
}

// =============================================================================
// BLOCK PREDICATE
// =============================================================================

/// True iff the machine is more than `block_threshold` hours past due.
///
/// This predicate does not prevent anything by itself; the operation ledger
/// checks it before opening a job.
#[must_use]
pub fn is_blocked_from_operation(current_hm: u64, next_pm_due_hm: u64, block_threshold: u64) -> bool {
    current_hm > next_pm_due_hm.saturating_add(block_threshold)
}

/// [`is_blocked_from_operation`] with the standard 15 h threshold.
#[must_use]
pub fn is_blocked(current_hm: u64, next_pm_due_hm: u64) -> bool {
    is_blocked_from_operation(current_hm, next_pm_due_hm, BLOCK_THRESHOLD_HOURS)
}

/// Hours past due, zero when not yet due.
#[must_use]
pub fn hours_overdue(current_hm: u64, next_pm_due_hm: u64) -> u64 {
    current_hm.saturating_sub(next_pm_due_hm)
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationSubject {
    Machine(MachineId),
    Supply(SupplyId),
}

/// A single entry of the notification center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: AlertLevel,
    pub subject: NotificationSubject,
    pub message: String,
    pub detail: String,
}

/// Build the notification list: machine alerts first, then low-stock supplies.
///
/// Machines in the `Ok` band and supplies at or above the low-stock threshold
/// produce nothing.
#[must_use]
pub fn collect_notifications(machines: &[Machine], supplies: &[Supply]) -> Vec<Notification> {
    let mut list = Vec::new();

    for machine in machines {
        match machine.alert_level() {
            AlertLevel::Critical => list.push(Notification {
                level: AlertLevel::Critical,
                subject: NotificationSubject::Machine(machine.id),
                message: format!("PM overdue: {}", machine.name),
                detail: format!("{}h / {}h", machine.current_hm, machine.next_pm_due_hm),
            }),
            AlertLevel::Warning => list.push(Notification {
                level: AlertLevel::Warning,
                subject: NotificationSubject::Machine(machine.id),
                message: format!("PM upcoming: {}", machine.name),
                detail: format!(
                    "{}h remaining",
                    machine.next_pm_due_hm.saturating_sub(machine.current_hm)
                ),
            }),
            AlertLevel::Ok => {}
        }
    }

    for supply in supplies.iter().filter(|s| s.is_low_stock()) {
        list.push(Notification {
            level: AlertLevel::Warning,
            subject: NotificationSubject::Supply(supply.id),
            message: format!("Low stock: {}", supply.name),
            detail: format!("{} {} left", supply.stock, supply.unit),
        });
    }

    list
}

// =============================================================================
// TESTS
// =============================================================================
