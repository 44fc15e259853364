//! Fleet dashboard figures.

use crate::machine::Machine;
use crate::maintenance::MaintenanceRecord;
use crate::ledger::UsageRecord;
use crate::primitives::RECENT_MAINTENANCE_LIMIT;
use crate::supply::Supply;
use crate::system::AlertLevel;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Aggregate state of the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetOverview {
    pub total_machines: usize,
    pub machines_in_use: usize,
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub low_stock: Vec<Supply>,
    /// Sum of `hours_added` across every closed job.
    pub total_hours_logged: u64,
    /// Newest first.
    pub recent_maintenance: Vec<MaintenanceRecord>,
}

/// Compute the overview from full listings.
#[must_use]
pub fn assess_fleet(
    machines: &[Machine],
    supplies: &[Supply],
    maintenance: &[MaintenanceRecord],
    usage: &[UsageRecord],
) -> FleetOverview {
    let count = |level: AlertLevel| machines.iter().filter(|m| m.alert_level() == level).count();

    let mut recent: Vec<MaintenanceRecord> = maintenance.to_vec();
    recent.sort_by_key(|r| Reverse((r.recorded_at_ms, r.id)));
    recent.truncate(RECENT_MAINTENANCE_LIMIT);

    FleetOverview {
        total_machines: machines.len(),
        machines_in_use: machines.iter().filter(|m| m.is_in_use).count(),
        critical_alerts: count(AlertLevel::Critical),
        warning_alerts: count(AlertLevel::Warning),
        low_stock: supplies.iter().filter(|s| s.is_low_stock()).cloned().collect(),
        total_hours_logged: usage
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.hours_added)),
        recent_maintenance: recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maintenance::MaintenanceKind;
    use crate::machine::MachineDraft;
    use crate::types::{FuelLevel, MachineId, RecordId};

    fn record(id: u64, at: u64) -> MaintenanceRecord {
        MaintenanceRecord {
            id: RecordId(id),
            machine_id: MachineId(1),
            machine_name: "Unit".to_string(),
            kind: MaintenanceKind::Corrective,
            description: String::new(),
            hm_done_at: 0,
            fuel_level: FuelLevel::FULL,
            pm_type: None,
            supplies_used: Vec::new(),
            recorded_at_ms: at,
        }
    }

    #[test]
    fn recent_maintenance_is_newest_five() {
        let records: Vec<_> = (1..=7).map(|i| record(i, i * 10)).collect();
        let overview = assess_fleet(&[], &[], &records, &[]);
        let ids: Vec<_> = overview.recent_maintenance.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn counts_alerts_and_usage() {
        let mut machine = Machine::register(
            MachineId(1),
            MachineDraft {
                name: "Unit".to_string(),
                model: String::new(),
                plate: String::new(),
                current_hm: 0,
                cycle_index: None,
                fuel_level: FuelLevel::FULL,
            },
            0,
        );
        machine.current_hm = 300;
        machine.is_in_use = true;

        let overview = assess_fleet(&[machine], &[], &[], &[]);
        assert_eq!(overview.total_machines, 1);
        assert_eq!(overview.machines_in_use, 1);
        assert_eq!(overview.critical_alerts, 1);
        assert_eq!(overview.warning_alerts, 0);
        assert_eq!(overview.total_hours_logged, 0);
    }
}
