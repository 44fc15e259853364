//! # Export
//!
//! Whole-fleet snapshots. The canonical form is the snapshot framed with
//! [`SNAPSHOT_MAGIC`](crate::formats::SNAPSHOT_MAGIC); the app also renders the
//! same structure as JSON.

use crate::access::User;
use crate::cycle::PmType;
use crate::error::{FleetError, Result};
use crate::formats::{SNAPSHOT_MAGIC, decode_framed, encode_framed};
use crate::kit::PmKit;
use crate::ledger::{OpenJob, UsageRecord};
use crate::machine::Machine;
use crate::maintenance::MaintenanceRecord;
use crate::supply::Supply;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every record in a fleet store, in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub machines: Vec<Machine>,
    pub supplies: Vec<Supply>,
    pub kits: Vec<(PmType, PmKit)>,
    pub users: Vec<User>,
    pub maintenance: Vec<MaintenanceRecord>,
    pub usage: Vec<UsageRecord>,
    pub open_jobs: Vec<OpenJob>,
}

impl FleetSnapshot {
    /// Total number of records of every kind.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.machines.len()
            + self.supplies.len()
            + self.kits.len()
            + self.users.len()
            + self.maintenance.len()
            + self.usage.len()
            + self.open_jobs.len()
    }

    /// Check that the snapshot describes a consistent store.
    ///
    /// Rejects duplicate ids and usernames, machines whose next PM disagrees
    /// with their cycle index, kits that reference missing supplies, and open
    /// jobs that do not match the machines' in-use flags.
    pub fn validate(&self) -> Result<()> {
        unique("machine", self.machines.iter().map(|m| m.id.0))?;
        unique("supply", self.supplies.iter().map(|s| s.id.0))?;
        unique("maintenance record", self.maintenance.iter().map(|r| r.id.0))?;
        unique("usage record", self.usage.iter().map(|r| r.id.0))?;
        unique("user", self.users.iter().map(|u| u.id.0))?;
        unique("kit", self.kits.iter().map(|(pm, _)| pm.code()))?;
        unique("username", self.users.iter().map(|u| u.username.as_str()))?;

        for machine in &self.machines {
            if machine.next_pm_type != machine.cycle_index.pm_type() {
                return Err(FleetError::Format(format!(
                    "machine {}: next PM {} does not match cycle index {} ({})",
                    machine.id,
                    machine.next_pm_type,
                    machine.cycle_index,
                    machine.cycle_index.pm_type()
                )));
            }
        }

        let supplies: BTreeSet<_> = self.supplies.iter().map(|s| s.id).collect();
        for (pm_type, kit) in &self.kits {
            unique("kit item", kit.items().iter().map(|i| i.supply_id.0))?;
            for item in kit.items() {
                if item.quantity == 0 {
                    return Err(FleetError::Format(format!(
                        "kit {pm_type}: zero quantity for supply {}",
                        item.supply_id
                    )));
                }
                if !supplies.contains(&item.supply_id) {
                    return Err(FleetError::Format(format!(
                        "kit {pm_type}: unknown supply {}",
                        item.supply_id
                    )));
                }
            }
        }

        unique("open job machine", self.open_jobs.iter().map(|j| j.machine_id.0))?;
        unique("open job operator", self.open_jobs.iter().map(|j| j.operator.as_str()))?;
        for job in &self.open_jobs {
            let in_use = self
                .machines
                .iter()
                .any(|m| m.id == job.machine_id && m.is_in_use);
            if !in_use {
                return Err(FleetError::Format(format!(
                    "open job on machine {} which is missing or not in use",
                    job.machine_id
                )));
            }
        }
        for machine in self.machines.iter().filter(|m| m.is_in_use) {
            if !self.open_jobs.iter().any(|j| j.machine_id == machine.id) {
                return Err(FleetError::Format(format!(
                    "machine {} is in use without an open job",
                    machine.id
                )));
            }
        }
        Ok(())
    }
}

fn unique<K: Ord + std::fmt::Display>(kind: &str, keys: impl Iterator<Item = K>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if seen.contains(&key) {
            return Err(FleetError::Format(format!("duplicate {kind} {key}")));
        }
        seen.insert(key);
    }
    Ok(())
}

/// Canonical binary form of a snapshot.
pub fn export_canonical(snapshot: &FleetSnapshot) -> Result<Vec<u8>> {
    encode_framed(SNAPSHOT_MAGIC, snapshot)
}

/// Parse a canonical snapshot.
pub fn import_canonical(bytes: &[u8]) -> Result<FleetSnapshot> {
    decode_framed(SNAPSHOT_MAGIC, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::cycle::CycleIndex;
    use crate::kit::KitItem;
    use crate::machine::{Machine, MachineDraft};
    use crate::types::{FuelLevel, MachineId, SupplyId, UserId};

    fn user(id: u64, username: &str) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            role: Role::Operator,
            created_at_ms: 0,
        }
    }

    fn machine(id: u64, index: u64) -> Machine {
        Machine::register(
            MachineId(id),
            MachineDraft {
                name: format!("Loader {id}"),
                model: "WA470".to_string(),
                plate: String::new(),
                current_hm: 260,
                cycle_index: Some(CycleIndex::new(index)),
                fuel_level: FuelLevel::FULL,
            },
            0,
        )
    }

    fn job(machine_id: u64, operator: &str) -> OpenJob {
        OpenJob {
            machine_id: MachineId(machine_id),
            machine_name: format!("Loader {machine_id}"),
            operator: operator.to_string(),
            start_hm: 260,
            start_fuel: FuelLevel::FULL,
            start_time_ms: 0,
        }
    }

    fn is_format_error(snapshot: &FleetSnapshot) -> bool {
        matches!(snapshot.validate(), Err(FleetError::Format(_)))
    }

    #[test]
    fn canonical_bytes_are_stable() {
        let snapshot = FleetSnapshot {
            users: vec![User {
                id: UserId(1),
                username: "admin".to_string(),
                role: Role::Administrator,
                created_at_ms: 5,
            }],
            ..FleetSnapshot::default()
        };
        let first = export_canonical(&snapshot).unwrap_or_default();
        let second = export_canonical(&snapshot).unwrap_or_default();
        assert_eq!(first, second);
        assert_eq!(&first[..4], b"FPMS");
        assert_eq!(import_canonical(&first).ok(), Some(snapshot));
    }

    #[test]
    fn consistent_snapshot_validates() {
        let mut busy = machine(2, 3);
        busy.is_in_use = true;
        let snapshot = FleetSnapshot {
            machines: vec![machine(1, 1), busy],
            users: vec![user(1, "ana"), user(2, "luis")],
            open_jobs: vec![job(2, "ana")],
            ..FleetSnapshot::default()
        };
        assert!(snapshot.validate().is_ok());
        assert!(FleetSnapshot::default().validate().is_ok());
    }

    #[test]
    fn next_pm_must_follow_cycle_index() {
        let mut edited = machine(1, 1);
        edited.cycle_index = CycleIndex::new(7);
        let snapshot = FleetSnapshot {
            machines: vec![edited],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&snapshot));
    }

    #[test]
    fn duplicate_usernames_and_ids_rejected() {
        let names = FleetSnapshot {
            users: vec![user(1, "ana"), user(2, "ana")],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&names));

        let ids = FleetSnapshot {
            machines: vec![machine(1, 0), machine(1, 2)],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&ids));
    }

    #[test]
    fn open_jobs_must_match_machines() {
        let orphan = FleetSnapshot {
            open_jobs: vec![job(9, "ana")],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&orphan));

        let idle = FleetSnapshot {
            machines: vec![machine(1, 0)],
            open_jobs: vec![job(1, "ana")],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&idle));

        let mut busy = machine(1, 0);
        busy.is_in_use = true;
        let stranded = FleetSnapshot {
            machines: vec![busy],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&stranded));
    }

    #[test]
    fn kit_items_must_reference_supplies() {
        let mut kit = PmKit::new();
        let added = kit.upsert(KitItem {
            supply_id: SupplyId(4),
            name: "Oil".to_string(),
            quantity: 30,
            is_mandatory: true,
        });
        assert!(added.is_ok());
        let snapshot = FleetSnapshot {
            kits: vec![(PmType::Pm2, kit)],
            ..FleetSnapshot::default()
        };
        assert!(is_format_error(&snapshot));
    }

    #[test]
    fn record_bytes_are_not_a_snapshot() {
        let bytes = crate::formats::encode_record(&FleetSnapshot::default()).unwrap_or_default();
        assert!(matches!(import_canonical(&bytes), Err(FleetError::Format(_))));
    }
}
