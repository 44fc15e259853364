//! # Maintenance Planner
//!
//! Validates a maintenance event against the machine, the kit configuration
//! and the inventory, and computes every change the event implies. Nothing is
//! written here: the store applies a [`MaintenancePlan`] in one transaction, or
//! nothing at all when planning fails.
//!
//! Checks run in a fixed order so the first problem reported is stable:
//!
//! 1. hour-meter regression
//! 2. fuel level range
//! 3. quantities of at least one
//! 4. duplicated supplies
//! 5. mandatory kit items (scheduled events only)
//! 6. unknown supplies and stock availability

use crate::cycle::{PmType, advance_cycle};
use crate::error::{FleetError, Result};
use crate::kit::{KitConfig, PmKit};
use crate::machine::{LastPm, Machine};
use crate::supply::Supply;
use crate::types::{FuelLevel, MachineId, RecordId, SupplyId, TimestampMs};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// TYPES
// =============================================================================

/// Whether the event completes a PM step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaintenanceKind {
    /// Completes the machine's next PM step and advances its cycle.
    Scheduled,
    /// A repair; updates the readings but leaves the cycle alone.
    Corrective,
}

impl MaintenanceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceKind::Scheduled => "scheduled",
            MaintenanceKind::Corrective => "corrective",
        }
    }
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "programado" | "pm" => Ok(MaintenanceKind::Scheduled),
            "corrective" | "correctivo" | "no programado" => Ok(MaintenanceKind::Corrective),
            _ => Err(FleetError::InvalidMaintenanceKind(s.to_string())),
        }
    }
}

/// A requested consumption line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLine {
    pub supply_id: SupplyId,
    pub quantity: u64,
}

/// A consumption line as recorded in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyUsage {
    pub supply_id: SupplyId,
    pub name: String,
    pub quantity: u64,
    /// Whether the line was a mandatory item of the completed PM's kit.
    pub is_mandatory: bool,
}

/// A maintenance event as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub machine_id: MachineId,
    pub kind: MaintenanceKind,
    /// Hour-meter reading at which the work was done.
    pub hm_done: u64,
    /// Raw fuel percentage; validated by the planner.
    pub fuel_level: u64,
    pub description: String,
    pub supplies_used: Vec<UsageLine>,
}

/// A committed maintenance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: RecordId,
    pub machine_id: MachineId,
    pub machine_name: String,
    pub kind: MaintenanceKind,
    pub description: String,
    pub hm_done_at: u64,
    pub fuel_level: FuelLevel,
    /// The step completed; `None` for corrective events.
    pub pm_type: Option<PmType>,
    pub supplies_used: Vec<SupplyUsage>,
    pub recorded_at_ms: TimestampMs,
}

/// Stock change of one supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub supply_id: SupplyId,
    pub previous: u64,
    pub new_stock: u64,
}

/// Everything a validated maintenance event changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenancePlan {
    /// The machine after the event.
    pub machine: Machine,
    pub record: MaintenanceRecord,
    pub stock_updates: Vec<StockUpdate>,
}

// =============================================================================
// PLANNER
// =============================================================================

/// The consumption list a scheduled maintenance starts from.
#[must_use]
pub fn prefill_supplies(kit: &PmKit) -> Vec<UsageLine> {
    kit.prefill()
}

/// Validate `request` and compute its effects.
///
/// `supplies` must hold the current inventory; a supply not in it is unknown.
pub fn plan_maintenance(
    machine: &Machine,
    request: &MaintenanceRequest,
    kits: &KitConfig,
    supplies: &BTreeMap<SupplyId, Supply>,
    record_id: RecordId,
    now_ms: TimestampMs,
) -> Result<MaintenancePlan> {
    if request.hm_done < machine.current_hm {
        return Err(FleetError::HourMeterRegression {
            current: machine.current_hm,
            provided: request.hm_done,
        });
    }
    let fuel_level = FuelLevel::new(request.fuel_level)?;

    if let Some(line) = request.supplies_used.iter().find(|l| l.quantity == 0) {
        return Err(FleetError::InvalidQuantity(line.quantity));
    }

    let mut seen = BTreeSet::new();
    for line in &request.supplies_used {
        if !seen.insert(line.supply_id) {
            return Err(FleetError::DuplicateSupply(line.supply_id));
        }
    }

    let completed = machine.next_pm_type;
    let kit = match request.kind {
        MaintenanceKind::Scheduled => kits.kit(completed),
        MaintenanceKind::Corrective => None,
    };
    if let Some(missing) = kit
        .into_iter()
        .flat_map(PmKit::mandatory)
        .find(|item| !seen.contains(&item.supply_id))
    {
        return Err(FleetError::MissingMandatorySupply {
            supply_id: missing.supply_id,
            name: missing.name.clone(),
        });
    }

    let mut usage = Vec::with_capacity(request.supplies_used.len());
    let mut stock_updates = Vec::with_capacity(request.supplies_used.len());
    for line in &request.supplies_used {
        let supply = supplies
            .get(&line.supply_id)
            .ok_or(FleetError::UnknownSupply(line.supply_id))?;
        if supply.stock < line.quantity {
            return Err(FleetError::InsufficientStock {
                supply_id: supply.id,
                name: supply.name.clone(),
                available: supply.stock,
                requested: line.quantity,
            });
        }
        let is_mandatory = kit
            .and_then(|k| k.get(line.supply_id))
            .is_some_and(|item| item.is_mandatory);
        usage.push(SupplyUsage {
            supply_id: supply.id,
            name: supply.name.clone(),
            quantity: line.quantity,
            is_mandatory,
        });
        stock_updates.push(StockUpdate {
            supply_id: supply.id,
            previous: supply.stock,
            new_stock: supply.stock_after(line.quantity),
        });
    }

    let mut updated = machine.clone();
    updated.current_hm = request.hm_done;
    updated.last_pm_hm = request.hm_done;
    updated.fuel_level = fuel_level;

    let pm_type = match request.kind {
        MaintenanceKind::Scheduled => {
            let next = advance_cycle(request.hm_done, machine.cycle_index);
            updated.cycle_index = next.next_cycle_index;
            updated.next_pm_type = next.next_pm_type;
            updated.next_pm_due_hm = next.next_pm_due_hm;
            updated.last_pm = LastPm::Done(completed);
            Some(completed)
        }
        MaintenanceKind::Corrective => None,
    };

    let description = match (request.kind, request.description.trim()) {
        (MaintenanceKind::Scheduled, "") => completed.as_str().to_string(),
        (_, text) => text.to_string(),
    };

    let record = MaintenanceRecord {
        id: record_id,
        machine_id: machine.id,
        machine_name: machine.name.clone(),
        kind: request.kind,
        description,
        hm_done_at: request.hm_done,
        fuel_level,
        pm_type,
        supplies_used: usage,
        recorded_at_ms: now_ms,
    };

    Ok(MaintenancePlan {
        machine: updated,
        record,
        stock_updates,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleIndex;
    use crate::kit::KitItem;
    use crate::machine::MachineDraft;
    use crate::supply::SupplyDraft;

    const OIL: SupplyId = SupplyId(1);
    const FILTER: SupplyId = SupplyId(2);
    const GREASE: SupplyId = SupplyId(3);

    fn machine(current_hm: u64, index: u64) -> Machine {
        Machine::register(
            MachineId(1),
            MachineDraft {
                name: "Loader WA470".to_string(),
                model: "WA470-6".to_string(),
                plate: "KOM-992".to_string(),
                current_hm,
                cycle_index: Some(CycleIndex::new(index)),
                fuel_level: FuelLevel::FULL,
            },
            0,
        )
    }

    fn inventory() -> BTreeMap<SupplyId, Supply> {
        [(OIL, "Engine oil", 40), (FILTER, "Oil filter", 2), (GREASE, "Grease", 10)]
            .into_iter()
            .map(|(id, name, stock)| {
                let supply = Supply::new(
                    id,
                    SupplyDraft {
                        name: name.to_string(),
                        unit: "units".to_string(),
                        stock,
                    },
                );
                (id, supply)
            })
            .collect()
    }

    fn kits() -> KitConfig {
        let mut config = KitConfig::new();
        let kit = config.kit_mut(PmType::Pm2);
        let _ = kit.upsert(KitItem {
            supply_id: OIL,
            name: "Engine oil".to_string(),
            quantity: 30,
            is_mandatory: true,
        });
        let _ = kit.upsert(KitItem {
            supply_id: GREASE,
            name: "Grease".to_string(),
            quantity: 1,
            is_mandatory: false,
        });
        config
    }

    fn request(kind: MaintenanceKind, hm_done: u64, lines: &[(SupplyId, u64)]) -> MaintenanceRequest {
        MaintenanceRequest {
            machine_id: MachineId(1),
            kind,
            hm_done,
            fuel_level: 80,
            description: String::new(),
            supplies_used: lines
                .iter()
                .map(|(supply_id, quantity)| UsageLine {
                    supply_id: *supply_id,
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn scheduled_event_advances_cycle_and_consumes_stock() {
        let m = machine(260, 1);
        let req = request(MaintenanceKind::Scheduled, 520, &[(OIL, 30), (FILTER, 1)]);
        let plan = plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(9), 42);
        let Ok(plan) = plan else {
            unreachable!("valid request was rejected: {plan:?}");
        };

        assert_eq!(plan.machine.cycle_index.value(), 2);
        assert_eq!(plan.machine.next_pm_type, PmType::Pm1);
        assert_eq!(plan.machine.next_pm_due_hm, 770);
        assert_eq!(plan.machine.last_pm, LastPm::Done(PmType::Pm2));
        assert_eq!(plan.machine.last_pm_hm, 520);
        assert_eq!(plan.machine.fuel_level.value(), 80);

        assert_eq!(plan.record.pm_type, Some(PmType::Pm2));
        assert_eq!(plan.record.description, "PM2");
        assert!(plan.record.supplies_used[0].is_mandatory);
        assert!(!plan.record.supplies_used[1].is_mandatory);
        assert_eq!(plan.stock_updates[0].new_stock, 10);
        assert_eq!(plan.stock_updates[1].new_stock, 1);
    }

    #[test]
    fn corrective_event_keeps_cycle() {
        let m = machine(260, 1);
        let mut req = request(MaintenanceKind::Corrective, 300, &[(FILTER, 2)]);
        req.description = "  Replaced hydraulic hose ".to_string();
        let plan = plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0);
        let Ok(plan) = plan else {
            unreachable!("valid request was rejected: {plan:?}");
        };

        assert_eq!(plan.machine.cycle_index.value(), 1);
        assert_eq!(plan.machine.next_pm_due_hm, m.next_pm_due_hm);
        assert_eq!(plan.machine.current_hm, 300);
        assert_eq!(plan.machine.last_pm, LastPm::New);
        assert_eq!(plan.record.pm_type, None);
        assert_eq!(plan.record.description, "Replaced hydraulic hose");
        assert_eq!(plan.stock_updates[0].new_stock, 0);
    }

    #[test]
    fn regression_is_checked_first() {
        let m = machine(500, 1);
        let mut req = request(MaintenanceKind::Scheduled, 499, &[(OIL, 0)]);
        req.fuel_level = 150;
        assert!(matches!(
            plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0),
            Err(FleetError::HourMeterRegression { current: 500, provided: 499 })
        ));
    }

    #[test]
    fn fuel_out_of_range() {
        let m = machine(500, 1);
        let mut req = request(MaintenanceKind::Corrective, 500, &[]);
        req.fuel_level = 101;
        assert!(matches!(
            plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0),
            Err(FleetError::InvalidFuelLevel(101))
        ));
    }

    #[test]
    fn duplicate_supply_rejected() {
        let m = machine(500, 1);
        let req = request(MaintenanceKind::Corrective, 500, &[(OIL, 1), (OIL, 2)]);
        assert!(matches!(
            plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0),
            Err(FleetError::DuplicateSupply(OIL))
        ));
    }

    #[test]
    fn missing_mandatory_item_names_it() {
        let m = machine(260, 1);
        let req = request(MaintenanceKind::Scheduled, 500, &[(GREASE, 1)]);
        let result = plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0);
        assert!(
            matches!(result, Err(FleetError::MissingMandatorySupply { ref name, .. }) if name == "Engine oil")
        );
    }

    #[test]
    fn mandatory_items_not_required_for_corrective() {
        let m = machine(260, 1);
        let req = request(MaintenanceKind::Corrective, 500, &[]);
        assert!(plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0).is_ok());
    }

    #[test]
    fn insufficient_stock_reports_amounts() {
        let m = machine(260, 1);
        let req = request(MaintenanceKind::Scheduled, 500, &[(OIL, 30), (FILTER, 3)]);
        assert!(matches!(
            plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0),
            Err(FleetError::InsufficientStock { available: 2, requested: 3, .. })
        ));
    }

    #[test]
    fn unknown_supply_rejected() {
        let m = machine(260, 1);
        let req = request(MaintenanceKind::Corrective, 500, &[(SupplyId(99), 1)]);
        assert!(matches!(
            plan_maintenance(&m, &req, &kits(), &inventory(), RecordId(1), 0),
            Err(FleetError::UnknownSupply(SupplyId(99)))
        ));
    }

    #[test]
    fn kind_parsing_accepts_both_vocabularies() {
        assert_eq!("Programado".parse::<MaintenanceKind>().ok(), Some(MaintenanceKind::Scheduled));
        assert_eq!(
            "no programado".parse::<MaintenanceKind>().ok(),
            Some(MaintenanceKind::Corrective)
        );
        assert!("weekly".parse::<MaintenanceKind>().is_err());
    }

    #[test]
    fn prefill_follows_kit_order() {
        let config = kits();
        let lines = config.kit(PmType::Pm2).map(prefill_supplies).unwrap_or_default();
        let ids: Vec<_> = lines.iter().map(|l| l.supply_id).collect();
        assert_eq!(ids, vec![OIL, GREASE]);
    }
}
