//! # PM Kits
//!
//! Each PM type has a kit: an ordered list of supplies pre-filled into a
//! scheduled maintenance, some of them mandatory. A supply appears at most
//! once per kit; adding it again replaces the existing entry in place.

use crate::cycle::PmType;
use crate::error::{FleetError, Result};
use crate::maintenance::UsageLine;
use crate::types::SupplyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One supply line of a kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitItem {
    pub supply_id: SupplyId,
    /// Supply name at the time the item was added.
    pub name: String,
    pub quantity: u64,
    pub is_mandatory: bool,
}

/// The kit for a single PM type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmKit {
    items: Vec<KitItem>,
}

impl PmKit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[KitItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, supply_id: SupplyId) -> Option<&KitItem> {
        self.items.iter().find(|item| item.supply_id == supply_id)
    }

    /// Add an item, or replace the existing item for the same supply.
    pub fn upsert(&mut self, item: KitItem) -> Result<()> {
        if item.quantity == 0 {
            return Err(FleetError::InvalidQuantity(item.quantity));
        }
        match self.items.iter_mut().find(|i| i.supply_id == item.supply_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Remove the item for a supply, if present.
    pub fn remove(&mut self, supply_id: SupplyId) -> Option<KitItem> {
        let position = self.items.iter().position(|i| i.supply_id == supply_id)?;
        Some(self.items.remove(position))
    }

    /// Mandatory items only.
    pub fn mandatory(&self) -> impl Iterator<Item = &KitItem> {
        self.items.iter().filter(|item| item.is_mandatory)
    }

    /// The consumption list a scheduled maintenance starts from.
    #[must_use]
    pub fn prefill(&self) -> Vec<UsageLine> {
        self.items
            .iter()
            .map(|item| UsageLine {
                supply_id: item.supply_id,
                quantity: item.quantity,
            })
            .collect()
    }
}

/// Kits for every configured PM type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitConfig {
    kits: BTreeMap<PmType, PmKit>,
}

impl KitConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The kit for `pm_type`, if one was configured.
    #[must_use]
    pub fn kit(&self, pm_type: PmType) -> Option<&PmKit> {
        self.kits.get(&pm_type)
    }

    /// The kit for `pm_type`, created empty if missing.
    pub fn kit_mut(&mut self, pm_type: PmType) -> &mut PmKit {
        self.kits.entry(pm_type).or_default()
    }

    pub fn set(&mut self, pm_type: PmType, kit: PmKit) {
        self.kits.insert(pm_type, kit);
    }

    /// Configured kits in PM order.
    pub fn iter(&self) -> impl Iterator<Item = (PmType, &PmKit)> {
        self.kits.iter().map(|(pm, kit)| (*pm, kit))
    }
}

// =============================================================================
// TESTS
// =============================================================================
