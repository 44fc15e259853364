//! # Inventory
//!
//! Supplies consumed by maintenance events.

use crate::error::{FleetError, Result};
use crate::primitives::LOW_STOCK_THRESHOLD;
use crate::types::SupplyId;
use serde::{Deserialize, Serialize};

/// A stocked supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub id: SupplyId,
    pub name: String,
    /// Free-form unit label ("liters", "units", ...).
    pub unit: String,
    pub stock: u64,
}

/// Input for creating a supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyDraft {
    pub name: String,
    pub unit: String,
    pub stock: u64,
}

/// Partial update of a supply; `None` fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyEdit {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub stock: Option<u64>,
}

impl Supply {
    #[must_use]
    pub fn new(id: SupplyId, draft: SupplyDraft) -> Self {
        Self {
            id,
            name: draft.name,
            unit: draft.unit,
            stock: draft.stock,
        }
    }

    pub fn apply_edit(&mut self, edit: SupplyEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(unit) = edit.unit {
            self.unit = unit;
        }
        if let Some(stock) = edit.stock {
            self.stock = stock;
        }
    }

    /// Stock strictly below the advisory threshold.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }

    /// Add a strictly positive quantity. Returns the new stock.
    pub fn restock(&mut self, quantity: u64) -> Result<u64> {
        if quantity == 0 {
            return Err(FleetError::InvalidQuantity(quantity));
        }
        self.stock = self.stock.saturating_add(quantity);
        Ok(self.stock)
    }

    /// Stock after consuming `quantity`, never below zero.
    #[must_use]
    pub fn stock_after(&self, quantity: u64) -> u64 {
        self.stock.saturating_sub(quantity)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn oil(stock: u64) -> Supply {
        Supply::new(
            SupplyId(1),
            SupplyDraft {
                name: "Engine oil 15W-40".to_string(),
                unit: "liters".to_string(),
                stock,
            },
        )
    }

    #[test]
    fn low_stock_threshold_is_strict() {
        assert!(oil(9).is_low_stock());
        assert!(!oil(10).is_low_stock());
    }

    #[test]
    fn restock_rejects_zero() {
        let mut supply = oil(5);
        assert!(matches!(supply.restock(0), Err(FleetError::InvalidQuantity(0))));
        assert_eq!(supply.restock(20).ok(), Some(25));
    }

    #[test]
    fn consumption_never_negative() {
        assert_eq!(oil(3).stock_after(5), 0);
        assert_eq!(oil(8).stock_after(5), 3);
    }

    #[test]
    fn edit_updates_only_given_fields() {
        let mut supply = oil(5);
        supply.apply_edit(SupplyEdit {
            unit: Some("drums".to_string()),
            ..SupplyEdit::default()
        });
        assert_eq!(supply.unit, "drums");
        assert_eq!(supply.stock, 5);
    }
}
