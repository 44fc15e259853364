//! # Core Types
//!
//! Identifiers and bounded scalar values shared across the domain model.

use crate::error::{FleetError, Result};
use crate::primitives::MAX_FUEL_LEVEL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch, always supplied by the caller.
pub type TimestampMs = u64;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a machine in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u64);

/// Identifier of a supply in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SupplyId(pub u64);

/// Identifier of a maintenance or usage history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

impl fmt::Display for SupplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

// =============================================================================
// FUEL LEVEL
// =============================================================================

/// Fuel level as an integer percentage in `[0, 100]`.
///
/// The only way to build one is through [`FuelLevel::new`], so an out-of-range
/// value can never reach a machine record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FuelLevel(u8);

impl FuelLevel {
    /// A full tank.
    pub const FULL: Self = Self(MAX_FUEL_LEVEL);

    /// An empty tank.
    pub const EMPTY: Self = Self(0);

    /// Validate a raw percentage.
    pub fn new(percent: u64) -> Result<Self> {
        if percent > MAX_FUEL_LEVEL as u64 {
            return Err(FleetError::InvalidFuelLevel(percent));
        }
        Ok(Self(percent as u8))
    }

    /// The percentage value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for FuelLevel {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<u8> for FuelLevel {
    type Error = FleetError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value as u64)
    }
}

impl From<FuelLevel> for u8 {
    fn from(level: FuelLevel) -> Self {
        level.0
    }
}

impl fmt::Display for FuelLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_level_bounds() {
        assert_eq!(FuelLevel::new(0).map(FuelLevel::value).ok(), Some(0));
        assert_eq!(FuelLevel::new(100).map(FuelLevel::value).ok(), Some(100));
        assert!(matches!(
            FuelLevel::new(101),
            Err(FleetError::InvalidFuelLevel(101))
        ));
    }

    #[test]
    fn fuel_level_defaults_to_full() {
        assert_eq!(FuelLevel::default(), FuelLevel::FULL);
    }

    #[test]
    fn identifiers_order_numerically() {
        assert!(MachineId(2) < MachineId(10));
        assert_eq!(MachineId(7).to_string(), "M7");
        assert_eq!(SupplyId(3).to_string(), "S3");
    }
}
