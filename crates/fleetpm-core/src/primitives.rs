//! # Primitives
//!
//! Fixed contract values of the maintenance policy. All hour values are whole
//! hour-meter hours.

// =============================================================================
// PM CYCLE
// =============================================================================

/// Length of one full preventive-maintenance cycle, in hours.
pub const CYCLE_LENGTH_HOURS: u64 = 2000;

/// Number of steps in one cycle.
pub const CYCLE_STEPS: usize = 8;

/// Spacing between consecutive due dates, in hours.
pub const PM_INTERVAL_HOURS: u64 = 250;

/// A milestone counts as reached this many hours before it.
pub const RECOMMENDATION_TOLERANCE_HOURS: u64 = 25;

// =============================================================================
// ALERTS AND BLOCKING
// =============================================================================

/// Hours before the due reading at which a machine enters the warning band.
pub const WARNING_THRESHOLD_HOURS: u64 = 50;

/// Hours past due after which a machine may not start a new job.
pub const BLOCK_THRESHOLD_HOURS: u64 = 15;

/// A supply with stock strictly below this is low (advisory only).
pub const LOW_STOCK_THRESHOLD: u64 = 10;

// =============================================================================
// FUEL
// =============================================================================

/// Full tank, in percent.
pub const MAX_FUEL_LEVEL: u8 = 100;

/// A single job that drops fuel by more than this many points needs confirmation.
pub const HIGH_FUEL_DROP_POINTS: u8 = 50;

// =============================================================================
// OVERVIEW
// =============================================================================

/// Number of maintenance records listed as "recent" in the fleet overview.
pub const RECENT_MAINTENANCE_LIMIT: usize = 5;
