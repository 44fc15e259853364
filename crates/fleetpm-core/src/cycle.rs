//! # PM Cycle Engine
//!
//! A machine's preventive maintenance repeats every 2000 hours in eight steps:
//!
//! ```text
//! index     0     1     2     3      4      5      6      7
//! step     PM1   PM2   PM1   PM3    PM1    PM2    PM3    PM4
//! hours    250   500   750   1000   1250   1500   1750   2000
//! ```
//!
//! Two pure functions drive it:
//!
//! - [`recommended_cycle_index`] infers the next due step from a raw hour-meter
//!   reading, for machines whose maintenance history is unknown.
//! - [`advance_cycle`] moves a machine to its next step after a completed
//!   scheduled maintenance.
//!
//! Both are total over their inputs. Milestones and PM types live in a single
//! table ([`PM_CYCLE`]) so they cannot drift apart.

use crate::error::FleetError;
use crate::primitives::{
    CYCLE_LENGTH_HOURS, CYCLE_STEPS, PM_INTERVAL_HOURS, RECOMMENDATION_TOLERANCE_HOURS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// PM TYPE
// =============================================================================

/// A preventive-maintenance step type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PmType {
    Pm1,
    Pm2,
    Pm3,
    Pm4,
}

impl PmType {
    /// All PM types in ascending order.
    pub const ALL: [PmType; 4] = [PmType::Pm1, PmType::Pm2, PmType::Pm3, PmType::Pm4];

    /// Canonical upper-case name (`"PM1"`..`"PM4"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PmType::Pm1 => "PM1",
            PmType::Pm2 => "PM2",
            PmType::Pm3 => "PM3",
            PmType::Pm4 => "PM4",
        }
    }

    /// Stable one-byte code used as a storage key.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            PmType::Pm1 => 1,
            PmType::Pm2 => 2,
            PmType::Pm3 => 3,
            PmType::Pm4 => 4,
        }
    }

    /// Inverse of [`PmType::code`].
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|pm| pm.code() == code)
    }
}

impl fmt::Display for PmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PmType {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|pm| pm.as_str() == normalized)
            .ok_or_else(|| FleetError::InvalidPmType(s.to_string()))
    }
}

// =============================================================================
// CYCLE TABLE
// =============================================================================

/// One step of the cycle: the cumulative milestone and the PM performed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStep {
    /// Cumulative hours within the cycle at which this step falls due.
    pub milestone_hours: u64,
    /// The maintenance performed at this step.
    pub pm_type: PmType,
}

/// The full 2000-hour cycle, indexed by [`CycleIndex`].
pub const PM_CYCLE: [CycleStep; CYCLE_STEPS] = [
    CycleStep { milestone_hours: 250, pm_type: PmType::Pm1 },
    CycleStep { milestone_hours: 500, pm_type: PmType::Pm2 },
    CycleStep { milestone_hours: 750, pm_type: PmType::Pm1 },
    CycleStep { milestone_hours: 1000, pm_type: PmType::Pm3 },
    CycleStep { milestone_hours: 1250, pm_type: PmType::Pm1 },
    CycleStep { milestone_hours: 1500, pm_type: PmType::Pm2 },
    CycleStep { milestone_hours: 1750, pm_type: PmType::Pm3 },
    CycleStep { milestone_hours: 2000, pm_type: PmType::Pm4 },
];

// =============================================================================
// CYCLE INDEX
// =============================================================================

/// Position in the cycle, always in `[0, 8)`.
///
/// Construction reduces modulo 8, including when deserializing, so an
/// out-of-range index can never be observed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct CycleIndex(u8);

impl CycleIndex {
    /// The first step (PM1 at 250 h).
    pub const FIRST: Self = Self(0);

    /// Build an index, reducing modulo the cycle length.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self((raw % CYCLE_STEPS as u64) as u8)
    }

    /// The index as a `usize` in `[0, 8)`.
    #[must_use]
    pub fn value(self) -> usize {
        self.0 as usize
    }

    /// The following step, wrapping after PM4.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.0 as u64 + 1)
    }

    /// The cycle step at this index.
    #[must_use]
    pub fn step(self) -> CycleStep {
        PM_CYCLE[self.value()]
    }

    /// The PM type performed at this index.
    #[must_use]
    pub fn pm_type(self) -> PmType {
        self.step().pm_type
    }

    /// Human-readable label, e.g. `"PM3 (1000 hrs)"`.
    #[must_use]
    pub fn label(self) -> String {
        let step = self.step();
        if self.value() == CYCLE_STEPS - 1 {
            format!("{} ({} hrs - end of cycle)", step.pm_type, step.milestone_hours)
        } else {
            format!("{} ({} hrs)", step.pm_type, step.milestone_hours)
        }
    }
}

impl From<u8> for CycleIndex {
    fn from(raw: u8) -> Self {
        Self::new(raw as u64)
    }
}

impl From<CycleIndex> for u8 {
    fn from(index: CycleIndex) -> Self {
        index.0
    }
}

impl fmt::Display for CycleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The machine's new target after a completed scheduled maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPmStep {
    pub next_pm_type: PmType,
    pub next_pm_due_hm: u64,
    pub next_cycle_index: CycleIndex,
}

/// Infer the next due cycle step from a raw hour-meter reading.
///
/// The reading is reduced into the current 2000-hour cycle. A milestone counts
/// as reached from 25 hours before it, so a machine approaching a milestone is
/// considered due for the *following* step. Once every milestone is reached the
/// result wraps to 0 (PM1 of the next cycle).
#[must_use]
pub fn recommended_cycle_index(current_hm: u64) -> CycleIndex {
    let relative = current_hm % CYCLE_LENGTH_HOURS;
    let first_unreached = PM_CYCLE
        .iter()
        .position(|step| {
            relative < step.milestone_hours.saturating_sub(RECOMMENDATION_TOLERANCE_HOURS)
        })
        .unwrap_or(CYCLE_STEPS);
    CycleIndex::new(first_unreached as u64)
}

/// Compute the machine's next step after completing the step at `current`.
///
/// The next due reading is always 250 hours after the completing reading,
/// whichever milestone was just done.
#[must_use]
pub fn advance_cycle(hm_at_completion: u64, current: CycleIndex) -> NextPmStep {
    let next_cycle_index = current.next();
    NextPmStep {
        next_pm_type: next_cycle_index.pm_type(),
        next_pm_due_hm: due_after(hm_at_completion),
        next_cycle_index,
    }
}

/// The due reading for a step (re)computed at `hm`.
#[must_use]
pub fn due_after(hm: u64) -> u64 {
    hm.saturating_add(PM_INTERVAL_HOURS)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_boundaries() {
        assert_eq!(recommended_cycle_index(0), CycleIndex::new(0));
        assert_eq!(recommended_cycle_index(224), CycleIndex::new(0));
        assert_eq!(recommended_cycle_index(225), CycleIndex::new(1));
        assert_eq!(recommended_cycle_index(1974), CycleIndex::new(7));
        assert_eq!(recommended_cycle_index(1975), CycleIndex::new(0));
    }

    #[test]
    fn recommendation_inside_tolerance_is_next_step() {
        // 230 >= 250 - 25, so PM1 is considered reached and PM2 is next.
        let index = recommended_cycle_index(230);
        assert_eq!(index.value(), 1);
        assert_eq!(index.pm_type(), PmType::Pm2);

        assert_eq!(recommended_cycle_index(210).pm_type(), PmType::Pm1);
    }

    #[test]
    fn recommendation_wraps_into_next_cycle() {
        assert_eq!(recommended_cycle_index(2000), CycleIndex::new(0));
        assert_eq!(recommended_cycle_index(5120), CycleIndex::new(4));
        assert_eq!(recommended_cycle_index(4225), CycleIndex::new(1));
    }

    #[test]
    fn advance_after_pm2() {
        let step = advance_cycle(520, CycleIndex::new(1));
        assert_eq!(step.next_pm_type, PmType::Pm1);
        assert_eq!(step.next_pm_due_hm, 770);
        assert_eq!(step.next_cycle_index, CycleIndex::new(2));
    }

    #[test]
    fn advance_wraps_after_pm4() {
        let step = advance_cycle(2010, CycleIndex::new(7));
        assert_eq!(step.next_cycle_index, CycleIndex::FIRST);
        assert_eq!(step.next_pm_type, PmType::Pm1);
        assert_eq!(step.next_pm_due_hm, 2260);
    }

    #[test]
    fn advance_saturates_at_max_reading() {
        let step = advance_cycle(u64::MAX, CycleIndex::FIRST);
        assert_eq!(step.next_pm_due_hm, u64::MAX);
    }

    #[test]
    fn cycle_table_matches_sequence() {
        let sequence: Vec<_> = PM_CYCLE.iter().map(|s| s.pm_type.as_str()).collect();
        assert_eq!(
            sequence,
            vec!["PM1", "PM2", "PM1", "PM3", "PM1", "PM2", "PM3", "PM4"]
        );
        for pair in PM_CYCLE.windows(2) {
            assert_eq!(
                pair[1].milestone_hours - pair[0].milestone_hours,
                PM_INTERVAL_HOURS
            );
        }
    }

    #[test]
    fn cycle_index_reduces_modulo_eight() {
        assert_eq!(CycleIndex::new(8), CycleIndex::FIRST);
        assert_eq!(CycleIndex::new(11).value(), 3);
        assert_eq!(CycleIndex::from(255u8).value(), 7);
    }

    #[test]
    fn cycle_labels() {
        assert_eq!(CycleIndex::new(3).label(), "PM3 (1000 hrs)");
        assert_eq!(CycleIndex::new(7).label(), "PM4 (2000 hrs - end of cycle)");
    }

    #[test]
    fn pm_type_parsing() {
        assert_eq!("pm3".parse::<PmType>().ok(), Some(PmType::Pm3));
        assert_eq!(" PM4 ".parse::<PmType>().ok(), Some(PmType::Pm4));
        assert!("PM5".parse::<PmType>().is_err());
        for pm in PmType::ALL {
            assert_eq!(PmType::from_code(pm.code()), Some(pm));
        }
    }
}
