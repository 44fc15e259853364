//! Property tests for the PM cycle engine and the alert bands.

use fleetpm_core::cycle::{PM_CYCLE, due_after};
use fleetpm_core::primitives::{CYCLE_LENGTH_HOURS, CYCLE_STEPS, PM_INTERVAL_HOURS};
use fleetpm_core::system::{classify_alert, is_blocked};
use fleetpm_core::{AlertLevel, CycleIndex, advance_cycle, recommended_cycle_index};
use proptest::prelude::*;

const MAX_READING: u64 = 10_000_000;

proptest! {
    #[test]
    fn recommendation_is_in_range(hm in 0u64..MAX_READING) {
        prop_assert!(recommended_cycle_index(hm).value() < CYCLE_STEPS);
    }

    #[test]
    fn recommendation_is_periodic(hm in 0u64..MAX_READING, cycles in 0u64..100) {
        prop_assert_eq!(
            recommended_cycle_index(hm),
            recommended_cycle_index(hm + cycles * CYCLE_LENGTH_HOURS)
        );
    }

    #[test]
    fn recommendation_is_pure(hm in any::<u64>()) {
        prop_assert_eq!(recommended_cycle_index(hm), recommended_cycle_index(hm));
    }

    #[test]
    fn recommendation_never_picks_a_reached_milestone(hm in 0u64..MAX_READING) {
        let index = recommended_cycle_index(hm);
        let relative = hm % CYCLE_LENGTH_HOURS;
        // Either the step is still ahead, or every step was reached and we wrapped.
        let step = index.step();
        prop_assert!(relative + 25 < step.milestone_hours || (index.value() == 0 && relative >= 1975));
    }

    #[test]
    fn advance_moves_one_step(hm in 0u64..MAX_READING, raw in 0u8..8) {
        let current = CycleIndex::from(raw);
        let next = advance_cycle(hm, current);
        let expected = (raw as usize + 1) % CYCLE_STEPS;
        prop_assert_eq!(next.next_cycle_index.value(), expected);
        prop_assert_eq!(next.next_pm_type, PM_CYCLE[expected].pm_type);
        prop_assert_eq!(next.next_pm_due_hm, hm + PM_INTERVAL_HOURS);
        prop_assert_eq!(next.next_pm_due_hm, due_after(hm));
    }

    #[test]
    fn eight_advances_return_to_start(hm in 0u64..MAX_READING, raw in 0u8..8) {
        let start = CycleIndex::from(raw);
        let mut index = start;
        for _ in 0..CYCLE_STEPS {
            index = advance_cycle(hm, index).next_cycle_index;
        }
        prop_assert_eq!(index, start);
    }

    #[test]
    fn alert_bands_partition(current in 0u64..MAX_READING, due in 0u64..MAX_READING) {
        let level = classify_alert(current, due);
        let critical = current >= due;
        let warning = !critical && current >= due.saturating_sub(50);
        match level {
            AlertLevel::Critical => prop_assert!(critical),
            AlertLevel::Warning => prop_assert!(warning),
            AlertLevel::Ok => prop_assert!(!critical && !warning),
        }
    }

    #[test]
    fn blocked_implies_critical(current in 0u64..MAX_READING, due in 0u64..MAX_READING) {
        if is_blocked(current, due) {
            prop_assert_eq!(classify_alert(current, due), AlertLevel::Critical);
        }
    }
}

#[test]
fn documented_examples() {
    assert_eq!(recommended_cycle_index(0).value(), 0);
    assert_eq!(recommended_cycle_index(224).value(), 0);
    assert_eq!(recommended_cycle_index(225).value(), 1);
    assert_eq!(recommended_cycle_index(230).value(), 1);
    assert_eq!(recommended_cycle_index(1975).value(), 0);

    let next = advance_cycle(520, CycleIndex::new(1));
    assert_eq!(next.next_pm_type.as_str(), "PM1");
    assert_eq!(next.next_pm_due_hm, 770);
    assert_eq!(next.next_cycle_index.value(), 2);

    assert!(!is_blocked(1000, 1000));
    assert!(!is_blocked(1015, 1000));
    assert!(is_blocked(1016, 1000));
}
