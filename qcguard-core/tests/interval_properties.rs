//! Property tests for interval extraction and the derived views

mod common;

use common::hourly;
use proptest::prelude::*;
use qcguard_core::interval::apply_intervals;
use qcguard_core::{extract_intervals, qci, Mask};

fn mask_strategy() -> impl Strategy<Value = Mask> {
    (1usize..40, 1usize..4).prop_flat_map(|(rows, width)| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), rows), width).prop_map(move |cells| {
            let names = (0..width).map(|c| format!("C{c}")).collect();
            Mask::from_columns(hourly(rows), names, cells).unwrap()
        })
    })
}

proptest! {
    #[test]
    fn intervals_rebuild_the_mask(mask in mask_strategy()) {
        let intervals = extract_intervals(&mask, "Flag", 1, false);
        let mut rebuilt = Mask::filled(mask.index(), mask.column_names(), true);
        apply_intervals(&mut rebuilt, &intervals);
        prop_assert_eq!(rebuilt, mask.clone());

        let failed: usize = intervals.iter().map(|r| r.timesteps).sum();
        prop_assert_eq!(failed, mask.failure_count());
    }

    #[test]
    fn intervals_are_disjoint_and_ordered(mask in mask_strategy()) {
        let intervals = extract_intervals(&mask, "Flag", 1, false);
        for pair in intervals.windows(2) {
            if pair[0].variable == pair[1].variable {
                prop_assert!(pair[0].end < pair[1].start);
            }
        }
    }

    #[test]
    fn min_failures_drops_short_runs(mask in mask_strategy(), min in 1usize..5) {
        let all = extract_intervals(&mask, "Flag", 1, false);
        let kept = extract_intervals(&mask, "Flag", min, false);
        let expected: Vec<_> = all.into_iter().filter(|r| r.timesteps >= min).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn qci_is_a_fraction(mask in mask_strategy()) {
        let q = qci(&mask, None);
        prop_assert_eq!(q.len(), mask.width());
        let rows = mask.rows() as f64;
        for (col, (_, v)) in q.iter().enumerate() {
            prop_assert!((0.0..=1.0).contains(&v));
            let passed = mask.column(col).iter().filter(|&&p| p).count() as f64;
            prop_assert!((v - passed / rows).abs() < 1e-12);
        }
    }
}
