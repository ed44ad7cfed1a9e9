use proptest::prelude::*;

use substrate_core::stats::{ema, geometric_mean, rank_z_scores, robust_threshold};
use substrate_core::Confidence;

proptest! {
    #[test]
    fn ema_stays_between_old_and_input(old in -10.0f64..10.0, x in -10.0f64..10.0, alpha in 0.01f64..1.0) {
        let v = ema(old, x, alpha);
        prop_assert!(v >= old.min(x) - 1e-9 && v <= old.max(x) + 1e-9);
    }

    #[test]
    fn rank_z_preserves_order(values in prop::collection::vec(0.0f64..100.0, 3..40)) {
        let z = rank_z_scores(&values);
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] > values[j] {
                    prop_assert!(z[i] > z[j]);
                }
            }
        }
    }

    #[test]
    fn geometric_mean_is_bounded_by_inputs(values in prop::collection::vec(0.01f64..1.0, 5)) {
        let g = geometric_mean(&values, 0.01);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(g >= lo - 1e-9 && g <= hi + 1e-9);
    }

    #[test]
    fn robust_threshold_never_below_floor(values in prop::collection::vec(0.0f64..5.0, 0..30), floor in 0.0f64..1.0) {
        prop_assert!(robust_threshold(&values, 2.0, floor) >= floor);
    }

    #[test]
    fn confidence_always_in_unit_interval(v in proptest::num::f64::ANY) {
        let c = Confidence::new(v).value();
        prop_assert!((0.0..=1.0).contains(&c));
    }
}
