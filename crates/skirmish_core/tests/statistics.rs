//! Statistical profile properties.

use proptest::prelude::*;
use skirmish_core::statistics::{StatisticalProfile, StatisticsError};
use skirmish_test_utils::strategies::{arb_sample, arb_samples};

proptest! {
    #[test]
    fn normalized_scores_stay_in_unit_range(samples in arb_samples(32), query in arb_sample()) {
        let profile = StatisticalProfile::from_values(samples);

        for score in [
            profile.normalized_deviation_from_min(query),
            profile.normalized_deviation_from_max(query),
            profile.normalized_squared_deviation_from_min(query),
            profile.normalized_squared_deviation_from_max(query),
        ] {
            prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn flat_profile_scores_zero(value in arb_sample(), count in 1usize..10, query in arb_sample()) {
        let profile = StatisticalProfile::from_values(std::iter::repeat(value).take(count));

        prop_assert_eq!(profile.normalized_deviation_from_min(query), 0.0);
        prop_assert_eq!(profile.normalized_deviation_from_max(query), 0.0);
    }

    #[test]
    fn extremes_score_zero_and_one(samples in arb_samples(32)) {
        let profile = StatisticalProfile::from_values(samples);
        prop_assume!(profile.max() > profile.min());

        prop_assert_eq!(profile.normalized_deviation_from_min(profile.min()), 0.0);
        prop_assert_eq!(profile.normalized_deviation_from_min(profile.max()), 1.0);
        prop_assert_eq!(profile.normalized_deviation_from_max(profile.max()), 0.0);
        prop_assert_eq!(profile.normalized_deviation_from_max(profile.min()), 1.0);
    }

    #[test]
    fn samples_lie_within_bounds(samples in arb_samples(32)) {
        let profile = StatisticalProfile::from_values(samples.iter().copied());

        prop_assert_eq!(profile.count() as usize, samples.len());
        for value in samples {
            prop_assert!(profile.min() <= value && value <= profile.max());
        }
    }
}

#[test]
fn finalized_profile_rejects_samples_and_keeps_scores() {
    let mut profile = StatisticalProfile::new();
    profile.add_value(10.0).unwrap();
    profile.add_value(30.0).unwrap();
    profile.finalize();
    let before = profile.normalized_deviation_from_min(20.0);

    assert_eq!(profile.add_value(50.0), Err(StatisticsError::Finalized));
    profile.finalize();

    assert_eq!(profile.normalized_deviation_from_min(20.0), before);
    assert_eq!(before, 0.5);
    assert_eq!(profile.mean(), 20.0);
}
