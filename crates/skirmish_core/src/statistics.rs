//! Running min/max/mean accumulators and normalized deviation scores.
//!
//! Every rating criterion is rescaled to `[0, 1]` relative to the values
//! observed across the candidate's category before it is weighted. A
//! [`StatisticalProfile`] collects the samples, is finalized once, and is
//! then read-only.
//!
//! Queries never divide by zero: an unfinalized, empty or flat profile
//! (`max == min`) yields `0.0`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::unit_kind::{TargetType, UnitCategory, UnitTypeFlags, UnitTypeId};

/// Errors raised by statistical profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatisticsError {
    /// A sample was added after the profile was finalized.
    #[error("Cannot add value to a finalized statistical profile")]
    Finalized,
}

/// Min/max/mean accumulator over a set of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalProfile {
    count: u32,
    min: f32,
    max: f32,
    sum: f32,
    mean: f32,
    finalized: bool,
}

impl StatisticalProfile {
    /// Create an empty, open profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and finalize a profile from an iterator of samples.
    #[must_use]
    pub fn from_values<I: IntoIterator<Item = f32>>(values: I) -> Self {
        let mut profile = Self::new();
        for value in values {
            profile.push(value);
        }
        profile.finalize();
        profile
    }

    /// Append a sample.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Finalized`] if [`finalize`](Self::finalize)
    /// has already been called.
    pub fn add_value(&mut self, value: f32) -> Result<(), StatisticsError> {
        if self.finalized {
            return Err(StatisticsError::Finalized);
        }
        self.push(value);
        Ok(())
    }

    fn push(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    /// Close the profile for writes and compute the mean. Idempotent.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.mean = if self.count > 0 {
            self.sum / self.count as f32
        } else {
            0.0
        };
        self.finalized = true;
    }

    /// Whether the profile is closed for writes.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of samples.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Smallest sample (0 if empty).
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Largest sample (0 if empty).
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Mean of all samples (0 until finalized).
    #[must_use]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    fn range(&self) -> Option<f32> {
        if !self.finalized || self.count == 0 {
            return None;
        }
        let range = self.max - self.min;
        (range > 0.0).then_some(range)
    }

    /// `(x - min) / (max - min)` clamped to `[0, 1]`; higher `x` scores higher.
    #[must_use]
    pub fn normalized_deviation_from_min(&self, value: f32) -> f32 {
        self.range()
            .map_or(0.0, |range| ((value - self.min) / range).clamp(0.0, 1.0))
    }

    /// `(max - x) / (max - min)` clamped to `[0, 1]`; lower `x` scores higher.
    #[must_use]
    pub fn normalized_deviation_from_max(&self, value: f32) -> f32 {
        self.range()
            .map_or(0.0, |range| ((self.max - value) / range).clamp(0.0, 1.0))
    }

    /// Squared [`normalized_deviation_from_min`](Self::normalized_deviation_from_min).
    #[must_use]
    pub fn normalized_squared_deviation_from_min(&self, value: f32) -> f32 {
        let deviation = self.normalized_deviation_from_min(value);
        deviation * deviation
    }

    /// Squared [`normalized_deviation_from_max`](Self::normalized_deviation_from_max).
    #[must_use]
    pub fn normalized_squared_deviation_from_max(&self, value: f32) -> f32 {
        let deviation = self.normalized_deviation_from_max(value);
        deviation * deviation
    }

    /// `x / max`, or 0 if the profile is empty or its max is not positive.
    #[must_use]
    pub fn deviation_from_zero(&self, value: f32) -> f32 {
        if self.finalized && self.count > 0 && self.max > 0.0 {
            value / self.max
        } else {
            0.0
        }
    }
}

/// Numeric properties a profile can be built from.
///
/// Implemented by the unit property table so that statistics do not
/// depend on how properties are stored.
pub trait StatisticsSource {
    /// Category of a unit type.
    fn category(&self, id: UnitTypeId) -> UnitCategory;
    /// Total cost.
    fn cost(&self, id: UnitTypeId) -> f32;
    /// Build time.
    fn build_time(&self, id: UnitTypeId) -> f32;
    /// Category dependent primary value.
    fn primary_ability(&self, id: UnitTypeId) -> f32;
    /// Category dependent secondary value.
    fn secondary_ability(&self, id: UnitTypeId) -> f32;
    /// Seismic detection range.
    fn seismic_range(&self, id: UnitTypeId) -> f32;
    /// Maximum speed.
    fn max_speed(&self, id: UnitTypeId) -> f32;
    /// Capability flags.
    fn flags(&self, id: UnitTypeId) -> UnitTypeFlags;
}

/// Range and cost profiles of static sensors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorStatistics {
    /// Radar ranges of radar buildings.
    pub radar_ranges: StatisticalProfile,
    /// Costs of radar buildings.
    pub radar_costs: StatisticalProfile,
    /// Sonar ranges of sonar buildings.
    pub sonar_ranges: StatisticalProfile,
    /// Costs of sonar buildings.
    pub sonar_costs: StatisticalProfile,
    /// Seismic ranges of seismic detectors.
    pub seismic_ranges: StatisticalProfile,
    /// Costs of seismic detectors.
    pub seismic_costs: StatisticalProfile,
}

impl SensorStatistics {
    /// Build from the static sensors of one faction.
    pub fn build<S: StatisticsSource + ?Sized>(source: &S, sensors: &[UnitTypeId]) -> Self {
        let mut stats = Self::default();
        for &id in sensors {
            let flags = source.flags(id);
            let cost = source.cost(id);
            if flags.contains(UnitTypeFlags::RADAR) {
                stats.radar_ranges.push(source.primary_ability(id));
                stats.radar_costs.push(cost);
            }
            if flags.contains(UnitTypeFlags::SONAR) {
                stats.sonar_ranges.push(source.secondary_ability(id));
                stats.sonar_costs.push(cost);
            }
            if flags.contains(UnitTypeFlags::SEISMIC) {
                stats.seismic_ranges.push(source.seismic_range(id));
                stats.seismic_costs.push(cost);
            }
        }
        for profile in [
            &mut stats.radar_ranges,
            &mut stats.radar_costs,
            &mut stats.sonar_ranges,
            &mut stats.sonar_costs,
            &mut stats.seismic_ranges,
            &mut stats.seismic_costs,
        ] {
            profile.finalize();
        }
        stats
    }
}

/// Profiles of one criterion, one per unit category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProfiles(Vec<StatisticalProfile>);

impl Default for CategoryProfiles {
    fn default() -> Self {
        Self(vec![StatisticalProfile::default(); UnitCategory::COUNT])
    }
}

impl CategoryProfiles {
    /// Profile for a category.
    #[must_use]
    pub fn get(&self, category: UnitCategory) -> &StatisticalProfile {
        &self.0[category.index()]
    }
}

/// Profiles of one criterion, one per mobile target type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatProfiles([StatisticalProfile; 4]);

impl CombatProfiles {
    /// Profile for combat units of a target type. Static maps to an empty profile.
    #[must_use]
    pub fn get(&self, target: TargetType) -> &StatisticalProfile {
        const EMPTY: &StatisticalProfile = &StatisticalProfile {
            count: 0,
            min: 0.0,
            max: 0.0,
            sum: 0.0,
            mean: 0.0,
            finalized: true,
        };
        self.0.get(target.index()).unwrap_or(EMPTY)
    }
}

/// Per-faction statistics used by every selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitStatistics {
    /// Cost per category.
    pub cost: CategoryProfiles,
    /// Build time per category.
    pub build_time: CategoryProfiles,
    /// Primary ability per category.
    pub primary_ability: CategoryProfiles,
    /// Secondary ability per category.
    pub secondary_ability: CategoryProfiles,
    /// Max speed per category.
    pub speed: CategoryProfiles,
    /// Cost of combat units per target type.
    pub combat_cost: CombatProfiles,
    /// Build time of combat units per target type.
    pub combat_build_time: CombatProfiles,
    /// Weapon range of combat units per target type.
    pub combat_range: CombatProfiles,
    /// Speed of combat units per target type.
    pub combat_speed: CombatProfiles,
    /// Static sensor statistics.
    pub sensors: SensorStatistics,
}

impl UnitStatistics {
    /// Build and finalize all profiles for one faction.
    ///
    /// `units_in_category[c]` lists the faction's units of category `c`;
    /// `combat_units[t]` lists its combat units of mobile target type `t`.
    pub fn build<S: StatisticsSource + ?Sized>(
        source: &S,
        units_in_category: &[Vec<UnitTypeId>],
        combat_units: &[Vec<UnitTypeId>],
    ) -> Self {
        let mut stats = Self::default();

        for (index, units) in units_in_category.iter().enumerate().take(UnitCategory::COUNT) {
            for &id in units {
                stats.cost.0[index].push(source.cost(id));
                stats.build_time.0[index].push(source.build_time(id));
                stats.primary_ability.0[index].push(source.primary_ability(id));
                stats.secondary_ability.0[index].push(source.secondary_ability(id));
                stats.speed.0[index].push(source.max_speed(id));
            }
        }

        for (index, units) in combat_units.iter().enumerate().take(TargetType::MOBILE.len()) {
            for &id in units {
                stats.combat_cost.0[index].push(source.cost(id));
                stats.combat_build_time.0[index].push(source.build_time(id));
                stats.combat_range.0[index].push(source.primary_ability(id));
                stats.combat_speed.0[index].push(source.max_speed(id));
            }
        }

        for profiles in [
            &mut stats.cost,
            &mut stats.build_time,
            &mut stats.primary_ability,
            &mut stats.secondary_ability,
            &mut stats.speed,
        ] {
            profiles.0.iter_mut().for_each(StatisticalProfile::finalize);
        }
        for profiles in [
            &mut stats.combat_cost,
            &mut stats.combat_build_time,
            &mut stats.combat_range,
            &mut stats.combat_speed,
        ] {
            profiles.0.iter_mut().for_each(StatisticalProfile::finalize);
        }

        let sensors = units_in_category
            .get(UnitCategory::StaticSensor.index())
            .map_or(&[][..], Vec::as_slice);
        stats.sensors = SensorStatistics::build(source, sensors);

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn profile(values: &[f32]) -> StatisticalProfile {
        StatisticalProfile::from_values(values.iter().copied())
    }

    #[test]
    fn test_min_max_mean() {
        let p = profile(&[2.0, 4.0, 9.0]);
        assert_eq!(p.min(), 2.0);
        assert_eq!(p.max(), 9.0);
        assert_eq!(p.mean(), 5.0);
        assert_eq!(p.count(), 3);
    }

    #[test]
    fn test_add_after_finalize_fails() {
        let mut p = StatisticalProfile::new();
        p.add_value(1.0).unwrap();
        p.finalize();
        assert_eq!(p.add_value(2.0), Err(StatisticsError::Finalized));
        assert_eq!(p.count(), 1);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut p = StatisticalProfile::new();
        p.add_value(3.0).unwrap();
        p.add_value(5.0).unwrap();
        p.finalize();
        let first = p.clone();
        p.finalize();
        assert_eq!(p, first);
    }

    #[test]
    fn test_unfinalized_profile_is_neutral() {
        let mut p = StatisticalProfile::new();
        p.add_value(1.0).unwrap();
        p.add_value(10.0).unwrap();
        assert_eq!(p.normalized_deviation_from_min(5.0), 0.0);
        assert_eq!(p.deviation_from_zero(5.0), 0.0);
    }

    #[test]
    fn test_empty_profile_is_neutral() {
        let p = profile(&[]);
        assert_eq!(p.normalized_deviation_from_min(1.0), 0.0);
        assert_eq!(p.normalized_deviation_from_max(1.0), 0.0);
        assert_eq!(p.mean(), 0.0);
    }

    #[test]
    fn test_deviation_values() {
        let p = profile(&[10.0, 20.0, 30.0]);
        assert_eq!(p.normalized_deviation_from_min(15.0), 0.25);
        assert_eq!(p.normalized_deviation_from_max(15.0), 0.75);
        assert_eq!(p.normalized_squared_deviation_from_min(20.0), 0.25);
        assert_eq!(p.normalized_squared_deviation_from_max(30.0), 0.0);
        assert_eq!(p.deviation_from_zero(15.0), 0.5);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let p = profile(&[10.0, 20.0]);
        assert_eq!(p.normalized_deviation_from_min(40.0), 1.0);
        assert_eq!(p.normalized_deviation_from_max(40.0), 0.0);
        assert_eq!(p.normalized_deviation_from_min(-5.0), 0.0);
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let p = profile(&[1.0, f32::NAN, 3.0, f32::INFINITY]);
        assert_eq!(p.count(), 2);
        assert_eq!(p.max(), 3.0);
    }

    proptest! {
        #[test]
        fn prop_deviation_in_unit_range(
            values in proptest::collection::vec(-1.0e6f32..1.0e6, 1..32),
            x in -2.0e6f32..2.0e6,
        ) {
            let p = profile(&values);
            for d in [
                p.normalized_deviation_from_min(x),
                p.normalized_deviation_from_max(x),
                p.normalized_squared_deviation_from_min(x),
                p.normalized_squared_deviation_from_max(x),
            ] {
                prop_assert!((0.0..=1.0).contains(&d), "deviation {} out of range", d);
            }
        }

        #[test]
        fn prop_flat_profile_scores_zero(
            value in -1.0e6f32..1.0e6,
            n in 1usize..16,
            x in -2.0e6f32..2.0e6,
        ) {
            let p = profile(&vec![value; n]);
            prop_assert_eq!(p.normalized_deviation_from_min(x), 0.0);
            prop_assert_eq!(p.normalized_deviation_from_max(x), 0.0);
        }
    }
}
