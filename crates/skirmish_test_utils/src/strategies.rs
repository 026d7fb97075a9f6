//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of profiles, selectors and the scheduler.

use proptest::prelude::*;
use skirmish_core::math::{Fixed, Vec2Fixed};
use skirmish_core::rating::{CombatUnitCriteria, PowerPlantCriteria};
use skirmish_core::task::Priority;

/// A finite sample in a range wide enough to cover costs and ranges.
pub fn arb_sample() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

/// A non-empty list of samples.
pub fn arb_samples(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(arb_sample(), 1..=max_len.max(1))
}

/// A position on a map of edge length `size`.
pub fn arb_position(size: i32) -> impl Strategy<Value = Vec2Fixed> {
    (0..=size, 0..=size).prop_map(|(x, y)| Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y)))
}

/// Any priority.
pub fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Urgent),
        Just(Priority::High),
        Just(Priority::Normal),
        Just(Priority::Low),
    ]
}

/// A selection weight in `[0, 2]`.
pub fn arb_weight() -> impl Strategy<Value = f32> {
    0.0f32..=2.0f32
}

/// Power plant weights.
pub fn arb_power_plant_criteria() -> impl Strategy<Value = PowerPlantCriteria> {
    (arb_weight(), arb_weight(), arb_weight()).prop_map(|(cost, build_time, power)| {
        PowerPlantCriteria {
            cost,
            build_time,
            power,
        }
    })
}

/// Combat unit weights.
pub fn arb_combat_criteria() -> impl Strategy<Value = CombatUnitCriteria> {
    (
        arb_weight(),
        arb_weight(),
        arb_weight(),
        arb_weight(),
        arb_weight(),
        arb_weight(),
    )
        .prop_map(|(cost, range, speed, power, efficiency, factory_utilization)| {
            CombatUnitCriteria {
                cost,
                range,
                speed,
                power,
                efficiency,
                factory_utilization,
            }
        })
}

/// Utilization per factory, each in `[0, 1]`.
pub fn arb_utilization(factories: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0f32..=1.0f32, factories)
}

/// One step of a target list workout: add unit `id`, or remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOp {
    /// Sight enemy `id`.
    Add(u32),
    /// Enemy `id` died.
    Remove(u32),
}

/// A sequence of target list operations over a small id space.
pub fn arb_target_ops(max_len: usize) -> impl Strategy<Value = Vec<TargetOp>> {
    let op = prop_oneof![
        (1u32..40).prop_map(TargetOp::Add),
        (1u32..40).prop_map(TargetOp::Remove),
    ];
    prop::collection::vec(op, 0..=max_len)
}
