//! Test fixtures and helpers.
//!
//! A small but complete roster covering every category the selectors look
//! at, plus shortcuts for building trees and controllers from it.

use std::sync::Arc;

use fixed::types::I32F32;
use skirmish_core::config::AiConfig;
use skirmish_core::construction::ConstructionOrderController;
use skirmish_core::data::FactionData;
use skirmish_core::factions::FactionId;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::registry::BuildTree;
use skirmish_core::unit_kind::UnitTypeId;

/// Faction of [`ROSTER`].
pub const ARM: FactionId = FactionId::new(1);

/// Reference roster.
///
/// `solar` and `wind` are identical apart from their name; `solar` is
/// registered first. `fusion` is only built by `con_kbot`.
pub const ROSTER: &str = r#"
FactionData(
    id: 1,
    name: "Arm",
    units: [
        UnitData(id: "commander", category: Commander, movement: "ground", cost: 2000.0, build_time: 50000.0,
            max_health: 3000.0, max_speed: 40.0, build_speed: 300.0, build_distance: 100.0,
            tags: ["builder"], build_options: ["solar", "wind", "mex", "kbot_lab", "vehicle_plant", "llt", "radar_tower"]),
        UnitData(id: "solar", category: PowerPlant, movement: "static_land", cost: 150.0, build_time: 2800.0,
            max_health: 500.0, primary_ability: 20.0),
        UnitData(id: "wind", category: PowerPlant, movement: "static_land", cost: 150.0, build_time: 2800.0,
            max_health: 500.0, primary_ability: 20.0),
        UnitData(id: "fusion", category: PowerPlant, movement: "static_land", cost: 3500.0, build_time: 70000.0,
            max_health: 4000.0, primary_ability: 1000.0),
        UnitData(id: "tidal", category: PowerPlant, movement: "static_sea_floater", cost: 180.0, build_time: 2500.0,
            max_health: 400.0, primary_ability: 18.0),
        UnitData(id: "mex", category: MetalExtractor, movement: "static_land", cost: 50.0, build_time: 1800.0,
            max_health: 300.0, primary_ability: 0.001),
        UnitData(id: "llt", category: StaticDefence, movement: "static_land", cost: 100.0, build_time: 2000.0,
            max_health: 700.0, primary_ability: 430.0, tags: ["armed"], combat_power: (3.0, 0.5, 2.0, 0.0, 1.0)),
        UnitData(id: "radar_tower", category: StaticSensor, movement: "static_land", cost: 60.0, build_time: 1200.0,
            max_health: 200.0, primary_ability: 2200.0, tags: ["radar"]),
        UnitData(id: "kbot_lab", category: StaticConstructor, movement: "static_land", cost: 600.0, build_time: 6000.0,
            max_health: 2000.0, build_speed: 100.0, footprint: (6, 6), build_options: ["con_kbot", "peewee", "rocko"]),
        UnitData(id: "vehicle_plant", category: StaticConstructor, movement: "static_land", cost: 700.0, build_time: 7000.0,
            max_health: 2500.0, build_speed: 100.0, footprint: (7, 7), build_options: ["con_vehicle", "flash"]),
        UnitData(id: "con_kbot", category: MobileConstructor, movement: "ground", cost: 120.0, build_time: 3000.0,
            max_health: 300.0, max_speed: 30.0, build_speed: 80.0, build_distance: 90.0,
            tags: ["builder"], build_options: ["solar", "wind", "fusion", "mex", "llt"]),
        UnitData(id: "con_vehicle", category: MobileConstructor, movement: "ground", cost: 140.0, build_time: 3300.0,
            max_health: 900.0, max_speed: 45.0, build_speed: 90.0, build_distance: 110.0,
            tags: ["builder"], build_options: ["solar", "mex", "llt"]),
        UnitData(id: "peewee", category: GroundCombat, movement: "ground", cost: 50.0, build_time: 1000.0,
            max_health: 200.0, max_speed: 50.0, primary_ability: 200.0, tags: ["armed"],
            combat_power: (2.0, 0.1, 0.5, 0.0, 1.0)),
        UnitData(id: "rocko", category: GroundCombat, movement: "ground", cost: 110.0, build_time: 1900.0,
            max_health: 350.0, max_speed: 35.0, primary_ability: 600.0, tags: ["armed"],
            combat_power: (3.5, 0.0, 1.5, 0.0, 2.0)),
        UnitData(id: "flash", category: GroundCombat, movement: "ground", cost: 100.0, build_time: 1400.0,
            max_health: 600.0, max_speed: 90.0, primary_ability: 180.0, tags: ["armed"],
            combat_power: (2.5, 0.0, 0.8, 0.0, 1.2)),
        UnitData(id: "nano", category: StaticSupport, movement: "static_land", cost: 200.0, build_time: 1500.0,
            max_health: 400.0, build_speed: 100.0, build_distance: 400.0, tags: ["assister"]),
    ],
    starting_units: ["commander"],
)
"#;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Parsed [`ROSTER`].
///
/// # Panics
///
/// Panics if the roster fails to parse.
#[must_use]
pub fn roster() -> FactionData {
    FactionData::from_ron_str(ROSTER).expect("reference roster parses")
}

/// Unit tables for [`ROSTER`].
///
/// # Panics
///
/// Panics if the roster is inconsistent.
#[must_use]
pub fn tree() -> Arc<BuildTree> {
    Arc::new(BuildTree::from_factions(&[roster()]).expect("reference roster is consistent"))
}

/// Id of a unit in [`ROSTER`].
///
/// # Panics
///
/// Panics if `name` is not in the roster.
#[must_use]
pub fn unit(name: &str) -> UnitTypeId {
    tree()
        .find(ARM, name)
        .unwrap_or_else(|| panic!("unit '{name}' not in roster"))
}

/// Controller for [`ROSTER`] with the start units already spawned.
#[must_use]
pub fn controller(config: &AiConfig) -> ConstructionOrderController {
    let tree = tree();
    let start: Vec<UnitTypeId> = tree.start_units().to_vec();
    let mut controller = ConstructionOrderController::new(tree, ARM, config);
    for unit_type in start {
        controller.unit_spawned(unit_type);
    }
    controller
}
