//! Weighted multi-criteria selection of unit types.
//!
//! Every selector follows the same scan:
//! 1. take the per-category [`StatisticalProfile`]s of the faction
//! 2. walk the category's candidates in registration order
//! 3. rate each as `Σ weight_i * deviation_i` plus optional bonuses
//! 4. keep the strictly greater maximum, starting from `0.0`
//!
//! Ties keep the earlier candidate. A scan where nothing rates above zero
//! returns [`UnitTypeId::NONE`]. Weights may be negative; that simply
//! inverts the criterion.
//!
//! Selectors here are pure: they read the registry and never request
//! producers. The two-phase "request a builder, then re-select" wrappers
//! live in [`construction`](crate::construction).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::RatingConstants;
use crate::factions::FactionId;
use crate::learning::{AttackedByRates, MapType};
use crate::registry::{BuildTree, UnitTypeRegistry};
use crate::statistics::StatisticalProfile;
use crate::unit_kind::{
    MovementType, TargetType, TargetTypeValues, UnitCategory, UnitTypeFlags, UnitTypeId,
};

/// Keeps the best candidate of a scan.
#[derive(Debug, Clone, Copy)]
struct Best {
    id: UnitTypeId,
    rating: f32,
}

impl Best {
    const fn new(floor: f32) -> Self {
        Self {
            id: UnitTypeId::NONE,
            rating: floor,
        }
    }

    fn offer(&mut self, id: UnitTypeId, rating: f32) {
        if rating > self.rating {
            self.id = id;
            self.rating = rating;
        }
    }
}

/// Integer jitter in `0..=randomness`, scaled.
fn jitter_inclusive<R: Rng + ?Sized>(rng: &mut R, randomness: u32, scale: f32) -> f32 {
    scale * rng.gen_range(0..=randomness) as f32
}

/// Integer jitter in `0..randomness` (none if `randomness` is 0), scaled.
fn jitter_exclusive<R: Rng + ?Sized>(rng: &mut R, randomness: u32, scale: f32) -> f32 {
    if randomness == 0 {
        0.0
    } else {
        scale * rng.gen_range(0..randomness) as f32
    }
}

/// Whether a building may be chosen for a land or sea site.
#[must_use]
pub fn is_building_selectable(
    registry: &UnitTypeRegistry,
    id: UnitTypeId,
    water: bool,
    must_be_constructable: bool,
) -> bool {
    let Some(props) = registry.tree().get(id) else {
        return false;
    };
    let constructable = !must_be_constructable || registry.is_constructable(id);
    let site = if water {
        props.movement.is_static_sea()
    } else {
        props.movement.is_static_land()
    };
    constructable && site
}

/// Weights for power plant selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerPlantCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of short build time.
    pub build_time: f32,
    /// Weight of high energy production.
    pub power: f32,
}

/// Select a power plant.
#[must_use]
pub fn select_power_plant(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &PowerPlantCriteria,
    water: bool,
    must_be_constructable: bool,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::PowerPlant;
    let powers = stats.primary_ability.get(category);
    let costs = stats.cost.get(category);
    let build_times = stats.build_time.get(category);

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(category, faction) {
        if !is_building_selectable(registry, id, water, must_be_constructable) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let rating = criteria.power * powers.normalized_deviation_from_min(props.primary_ability)
            + criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.build_time * build_times.normalized_deviation_from_max(props.build_time);
        best.offer(id, rating);
    }
    best.id
}

/// Weights for metal extractor selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractorCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of high extraction.
    pub extracted_metal: f32,
    /// Prefer armed extractors.
    pub armed: bool,
}

/// Select a metal extractor.
#[must_use]
pub fn select_extractor(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &ExtractorCriteria,
    water: bool,
    must_be_constructable: bool,
    constants: &RatingConstants,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::MetalExtractor;
    let extraction = stats.primary_ability.get(category);
    let costs = stats.cost.get(category);

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(category, faction) {
        if !is_building_selectable(registry, id, water, must_be_constructable) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let mut rating = criteria.extracted_metal
            * extraction.normalized_deviation_from_min(props.primary_ability)
            + criteria.cost * costs.normalized_deviation_from_max(props.cost);
        if criteria.armed && props.flags.contains(UnitTypeFlags::ARMED) {
            rating += constants.armed_bonus;
        }
        best.offer(id, rating);
    }
    best.id
}

/// The extractor with the largest footprint across all factions.
///
/// Build sites for extractors are reserved with this footprint so that any
/// faction's extractor fits.
#[must_use]
pub fn largest_extractor(tree: &BuildTree) -> UnitTypeId {
    let mut largest = UnitTypeId::NONE;
    let mut largest_area = 0;
    for props in tree.all() {
        if props.category == UnitCategory::MetalExtractor && props.footprint_area() > largest_area {
            largest_area = props.footprint_area();
            largest = props.id;
        }
    }
    largest
}

/// Weights for storage selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of short build time.
    pub build_time: f32,
    /// Weight of metal capacity.
    pub metal: f32,
    /// Weight of energy capacity.
    pub energy: f32,
}

/// Select a storage building.
#[must_use]
pub fn select_storage(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &StorageCriteria,
    water: bool,
    must_be_constructable: bool,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::Storage;
    let costs = stats.cost.get(category);
    let build_times = stats.build_time.get(category);
    let metal = stats.primary_ability.get(category);
    let energy = stats.secondary_ability.get(category);

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(category, faction) {
        if !is_building_selectable(registry, id, water, must_be_constructable) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let rating = criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.build_time * build_times.normalized_deviation_from_max(props.build_time)
            + criteria.metal * metal.normalized_deviation_from_min(props.primary_ability)
            + criteria.energy * energy.normalized_deviation_from_min(props.secondary_ability);
        best.offer(id, rating);
    }
    best.id
}

/// Weights for metal maker selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetalMakerCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of metal produced per energy consumed.
    pub efficiency: f32,
    /// Weight of metal produced.
    pub metal: f32,
}

fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Select a metal maker.
#[must_use]
pub fn select_metal_maker(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &MetalMakerCriteria,
    water: bool,
    must_be_constructable: bool,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::MetalMaker;
    let makers = tree.units_in_category(category, faction);
    let costs = stats.cost.get(category);
    let metal = stats.primary_ability.get(category);
    let efficiencies = StatisticalProfile::from_values(
        makers
            .iter()
            .filter_map(|&id| tree.get(id))
            .map(|p| ratio(p.primary_ability, p.secondary_ability)),
    );

    let mut best = Best::new(0.0);
    for &id in makers {
        if !is_building_selectable(registry, id, water, must_be_constructable) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let rating = criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.metal * metal.normalized_deviation_from_min(props.primary_ability)
            + criteria.efficiency
                * efficiencies.normalized_deviation_from_min(ratio(
                    props.primary_ability,
                    props.secondary_ability,
                ));
        best.offer(id, rating);
    }
    best.id
}

/// Weights for static defence selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticDefenceCriteria {
    /// Target type the defence has to fight.
    pub target_type: TargetType,
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of short build time.
    pub build_time: f32,
    /// Weight of long range.
    pub range: f32,
    /// Weight of combat power against `target_type`.
    pub combat_power: f32,
    /// Upper bound of the integer jitter.
    pub randomness: u32,
}

/// Select a static defence.
#[must_use]
pub fn select_static_defence<R: Rng + ?Sized>(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &StaticDefenceCriteria,
    water: bool,
    must_be_constructable: bool,
    constants: &RatingConstants,
    rng: &mut R,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::StaticDefence;
    let defences = tree.units_in_category(category, faction);
    let costs = stats.cost.get(category);
    let ranges = stats.primary_ability.get(category);
    let build_times = stats.build_time.get(category);
    let combat_powers = StatisticalProfile::from_values(
        defences
            .iter()
            .map(|&id| tree.combat_power(id).get(criteria.target_type)),
    );

    let mut best = Best::new(0.0);
    for &id in defences {
        if !is_building_selectable(registry, id, water, must_be_constructable) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let power = tree.combat_power(id).get(criteria.target_type);
        let rating = criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.build_time * build_times.normalized_deviation_from_max(props.build_time)
            + criteria.range * ranges.normalized_deviation_from_min(props.primary_ability)
            + criteria.combat_power * combat_powers.normalized_deviation_from_min(power)
            + jitter_inclusive(rng, criteria.randomness, constants.defence_jitter);
        best.offer(id, rating);
    }
    best.id
}

/// Weights for static artillery selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtilleryCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of long range.
    pub range: f32,
}

/// Select a static artillery. Single phase: constructability is not checked.
#[must_use]
pub fn select_static_artillery(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &ArtilleryCriteria,
    water: bool,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::StaticArtillery;
    let costs = stats.cost.get(category);
    let ranges = stats.primary_ability.get(category);

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(category, faction) {
        if !is_building_selectable(registry, id, water, false) {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let rating = criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.range * ranges.normalized_deviation_from_min(props.primary_ability);
        best.offer(id, rating);
    }
    best.id
}

/// Weights for sensor selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of long range.
    pub range: f32,
}

fn select_sensor(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &SensorCriteria,
    water: bool,
    must_be_constructable: bool,
    sonar: bool,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let (flag, costs, ranges) = if sonar {
        (
            UnitTypeFlags::SONAR,
            &stats.sensors.sonar_costs,
            &stats.sensors.sonar_ranges,
        )
    } else {
        (
            UnitTypeFlags::RADAR,
            &stats.sensors.radar_costs,
            &stats.sensors.radar_ranges,
        )
    };

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(UnitCategory::StaticSensor, faction) {
        let Some(props) = tree.get(id) else { continue };
        if !props.flags.contains(flag)
            || !is_building_selectable(registry, id, water, must_be_constructable)
        {
            continue;
        }
        let range = if sonar {
            props.secondary_ability
        } else {
            props.primary_ability
        };
        let rating = criteria.cost * costs.normalized_deviation_from_max(props.cost)
            + criteria.range * ranges.normalized_deviation_from_min(range);
        best.offer(id, rating);
    }
    best.id
}

/// Select a radar building.
#[must_use]
pub fn select_radar(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &SensorCriteria,
    water: bool,
    must_be_constructable: bool,
) -> UnitTypeId {
    select_sensor(registry, faction, criteria, water, must_be_constructable, false)
}

/// Select a sonar building.
#[must_use]
pub fn select_sonar(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &SensorCriteria,
    water: bool,
    must_be_constructable: bool,
) -> UnitTypeId {
    select_sensor(registry, faction, criteria, water, must_be_constructable, true)
}

/// Weights and filters for scout selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoutCriteria {
    /// Weight of line of sight.
    pub sight_range: f32,
    /// Weight of low cost.
    pub cost: f32,
    /// Allowed movement classes.
    pub movement: MovementType,
    /// Upper bound (exclusive) of the integer jitter.
    pub randomness: u32,
    /// Prefer cloakable scouts.
    pub cloakable: bool,
    /// Only scouts with a producer alive right now.
    pub factory_available: bool,
}

/// Select a scout.
#[must_use]
pub fn select_scout<R: Rng + ?Sized>(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    criteria: &ScoutCriteria,
    constants: &RatingConstants,
    rng: &mut R,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let category = UnitCategory::Scout;
    let costs = stats.cost.get(category);
    let sight_ranges = stats.primary_ability.get(category);

    let mut best = Best::new(0.0);
    for &id in tree.units_in_category(category, faction) {
        let Some(props) = tree.get(id) else { continue };
        let movement_allowed = props.movement.is_included_in(criteria.movement);
        let factory_ok = !criteria.factory_available || registry.is_constructable(id);
        if !(movement_allowed && factory_ok) {
            continue;
        }
        let mut rating = criteria.sight_range
            * sight_ranges.normalized_deviation_from_min(props.primary_ability)
            + criteria.cost * costs.normalized_deviation_from_max(props.cost);
        if criteria.cloakable && props.flags.contains(UnitTypeFlags::CLOAKABLE) {
            rating += constants.cloak_bonus;
        }
        rating += jitter_exclusive(rng, criteria.randomness, constants.scout_jitter);
        best.offer(id, rating);
    }
    best.id
}

/// Weights for combat unit selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatUnitCriteria {
    /// Weight of low cost.
    pub cost: f32,
    /// Weight of long range.
    pub range: f32,
    /// Weight of high speed.
    pub speed: f32,
    /// Weight of weighted combat power.
    pub power: f32,
    /// Weight of combat power per cost.
    pub efficiency: f32,
    /// Weight of the best producer's utilization.
    pub factory_utilization: f32,
}

/// Select a mobile combat unit of `target_type`.
///
/// `factory_utilization` is indexed by [`BuildTree::factory_index`]. A
/// candidate whose producers all report zero utilization is skipped.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn select_combat_unit<R: Rng + ?Sized>(
    registry: &UnitTypeRegistry,
    faction: FactionId,
    target_type: TargetType,
    combat_power_weights: &TargetTypeValues,
    criteria: &CombatUnitCriteria,
    factory_utilization: &[f32],
    randomness: u32,
    constants: &RatingConstants,
    rng: &mut R,
) -> UnitTypeId {
    let tree = registry.tree();
    let Some(stats) = tree.statistics(faction) else {
        return UnitTypeId::NONE;
    };
    let units = tree.combat_units(target_type, faction);
    let costs = stats.combat_cost.get(target_type);
    let ranges = stats.combat_range.get(target_type);
    let speeds = stats.combat_speed.get(target_type);

    let powers: Vec<f32> = units
        .iter()
        .map(|&id| tree.combat_power(id).weighted_sum(combat_power_weights))
        .collect();
    let power_stats = StatisticalProfile::from_values(powers.iter().copied());
    let efficiency_stats = StatisticalProfile::from_values(
        units
            .iter()
            .zip(&powers)
            .map(|(&id, &power)| ratio(power, tree.get(id).map_or(0.0, |p| p.cost))),
    );

    let mut best = Best::new(0.0);
    for (&id, &power) in units.iter().zip(&powers) {
        let utilization = tree
            .constructed_by(id)
            .iter()
            .filter_map(|&factory| tree.factory_index(factory))
            .filter_map(|index| factory_utilization.get(index).copied())
            .fold(0.0_f32, f32::max);
        if utilization <= 0.0 {
            continue;
        }
        let Some(props) = tree.get(id) else { continue };
        let efficiency = ratio(power, props.cost);
        let rating = criteria.cost * costs.normalized_squared_deviation_from_max(props.cost)
            + criteria.range * ranges.normalized_squared_deviation_from_min(props.primary_ability)
            + criteria.speed * speeds.normalized_squared_deviation_from_min(props.max_speed)
            + criteria.power * power_stats.normalized_squared_deviation_from_min(power)
            + criteria.efficiency * efficiency_stats.normalized_squared_deviation_from_min(efficiency)
            + criteria.factory_utilization * utilization
            + jitter_exclusive(rng, randomness, constants.combat_jitter);
        best.offer(id, rating);
    }
    best.id
}

/// Weight of combat power against each mobile target type for a map.
///
/// Static has weight 0. On land maps floater and submerged are 0 as well.
#[must_use]
pub fn determine_combat_power_weights(rates: &AttackedByRates, map: MapType) -> TargetTypeValues {
    let mut weights = TargetTypeValues::default();
    weights.set(
        TargetType::Air,
        0.1 + rates.until_early_phase(map, TargetType::Air),
    );
    weights.set(
        TargetType::Surface,
        1.0 + rates.until_early_phase(map, TargetType::Surface),
    );
    if !map.is_land_map() {
        weights.set(
            TargetType::Floater,
            1.0 + rates.until_early_phase(map, TargetType::Floater),
        );
        weights.set(
            TargetType::Submerged,
            0.75 + rates.until_early_phase(map, TargetType::Submerged),
        );
    }
    weights
}

/// Inputs for ranking factories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactoryRating {
    /// Rated factory.
    pub factory: UnitTypeId,
    /// Average weighted combat power of its combat units.
    pub combat_power_rating: f32,
    /// Can build a builder usable on this map.
    pub can_construct_builder: bool,
    /// Can build a scout usable on this map.
    pub can_construct_scout: bool,
}

fn usable_on_map(movement: MovementType, map: MapType) -> bool {
    if movement.is_sea_unit() {
        !map.is_land_map()
    } else if movement.is_ground() {
        !map.is_water_map()
    } else {
        true
    }
}

/// Rate a factory by what it can build.
#[must_use]
pub fn calculate_factory_rating(
    tree: &BuildTree,
    factory: UnitTypeId,
    weights: &TargetTypeValues,
    map: MapType,
) -> FactoryRating {
    let mut power = TargetTypeValues::default();
    let mut combat_units = 0_u32;
    let mut rating = FactoryRating {
        factory,
        combat_power_rating: 0.0,
        can_construct_builder: false,
        can_construct_scout: false,
    };

    for &unit in tree.can_build(factory) {
        let Some(props) = tree.get(unit) else { continue };
        let unit_power = tree.combat_power(unit);
        let relevant: &[TargetType] = match props.category {
            UnitCategory::GroundCombat => &[TargetType::Surface, TargetType::Air],
            UnitCategory::AirCombat | UnitCategory::HoverCombat => {
                &[TargetType::Surface, TargetType::Air, TargetType::Floater]
            }
            UnitCategory::SeaCombat => &TargetType::MOBILE,
            UnitCategory::SubmarineCombat => &[TargetType::Floater, TargetType::Submerged],
            UnitCategory::MobileConstructor => {
                rating.can_construct_builder |= usable_on_map(props.movement, map);
                continue;
            }
            UnitCategory::Scout => {
                rating.can_construct_scout |= usable_on_map(props.movement, map);
                continue;
            }
            _ => continue,
        };
        for &target in relevant {
            power.accumulate(target, unit_power.get(target));
        }
        combat_units += 1;
    }

    if combat_units > 0 {
        rating.combat_power_rating = power.weighted_sum(weights) / combat_units as f32;
    }
    rating
}

/// Per-type caps on committed producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerCaps {
    /// Cap for mobile builders.
    pub max_builders_per_type: u32,
    /// Cap for factories.
    pub max_factories_per_type: u32,
}

/// Select the builder best suited to construct `building`.
///
/// Build time matters more while few producers of `building` are alive.
/// Builders at their per-type cap are skipped. Unlike the category
/// selectors, any uncapped builder is acceptable: a sole builder type with
/// flat statistics rates 0 and is still selected.
#[must_use]
pub fn select_builder_for(
    registry: &UnitTypeRegistry,
    building: UnitTypeId,
    caps: &ProducerCaps,
    constants: &RatingConstants,
) -> UnitTypeId {
    let tree = registry.tree();
    let builders = tree.constructed_by(building);

    let cost_weight = 1.0;
    let power_weight = 1.0;
    let time_weight = match registry.state(building).constructors_available {
        0 => 2.0,
        1 => 1.0,
        _ => 0.5,
    };

    let props = || builders.iter().filter_map(|&id| tree.get(id));
    let costs = StatisticalProfile::from_values(props().map(|p| p.cost));
    let build_times = StatisticalProfile::from_values(props().map(|p| p.build_time));
    let build_powers = StatisticalProfile::from_values(props().map(|p| p.build_speed));

    let mut best = Best::new(f32::NEG_INFINITY);
    for props in props() {
        if registry.state(props.id).committed() >= caps.max_builders_per_type {
            continue;
        }
        let mut rating = cost_weight * costs.normalized_deviation_from_max(props.cost)
            + time_weight * build_times.normalized_deviation_from_max(props.build_time)
            + power_weight * build_powers.normalized_deviation_from_min(props.build_speed);
        if registry.is_constructable(props.id) {
            rating += constants.constructable_bonus;
        }
        best.offer(props.id, rating);
    }
    best.id
}

/// Share of flat land and water in the base area, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseTerrain {
    /// Flat land share.
    pub flat_land_ratio: f32,
    /// Water share.
    pub water_ratio: f32,
}

/// Select the producer (factory or mobile builder) best suited to build `unit`.
///
/// Static producers are scaled by the base's share of suitable terrain and
/// rejected below the configured threshold.
#[must_use]
pub fn select_factory_for(
    registry: &UnitTypeRegistry,
    unit: UnitTypeId,
    caps: &ProducerCaps,
    terrain: &BaseTerrain,
    constants: &RatingConstants,
) -> UnitTypeId {
    let tree = registry.tree();
    let producers: Vec<_> = tree
        .constructed_by(unit)
        .iter()
        .filter_map(|&id| tree.get(id))
        .collect();

    let max_cost = producers.iter().map(|p| p.cost).fold(0.0_f32, f32::max);
    let max_time = producers.iter().map(|p| p.build_time).fold(0.0_f32, f32::max);
    let max_speed = producers.iter().map(|p| p.build_speed).fold(0.0_f32, f32::max);

    let terrain_factor = |ratio: f32| {
        if ratio > constants.terrain_ratio_threshold {
            Some(ratio)
        } else {
            None
        }
    };

    let mut best = Best::new(constants.terrain_rejection_rating);
    for props in producers {
        if registry.state(props.id).committed() >= caps.max_factories_per_type {
            continue;
        }
        let mut rating = ratio(props.build_speed, max_speed)
            - ratio(props.build_time, max_time)
            - ratio(props.cost, max_cost);
        if registry.is_constructable(props.id) {
            rating += constants.constructable_bonus;
        }
        let factor = if props.movement.is_static_land() {
            Some(terrain_factor(terrain.flat_land_ratio))
        } else if props.movement.is_static_sea() {
            Some(terrain_factor(terrain.water_ratio))
        } else {
            None
        };
        match factor {
            Some(Some(ratio)) => rating *= ratio,
            Some(None) => rating = constants.terrain_rejection_rating,
            None => {}
        }
        best.offer(props.id, rating);
    }
    best.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FactionData;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    const ROSTER: &str = r#"
        FactionData(
            id: 1,
            name: "Arm",
            units: [
                UnitData(id: "commander", category: Commander, movement: "ground", cost: 2000.0, build_time: 50000.0, build_speed: 300.0, tags: ["builder"], build_options: ["solar", "wind", "mex", "armed_mex", "kbot_lab", "tidal"]),
                UnitData(id: "solar", category: PowerPlant, movement: "static_land", cost: 150.0, build_time: 2800.0, primary_ability: 20.0),
                UnitData(id: "wind", category: PowerPlant, movement: "static_land", cost: 50.0, build_time: 1600.0, primary_ability: 10.0),
                UnitData(id: "tidal", category: PowerPlant, movement: "static_sea_floater", cost: 90.0, build_time: 2000.0, primary_ability: 15.0),
                UnitData(id: "mex", category: MetalExtractor, movement: "static_land", cost: 50.0, build_time: 500.0, primary_ability: 1.0),
                UnitData(id: "armed_mex", category: MetalExtractor, movement: "static_land", cost: 80.0, build_time: 900.0, primary_ability: 1.0, tags: ["armed"]),
                UnitData(id: "kbot_lab", category: StaticConstructor, movement: "static_land", cost: 600.0, build_time: 6000.0, build_speed: 100.0, build_options: ["peewee", "hammer"]),
                UnitData(id: "peewee", category: GroundCombat, movement: "ground", cost: 50.0, build_time: 1000.0, max_speed: 3.0, primary_ability: 200.0, combat_power: (2.0, 0.0, 0.0, 0.0, 1.0)),
                UnitData(id: "hammer", category: GroundCombat, movement: "ground", cost: 120.0, build_time: 2000.0, max_speed: 1.5, primary_ability: 600.0, combat_power: (4.0, 0.0, 0.0, 0.0, 5.0)),
            ],
        )
    "#;

    fn registry() -> UnitTypeRegistry {
        let faction = FactionData::from_ron_str(ROSTER).unwrap();
        UnitTypeRegistry::new(Arc::new(BuildTree::from_factions(&[faction]).unwrap()))
    }

    fn id(registry: &UnitTypeRegistry, name: &str) -> UnitTypeId {
        registry.tree().find(FactionId::new(1), name).unwrap()
    }

    const ARM: FactionId = FactionId::new(1);

    #[test]
    fn test_power_plant_prefers_cheap_when_cost_weighted() {
        let registry = registry();
        let criteria = PowerPlantCriteria {
            cost: 1.0,
            build_time: 0.0,
            power: 0.0,
        };
        let selected = select_power_plant(&registry, ARM, &criteria, false, false);
        assert_eq!(selected, id(&registry, "wind"));
    }

    #[test]
    fn test_power_plant_prefers_power_when_power_weighted() {
        let registry = registry();
        let criteria = PowerPlantCriteria {
            cost: 0.0,
            build_time: 0.0,
            power: 1.0,
        };
        let selected = select_power_plant(&registry, ARM, &criteria, false, false);
        assert_eq!(selected, id(&registry, "solar"));
    }

    #[test]
    fn test_power_plant_water_filter() {
        let registry = registry();
        let criteria = PowerPlantCriteria {
            cost: 1.0,
            build_time: 1.0,
            power: 1.0,
        };
        let selected = select_power_plant(&registry, ARM, &criteria, true, false);
        assert_eq!(selected, id(&registry, "tidal"));
    }

    #[test]
    fn test_must_be_constructable_filters_everything_without_producer() {
        let registry = registry();
        let criteria = PowerPlantCriteria {
            cost: 1.0,
            build_time: 1.0,
            power: 1.0,
        };
        assert_eq!(
            select_power_plant(&registry, ARM, &criteria, false, true),
            UnitTypeId::NONE
        );
    }

    #[test]
    fn test_all_zero_ratings_select_none() {
        let registry = registry();
        let criteria = PowerPlantCriteria::default();
        assert_eq!(
            select_power_plant(&registry, ARM, &criteria, false, false),
            UnitTypeId::NONE
        );
    }

    #[test]
    fn test_unknown_faction_selects_none() {
        let registry = registry();
        let criteria = PowerPlantCriteria {
            cost: 1.0,
            build_time: 1.0,
            power: 1.0,
        };
        assert_eq!(
            select_power_plant(&registry, FactionId::new(5), &criteria, false, false),
            UnitTypeId::NONE
        );
    }

    #[test]
    fn test_armed_bonus() {
        let registry = registry();
        let constants = RatingConstants::default();
        let unarmed = ExtractorCriteria {
            cost: 0.1,
            extracted_metal: 1.0,
            armed: false,
        };
        let armed = ExtractorCriteria {
            armed: true,
            ..unarmed
        };
        assert_eq!(
            select_extractor(&registry, ARM, &unarmed, false, false, &constants),
            id(&registry, "mex")
        );
        assert_eq!(
            select_extractor(&registry, ARM, &armed, false, false, &constants),
            id(&registry, "armed_mex")
        );
    }

    #[test]
    fn test_largest_extractor() {
        let registry = registry();
        // Equal footprints: the first registered wins.
        assert_eq!(largest_extractor(registry.tree()), id(&registry, "mex"));
    }

    #[test]
    fn test_combat_unit_requires_utilization() {
        let registry = registry();
        let constants = RatingConstants::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let weights = TargetTypeValues::from_array([1.0, 0.1, 0.0, 0.0, 0.0]);
        let criteria = CombatUnitCriteria {
            cost: 1.0,
            range: 1.0,
            speed: 1.0,
            power: 1.0,
            efficiency: 1.0,
            factory_utilization: 1.0,
        };

        let idle = vec![0.0; registry.tree().factory_count()];
        assert_eq!(
            select_combat_unit(
                &registry,
                ARM,
                TargetType::Surface,
                &weights,
                &criteria,
                &idle,
                4,
                &constants,
                &mut rng
            ),
            UnitTypeId::NONE
        );

        let busy = vec![1.0; registry.tree().factory_count()];
        let selected = select_combat_unit(
            &registry,
            ARM,
            TargetType::Surface,
            &weights,
            &criteria,
            &busy,
            0,
            &constants,
            &mut rng,
        );
        assert!(selected.is_valid());
    }

    #[test]
    fn test_combat_power_weights_land_map() {
        let rates = AttackedByRates::default();
        let weights = determine_combat_power_weights(&rates, MapType::Land);
        assert_eq!(weights.get(TargetType::Surface), 1.0);
        assert_eq!(weights.get(TargetType::Air), 0.1);
        assert_eq!(weights.get(TargetType::Floater), 0.0);

        let weights = determine_combat_power_weights(&rates, MapType::Water);
        assert_eq!(weights.get(TargetType::Submerged), 0.75);
    }

    #[test]
    fn test_factory_rating() {
        let registry = registry();
        let tree = registry.tree();
        let lab = id(&registry, "kbot_lab");
        let weights = TargetTypeValues::from_array([1.0, 0.0, 0.0, 0.0, 0.0]);

        let rating = calculate_factory_rating(tree, lab, &weights, MapType::Land);
        assert_eq!(rating.combat_power_rating, 3.0);
        assert!(!rating.can_construct_builder);
        assert!(!rating.can_construct_scout);
    }

    #[test]
    fn test_builder_cap() {
        let mut registry = registry();
        let solar = id(&registry, "solar");
        let commander = id(&registry, "commander");
        let caps = ProducerCaps {
            max_builders_per_type: 1,
            max_factories_per_type: 1,
        };
        let constants = RatingConstants::default();

        // Single candidate with flat statistics only scores through the bonus.
        registry.constructor_requested(commander);
        registry.constructor_finished(commander);
        registry.unit_spawned(commander);
        assert_eq!(
            select_builder_for(&registry, solar, &caps, &constants),
            UnitTypeId::NONE
        );
    }

    #[test]
    fn test_sole_builder_selected_without_bonus() {
        let registry = registry();
        let caps = ProducerCaps {
            max_builders_per_type: 4,
            max_factories_per_type: 2,
        };
        let selected =
            select_builder_for(&registry, id(&registry, "solar"), &caps, &RatingConstants::default());
        assert_eq!(selected, id(&registry, "commander"));
    }

    #[test]
    fn test_factory_rejected_without_flat_land() {
        let registry = registry();
        let peewee = id(&registry, "peewee");
        let caps = ProducerCaps {
            max_builders_per_type: 4,
            max_factories_per_type: 2,
        };
        let constants = RatingConstants::default();
        let no_land = BaseTerrain {
            flat_land_ratio: 0.05,
            water_ratio: 0.0,
        };
        let land = BaseTerrain {
            flat_land_ratio: 0.9,
            water_ratio: 0.0,
        };

        assert_eq!(
            select_factory_for(&registry, peewee, &caps, &no_land, &constants),
            UnitTypeId::NONE
        );
        assert_eq!(
            select_factory_for(&registry, peewee, &caps, &land, &constants),
            id(&registry, "kbot_lab")
        );
    }
}
