//! Unit type tables and per-type construction counters.
//!
//! The registry is split in two:
//! - [`BuildTree`]: immutable after load, shared by every agent of the
//!   process behind an `Arc`. Unit properties, producer relations,
//!   category lists, statistics and combat power.
//! - [`UnitTypeRegistry`]: one per agent. Wraps the shared tree and owns the
//!   mutable [`UnitTypeDynamicState`] counters.
//!
//! Counters never go negative. A decrement of a zero counter indicates a
//! lifecycle-tracking bug upstream; it is clamped and logged.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::FactionData;
use crate::error::{AiError, Result};
use crate::factions::FactionId;
use crate::statistics::{StatisticsSource, UnitStatistics};
use crate::unit_kind::{
    MovementType, TargetType, TargetTypeValues, UnitCategory, UnitTypeFlags, UnitTypeId,
};

/// Immutable properties of a unit type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitTypeProperties {
    /// Numeric ID.
    pub id: UnitTypeId,
    /// String ID from the roster.
    pub name: String,
    /// Owning faction.
    pub faction: FactionId,
    /// Category.
    pub category: UnitCategory,
    /// Movement class.
    pub movement: MovementType,
    /// Capability flags.
    pub flags: UnitTypeFlags,
    /// Target type of this unit.
    pub target_type: TargetType,
    /// Total cost.
    pub cost: f32,
    /// Build time.
    pub build_time: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Maximum speed.
    pub max_speed: f32,
    /// Category dependent primary value.
    pub primary_ability: f32,
    /// Category dependent secondary value.
    pub secondary_ability: f32,
    /// Seismic detection range.
    pub seismic_range: f32,
    /// Build power.
    pub build_speed: f32,
    /// Construction distance.
    pub build_distance: f32,
    /// Footprint in map squares.
    pub footprint: (u8, u8),
}

impl UnitTypeProperties {
    /// Whether this type can construct other units while mobile.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        self.flags.contains(UnitTypeFlags::BUILDER) || self.category.is_mobile_constructor()
    }

    /// Whether this type is a factory.
    #[must_use]
    pub fn is_factory(&self) -> bool {
        self.category.is_static_constructor() || self.flags.contains(UnitTypeFlags::FACTORY)
    }

    /// Whether this type can assist construction.
    #[must_use]
    pub fn is_assister(&self) -> bool {
        self.flags.contains(UnitTypeFlags::ASSISTER)
    }

    /// Footprint area in map squares.
    #[must_use]
    pub fn footprint_area(&self) -> u32 {
        u32::from(self.footprint.0) * u32::from(self.footprint.1)
    }
}

/// Process-wide, immutable unit tables.
///
/// ID 0 is a dummy entry so that [`UnitTypeId::NONE`] indexes safely.
/// Within each faction, IDs follow roster order; that order is the
/// tie-break of every selection scan.
#[derive(Debug, Clone)]
pub struct BuildTree {
    properties: Vec<UnitTypeProperties>,
    can_build: Vec<Vec<UnitTypeId>>,
    constructed_by: Vec<Vec<UnitTypeId>>,
    combat_power: Vec<TargetTypeValues>,
    /// `[faction][category]`.
    units_in_category: Vec<Vec<Vec<UnitTypeId>>>,
    /// `[faction][mobile target type]`.
    combat_units: Vec<Vec<Vec<UnitTypeId>>>,
    statistics: Vec<UnitStatistics>,
    factory_index: HashMap<UnitTypeId, usize>,
    start_units: Vec<UnitTypeId>,
    by_name: HashMap<(FactionId, String), UnitTypeId>,
}

impl BuildTree {
    /// Build the tables from faction rosters.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::RosterParse`] if a build option names a unit that
    /// does not exist in the same faction, or if there are more units than
    /// IDs.
    pub fn from_factions(factions: &[FactionData]) -> Result<Self> {
        let faction_slots = factions
            .iter()
            .map(|f| f.id.index() + 1)
            .max()
            .unwrap_or(1);

        let mut properties = vec![UnitTypeProperties::default()];
        let mut combat_power = vec![TargetTypeValues::default()];
        let mut by_name = HashMap::new();
        let mut registered = Vec::new();

        for faction in factions {
            for unit in &faction.units {
                let id = u16::try_from(properties.len())
                    .map(UnitTypeId::new)
                    .map_err(|_| AiError::RosterParse {
                        path: faction.name.clone(),
                        message: "too many unit types".to_string(),
                    })?;
                let movement = unit.movement_type();
                properties.push(UnitTypeProperties {
                    id,
                    name: unit.id.clone(),
                    faction: faction.id,
                    category: unit.category,
                    movement,
                    flags: unit.flags(),
                    target_type: movement.target_type(),
                    cost: unit.cost,
                    build_time: unit.build_time,
                    max_health: unit.max_health,
                    max_speed: unit.max_speed,
                    primary_ability: unit.primary_ability,
                    secondary_ability: unit.secondary_ability,
                    seismic_range: unit.seismic_range,
                    build_speed: unit.build_speed,
                    build_distance: unit.build_distance,
                    footprint: unit.footprint,
                });
                combat_power.push(unit.combat_power);
                by_name.entry((faction.id, unit.id.clone())).or_insert(id);
                registered.push((id, faction, unit));
            }
        }

        let mut can_build = vec![Vec::new(); properties.len()];
        let mut constructed_by = vec![Vec::new(); properties.len()];
        for (producer, faction, unit) in registered {
            for option in &unit.build_options {
                let target = by_name
                    .get(&(faction.id, option.clone()))
                    .copied()
                    .ok_or_else(|| AiError::RosterParse {
                        path: faction.name.clone(),
                        message: format!("'{}' builds unknown unit '{option}'", unit.id),
                    })?;
                can_build[producer.index()].push(target);
                constructed_by[target.index()].push(producer);
            }
        }

        let mut units_in_category =
            vec![vec![Vec::new(); UnitCategory::COUNT]; faction_slots];
        let mut combat_units = vec![vec![Vec::new(); TargetType::MOBILE.len()]; faction_slots];
        let mut factory_index = HashMap::new();
        for props in properties.iter().skip(1) {
            let faction = props.faction.index();
            units_in_category[faction][props.category.index()].push(props.id);
            if props.category.is_combat_unit() && props.target_type != TargetType::Static {
                combat_units[faction][props.target_type.index()].push(props.id);
            }
            if props.is_factory() {
                let next = factory_index.len();
                factory_index.insert(props.id, next);
            }
        }

        let start_units = factions
            .iter()
            .flat_map(|f| {
                f.starting_units
                    .iter()
                    .filter_map(|name| by_name.get(&(f.id, name.clone())).copied())
            })
            .collect();

        let mut tree = Self {
            properties,
            can_build,
            constructed_by,
            combat_power,
            units_in_category,
            combat_units,
            statistics: Vec::new(),
            factory_index,
            start_units,
            by_name,
        };
        tree.statistics = (0..faction_slots)
            .map(|f| UnitStatistics::build(&tree, &tree.units_in_category[f], &tree.combat_units[f]))
            .collect();

        Ok(tree)
    }

    /// Replace the combat power table with learned values.
    ///
    /// Ignored unless the table has exactly one entry per unit type.
    #[must_use]
    pub fn with_combat_power(mut self, table: Vec<TargetTypeValues>) -> Self {
        if table.len() == self.combat_power.len() {
            self.combat_power = table;
        } else {
            warn!(
                expected = self.combat_power.len(),
                got = table.len(),
                "Ignoring combat power table of wrong size"
            );
        }
        self
    }

    /// Properties of a unit type.
    #[inline]
    #[must_use]
    pub fn get(&self, id: UnitTypeId) -> Option<&UnitTypeProperties> {
        if !id.is_valid() {
            return None;
        }
        self.properties.get(id.index())
    }

    /// Find a unit by faction and roster name.
    #[must_use]
    pub fn find(&self, faction: FactionId, name: &str) -> Option<UnitTypeId> {
        self.by_name.get(&(faction, name.to_string())).copied()
    }

    /// Number of table entries including the dummy at index 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no unit types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.len() <= 1
    }

    /// All registered unit types, in ID order.
    pub fn all(&self) -> impl Iterator<Item = &UnitTypeProperties> {
        self.properties.iter().skip(1)
    }

    /// Number of per-faction slots (highest faction index + 1).
    #[must_use]
    pub fn faction_slots(&self) -> usize {
        self.units_in_category.len()
    }

    /// Units of a category for a faction, in registration order.
    #[must_use]
    pub fn units_in_category(&self, category: UnitCategory, faction: FactionId) -> &[UnitTypeId] {
        self.units_in_category
            .get(faction.index())
            .map_or(&[][..], |cats| cats[category.index()].as_slice())
    }

    /// Combat units of a mobile target type for a faction.
    #[must_use]
    pub fn combat_units(&self, target: TargetType, faction: FactionId) -> &[UnitTypeId] {
        self.combat_units
            .get(faction.index())
            .and_then(|targets| targets.get(target.index()))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Types this unit can construct.
    #[must_use]
    pub fn can_build(&self, id: UnitTypeId) -> &[UnitTypeId] {
        self.can_build.get(id.index()).map_or(&[][..], Vec::as_slice)
    }

    /// Types able to construct this unit.
    #[must_use]
    pub fn constructed_by(&self, id: UnitTypeId) -> &[UnitTypeId] {
        self.constructed_by
            .get(id.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Combat power of a unit type against each target type.
    #[must_use]
    pub fn combat_power(&self, id: UnitTypeId) -> TargetTypeValues {
        self.combat_power
            .get(id.index())
            .copied()
            .unwrap_or_default()
    }

    /// The full combat power table, indexed by unit type.
    #[must_use]
    pub fn combat_power_table(&self) -> &[TargetTypeValues] {
        &self.combat_power
    }

    /// Statistics of a faction.
    #[must_use]
    pub fn statistics(&self, faction: FactionId) -> Option<&UnitStatistics> {
        self.statistics.get(faction.index())
    }

    /// Sequential factory index for utilization tables.
    #[must_use]
    pub fn factory_index(&self, id: UnitTypeId) -> Option<usize> {
        self.factory_index.get(&id).copied()
    }

    /// Number of factory types.
    #[must_use]
    pub fn factory_count(&self) -> usize {
        self.factory_index.len()
    }

    /// Units players start with.
    #[must_use]
    pub fn start_units(&self) -> &[UnitTypeId] {
        &self.start_units
    }
}

impl StatisticsSource for BuildTree {
    fn category(&self, id: UnitTypeId) -> UnitCategory {
        self.get(id).map_or(UnitCategory::Unknown, |p| p.category)
    }

    fn cost(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.cost)
    }

    fn build_time(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.build_time)
    }

    fn primary_ability(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.primary_ability)
    }

    fn secondary_ability(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.secondary_ability)
    }

    fn seismic_range(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.seismic_range)
    }

    fn max_speed(&self, id: UnitTypeId) -> f32 {
        self.get(id).map_or(0.0, |p| p.max_speed)
    }

    fn flags(&self, id: UnitTypeId) -> UnitTypeFlags {
        self.get(id).map_or(UnitTypeFlags::empty(), |p| p.flags)
    }
}

/// Mutable per-type counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTypeDynamicState {
    /// Built and alive.
    pub active: u32,
    /// Ordered, construction not begun.
    pub requested: u32,
    /// Construction started.
    pub under_construction: u32,
    /// Producer types of this type currently alive.
    pub constructors_available: u32,
    /// Producer types of this type ordered but not finished.
    pub constructors_requested: u32,
}

impl UnitTypeDynamicState {
    /// `active + requested + under_construction`.
    #[must_use]
    pub fn committed(&self) -> u32 {
        self.active + self.requested + self.under_construction
    }
}

/// Per-category totals of the lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Built and alive.
    pub active: u32,
    /// Ordered, construction not begun.
    pub requested: u32,
    /// Construction started.
    pub under_construction: u32,
}

/// Saved counters for exact rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    dynamic: Vec<UnitTypeDynamicState>,
    categories: Vec<CategoryCount>,
}

fn increment(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

fn decrement(counter: &mut u32, id: UnitTypeId, name: &'static str) {
    if *counter == 0 {
        warn!(unit_type = id.as_u16(), counter = name, "Counter underflow clamped at 0");
    } else {
        *counter -= 1;
    }
}

/// One agent's view of the unit tables: shared tree plus own counters.
#[derive(Debug, Clone)]
pub struct UnitTypeRegistry {
    tree: Arc<BuildTree>,
    dynamic: Vec<UnitTypeDynamicState>,
    categories: Vec<CategoryCount>,
}

impl UnitTypeRegistry {
    /// Create counters for every type of `tree`, all zero.
    #[must_use]
    pub fn new(tree: Arc<BuildTree>) -> Self {
        let dynamic = vec![UnitTypeDynamicState::default(); tree.len()];
        Self {
            tree,
            dynamic,
            categories: vec![CategoryCount::default(); UnitCategory::COUNT],
        }
    }

    /// The shared tables.
    #[must_use]
    pub fn tree(&self) -> &BuildTree {
        &self.tree
    }

    /// A new handle to the shared tables.
    #[must_use]
    pub fn shared_tree(&self) -> Arc<BuildTree> {
        Arc::clone(&self.tree)
    }

    /// Counters of a type (zeros for unknown IDs).
    #[must_use]
    pub fn state(&self, id: UnitTypeId) -> UnitTypeDynamicState {
        self.dynamic.get(id.index()).copied().unwrap_or_default()
    }

    /// Totals of a category.
    #[must_use]
    pub fn category_count(&self, category: UnitCategory) -> CategoryCount {
        self.categories[category.index()]
    }

    /// Whether at least one producer of this type is alive.
    #[must_use]
    pub fn is_constructable(&self, id: UnitTypeId) -> bool {
        self.state(id).constructors_available > 0
    }

    /// Whether a producer of this type is alive or on order.
    #[must_use]
    pub fn has_producer(&self, id: UnitTypeId) -> bool {
        let state = self.state(id);
        state.constructors_available + state.constructors_requested > 0
    }

    /// Save all counters.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            dynamic: self.dynamic.clone(),
            categories: self.categories.clone(),
        }
    }

    /// Restore counters saved by [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.dynamic = snapshot.dynamic;
        self.categories = snapshot.categories;
    }

    fn with_state<F>(&mut self, id: UnitTypeId, f: F)
    where
        F: FnOnce(&mut UnitTypeDynamicState, &mut CategoryCount),
    {
        if !id.is_valid() {
            return;
        }
        let category = self.tree.get(id).map_or(UnitCategory::Unknown, |p| p.category);
        if let Some(state) = self.dynamic.get_mut(id.index()) {
            f(state, &mut self.categories[category.index()]);
        }
    }

    /// A unit of this type was ordered.
    pub fn unit_requested(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            increment(&mut s.requested);
            increment(&mut c.requested);
        });
    }

    /// An order for this type could not be placed.
    pub fn unit_request_failed(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            decrement(&mut s.requested, id, "requested");
            decrement(&mut c.requested, id, "category.requested");
        });
    }

    /// Construction of an ordered unit began.
    pub fn unit_under_construction(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            decrement(&mut s.requested, id, "requested");
            decrement(&mut c.requested, id, "category.requested");
            increment(&mut s.under_construction);
            increment(&mut c.under_construction);
        });
    }

    /// Construction finished.
    pub fn unit_finished(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            decrement(&mut s.under_construction, id, "under_construction");
            decrement(&mut c.under_construction, id, "category.under_construction");
            increment(&mut s.active);
            increment(&mut c.active);
        });
    }

    /// A unit appeared already built (starting units).
    pub fn unit_spawned(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            increment(&mut s.active);
            increment(&mut c.active);
        });
    }

    /// A unit was destroyed before construction finished.
    pub fn unit_under_construction_killed(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            decrement(&mut s.under_construction, id, "under_construction");
            decrement(&mut c.under_construction, id, "category.under_construction");
        });
    }

    /// A finished unit was destroyed.
    pub fn active_unit_killed(&mut self, id: UnitTypeId) {
        self.with_state(id, |s, c| {
            decrement(&mut s.active, id, "active");
            decrement(&mut c.active, id, "category.active");
        });
    }

    fn for_each_buildable<F>(&mut self, producer: UnitTypeId, mut f: F)
    where
        F: FnMut(&mut UnitTypeDynamicState, UnitTypeId),
    {
        let tree = Arc::clone(&self.tree);
        for &target in tree.can_build(producer) {
            if let Some(state) = self.dynamic.get_mut(target.index()) {
                f(state, target);
            }
        }
    }

    /// A producer of this type was ordered.
    pub fn constructor_requested(&mut self, producer: UnitTypeId) {
        self.for_each_buildable(producer, |s, _| increment(&mut s.constructors_requested));
    }

    /// A producer of this type finished construction.
    pub fn constructor_finished(&mut self, producer: UnitTypeId) {
        self.for_each_buildable(producer, |s, id| {
            increment(&mut s.constructors_available);
            decrement(&mut s.constructors_requested, id, "constructors_requested");
        });
    }

    /// A finished producer of this type was destroyed.
    pub fn constructor_killed(&mut self, producer: UnitTypeId) {
        self.for_each_buildable(producer, |s, id| {
            decrement(&mut s.constructors_available, id, "constructors_available");
        });
    }

    /// A producer of this type was destroyed or cancelled before finishing.
    pub fn unfinished_constructor_killed(&mut self, producer: UnitTypeId) {
        self.for_each_buildable(producer, |s, id| {
            decrement(&mut s.constructors_requested, id, "constructors_requested");
        });
    }
}
