//! Turning selections into construction orders.
//!
//! [`ConstructionOrderController`] owns one agent's [`UnitTypeRegistry`]
//! counters and the per-factory [`BuildQueue`]s. It is the only writer of
//! the counters: every lifecycle transition reported by the host goes
//! through one of its `unit_*` handlers.
//!
//! Producer requests recurse: a building without a builder requests a
//! builder, a builder without a factory requests a factory, and so on. The
//! chain is cut when it revisits a type or exceeds the configured depth. A
//! request that cannot be placed restores every counter and queue to the
//! state before the attempt.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AiConfig, RatingConstants};
use crate::factions::FactionId;
use crate::rating::{
    self, ArtilleryCriteria, BaseTerrain, CombatUnitCriteria, ExtractorCriteria,
    MetalMakerCriteria, PowerPlantCriteria, ProducerCaps, ScoutCriteria, SensorCriteria,
    StaticDefenceCriteria, StorageCriteria,
};
use crate::registry::{BuildTree, RegistrySnapshot, UnitTypeRegistry};
use crate::unit_kind::{TargetType, TargetTypeValues, UnitTypeId};

/// Error type for build queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("Build queue full ({0} items)")]
    Full(usize),
    /// No factory able to build the unit exists or is on order.
    #[error("No factory available for unit type {0}")]
    NoFactory(u16),
}

/// Where a new item goes in a build queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuePosition {
    /// Build next.
    Front,
    /// Build after the current head.
    Second,
    /// Build last.
    Back,
}

/// Bounded queue of unit types waiting for one factory type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildQueue {
    items: VecDeque<UnitTypeId>,
    capacity: usize,
}

impl BuildQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Insert an item.
    ///
    /// # Errors
    /// Returns [`QueueError::Full`] at capacity.
    pub fn insert(&mut self, unit_type: UnitTypeId, position: QueuePosition) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full(self.capacity));
        }
        match position {
            QueuePosition::Front => self.items.push_front(unit_type),
            QueuePosition::Second if !self.items.is_empty() => self.items.insert(1, unit_type),
            QueuePosition::Second | QueuePosition::Back => self.items.push_back(unit_type),
        }
        Ok(())
    }

    /// Next item to build, without removing it.
    #[must_use]
    pub fn front(&self) -> Option<UnitTypeId> {
        self.items.front().copied()
    }

    /// Remove and return the next item.
    pub fn pop_front(&mut self) -> Option<UnitTypeId> {
        self.items.pop_front()
    }

    /// Queued items, next first.
    pub fn iter(&self) -> impl Iterator<Item = UnitTypeId> + '_ {
        self.items.iter().copied()
    }

    fn drain(&mut self) -> Vec<UnitTypeId> {
        self.items.drain(..).collect()
    }
}

/// When a two-phase selection requests a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProducerPolicy {
    /// No producer alive and none on order.
    WhenNoProducer,
    /// No producer alive. A producer is only requested if none is on order.
    WhenNotConstructable,
}

#[derive(Debug, Clone)]
struct ControllerSnapshot {
    registry: RegistrySnapshot,
    queues: Vec<BuildQueue>,
    factory_requests: VecDeque<UnitTypeId>,
    future_builders: u32,
    future_factories: u32,
}

/// One agent's construction bookkeeping.
#[derive(Debug, Clone)]
pub struct ConstructionOrderController {
    registry: UnitTypeRegistry,
    faction: FactionId,
    queues: Vec<BuildQueue>,
    factory_requests: VecDeque<UnitTypeId>,
    future_builders: u32,
    future_factories: u32,
    terrain: BaseTerrain,
    caps: ProducerCaps,
    constants: RatingConstants,
}

impl ConstructionOrderController {
    /// Create a controller with zeroed counters.
    #[must_use]
    pub fn new(tree: Arc<BuildTree>, faction: FactionId, config: &AiConfig) -> Self {
        let queues = vec![BuildQueue::new(config.max_buildqueue_size); tree.factory_count()];
        Self {
            registry: UnitTypeRegistry::new(tree),
            faction,
            queues,
            factory_requests: VecDeque::new(),
            future_builders: 0,
            future_factories: 0,
            terrain: BaseTerrain::default(),
            caps: ProducerCaps {
                max_builders_per_type: config.max_builders_per_type,
                max_factories_per_type: config.max_factories_per_type,
            },
            constants: config.rating.clone(),
        }
    }

    /// Read-only view of the counters.
    #[must_use]
    pub fn registry(&self) -> &UnitTypeRegistry {
        &self.registry
    }

    /// The shared unit tables.
    #[must_use]
    pub fn tree(&self) -> &BuildTree {
        self.registry.tree()
    }

    /// Faction this controller builds for.
    #[must_use]
    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// Rating constants in use.
    #[must_use]
    pub fn constants(&self) -> &RatingConstants {
        &self.constants
    }

    /// Update the terrain ratios of the base area.
    pub fn set_base_terrain(&mut self, terrain: BaseTerrain) {
        self.terrain = terrain;
    }

    /// Terrain ratios of the base area.
    #[must_use]
    pub fn base_terrain(&self) -> BaseTerrain {
        self.terrain
    }

    /// Mobile builders ordered but not finished.
    #[must_use]
    pub fn future_builders(&self) -> u32 {
        self.future_builders
    }

    /// Static producers ordered but not finished.
    #[must_use]
    pub fn future_factories(&self) -> u32 {
        self.future_factories
    }

    /// Build queue of a factory type.
    #[must_use]
    pub fn queue(&self, factory: UnitTypeId) -> Option<&BuildQueue> {
        self.tree()
            .factory_index(factory)
            .and_then(|index| self.queues.get(index))
    }

    /// Static producers waiting for a builder to be assigned, oldest first.
    pub fn pending_factories(&self) -> impl Iterator<Item = UnitTypeId> + '_ {
        self.factory_requests.iter().copied()
    }

    /// Take the oldest static producer waiting for a builder.
    pub fn next_factory_request(&mut self) -> Option<UnitTypeId> {
        self.factory_requests.pop_front()
    }

    /// Take the next unit a factory of type `factory` should build.
    pub fn take_next(&mut self, factory: UnitTypeId) -> Option<UnitTypeId> {
        let index = self.tree().factory_index(factory)?;
        self.queues.get_mut(index).and_then(BuildQueue::pop_front)
    }

    /// Put `unit_type` in the shortest queue of a factory type able to
    /// build it, and count it as requested.
    ///
    /// Only factory types with at least one instance alive, under
    /// construction or on order are considered.
    ///
    /// # Errors
    /// [`QueueError::NoFactory`] if no such factory exists,
    /// [`QueueError::Full`] if all their queues are full.
    pub fn add_unit_to_buildqueue(
        &mut self,
        unit_type: UnitTypeId,
        position: QueuePosition,
    ) -> Result<UnitTypeId, QueueError> {
        let mut chosen: Option<(UnitTypeId, usize)> = None;
        let mut any_factory = false;
        for &factory in self.registry.tree().constructed_by(unit_type) {
            let Some(index) = self.registry.tree().factory_index(factory) else {
                continue;
            };
            if self.registry.state(factory).committed() == 0 {
                continue;
            }
            any_factory = true;
            let queue = &self.queues[index];
            if queue.is_full() {
                continue;
            }
            if chosen.map_or(true, |(_, best)| queue.len() < self.queues[best].len()) {
                chosen = Some((factory, index));
            }
        }

        let Some((factory, index)) = chosen else {
            return Err(if any_factory {
                QueueError::Full(self.queues.first().map_or(0, |q| q.capacity))
            } else {
                QueueError::NoFactory(unit_type.as_u16())
            });
        };
        self.queues[index].insert(unit_type, position)?;
        self.unit_requested(unit_type);
        debug!(
            unit_type = unit_type.as_u16(),
            factory = factory.as_u16(),
            ?position,
            "Unit queued"
        );
        Ok(factory)
    }

    fn save(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            registry: self.registry.snapshot(),
            queues: self.queues.clone(),
            factory_requests: self.factory_requests.clone(),
            future_builders: self.future_builders,
            future_factories: self.future_factories,
        }
    }

    fn restore(&mut self, snapshot: ControllerSnapshot) {
        self.registry.restore(snapshot.registry);
        self.queues = snapshot.queues;
        self.factory_requests = snapshot.factory_requests;
        self.future_builders = snapshot.future_builders;
        self.future_factories = snapshot.future_factories;
    }

    fn chain_allows(&self, unit_type: UnitTypeId, chain: &[UnitTypeId]) -> bool {
        if chain.contains(&unit_type) {
            warn!(unit_type = unit_type.as_u16(), "Producer request cycle cut");
            return false;
        }
        if chain.len() >= usize::from(self.constants.max_request_depth) {
            warn!(
                unit_type = unit_type.as_u16(),
                depth = chain.len(),
                "Producer request depth exceeded"
            );
            return false;
        }
        true
    }

    /// Make sure a builder for `building` exists or is on its way.
    ///
    /// Returns the selected builder type, or [`UnitTypeId::NONE`] if no
    /// builder could be selected or ordered. On failure no counter changes.
    pub fn request_builder_for(&mut self, building: UnitTypeId) -> UnitTypeId {
        self.request_builder(building, &mut Vec::new())
    }

    fn request_builder(&mut self, building: UnitTypeId, chain: &mut Vec<UnitTypeId>) -> UnitTypeId {
        if !self.chain_allows(building, chain) {
            return UnitTypeId::NONE;
        }
        let builder =
            rating::select_builder_for(&self.registry, building, &self.caps, &self.constants);
        if !builder.is_valid() {
            return UnitTypeId::NONE;
        }
        let state = self.registry.state(builder);
        if state.under_construction + state.requested > 0 {
            return builder;
        }

        let saved = self.save();
        chain.push(building);
        if !self.registry.has_producer(builder) {
            self.build_factory(builder, chain);
        }
        let position = if state.active > 1 {
            QueuePosition::Second
        } else {
            QueuePosition::Front
        };
        let queued = self.add_unit_to_buildqueue(builder, position);
        chain.pop();

        match queued {
            Ok(_) => {
                info!(
                    building = building.as_u16(),
                    builder = builder.as_u16(),
                    "Builder requested"
                );
                builder
            }
            Err(e) => {
                debug!(builder = builder.as_u16(), error = %e, "Builder request rolled back");
                self.restore(saved);
                UnitTypeId::NONE
            }
        }
    }

    /// Make sure a producer (factory or mobile builder) for `unit` exists
    /// or is on its way.
    ///
    /// Static producers are added to [`pending_factories`](Self::pending_factories)
    /// and a builder is requested for them if needed. Mobile producers are
    /// queued at a factory. Returns the selected producer or
    /// [`UnitTypeId::NONE`]; on failure no counter changes.
    pub fn build_factory_for(&mut self, unit: UnitTypeId) -> UnitTypeId {
        self.build_factory(unit, &mut Vec::new())
    }

    fn build_factory(&mut self, unit: UnitTypeId, chain: &mut Vec<UnitTypeId>) -> UnitTypeId {
        if !self.chain_allows(unit, chain) {
            return UnitTypeId::NONE;
        }
        let producer = rating::select_factory_for(
            &self.registry,
            unit,
            &self.caps,
            &self.terrain,
            &self.constants,
        );
        let Some(props) = self.registry.tree().get(producer) else {
            return UnitTypeId::NONE;
        };
        let is_static = props.movement.is_static();
        let state = self.registry.state(producer);
        if state.requested + state.under_construction > 0 {
            return producer;
        }

        let saved = self.save();
        chain.push(unit);
        let placed = if is_static {
            self.unit_requested(producer);
            self.factory_requests.push_back(producer);
            if !self.registry.has_producer(producer) {
                self.request_builder(producer, chain);
            }
            true
        } else {
            if !self.registry.has_producer(producer) {
                self.build_factory(producer, chain);
            }
            let position = if state.active > 0 {
                QueuePosition::Second
            } else {
                QueuePosition::Front
            };
            self.add_unit_to_buildqueue(producer, position).is_ok()
        };
        chain.pop();

        if placed {
            info!(
                unit_type = unit.as_u16(),
                producer = producer.as_u16(),
                is_static,
                "Producer requested"
            );
            producer
        } else {
            debug!(producer = producer.as_u16(), "Producer request rolled back");
            self.restore(saved);
            UnitTypeId::NONE
        }
    }

    fn two_phase<F>(&mut self, policy: ProducerPolicy, mut select: F) -> UnitTypeId
    where
        F: FnMut(&UnitTypeRegistry, bool) -> UnitTypeId,
    {
        let selected = select(&self.registry, false);
        if !selected.is_valid() {
            return selected;
        }
        let state = self.registry.state(selected);
        let request = match policy {
            ProducerPolicy::WhenNoProducer => {
                state.constructors_available + state.constructors_requested == 0
            }
            ProducerPolicy::WhenNotConstructable => state.constructors_available == 0,
        };
        if !request {
            return selected;
        }
        if state.constructors_requested == 0 {
            self.request_builder_for(selected);
        }
        select(&self.registry, true)
    }

    /// Select a power plant, requesting a builder if none can build it.
    pub fn select_power_plant(&mut self, criteria: &PowerPlantCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        self.two_phase(ProducerPolicy::WhenNoProducer, |registry, constructable| {
            rating::select_power_plant(registry, faction, criteria, water, constructable)
        })
    }

    /// Select a metal extractor, requesting a builder if none can build it.
    pub fn select_extractor(&mut self, criteria: &ExtractorCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        let constants = self.constants.clone();
        self.two_phase(ProducerPolicy::WhenNoProducer, |registry, constructable| {
            rating::select_extractor(registry, faction, criteria, water, constructable, &constants)
        })
    }

    /// Select a storage, requesting a builder if none is alive.
    pub fn select_storage(&mut self, criteria: &StorageCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        self.two_phase(ProducerPolicy::WhenNotConstructable, |registry, constructable| {
            rating::select_storage(registry, faction, criteria, water, constructable)
        })
    }

    /// Select a metal maker, requesting a builder if none is alive.
    pub fn select_metal_maker(&mut self, criteria: &MetalMakerCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        self.two_phase(ProducerPolicy::WhenNotConstructable, |registry, constructable| {
            rating::select_metal_maker(registry, faction, criteria, water, constructable)
        })
    }

    /// Select a static defence, requesting a builder if none is alive.
    pub fn select_static_defence<R: Rng + ?Sized>(
        &mut self,
        criteria: &StaticDefenceCriteria,
        water: bool,
        rng: &mut R,
    ) -> UnitTypeId {
        let faction = self.faction;
        let constants = self.constants.clone();
        self.two_phase(ProducerPolicy::WhenNotConstructable, |registry, constructable| {
            rating::select_static_defence(
                registry,
                faction,
                criteria,
                water,
                constructable,
                &constants,
                &mut *rng,
            )
        })
    }

    /// Select a radar, requesting a builder if none is alive.
    pub fn select_radar(&mut self, criteria: &SensorCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        self.two_phase(ProducerPolicy::WhenNotConstructable, |registry, constructable| {
            rating::select_radar(registry, faction, criteria, water, constructable)
        })
    }

    /// Select a sonar, requesting a builder if none is alive.
    pub fn select_sonar(&mut self, criteria: &SensorCriteria, water: bool) -> UnitTypeId {
        let faction = self.faction;
        self.two_phase(ProducerPolicy::WhenNotConstructable, |registry, constructable| {
            rating::select_sonar(registry, faction, criteria, water, constructable)
        })
    }

    /// Select a static artillery. Never requests a builder.
    #[must_use]
    pub fn select_static_artillery(&self, criteria: &ArtilleryCriteria, water: bool) -> UnitTypeId {
        rating::select_static_artillery(&self.registry, self.faction, criteria, water)
    }

    /// Select a scout.
    pub fn select_scout<R: Rng + ?Sized>(&self, criteria: &ScoutCriteria, rng: &mut R) -> UnitTypeId {
        rating::select_scout(&self.registry, self.faction, criteria, &self.constants, rng)
    }

    /// Select a mobile combat unit.
    pub fn select_combat_unit<R: Rng + ?Sized>(
        &self,
        target_type: TargetType,
        combat_power_weights: &TargetTypeValues,
        criteria: &CombatUnitCriteria,
        factory_utilization: &[f32],
        randomness: u32,
        rng: &mut R,
    ) -> UnitTypeId {
        rating::select_combat_unit(
            &self.registry,
            self.faction,
            target_type,
            combat_power_weights,
            criteria,
            factory_utilization,
            randomness,
            &self.constants,
            rng,
        )
    }

    fn is_producer(&self, unit_type: UnitTypeId) -> bool {
        !self.tree().can_build(unit_type).is_empty()
    }

    fn adjust_future(&mut self, unit_type: UnitTypeId, increase: bool) {
        let Some(props) = self.registry.tree().get(unit_type) else {
            return;
        };
        let counter = if props.is_factory() {
            &mut self.future_factories
        } else if props.is_builder() {
            &mut self.future_builders
        } else {
            return;
        };
        *counter = if increase {
            counter.saturating_add(1)
        } else {
            counter.saturating_sub(1)
        };
    }

    /// An order for `unit_type` was placed.
    pub fn unit_requested(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_requested(unit_type);
        if self.is_producer(unit_type) {
            self.registry.constructor_requested(unit_type);
        }
        self.adjust_future(unit_type, true);
    }

    /// An order for `unit_type` was dropped before construction began.
    pub fn unit_request_failed(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_request_failed(unit_type);
        if self.is_producer(unit_type) {
            self.registry.unfinished_constructor_killed(unit_type);
        }
        self.adjust_future(unit_type, false);
    }

    /// Construction of an ordered `unit_type` began.
    pub fn unit_created(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_under_construction(unit_type);
    }

    /// Construction of `unit_type` finished.
    pub fn unit_finished(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_finished(unit_type);
        if self.is_producer(unit_type) {
            self.registry.constructor_finished(unit_type);
        }
        self.adjust_future(unit_type, false);
    }

    /// A unit that starts the game already built appeared.
    pub fn unit_spawned(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_spawned(unit_type);
        if self.is_producer(unit_type) {
            self.registry.constructor_requested(unit_type);
            self.registry.constructor_finished(unit_type);
        }
    }

    /// A `unit_type` under construction was destroyed.
    pub fn unit_under_construction_killed(&mut self, unit_type: UnitTypeId) {
        self.registry.unit_under_construction_killed(unit_type);
        if self.is_producer(unit_type) {
            self.registry.unfinished_constructor_killed(unit_type);
        }
        self.adjust_future(unit_type, false);
    }

    /// A finished `unit_type` was destroyed.
    ///
    /// When the last factory of a type dies, its queued orders are dropped.
    pub fn active_unit_killed(&mut self, unit_type: UnitTypeId) {
        self.registry.active_unit_killed(unit_type);
        if self.is_producer(unit_type) {
            self.registry.constructor_killed(unit_type);
        }
        if self.registry.state(unit_type).committed() > 0 {
            return;
        }
        let Some(index) = self.tree().factory_index(unit_type) else {
            return;
        };
        let orphaned = self.queues[index].drain();
        if !orphaned.is_empty() {
            warn!(
                factory = unit_type.as_u16(),
                dropped = orphaned.len(),
                "Last factory lost, dropping its queue"
            );
        }
        for queued in orphaned {
            self.unit_request_failed(queued);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FactionData;
    use crate::registry::UnitTypeDynamicState;

    const ROSTER: &str = r#"
        FactionData(
            id: 1,
            name: "Arm",
            units: [
                UnitData(id: "commander", category: Commander, movement: "ground", cost: 2000.0, build_time: 50000.0, build_speed: 300.0, tags: ["builder"], build_options: ["solar", "kbot_lab"]),
                UnitData(id: "solar", category: PowerPlant, movement: "static_land", cost: 150.0, build_time: 2800.0, primary_ability: 20.0),
                UnitData(id: "fusion", category: PowerPlant, movement: "static_land", cost: 4000.0, build_time: 70000.0, primary_ability: 1000.0),
                UnitData(id: "kbot_lab", category: StaticConstructor, movement: "static_land", cost: 600.0, build_time: 6000.0, build_speed: 100.0, build_options: ["con_kbot", "peewee"]),
                UnitData(id: "con_kbot", category: MobileConstructor, movement: "ground", cost: 120.0, build_time: 3000.0, build_speed: 80.0, tags: ["builder"], build_options: ["solar", "fusion"]),
                UnitData(id: "peewee", category: GroundCombat, movement: "ground", cost: 50.0, build_time: 1000.0, primary_ability: 200.0),
            ],
            starting_units: ["commander"],
        )
    "#;

    const ARM: FactionId = FactionId::new(1);

    fn controller() -> ConstructionOrderController {
        let faction = FactionData::from_ron_str(ROSTER).unwrap();
        let tree = Arc::new(BuildTree::from_factions(&[faction]).unwrap());
        let mut controller = ConstructionOrderController::new(tree, ARM, &AiConfig::default());
        controller.set_base_terrain(BaseTerrain {
            flat_land_ratio: 0.8,
            water_ratio: 0.0,
        });
        controller
    }

    fn id(controller: &ConstructionOrderController, name: &str) -> UnitTypeId {
        controller.tree().find(ARM, name).unwrap()
    }

    #[test]
    fn test_queue_positions() {
        let mut queue = BuildQueue::new(3);
        let (a, b, c) = (UnitTypeId::new(1), UnitTypeId::new(2), UnitTypeId::new(3));

        queue.insert(a, QueuePosition::Second).unwrap();
        queue.insert(b, QueuePosition::Front).unwrap();
        queue.insert(c, QueuePosition::Second).unwrap();

        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![b, c, a]);
        assert_eq!(queue.insert(a, QueuePosition::Back), Err(QueueError::Full(3)));
        assert_eq!(queue.pop_front(), Some(b));
    }

    #[test]
    fn test_queue_without_factory_fails() {
        let mut controller = controller();
        let peewee = id(&controller, "peewee");
        let result = controller.add_unit_to_buildqueue(peewee, QueuePosition::Back);
        assert_eq!(result, Err(QueueError::NoFactory(peewee.as_u16())));
        assert_eq!(controller.registry().state(peewee).requested, 0);
    }

    #[test]
    fn test_builder_request_chains_to_factory() {
        let mut controller = controller();
        let commander = id(&controller, "commander");
        let fusion = id(&controller, "fusion");
        let lab = id(&controller, "kbot_lab");
        let con_kbot = id(&controller, "con_kbot");
        controller.unit_spawned(commander);

        // Only the constructor kbot builds fusion; it needs a lab first.
        let builder = controller.request_builder_for(fusion);

        assert_eq!(builder, con_kbot);
        assert_eq!(controller.pending_factories().collect::<Vec<_>>(), vec![lab]);
        assert_eq!(controller.registry().state(lab).requested, 1);
        assert_eq!(controller.registry().state(con_kbot).requested, 1);
        assert_eq!(controller.registry().state(fusion).constructors_requested, 1);
        assert_eq!(controller.queue(lab).unwrap().front(), Some(con_kbot));
        assert_eq!(controller.future_builders(), 1);
        assert_eq!(controller.future_factories(), 1);
    }

    #[test]
    fn test_failed_request_rolls_back_exactly() {
        let mut controller = controller();
        let fusion = id(&controller, "fusion");
        // No flat land: the lab is rejected, so the constructor kbot has
        // nowhere to be queued.
        controller.set_base_terrain(BaseTerrain::default());
        let before = controller.registry().snapshot();

        let builder = controller.request_builder_for(fusion);

        assert_eq!(builder, UnitTypeId::NONE);
        assert_eq!(controller.registry().snapshot(), before);
        assert_eq!(controller.pending_factories().count(), 0);
        assert_eq!(controller.future_builders(), 0);
    }

    #[test]
    fn test_two_phase_requests_builder() {
        let mut controller = controller();
        let commander = id(&controller, "commander");
        let con_kbot = id(&controller, "con_kbot");
        controller.unit_spawned(commander);

        let criteria = PowerPlantCriteria {
            cost: 0.1,
            build_time: 0.0,
            power: 1.0,
        };
        let selected = controller.select_power_plant(&criteria, false);

        // Fusion has no producer, so a builder is requested and the
        // constructable solar is returned.
        assert_eq!(selected, id(&controller, "solar"));
        assert_eq!(controller.registry().state(con_kbot).requested, 1);
    }

    #[test]
    fn test_lifecycle_round_trip() {
        let mut controller = controller();
        let commander = id(&controller, "commander");
        let lab = id(&controller, "kbot_lab");
        let peewee = id(&controller, "peewee");
        controller.unit_spawned(commander);

        controller.unit_requested(lab);
        assert_eq!(controller.registry().state(peewee).constructors_requested, 1);
        controller.unit_created(lab);
        controller.unit_finished(lab);
        assert_eq!(controller.registry().state(peewee).constructors_available, 1);
        assert_eq!(controller.future_factories(), 0);

        controller.add_unit_to_buildqueue(peewee, QueuePosition::Back).unwrap();
        controller.active_unit_killed(lab);

        assert!(controller.queue(lab).unwrap().is_empty());
        assert_eq!(controller.registry().state(peewee), UnitTypeDynamicState::default());
    }

    #[test]
    fn test_mutual_producers_terminate() {
        let roster = r#"
            FactionData(
                id: 1,
                name: "Loop",
                units: [
                    UnitData(id: "egg", category: StaticConstructor, movement: "static_land", cost: 10.0, build_time: 10.0, build_speed: 1.0, build_options: ["hen"]),
                    UnitData(id: "hen", category: MobileConstructor, movement: "ground", cost: 10.0, build_time: 10.0, build_speed: 1.0, tags: ["builder"], build_options: ["egg"]),
                ],
            )
        "#;
        let faction = FactionData::from_ron_str(roster).unwrap();
        let tree = Arc::new(BuildTree::from_factions(&[faction]).unwrap());
        let mut controller = ConstructionOrderController::new(tree, ARM, &AiConfig::default());
        controller.set_base_terrain(BaseTerrain {
            flat_land_ratio: 1.0,
            water_ratio: 0.0,
        });
        let hen = controller.tree().find(ARM, "hen").unwrap();

        // Terminates; the egg is listed even though nothing can build it yet.
        let producer = controller.build_factory_for(hen);
        assert!(producer.is_valid());
        assert!(controller.pending_factories().count() <= 1);
    }
}
