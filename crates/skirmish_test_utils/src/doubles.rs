//! Scripted stand-ins for the host simulation and the task planner.

use std::collections::{BTreeMap, VecDeque};

use skirmish_core::math::{Fixed, Vec2Fixed};
use skirmish_core::oracle::{
    Facing, Order, OrderSink, TaskPlanner, TerrainOracle, UnitId, UnitQuery, UnitSnapshot,
};
use skirmish_core::task::TaskRequest;
use skirmish_core::unit_kind::{MovementType, UnitTypeId};

use crate::fixtures;

/// Open square map that records every order.
///
/// Build sites are searched by stepping east from the requested spot past
/// blocked or unbuildable positions. Path estimates are straight-line
/// distance times `path_factor`, or unknown when the factor is zero.
#[derive(Debug, Clone)]
pub struct FakeWorld {
    /// Live units.
    pub units: BTreeMap<UnitId, UnitSnapshot>,
    /// Every order issued, in order.
    pub orders: Vec<(UnitId, Order)>,
    /// Sites reserved through the oracle.
    pub blockers: Vec<Vec2Fixed>,
    /// Spots that can never be built on.
    pub unbuildable: Vec<Vec2Fixed>,
    /// Edge length of the map.
    pub size: i32,
    /// Multiplier on straight-line distance for path estimates.
    pub path_factor: Fixed,
    /// Fail every site search.
    pub no_sites: bool,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl FakeWorld {
    /// An empty square map.
    #[must_use]
    pub fn new(size: i32) -> Self {
        Self {
            units: BTreeMap::new(),
            orders: Vec::new(),
            blockers: Vec::new(),
            unbuildable: Vec::new(),
            size,
            path_factor: Fixed::ZERO,
            no_sites: false,
        }
    }

    fn insert(&mut self, id: u32, unit_type: UnitTypeId, x: i32, y: i32, owned: bool) -> UnitId {
        let unit = UnitId::new(id);
        let max_health = fixtures::tree().get(unit_type).map_or(100.0, |p| p.max_health);
        self.units.insert(
            unit,
            UnitSnapshot {
                id: unit,
                unit_type,
                position: fixtures::pos(x, y),
                health: max_health,
                max_health,
                being_built: false,
                owned,
            },
        );
        unit
    }

    /// Add a finished unit of ours at full health.
    pub fn spawn(&mut self, id: u32, unit_type: UnitTypeId, x: i32, y: i32) -> UnitId {
        self.insert(id, unit_type, x, y, true)
    }

    /// Add an enemy unit at full health.
    pub fn spawn_enemy(&mut self, id: u32, unit_type: UnitTypeId, x: i32, y: i32) -> UnitId {
        self.insert(id, unit_type, x, y, false)
    }

    /// Add one of our units that has just started construction.
    pub fn begin_construction(&mut self, id: u32, unit_type: UnitTypeId, x: i32, y: i32) -> UnitId {
        let unit = self.insert(id, unit_type, x, y, true);
        if let Some(snapshot) = self.units.get_mut(&unit) {
            snapshot.being_built = true;
            snapshot.health = 1.0;
        }
        unit
    }

    /// Finish construction of `unit`.
    pub fn finish(&mut self, unit: UnitId) {
        if let Some(snapshot) = self.units.get_mut(&unit) {
            snapshot.being_built = false;
            snapshot.health = snapshot.max_health;
        }
    }

    /// Set the health of `unit`.
    pub fn set_health(&mut self, unit: UnitId, health: f32) {
        if let Some(snapshot) = self.units.get_mut(&unit) {
            snapshot.health = health;
        }
    }

    /// Remove `unit` and return its last snapshot.
    pub fn kill(&mut self, unit: UnitId) -> Option<UnitSnapshot> {
        self.units.remove(&unit)
    }

    /// Most recent order given to `unit`.
    #[must_use]
    pub fn last_order(&self, unit: UnitId) -> Option<Order> {
        self.orders
            .iter()
            .rev()
            .find(|(u, _)| *u == unit)
            .map(|(_, o)| *o)
    }

    /// Every order given to `unit`, oldest first.
    #[must_use]
    pub fn orders_for(&self, unit: UnitId) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|(u, _)| *u == unit)
            .map(|(_, o)| *o)
            .collect()
    }
}

impl TerrainOracle for FakeWorld {
    fn map_size(&self) -> Vec2Fixed {
        fixtures::pos(self.size, self.size)
    }

    fn find_build_site(
        &self,
        _unit_type: UnitTypeId,
        near: Vec2Fixed,
        radius: Fixed,
        _facing: Facing,
    ) -> Option<Vec2Fixed> {
        if self.no_sites {
            return None;
        }
        let mut site = near;
        while self.blockers.contains(&site) || self.unbuildable.contains(&site) {
            site.x += Fixed::from_num(64);
            if site.distance(near) > radius {
                return None;
            }
        }
        Some(site)
    }

    fn estimate_path_length(
        &self,
        from: Vec2Fixed,
        to: Vec2Fixed,
        _movement: MovementType,
        _clearance: Fixed,
    ) -> Fixed {
        from.distance(to).saturating_mul(self.path_factor)
    }

    fn is_buildable_at(&self, _unit_type: UnitTypeId, position: Vec2Fixed, _facing: Facing) -> bool {
        !self.unbuildable.contains(&position)
    }

    fn add_blocker(&mut self, _unit_type: UnitTypeId, position: Vec2Fixed, _facing: Facing) {
        self.blockers.push(position);
    }

    fn remove_blocker(&mut self, _unit_type: UnitTypeId, position: Vec2Fixed, _facing: Facing) {
        if let Some(i) = self.blockers.iter().position(|b| *b == position) {
            self.blockers.remove(i);
        }
    }
}

impl UnitQuery for FakeWorld {
    fn unit(&self, id: UnitId) -> Option<UnitSnapshot> {
        self.units.get(&id).copied()
    }

    fn friendly_units_in(&self, center: Vec2Fixed, radius: Fixed) -> Vec<UnitSnapshot> {
        let mut found: Vec<_> = self
            .units
            .values()
            .filter(|u| u.owned && u.position.distance(center) <= radius)
            .copied()
            .collect();
        found.sort_by_key(|u| (u.position.distance_squared(center), u.id));
        found
    }
}

impl OrderSink for FakeWorld {
    fn issue(&mut self, unit: UnitId, order: Order) -> bool {
        if !self.units.contains_key(&unit) {
            return false;
        }
        self.orders.push((unit, order));
        true
    }
}

/// Planner that hands out a fixed script of requests, one per call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlanner {
    script: VecDeque<TaskRequest>,
    /// Workers that asked for work, oldest first.
    pub asked: Vec<UnitId>,
}

impl ScriptedPlanner {
    /// Planner that returns `requests` in order, then nothing.
    #[must_use]
    pub fn new(requests: impl IntoIterator<Item = TaskRequest>) -> Self {
        Self {
            script: requests.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Requests not handed out yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl TaskPlanner for ScriptedPlanner {
    fn plan_task(&mut self, worker: UnitId, _: UnitTypeId, _: Vec2Fixed) -> Option<TaskRequest> {
        self.asked.push(worker);
        self.script.pop_front()
    }
}
