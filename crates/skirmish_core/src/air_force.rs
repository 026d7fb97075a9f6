//! Bounded list of bombing targets.
//!
//! The list never grows past its capacity. A full list rejects new targets;
//! the caller decides whether that matters.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::math::Vec2Fixed;
use crate::oracle::{TerrainOracle, UnitId, UnitSnapshot};
use crate::unit_kind::UnitTypeId;

/// An enemy unit worth bombing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirTarget {
    /// Handle of the enemy unit.
    pub unit: UnitId,
    /// Its type.
    pub unit_type: UnitTypeId,
    /// Position when spotted.
    pub position: Vec2Fixed,
    /// Cost of its type.
    pub cost: f32,
    /// Health when last seen.
    pub health: f32,
    /// Maximum health of its type.
    pub max_health: f32,
}

impl AirTarget {
    /// Build a target from a sighting.
    #[must_use]
    pub fn from_snapshot(snapshot: &UnitSnapshot, cost: f32) -> Self {
        Self {
            unit: snapshot.id,
            unit_type: snapshot.unit_type,
            position: snapshot.position,
            cost,
            health: snapshot.health,
            max_health: snapshot.max_health,
        }
    }

    /// `cost^e / (1 + air_power × danger) × max_health / health`.
    ///
    /// Damaged targets rate higher.
    #[must_use]
    pub fn rating(&self, cost_exponent: f32, danger: f32, enemy_air_power: f32) -> f32 {
        let health_rating = self.max_health / self.health.max(1.0);
        self.cost.powf(cost_exponent) / (1.0 + enemy_air_power * danger) * health_rating
    }
}

/// Fixed-capacity slot array of bombing targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirTargetList {
    slots: Vec<Option<AirTarget>>,
    count: usize,
}

impl AirTargetList {
    /// An empty list with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            count: 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no target is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether every slot is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count >= self.slots.len()
    }

    /// Stored targets in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &AirTarget> {
        self.slots.iter().flatten()
    }

    /// Whether `unit` is on the list.
    #[must_use]
    pub fn is_target(&self, unit: UnitId) -> bool {
        self.iter().any(|t| t.unit == unit)
    }

    /// Add a sighted enemy unless the list is full, the unit is ours,
    /// already listed, or off the map.
    pub fn check_bomb_target<T: TerrainOracle + ?Sized>(
        &mut self,
        snapshot: &UnitSnapshot,
        cost: f32,
        terrain: &T,
    ) -> bool {
        if self.is_full() || snapshot.owned || self.is_target(snapshot.id) {
            return false;
        }
        if !terrain.is_on_map(snapshot.position) {
            return false;
        }
        self.add_target(AirTarget::from_snapshot(snapshot, cost))
    }

    /// Store a target in the first free slot. Returns false if full.
    pub fn add_target(&mut self, target: AirTarget) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) else {
            trace!(unit = target.unit.0, "Air target list full");
            return false;
        };
        *slot = Some(target);
        self.count += 1;
        debug!(unit = target.unit.0, targets = self.count, "Air target added");
        true
    }

    /// Drop `unit` from the list.
    pub fn remove_target(&mut self, unit: UnitId) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.is_some_and(|t| t.unit == unit))
        else {
            return false;
        };
        *slot = None;
        self.count -= 1;
        debug!(unit = unit.0, targets = self.count, "Air target removed");
        true
    }

    /// Record new health of a listed target.
    pub fn update_health(&mut self, unit: UnitId, health: f32) {
        if let Some(target) = self.slots.iter_mut().flatten().find(|t| t.unit == unit) {
            target.health = health;
        }
    }

    /// Take the highest rated target off the list.
    ///
    /// `enemy_air_power` reports the anti-air threat at a position. Only
    /// ratings strictly above zero qualify; ties keep the earlier slot.
    pub fn best_target<F>(
        &mut self,
        cost_exponent: f32,
        danger: f32,
        enemy_air_power: F,
    ) -> Option<AirTarget>
    where
        F: Fn(Vec2Fixed) -> f32,
    {
        let mut best: Option<(usize, f32)> = None;
        for (i, target) in self.slots.iter().enumerate() {
            let Some(target) = target else {
                continue;
            };
            let rating = target.rating(cost_exponent, danger, enemy_air_power(target.position));
            if rating > best.map_or(0.0, |(_, r)| r) {
                best = Some((i, rating));
            }
        }
        let (index, _) = best?;
        let target = self.slots[index].take()?;
        self.count -= 1;
        Some(target)
    }
}

/// Number of air groups to send against a unit with `health`.
#[must_use]
pub fn groups_for_health(health: f32) -> u32 {
    if health > 8000.0 {
        3
    } else if health > 4000.0 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::oracle::Facing;
    use crate::unit_kind::MovementType;

    struct Map;

    impl TerrainOracle for Map {
        fn map_size(&self) -> Vec2Fixed {
            Vec2Fixed::from_ints(1000, 1000)
        }
        fn find_build_site(&self, _: UnitTypeId, _: Vec2Fixed, _: Fixed, _: Facing) -> Option<Vec2Fixed> {
            None
        }
        fn estimate_path_length(&self, _: Vec2Fixed, _: Vec2Fixed, _: MovementType, _: Fixed) -> Fixed {
            Fixed::ZERO
        }
        fn is_buildable_at(&self, _: UnitTypeId, _: Vec2Fixed, _: Facing) -> bool {
            false
        }
        fn add_blocker(&mut self, _: UnitTypeId, _: Vec2Fixed, _: Facing) {}
        fn remove_blocker(&mut self, _: UnitTypeId, _: Vec2Fixed, _: Facing) {}
    }

    fn enemy(id: u32, x: i32, health: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            unit_type: UnitTypeId::new(3),
            position: Vec2Fixed::from_ints(x, 500),
            health,
            max_health: 1000.0,
            being_built: false,
            owned: false,
        }
    }

    #[test]
    fn test_check_bomb_target_filters() {
        let mut list = AirTargetList::new(4);
        let mut own = enemy(1, 100, 1000.0);
        own.owned = true;

        assert!(!list.check_bomb_target(&own, 100.0, &Map));
        assert!(!list.check_bomb_target(&enemy(2, 5000, 1000.0), 100.0, &Map));
        assert!(list.check_bomb_target(&enemy(3, 100, 1000.0), 100.0, &Map));
        assert!(!list.check_bomb_target(&enemy(3, 100, 1000.0), 100.0, &Map));
        assert_eq!(list.len(), 1);
        assert!(list.is_target(UnitId::new(3)));
    }

    #[test]
    fn test_full_list_rejects() {
        let mut list = AirTargetList::new(2);
        assert!(list.check_bomb_target(&enemy(1, 100, 1000.0), 100.0, &Map));
        assert!(list.check_bomb_target(&enemy(2, 200, 1000.0), 100.0, &Map));
        assert!(!list.check_bomb_target(&enemy(3, 300, 1000.0), 100.0, &Map));
        assert_eq!(list.len(), 2);
        assert!(list.is_full());
    }

    #[test]
    fn test_remove_frees_slot() {
        let mut list = AirTargetList::new(1);
        list.check_bomb_target(&enemy(1, 100, 1000.0), 100.0, &Map);
        assert!(list.remove_target(UnitId::new(1)));
        assert!(!list.remove_target(UnitId::new(1)));
        assert!(list.check_bomb_target(&enemy(2, 100, 1000.0), 100.0, &Map));
    }

    #[test]
    fn test_best_target_prefers_damaged_and_unguarded() {
        let mut list = AirTargetList::new(4);
        list.check_bomb_target(&enemy(1, 100, 1000.0), 100.0, &Map);
        list.check_bomb_target(&enemy(2, 200, 250.0), 100.0, &Map);
        list.check_bomb_target(&enemy(3, 900, 100.0), 100.0, &Map);

        // Heavy anti-air on the right half of the map.
        let threat = |p: Vec2Fixed| if p.x > Fixed::from_num(500) { 100.0 } else { 0.0 };
        let best = list.best_target(1.0, 1.0, threat).unwrap();

        assert_eq!(best.unit, UnitId::new(2));
        assert!(!list.is_target(UnitId::new(2)));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_best_target_on_empty_list() {
        let mut list = AirTargetList::new(3);
        assert_eq!(list.best_target(1.0, 1.0, |_| 0.0), None);
    }

    #[test]
    fn test_groups_for_health() {
        assert_eq!(groups_for_health(4000.0), 1);
        assert_eq!(groups_for_health(4001.0), 2);
        assert_eq!(groups_for_health(8000.0), 2);
        assert_eq!(groups_for_health(8001.0), 3);
    }
}
