//! Interfaces to the host simulation.
//!
//! The core never touches the game directly. Everything it needs from the
//! outside world comes through these traits:
//!
//! - [`TerrainOracle`]: build sites, path lengths, occupancy markers
//! - [`UnitQuery`]: read-only view of live units
//! - [`OrderSink`]: fire-and-forget unit orders
//! - [`TaskPlanner`]: the economy/military layer that invents work on demand
//!
//! Tests drive the core through scripted implementations of these traits.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::task::TaskRequest;
use crate::unit_kind::{MovementType, UnitTypeId};

/// Handle of a live unit in the host simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a unit handle.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Building orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// No preference.
    #[default]
    Any,
    /// Facing south.
    South,
    /// Facing east.
    East,
    /// Facing north.
    North,
    /// Facing west.
    West,
}

impl Facing {
    /// Face toward the map center along the dominant axis.
    #[must_use]
    pub fn toward_center(position: Vec2Fixed, map_size: Vec2Fixed) -> Self {
        let two = Fixed::from_num(2);
        let dx = (map_size.x - two * position.x).abs();
        let dy = (map_size.y - two * position.y).abs();
        if dx > dy {
            if two * position.x > map_size.x {
                Self::West
            } else {
                Self::East
            }
        } else if two * position.y > map_size.y {
            Self::North
        } else {
            Self::South
        }
    }
}

/// Step `distance` from `position` toward the map center on both axes.
#[must_use]
pub fn step_toward_center(position: Vec2Fixed, map_size: Vec2Fixed, distance: Fixed) -> Vec2Fixed {
    let two = Fixed::from_num(2);
    let step = |value: Fixed, size: Fixed| {
        if two * value > size {
            value - distance
        } else {
            value + distance
        }
    };
    Vec2Fixed::new(step(position.x, map_size.x), step(position.y, map_size.y))
}

/// Terrain and pathing queries.
pub trait TerrainOracle {
    /// Size of the playable area.
    fn map_size(&self) -> Vec2Fixed;

    /// Search a site for `unit_type` within `radius` of `near`.
    fn find_build_site(
        &self,
        unit_type: UnitTypeId,
        near: Vec2Fixed,
        radius: Fixed,
        facing: Facing,
    ) -> Option<Vec2Fixed>;

    /// Approximate path length. Non-positive means unknown.
    fn estimate_path_length(
        &self,
        from: Vec2Fixed,
        to: Vec2Fixed,
        movement: MovementType,
        clearance: Fixed,
    ) -> Fixed;

    /// Whether `unit_type` can be placed at `position` right now. A blocker
    /// added by the core at exactly this spot does not count against it.
    fn is_buildable_at(&self, unit_type: UnitTypeId, position: Vec2Fixed, facing: Facing) -> bool;

    /// Mark a planned site as occupied.
    fn add_blocker(&mut self, unit_type: UnitTypeId, position: Vec2Fixed, facing: Facing);

    /// Release a planned site.
    fn remove_blocker(&mut self, unit_type: UnitTypeId, position: Vec2Fixed, facing: Facing);

    /// Whether a position lies inside the map.
    fn is_on_map(&self, position: Vec2Fixed) -> bool {
        let size = self.map_size();
        position.x >= Fixed::ZERO
            && position.y >= Fixed::ZERO
            && position.x <= size.x
            && position.y <= size.y
    }
}

/// What the core can see of a live unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSnapshot {
    /// Handle.
    pub id: UnitId,
    /// Type.
    pub unit_type: UnitTypeId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Still under construction.
    pub being_built: bool,
    /// Belongs to this agent.
    pub owned: bool,
}

impl UnitSnapshot {
    /// Health still missing.
    #[must_use]
    pub fn missing_health(&self) -> f32 {
        (self.max_health - self.health).max(0.0)
    }

    /// Whether the unit is below full health.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }
}

/// Read-only view of live units.
pub trait UnitQuery {
    /// Look up a unit. `None` once it no longer exists.
    fn unit(&self, id: UnitId) -> Option<UnitSnapshot>;

    /// Friendly units within `radius` of `center`, nearest first.
    fn friendly_units_in(&self, center: Vec2Fixed, radius: Fixed) -> Vec<UnitSnapshot>;
}

/// A unit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Construct a unit at a position.
    Build {
        /// Type to construct.
        unit_type: UnitTypeId,
        /// Site.
        position: Vec2Fixed,
        /// Orientation.
        facing: Facing,
    },
    /// Repair or continue construction of a unit.
    Repair(UnitId),
    /// Assist another constructor.
    Guard(UnitId),
    /// Reclaim everything in an area.
    ReclaimArea {
        /// Center of the area.
        center: Vec2Fixed,
        /// Radius of the area.
        #[serde(with = "crate::math::fixed_serde")]
        radius: Fixed,
    },
    /// Move to a position.
    MoveTo(Vec2Fixed),
    /// Patrol between current position and target.
    PatrolTo(Vec2Fixed),
    /// Stop all actions.
    Stop,
}

/// Outbound orders. Fire-and-forget.
pub trait OrderSink {
    /// Issue an order. Returns whether the host accepted it.
    fn issue(&mut self, unit: UnitId, order: Order) -> bool;

    /// Issue the same order to several units.
    fn issue_all(&mut self, units: &[UnitId], order: Order) {
        for &unit in units {
            self.issue(unit, order);
        }
    }
}

/// Everything the core consumes from the host, as one object.
pub trait Host: TerrainOracle + UnitQuery + OrderSink {}

impl<T: TerrainOracle + UnitQuery + OrderSink> Host for T {}

/// Economy or military layer that creates tasks on demand.
pub trait TaskPlanner {
    /// Work for a worker no open task fits. `None` leaves it idle.
    fn plan_task(&mut self, worker: UnitId, worker_type: UnitTypeId, position: Vec2Fixed)
        -> Option<TaskRequest>;
}

/// A planner that never has work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlanner;

impl TaskPlanner for NoPlanner {
    fn plan_task(&mut self, _: UnitId, _: UnitTypeId, _: Vec2Fixed) -> Option<TaskRequest> {
        None
    }
}
