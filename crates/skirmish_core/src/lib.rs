//! # Skirmish Core
//!
//! Decision core of a skirmish RTS agent: which unit types to build, which
//! factory or builder should produce them, and which worker does what.
//!
//! This crate contains **only** decision logic:
//! - No map or pathfinding implementation (asked of the host through [`oracle`])
//! - No system randomness (tie-break jitter comes from a seeded generator)
//! - No rendering, networking or scripting
//!
//! Unit positions use fixed-point math; ratings are plain `f32`.
//!
//! ## Crate Structure
//!
//! - [`unit_kind`] - Unit categories, target types and movement flags
//! - [`statistics`] - Min/max/average profiles over unit attributes
//! - [`registry`] - Static unit tables and per-player counters
//! - [`rating`] - Weighted selection of power plants, defences, combat units and producers
//! - [`construction`] - Build request bookkeeping and factory queues
//! - [`task`] - Worker tasks and the scheduler that drives them
//! - [`air_force`] - Bounded list of bombing targets
//! - [`learning`] / [`knowledge`] - Learned attack rates and their persistence
//! - [`agent`] - Facade that turns host events into calls on the parts above

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod air_force;
pub mod config;
pub mod construction;
pub mod data;
pub mod error;
pub mod factions;
pub mod knowledge;
pub mod learning;
pub mod math;
pub mod oracle;
pub mod rating;
pub mod registry;
pub mod statistics;
pub mod task;
pub mod unit_kind;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::SkirmishAgent;
    pub use crate::air_force::{AirTarget, AirTargetList};
    pub use crate::config::{AiConfig, RatingConstants};
    pub use crate::construction::{ConstructionOrderController, QueueError, QueuePosition};
    pub use crate::error::{AiError, Result};
    pub use crate::factions::FactionId;
    pub use crate::knowledge::SharedKnowledge;
    pub use crate::learning::{GamePhase, MapType};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::oracle::{
        Facing, Host, NoPlanner, Order, OrderSink, TaskPlanner, TerrainOracle, UnitId,
        UnitQuery, UnitSnapshot,
    };
    pub use crate::registry::{BuildTree, UnitTypeProperties, UnitTypeRegistry};
    pub use crate::statistics::StatisticalProfile;
    pub use crate::task::{BuildType, Priority, TaskId, TaskRequest, TaskStore};
    pub use crate::unit_kind::{MovementType, TargetType, UnitCategory, UnitTypeId};
}
