//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::unit_kind::{MovementType, TargetTypeValues, UnitCategory, UnitTypeFlags};

/// Data-driven unit definition, as provided by the host.
///
/// The meaning of `primary_ability` and `secondary_ability` depends on the
/// category:
///
/// | Category            | primary                | secondary              |
/// |---------------------|------------------------|------------------------|
/// | power plant         | energy produced        | -                      |
/// | metal extractor     | metal extracted        | -                      |
/// | storage             | metal capacity         | energy capacity        |
/// | metal maker         | metal produced         | energy consumed        |
/// | static sensor       | radar range            | sonar range            |
/// | defence / artillery | max weapon range       | -                      |
/// | combat / scout      | max weapon range       | line of sight          |
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "light_tank",
///     category: GroundCombat,
///     movement: "ground",
///     cost: 120.0,
///     build_time: 2400.0,
///     max_health: 900.0,
///     max_speed: 2.1,
///     primary_ability: 320.0,
///     tags: ["armed"],
///     combat_power: (4.0, 0.2, 3.0, 0.0, 2.5),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitData {
    /// Unique string identifier for this unit type within its faction.
    pub id: String,

    /// Category this unit belongs to.
    #[serde(default)]
    pub category: UnitCategory,

    /// Movement tag (see [`MovementType::from_tag`]).
    pub movement: String,

    /// Total cost (metal plus energy scaled to metal).
    pub cost: f32,

    /// Build time in build-power units.
    pub build_time: f32,

    /// Maximum health points.
    #[serde(default)]
    pub max_health: f32,

    /// Maximum speed in map units per second.
    #[serde(default)]
    pub max_speed: f32,

    /// Category dependent primary value.
    #[serde(default)]
    pub primary_ability: f32,

    /// Category dependent secondary value.
    #[serde(default)]
    pub secondary_ability: f32,

    /// Seismic detection range.
    #[serde(default)]
    pub seismic_range: f32,

    /// Build power for builders, factories and assisters.
    #[serde(default)]
    pub build_speed: f32,

    /// Maximum distance at which a builder can construct.
    #[serde(default)]
    pub build_distance: f32,

    /// Footprint size in map squares (x, y).
    #[serde(default = "default_footprint")]
    pub footprint: (u8, u8),

    /// Capability tags (e.g., "builder", "armed", "radar").
    #[serde(default)]
    pub tags: Vec<String>,

    /// Default combat power against each target type.
    #[serde(default)]
    pub combat_power: TargetTypeValues,

    /// Unit IDs this unit can construct.
    #[serde(default)]
    pub build_options: Vec<String>,
}

/// Default footprint for units without explicit size.
const fn default_footprint() -> (u8, u8) {
    (2, 2)
}

impl UnitData {
    /// Check if this unit has the specified tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Parsed movement class; unknown tags map to an empty set.
    #[must_use]
    pub fn movement_type(&self) -> MovementType {
        MovementType::from_tag(&self.movement).unwrap_or_else(MovementType::empty)
    }

    /// Parsed capability flags.
    #[must_use]
    pub fn flags(&self) -> UnitTypeFlags {
        UnitTypeFlags::from_tags(&self.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_unit() {
        let unit: UnitData = ron::from_str(
            r#"UnitData(id: "mex", category: MetalExtractor, movement: "static_land", cost: 50.0, build_time: 500.0)"#,
        )
        .unwrap();

        assert_eq!(unit.category, UnitCategory::MetalExtractor);
        assert!(unit.movement_type().is_static_land());
        assert_eq!(unit.footprint, (2, 2));
        assert!(unit.build_options.is_empty());
    }

    #[test]
    fn test_tags_and_flags() {
        let unit: UnitData = ron::from_str(
            r#"UnitData(id: "llt", category: StaticDefence, movement: "static_land", cost: 90.0, build_time: 900.0, tags: ["armed"])"#,
        )
        .unwrap();

        assert!(unit.has_tag("armed"));
        assert!(unit.flags().contains(UnitTypeFlags::ARMED));
        assert!(!unit.has_tag("builder"));
    }

    #[test]
    fn test_unknown_movement_is_empty() {
        let unit: UnitData = ron::from_str(
            r#"UnitData(id: "odd", movement: "teleport", cost: 1.0, build_time: 1.0)"#,
        )
        .unwrap();

        assert_eq!(unit.movement_type(), MovementType::empty());
        assert_eq!(unit.category, UnitCategory::Unknown);
    }
}
