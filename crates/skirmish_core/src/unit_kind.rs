//! Unit type identity and classification.
//!
//! This module provides the vocabulary every other module speaks:
//! - [`UnitTypeId`]: numeric handle into the unit tables
//! - [`UnitCategory`]: mutually exclusive classification of a unit type
//! - [`TargetType`] / [`TargetTypeValues`]: what a unit is and what it can hit
//! - [`MovementType`] / [`UnitTypeFlags`]: bitflags for fast queries
//!
//! Flags are computed once from the RON `tags` array at load time and
//! cached per unit, so selection scans never touch strings.

use serde::{Deserialize, Serialize};

/// Numeric identifier for a unit type.
///
/// Index into the unit tables. `0` is the sentinel "no unit type" and is
/// what every selector returns when nothing qualifies.
///
/// # Example
///
/// ```
/// use skirmish_core::unit_kind::UnitTypeId;
///
/// let id = UnitTypeId::new(42);
/// assert_eq!(id.as_u16(), 42);
/// assert!(!UnitTypeId::NONE.is_valid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct UnitTypeId(u16);

impl UnitTypeId {
    /// Sentinel value indicating no unit type.
    pub const NONE: Self = Self(0);

    /// Create a new unit type ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Index into per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a valid ID (not NONE).
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Mutually exclusive classification of a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Not classified; ignored by every selector.
    #[default]
    Unknown,
    /// Static defence (turrets, torpedo launchers).
    StaticDefence,
    /// Long range static artillery.
    StaticArtillery,
    /// Metal/energy storage.
    Storage,
    /// Factory.
    StaticConstructor,
    /// Static assister (nano tower) or other support building.
    StaticSupport,
    /// Radar, sonar, seismic or jammer building.
    StaticSensor,
    /// Energy production building.
    PowerPlant,
    /// Metal extractor.
    MetalExtractor,
    /// Energy-to-metal converter.
    MetalMaker,
    /// Starting unit.
    Commander,
    /// Ground combat unit.
    GroundCombat,
    /// Air combat unit.
    AirCombat,
    /// Hover combat unit.
    HoverCombat,
    /// Surface ship.
    SeaCombat,
    /// Submarine.
    SubmarineCombat,
    /// Mobile artillery.
    MobileArtillery,
    /// Scout.
    Scout,
    /// Transport.
    Transport,
    /// Mobile builder.
    MobileConstructor,
    /// Mobile support (radar vehicle, jammer, ...).
    MobileSupport,
}

impl UnitCategory {
    /// Number of categories.
    pub const COUNT: usize = 21;

    /// Every category in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Unknown,
        Self::StaticDefence,
        Self::StaticArtillery,
        Self::Storage,
        Self::StaticConstructor,
        Self::StaticSupport,
        Self::StaticSensor,
        Self::PowerPlant,
        Self::MetalExtractor,
        Self::MetalMaker,
        Self::Commander,
        Self::GroundCombat,
        Self::AirCombat,
        Self::HoverCombat,
        Self::SeaCombat,
        Self::SubmarineCombat,
        Self::MobileArtillery,
        Self::Scout,
        Self::Transport,
        Self::MobileConstructor,
        Self::MobileSupport,
    ];

    /// Index into per-category tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether units of this category never move.
    #[must_use]
    pub const fn is_building(self) -> bool {
        matches!(
            self,
            Self::StaticDefence
                | Self::StaticArtillery
                | Self::Storage
                | Self::StaticConstructor
                | Self::StaticSupport
                | Self::StaticSensor
                | Self::PowerPlant
                | Self::MetalExtractor
                | Self::MetalMaker
        )
    }

    /// Whether this is a factory.
    #[must_use]
    pub const fn is_static_constructor(self) -> bool {
        matches!(self, Self::StaticConstructor)
    }

    /// Whether this is a mobile builder (including the commander).
    #[must_use]
    pub const fn is_mobile_constructor(self) -> bool {
        matches!(self, Self::MobileConstructor | Self::Commander)
    }

    /// Whether this is a mobile combat category.
    #[must_use]
    pub const fn is_combat_unit(self) -> bool {
        matches!(
            self,
            Self::GroundCombat
                | Self::AirCombat
                | Self::HoverCombat
                | Self::SeaCombat
                | Self::SubmarineCombat
                | Self::MobileArtillery
        )
    }
}

/// What a unit is, seen from a weapon's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetType {
    /// Ground and hover units.
    #[default]
    Surface,
    /// Aircraft.
    Air,
    /// Ships.
    Floater,
    /// Submarines.
    Submerged,
    /// Buildings.
    Static,
}

impl TargetType {
    /// Number of target types.
    pub const COUNT: usize = 5;

    /// Every target type.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Surface,
        Self::Air,
        Self::Floater,
        Self::Submerged,
        Self::Static,
    ];

    /// Target types of units that can move.
    pub const MOBILE: [Self; 4] = [Self::Surface, Self::Air, Self::Floater, Self::Submerged];

    /// Index into per-target-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value per [`TargetType`].
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTypeValues([f32; TargetType::COUNT]);

impl TargetTypeValues {
    /// All values set to `value`.
    #[must_use]
    pub const fn splat(value: f32) -> Self {
        Self([value; TargetType::COUNT])
    }

    /// Build from explicit values in [`TargetType::ALL`] order.
    #[must_use]
    pub const fn from_array(values: [f32; TargetType::COUNT]) -> Self {
        Self(values)
    }

    /// Value for a target type.
    #[must_use]
    pub fn get(&self, target: TargetType) -> f32 {
        self.0[target.index()]
    }

    /// Overwrite the value for a target type.
    pub fn set(&mut self, target: TargetType, value: f32) {
        self.0[target.index()] = value;
    }

    /// Add to the value for a target type.
    pub fn accumulate(&mut self, target: TargetType, value: f32) {
        self.0[target.index()] += value;
    }

    /// Sum of `self[t] * weights[t]` over all target types.
    #[must_use]
    pub fn weighted_sum(&self, weights: &Self) -> f32 {
        self.0.iter().zip(weights.0.iter()).map(|(v, w)| v * w).sum()
    }

    /// Sum of all values.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }
}

/// Movement class bitflags.
///
/// # Example
///
/// ```
/// use skirmish_core::unit_kind::MovementType;
///
/// let sea = MovementType::SEA_FLOATER | MovementType::SEA_SUBMERGED;
/// assert!(MovementType::SEA_FLOATER.is_included_in(sea));
/// assert!(!MovementType::GROUND.is_included_in(sea));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MovementType(u16);

impl MovementType {
    /// Moves on land only.
    pub const GROUND: Self = Self(1 << 0);
    /// Moves on land and sea floor.
    pub const AMPHIBIOUS: Self = Self(1 << 1);
    /// Hovers over land and water.
    pub const HOVER: Self = Self(1 << 2);
    /// Ship.
    pub const SEA_FLOATER: Self = Self(1 << 3);
    /// Submarine.
    pub const SEA_SUBMERGED: Self = Self(1 << 4);
    /// Aircraft.
    pub const AIR: Self = Self(1 << 5);
    /// Building on land.
    pub const STATIC_LAND: Self = Self(1 << 6);
    /// Building floating on water.
    pub const STATIC_SEA_FLOATER: Self = Self(1 << 7);
    /// Building on the sea floor.
    pub const STATIC_SEA_SUBMERGED: Self = Self(1 << 8);

    /// Every mobile movement class.
    pub const ANY_MOBILE: Self = Self(0b11_1111);
    /// Every static movement class.
    pub const ANY_STATIC: Self = Self(0b1_1100_0000);

    /// Empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two movement sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether this movement class is part of the `mask` set.
    #[inline]
    #[must_use]
    pub const fn is_included_in(self, mask: Self) -> bool {
        self.intersects(mask)
    }

    /// Building on land.
    #[must_use]
    pub const fn is_static_land(self) -> bool {
        self.intersects(Self::STATIC_LAND)
    }

    /// Building on or under water.
    #[must_use]
    pub const fn is_static_sea(self) -> bool {
        self.intersects(Self::STATIC_SEA_FLOATER.union(Self::STATIC_SEA_SUBMERGED))
    }

    /// Any building.
    #[must_use]
    pub const fn is_static(self) -> bool {
        self.intersects(Self::ANY_STATIC)
    }

    /// Land-bound mobile unit.
    #[must_use]
    pub const fn is_ground(self) -> bool {
        self.intersects(Self::GROUND.union(Self::AMPHIBIOUS))
    }

    /// Water-bound mobile unit.
    #[must_use]
    pub const fn is_sea_unit(self) -> bool {
        self.intersects(Self::SEA_FLOATER.union(Self::SEA_SUBMERGED))
    }

    /// Aircraft.
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.intersects(Self::AIR)
    }

    /// Target type of a unit moving this way.
    #[must_use]
    pub const fn target_type(self) -> TargetType {
        if self.is_air() {
            TargetType::Air
        } else if self.intersects(Self::SEA_FLOATER) {
            TargetType::Floater
        } else if self.intersects(Self::SEA_SUBMERGED) {
            TargetType::Submerged
        } else if self.is_static() {
            TargetType::Static
        } else {
            TargetType::Surface
        }
    }

    /// Parse a movement tag from unit data.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let movement = match tag {
            "ground" => Self::GROUND,
            "amphibious" => Self::AMPHIBIOUS,
            "hover" => Self::HOVER,
            "sea_floater" | "ship" => Self::SEA_FLOATER,
            "sea_submerged" | "submarine" => Self::SEA_SUBMERGED,
            "air" => Self::AIR,
            "static_land" => Self::STATIC_LAND,
            "static_sea_floater" => Self::STATIC_SEA_FLOATER,
            "static_sea_submerged" => Self::STATIC_SEA_SUBMERGED,
            _ => return None,
        };
        Some(movement)
    }
}

impl std::ops::BitOr for MovementType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for MovementType {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Capability bitflags of a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitTypeFlags(u16);

impl UnitTypeFlags {
    /// Can construct units or buildings while mobile.
    pub const BUILDER: Self = Self(1 << 0);
    /// Produces units from a fixed location.
    pub const FACTORY: Self = Self(1 << 1);
    /// Can assist construction and repair.
    pub const ASSISTER: Self = Self(1 << 2);
    /// Has a radar.
    pub const RADAR: Self = Self(1 << 3);
    /// Has a sonar.
    pub const SONAR: Self = Self(1 << 4);
    /// Has a seismic detector.
    pub const SEISMIC: Self = Self(1 << 5);
    /// Has a radar jammer.
    pub const JAMMER: Self = Self(1 << 6);
    /// Can cloak.
    pub const CLOAKABLE: Self = Self(1 << 7);
    /// Carries a weapon.
    pub const ARMED: Self = Self(1 << 8);

    /// Empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Build flags from RON tags. Unknown tags are ignored.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        tags.iter().fold(Self::empty(), |flags, tag| {
            let flag = match tag.as_str() {
                "builder" => Self::BUILDER,
                "factory" => Self::FACTORY,
                "assister" | "nano" => Self::ASSISTER,
                "radar" => Self::RADAR,
                "sonar" => Self::SONAR,
                "seismic" => Self::SEISMIC,
                "jammer" => Self::JAMMER,
                "cloakable" => Self::CLOAKABLE,
                "armed" => Self::ARMED,
                _ => Self::empty(),
            };
            flags.union(flag)
        })
    }
}

impl std::ops::BitOr for UnitTypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}
