//! Learned data persisted between games.
//!
//! Two tables survive a match:
//! - attacked-by rates: how often each mobile target type attacked us,
//!   per map type and game phase
//! - the combat power table: one [`TargetTypeValues`] per unit type
//!
//! The file is bincode with a leading format tag. Loading fails closed: a
//! mismatching tag, a wrong unit count or a decode error yields `Err` and the
//! caller falls back to defaults. Nothing is ever partially applied.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::unit_kind::{TargetType, TargetTypeValues};

/// Format tag written by this version.
pub const LEARNED_DATA_FORMAT: &str = "skirmish-learn-v1";

const MOBILE_TARGETS: usize = 4;

/// Errors raised while loading or saving learned data.
#[derive(Debug, Error)]
pub enum LearningError {
    /// Failed to read or write the file.
    #[error("Failed to access learned data: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to encode or decode.
    #[error("Failed to decode learned data: {0}")]
    Codec(#[from] bincode::Error),
    /// The file was written by an incompatible version.
    #[error("Learned data version mismatch: expected '{expected}', got '{found}'")]
    VersionMismatch {
        /// Tag this build understands.
        expected: String,
        /// Tag found in the file.
        found: String,
    },
    /// The combat power table does not match the loaded rosters.
    #[error("Learned data has {found} unit types, expected {expected}")]
    UnitCountMismatch {
        /// Unit types in the current build tree.
        expected: usize,
        /// Unit types in the file.
        found: usize,
    },
}

/// Broad classification of a map by its water share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapType {
    /// Little or no water.
    #[default]
    Land,
    /// Mixed land and water.
    LandWater,
    /// Mostly water.
    Water,
}

impl MapType {
    /// Every map type.
    pub const ALL: [Self; 3] = [Self::Land, Self::LandWater, Self::Water];

    /// Index into per-map tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Classify by the share of water squares in `[0, 1]`.
    #[must_use]
    pub fn from_water_ratio(water_ratio: f32) -> Self {
        if water_ratio > 0.8 {
            Self::Water
        } else if water_ratio > 0.25 {
            Self::LandWater
        } else {
            Self::Land
        }
    }

    /// No naval warfare expected.
    #[must_use]
    pub const fn is_land_map(self) -> bool {
        matches!(self, Self::Land)
    }

    /// No land warfare expected.
    #[must_use]
    pub const fn is_water_map(self) -> bool {
        matches!(self, Self::Water)
    }
}

/// Phase of a match, by elapsed game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// First minutes.
    #[default]
    Starting,
    /// Early game.
    Early,
    /// Mid game.
    Mid,
    /// Late game.
    Late,
}

impl GamePhase {
    /// Every phase, in order.
    pub const ALL: [Self; 4] = [Self::Starting, Self::Early, Self::Mid, Self::Late];

    /// Index into per-phase tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Game time in seconds at which this phase begins.
    #[must_use]
    pub const fn start_seconds(self) -> u32 {
        match self {
            Self::Starting => 0,
            Self::Early => 360,
            Self::Mid => 1200,
            Self::Late => 2400,
        }
    }

    /// Phase at `tick`.
    #[must_use]
    pub fn from_tick(tick: u64, ticks_per_second: u32) -> Self {
        let seconds = tick / u64::from(ticks_per_second.max(1));
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|phase| seconds >= u64::from(phase.start_seconds()))
            .unwrap_or(Self::Starting)
    }
}

fn mobile_index(target: TargetType) -> Option<usize> {
    (target != TargetType::Static).then_some(target.index())
}

/// Attacked-by rates of one map type: `[phase][mobile target type]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePhaseRates([[f32; MOBILE_TARGETS]; 4]);

impl GamePhaseRates {
    /// Rate for a phase and target type (0 for static).
    #[must_use]
    pub fn get(&self, phase: GamePhase, target: TargetType) -> f32 {
        mobile_index(target).map_or(0.0, |t| self.0[phase.index()][t])
    }

    /// Overwrite the rate for a phase and target type.
    pub fn set(&mut self, phase: GamePhase, target: TargetType, rate: f32) {
        if let Some(t) = mobile_index(target) {
            self.0[phase.index()][t] = rate;
        }
    }

    /// Count one attack by a unit of `target` type during `phase`.
    pub fn record_attack(&mut self, phase: GamePhase, target: TargetType) {
        if let Some(t) = mobile_index(target) {
            self.0[phase.index()][t] += 1.0;
        }
    }

    /// Rescale every phase so its rates sum to 1 (empty phases stay 0).
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut result = *self;
        for phase in &mut result.0 {
            let total: f32 = phase.iter().sum();
            if total > 0.0 {
                phase.iter_mut().for_each(|rate| *rate /= total);
            }
        }
        result
    }
}

/// Attacked-by rates for every map type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackedByRates([GamePhaseRates; 3]);

impl AttackedByRates {
    /// Rates of one map type.
    #[must_use]
    pub fn for_map(&self, map: MapType) -> &GamePhaseRates {
        &self.0[map.index()]
    }

    /// Rate for a map, phase and target type.
    #[must_use]
    pub fn get(&self, map: MapType, phase: GamePhase, target: TargetType) -> f32 {
        self.0[map.index()].get(phase, target)
    }

    /// Overwrite a single rate.
    pub fn set(&mut self, map: MapType, phase: GamePhase, target: TargetType, rate: f32) {
        self.0[map.index()].set(phase, target, rate);
    }

    /// Mean rate over the starting and early phase.
    #[must_use]
    pub fn until_early_phase(&self, map: MapType, target: TargetType) -> f32 {
        let rates = &self.0[map.index()];
        0.5 * (rates.get(GamePhase::Starting, target) + rates.get(GamePhase::Early, target))
    }

    /// Merge the rates observed in one game into the stored table.
    ///
    /// Phases up to `reached` take this game's rates. Later phases were not
    /// observed, so their stored rates are kept but scaled by `decay`.
    pub fn merge_game(
        &mut self,
        map: MapType,
        reached: GamePhase,
        game: &GamePhaseRates,
        decay: f32,
    ) {
        let game = game.normalized();
        let stored = &mut self.0[map.index()];
        for phase in GamePhase::ALL {
            for target in TargetType::MOBILE {
                let rate = if phase <= reached {
                    game.get(phase, target)
                } else {
                    stored.get(phase, target) * decay
                };
                stored.set(phase, target, rate);
            }
        }
    }
}

/// Everything persisted between games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedData {
    /// Format tag; must match [`LEARNED_DATA_FORMAT`] on load.
    pub format_tag: String,
    /// Attacked-by rates.
    pub attacked_by_rates: AttackedByRates,
    /// Combat power per unit type (index = unit type ID).
    pub combat_power: Vec<TargetTypeValues>,
}

impl LearnedData {
    /// Fresh data with zero rates and the given combat power table.
    #[must_use]
    pub fn with_defaults(combat_power: Vec<TargetTypeValues>) -> Self {
        Self {
            format_tag: LEARNED_DATA_FORMAT.to_string(),
            attacked_by_rates: AttackedByRates::default(),
            combat_power,
        }
    }

    /// Save to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LearningError> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), "Saved learned data");
        Ok(())
    }

    /// Load from a file, checking format tag and unit count.
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable, written by
    /// another format, or describes a different set of unit types.
    pub fn load<P: AsRef<Path>>(
        path: P,
        expected_tag: &str,
        unit_count: usize,
    ) -> Result<Self, LearningError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes, expected_tag, unit_count)
    }

    /// Decode from bytes, checking format tag and unit count.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn decode(bytes: &[u8], expected_tag: &str, unit_count: usize) -> Result<Self, LearningError> {
        // The tag is the first field, so it decodes on its own from any version.
        let found: String = bincode::deserialize(bytes)?;
        if found != expected_tag {
            info!(expected = expected_tag, found = %found, "Learned data out of date");
            return Err(LearningError::VersionMismatch {
                expected: expected_tag.to_string(),
                found,
            });
        }

        let data: Self = bincode::deserialize(bytes)?;
        if data.combat_power.len() != unit_count {
            return Err(LearningError::UnitCountMismatch {
                expected: unit_count,
                found: data.combat_power.len(),
            });
        }
        Ok(data)
    }
}
