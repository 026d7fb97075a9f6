//! Tunable limits and rating constants.
//!
//! Loaded from RON. Every field has a default, so a config file only needs
//! to list what it changes:
//!
//! ```ron
//! AiConfig(
//!     max_builders_per_type: 3,
//!     rating: (armed_bonus: 0.3),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Empirically tuned rating constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConstants {
    /// Bonus for armed metal extractors.
    pub armed_bonus: f32,
    /// Jitter scale for static defence selection.
    pub defence_jitter: f32,
    /// Jitter scale for scout selection.
    pub scout_jitter: f32,
    /// Jitter scale for combat unit selection.
    pub combat_jitter: f32,
    /// Bonus for cloakable scouts.
    pub cloak_bonus: f32,
    /// Bonus for producers that can be built right now.
    pub constructable_bonus: f32,
    /// Factor applied per later game phase when storing attacked-by rates.
    pub learned_rate_decay: f32,
    /// Flat land / water ratio below which static producers are not built.
    pub terrain_ratio_threshold: f32,
    /// Rating assigned to producers rejected by terrain.
    pub terrain_rejection_rating: f32,
    /// Maximum depth of recursive producer requests.
    pub max_request_depth: u8,
}

impl Default for RatingConstants {
    fn default() -> Self {
        Self {
            armed_bonus: 0.2,
            defence_jitter: 0.05,
            scout_jitter: 0.1,
            combat_jitter: 0.05,
            cloak_bonus: 2.0,
            constructable_bonus: 2.0,
            learned_rate_decay: 0.7,
            terrain_ratio_threshold: 0.1,
            terrain_rejection_rating: -100_000.0,
            max_request_depth: 4,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Per-type cap on active + under construction + requested builders.
    pub max_builders_per_type: u32,
    /// Per-type cap on active + under construction + requested factories.
    pub max_factories_per_type: u32,
    /// Capacity of the air strike target list.
    pub max_air_targets: usize,
    /// Capacity of each factory build queue.
    pub max_buildqueue_size: usize,
    /// Maximum assistants per construction.
    pub max_assistants: usize,
    /// Constructions expected to finish sooner (seconds) get no assistants.
    pub min_assistance_buildtime: f32,
    /// Simulation ticks per second.
    pub ticks_per_second: u32,
    /// Ticks over which the whole task set is revisited once.
    pub slow_update_rate: u32,
    /// Tasks further away than this (seconds of travel) are not considered.
    pub max_travel_seconds: f32,
    /// Multiplier on straight-line distance when the path oracle has no answer.
    pub path_fallback_factor: f32,
    /// Share of missing health a repair must be able to restore in time.
    pub repair_health_margin: f32,
    /// Ticks between watchdog passes.
    pub watchdog_interval: u32,
    /// Ticks after which an unattended patrol or reclaim task expires.
    pub patrol_timeout: u32,
    /// Ticks a worker may sit on a task without progress before it is nudged.
    pub stuck_timeout: u32,
    /// Distance of the nudge move for stuck workers.
    pub stuck_move_distance: f32,
    /// Radius searched for a replacement builder.
    pub replacement_search_radius: f32,
    /// Radius searched for a build site around the requested position.
    pub build_site_search_radius: f32,
    /// Seconds of travel added to the build distance when an assister
    /// searches for something to repair.
    pub assist_search_seconds: f32,
    /// Open tasks allowed per worker.
    pub tasks_per_worker: usize,
    /// Rating constants.
    pub rating: RatingConstants,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_builders_per_type: 4,
            max_factories_per_type: 2,
            max_air_targets: 20,
            max_buildqueue_size: 12,
            max_assistants: 4,
            min_assistance_buildtime: 15.0,
            ticks_per_second: 30,
            slow_update_rate: 30,
            max_travel_seconds: 120.0,
            path_fallback_factor: 1.5,
            repair_health_margin: 0.6,
            watchdog_interval: 300,
            patrol_timeout: 1800,
            stuck_timeout: 900,
            stuck_move_distance: 50.0,
            replacement_search_radius: 800.0,
            build_site_search_radius: 1000.0,
            assist_search_seconds: 10.0,
            tasks_per_worker: 4,
            rating: RatingConstants::default(),
        }
    }
}

impl AiConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: AiConfig = ron::from_str(&contents)?;
        Ok(config)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: AiConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Number of tasks processed per update tick, at least one.
    #[must_use]
    pub fn update_slice(&self, total_tasks: usize) -> usize {
        let rate = self.slow_update_rate.max(1) as usize;
        (total_tasks / rate).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config =
            AiConfig::from_ron_str("AiConfig(max_builders_per_type: 7, rating: (armed_bonus: 0.5))")
                .unwrap();
        assert_eq!(config.max_builders_per_type, 7);
        assert_eq!(config.rating.armed_bonus, 0.5);
        assert_eq!(config.rating.cloak_bonus, 2.0);
        assert_eq!(config.path_fallback_factor, 1.5);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = AiConfig::from_ron_str("()").unwrap();
        assert_eq!(config, AiConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let result = AiConfig::from_ron_str("AiConfig(max_builders_per_type: \"many\")");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AiConfig::load("/nonexistent/ai.ron");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai.ron");
        std::fs::write(&path, "AiConfig(slow_update_rate: 10)").unwrap();

        let config = AiConfig::load(&path).unwrap();
        assert_eq!(config.slow_update_rate, 10);
    }

    #[test]
    fn test_update_slice() {
        let config = AiConfig::default();
        assert_eq!(config.update_slice(0), 1);
        assert_eq!(config.update_slice(29), 1);
        assert_eq!(config.update_slice(95), 3);
    }
}
