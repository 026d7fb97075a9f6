//! Faction roster combining all unit definitions of one faction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::unit_data::UnitData;
use crate::error::{AiError, Result};
use crate::factions::FactionId;

/// Complete roster of a faction.
///
/// # Example RON
///
/// ```ron
/// FactionData(
///     id: 1,
///     name: "Arm",
///     units: [...],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionData {
    /// Faction identifier.
    pub id: FactionId,

    /// Display name.
    pub name: String,

    /// All unit types of this faction, in registration order.
    pub units: Vec<UnitData>,

    /// IDs of the units a player starts with.
    #[serde(default)]
    pub starting_units: Vec<String>,
}

impl FactionData {
    /// Find a unit by its ID.
    #[must_use]
    pub fn get_unit(&self, id: &str) -> Option<&UnitData> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Parse a roster from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| AiError::RosterParse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a roster from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| AiError::RosterParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        ron::from_str(&contents).map_err(|e| AiError::RosterParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
        FactionData(
            id: 1,
            name: "Arm",
            units: [
                UnitData(id: "commander", category: Commander, movement: "ground", cost: 2000.0, build_time: 50000.0, tags: ["builder"], build_options: ["solar"]),
                UnitData(id: "solar", category: PowerPlant, movement: "static_land", cost: 150.0, build_time: 2800.0, primary_ability: 20.0),
            ],
            starting_units: ["commander"],
        )
    "#;

    #[test]
    fn test_parse_roster() {
        let faction = FactionData::from_ron_str(ROSTER).unwrap();
        assert_eq!(faction.id, FactionId::new(1));
        assert_eq!(faction.units.len(), 2);
        assert!(faction.get_unit("solar").is_some());
        assert!(faction.get_unit("fusion").is_none());
    }

    #[test]
    fn test_parse_error_is_roster_parse() {
        let err = FactionData::from_ron_str("FactionData(").unwrap_err();
        assert!(matches!(err, AiError::RosterParse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = FactionData::load("/nonexistent/roster.ron").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roster.ron"));
    }
}
