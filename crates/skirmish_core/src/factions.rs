//! Faction identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a playable faction.
///
/// Factions are data-driven: each one owns its own unit roster. Index 0 is
/// reserved for "neutral" (units that belong to no playable roster).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(u8);

impl FactionId {
    /// Units not belonging to any playable faction.
    pub const NEUTRAL: Self = Self(0);

    /// Create a faction ID from its 1-based roster index.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Index into per-faction tables (neutral maps to 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is a playable faction.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        self.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_not_playable() {
        assert!(!FactionId::NEUTRAL.is_playable());
        assert!(FactionId::new(2).is_playable());
        assert_eq!(FactionId::new(2).index(), 2);
    }
}
