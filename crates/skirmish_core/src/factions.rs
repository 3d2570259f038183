//! Faction definitions and identifiers.

use serde::{Deserialize, Serialize};

/// The sides present in a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The Coalition - the player's task force.
    Coalition,
    /// The Insurgents - the autonomous opposing force.
    Insurgents,
    /// Civilians - reserved, never populated by a mission script.
    Civilian,
}

impl Faction {
    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Coalition => "Coalition Task Force",
            Self::Insurgents => "Insurgent Militia",
            Self::Civilian => "Civilians",
        }
    }

    /// Whether the player may select and command units of this faction.
    #[must_use]
    pub const fn is_player_controlled(&self) -> bool {
        matches!(self, Self::Coalition)
    }

    /// Whether units of this faction pick their own targets.
    #[must_use]
    pub const fn is_autonomous(&self) -> bool {
        matches!(self, Self::Insurgents)
    }

    /// Whether units of this faction lift the fog of war.
    #[must_use]
    pub const fn grants_visibility(&self) -> bool {
        self.is_player_controlled()
    }

    /// Check if two factions are at war.
    #[must_use]
    pub const fn is_hostile_to(&self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Coalition, Self::Insurgents) | (Self::Insurgents, Self::Coalition)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostility_is_symmetric() {
        assert!(Faction::Coalition.is_hostile_to(Faction::Insurgents));
        assert!(Faction::Insurgents.is_hostile_to(Faction::Coalition));
        assert!(!Faction::Coalition.is_hostile_to(Faction::Coalition));
        assert!(!Faction::Civilian.is_hostile_to(Faction::Coalition));
        assert!(!Faction::Insurgents.is_hostile_to(Faction::Civilian));
    }

    #[test]
    fn test_only_coalition_is_controllable() {
        assert!(Faction::Coalition.is_player_controlled());
        assert!(!Faction::Insurgents.is_player_controlled());
        assert!(!Faction::Civilian.is_player_controlled());
        assert!(Faction::Insurgents.is_autonomous());
        assert!(!Faction::Coalition.is_autonomous());
    }
}
