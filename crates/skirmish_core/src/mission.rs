//! Mission objectives and the scripted battlefield layout.
//!
//! The mission is a river crossing: the Coalition task force starts in the
//! south-west, has to push past a bridge guard and a village outpost, and
//! reach the eastern town. Reaching the town calls in a single wave of
//! reinforcements. Destroying every Insurgent wins; losing every Coalition
//! unit loses.

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};

/// Progress of the mission. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MissionState {
    /// Initial state.
    #[default]
    Start,
    /// The task force reached the town and reinforcements arrived.
    ReinforcementsArrived,
    /// Every Insurgent destroyed.
    Victory,
    /// Every Coalition unit destroyed.
    Defeat,
}

impl MissionState {
    /// Whether the mission is over. Terminal states never change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ReinforcementsArrived => "reinforcements_arrived",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only order.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Victory | Self::Defeat, _) => false,
            (Self::Start, Self::ReinforcementsArrived) => true,
            (Self::Start | Self::ReinforcementsArrived, Self::Victory | Self::Defeat) => true,
            _ => false,
        }
    }
}

/// A unit placed by the mission script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// What to spawn.
    pub archetype: Archetype,
    /// Which side it fights for.
    pub faction: Faction,
    /// Pixel position.
    pub position: Vec2Fixed,
}

impl Placement {
    const fn new(archetype: Archetype, faction: Faction, position: Vec2Fixed) -> Self {
        Self {
            archetype,
            faction,
            position,
        }
    }
}

/// The objective circle that triggers reinforcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    /// Center of the town.
    pub center: Vec2Fixed,
    /// Trigger radius in pixels (strict).
    pub radius: Fixed,
}

impl Objective {
    /// Whether a unit at `position` counts as having reached the objective.
    #[must_use]
    pub fn is_reached_by(&self, position: Vec2Fixed) -> bool {
        position.distance_squared(self.center) < self.radius * self.radius
    }
}

/// Scripted layout for a world of a given pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionScript {
    width: Fixed,
    height: Fixed,
    objective: Objective,
}

impl MissionScript {
    /// Layout for a `width` x `height` pixel world.
    #[must_use]
    pub fn new(width: u32, height: u32, objective_radius: Fixed) -> Self {
        let width = Fixed::from_num(width);
        let height = Fixed::from_num(height);
        let center = Vec2Fixed::new(fraction(width, 80), fraction(height, 60));
        Self {
            width,
            height,
            objective: Objective {
                center,
                radius: objective_radius,
            },
        }
    }

    /// The reinforcement trigger.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Units present when the mission starts, in spawn order.
    #[must_use]
    pub fn initial_forces(&self) -> Vec<Placement> {
        use Archetype::{Apc, Buggy, Humvee, LightTank, Minigunner, RocketInfantry, Turret};
        use Faction::{Coalition, Insurgents};

        let (w, h) = (self.width, self.height);
        let at = |x: Fixed, y: Fixed| Vec2Fixed::new(x, y);
        let px = Fixed::from_num::<i32>;

        let bridge_x = fraction(w, 40).floor();
        let bridge_y = fraction(h, 50).floor();
        let town_x = fraction(w, 80).floor();
        let town_y = fraction(h, 60).floor();
        let village_buggy = at(fraction(w, 30).floor(), fraction(h, 25).floor());
        let village_rifle = at(fraction(w, 35).floor(), fraction(h, 20).floor());

        vec![
            // Task force, south-west corner
            Placement::new(Apc, Coalition, at(px(50), h - px(100))),
            Placement::new(Humvee, Coalition, at(px(80), h - px(150))),
            Placement::new(Minigunner, Coalition, at(px(120), h - px(120))),
            Placement::new(Minigunner, Coalition, at(px(120), h - px(100))),
            // Bridge guard
            Placement::new(Turret, Insurgents, at(bridge_x + px(150), bridge_y - px(50))),
            Placement::new(
                RocketInfantry,
                Insurgents,
                at(bridge_x + px(200), bridge_y - px(100)),
            ),
            // North village
            Placement::new(Buggy, Insurgents, village_buggy),
            Placement::new(Minigunner, Insurgents, village_rifle),
            // Town garrison
            Placement::new(LightTank, Insurgents, at(town_x - px(50), town_y - px(50))),
            Placement::new(Turret, Insurgents, at(town_x + px(100), town_y + px(100))),
            Placement::new(RocketInfantry, Insurgents, at(town_x, town_y - px(150))),
            Placement::new(Buggy, Insurgents, at(town_x + px(150), town_y)),
        ]
    }

    /// The wave spawned when the objective is first reached.
    #[must_use]
    pub fn reinforcements(&self) -> Vec<Placement> {
        let wave = [
            (Archetype::MediumTank, 100),
            (Archetype::MediumTank, 150),
            (Archetype::MediumTank, 200),
            (Archetype::Minigunner, 250),
            (Archetype::Minigunner, 300),
        ];
        wave.into_iter()
            .map(|(archetype, y)| {
                Placement::new(archetype, Faction::Coalition, Vec2Fixed::from_int(50, y))
            })
            .collect()
    }
}

/// `value * percent / 100`.
fn fraction(value: Fixed, percent: i64) -> Fixed {
    value * percent / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> MissionScript {
        MissionScript::new(1280, 960, Fixed::from_num(250))
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MissionState::Start.is_terminal());
        assert!(!MissionState::ReinforcementsArrived.is_terminal());
        assert!(MissionState::Victory.is_terminal());
        assert!(MissionState::Defeat.is_terminal());
    }

    #[test]
    fn test_forward_only_transitions() {
        use MissionState::*;
        assert!(Start.can_advance_to(ReinforcementsArrived));
        assert!(Start.can_advance_to(Victory));
        assert!(ReinforcementsArrived.can_advance_to(Defeat));
        assert!(!ReinforcementsArrived.can_advance_to(Start));
        assert!(!ReinforcementsArrived.can_advance_to(ReinforcementsArrived));
        assert!(!Victory.can_advance_to(Defeat));
        assert!(!Defeat.can_advance_to(Victory));
    }

    #[test]
    fn test_default_layout() {
        let forces = script().initial_forces();
        assert_eq!(forces.len(), 12);
        let coalition = forces.iter().filter(|p| p.faction == Faction::Coalition).count();
        assert_eq!(coalition, 4);

        assert_eq!(forces[0].archetype, Archetype::Apc);
        assert_eq!(forces[0].position, Vec2Fixed::from_int(50, 860));
        // Bridge guard turret at (512 + 150, 480 - 50)
        assert_eq!(forces[4].archetype, Archetype::Turret);
        assert_eq!(forces[4].position, Vec2Fixed::from_int(662, 430));
        // Town buggy at (1024 + 150, 576)
        assert_eq!(forces[11].position, Vec2Fixed::from_int(1174, 576));
    }

    #[test]
    fn test_objective_radius_is_strict() {
        let objective = script().objective();
        assert_eq!(objective.center, Vec2Fixed::from_int(1024, 576));
        assert!(objective.is_reached_by(Vec2Fixed::from_int(1024 - 249, 576)));
        assert!(!objective.is_reached_by(Vec2Fixed::from_int(1024 - 250, 576)));
    }

    #[test]
    fn test_reinforcement_wave() {
        let wave = script().reinforcements();
        assert_eq!(wave.len(), 5);
        assert!(wave.iter().all(|p| p.faction == Faction::Coalition));
        assert_eq!(
            wave.iter()
                .filter(|p| p.archetype == Archetype::MediumTank)
                .count(),
            3
        );
        assert_eq!(wave[4].position, Vec2Fixed::from_int(50, 300));
    }
}
