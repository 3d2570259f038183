//! Scripted stand-in for the player.
//!
//! Every few ticks the autopilot selects the whole task force and right-clicks
//! somewhere, going through the same commands a human would use:
//!
//! - the nearest insurgent that has been spotted, if any
//! - otherwise the objective while reinforcements are still pending
//! - otherwise the nearest insurgent anywhere, to hunt down the remainder

use skirmish_core::factions::Faction;
use skirmish_core::math::{Fixed, Vec2Fixed};
use skirmish_core::mission::MissionState;
use skirmish_core::simulation::{IssuedCommand, Simulation};

/// Decides and issues the player's orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autopilot {
    interval: u64,
    next_decision: u64,
}

impl Autopilot {
    /// An autopilot that acts every `interval` ticks, starting at once.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            next_decision: 0,
        }
    }

    /// Issue an order if one is due. Returns what the click became.
    pub fn step(&mut self, sim: &mut Simulation) -> Option<IssuedCommand> {
        if sim.tick() < self.next_decision || sim.mission_state().is_terminal() {
            return None;
        }
        self.next_decision = sim.tick() + self.interval;

        let centroid = task_force_centroid(sim)?;
        let click = choose_click(sim, centroid);

        let map = sim.map();
        let world = Vec2Fixed::from_int(
            (map.width() * map.tile_size()) as i32,
            (map.height() * map.tile_size()) as i32,
        );
        sim.select_in_box(Vec2Fixed::ZERO, world);

        let command = sim.command_at(click);
        tracing::debug!(tick = sim.tick(), ?command, "Autopilot order");
        command
    }
}

/// Mean position of the live player units.
fn task_force_centroid(sim: &Simulation) -> Option<Vec2Fixed> {
    let mut count = 0i64;
    let mut sum = Vec2Fixed::ZERO;
    for unit in sim.units().iter().filter(|u| u.faction.is_player_controlled()) {
        // Average in tile-sized units to stay clear of overflow.
        sum = sum + unit.position.scale(Fixed::ONE / 32);
        count += 1;
    }
    (count > 0).then(|| Vec2Fixed::new(sum.x * 32 / count, sum.y * 32 / count))
}

fn choose_click(sim: &Simulation, from: Vec2Fixed) -> Vec2Fixed {
    let nearest = |spotted_only: bool| {
        sim.units()
            .iter()
            .filter(|u| u.faction == Faction::Insurgents)
            .filter(|u| !spotted_only || sim.map().is_pixel_visible(u.position))
            .min_by_key(|u| u.position.distance_squared(from))
            .map(|u| u.position)
    };

    if let Some(target) = nearest(true) {
        return target;
    }
    if sim.mission_state() == MissionState::Start {
        return sim.objective().center;
    }
    nearest(false).unwrap_or_else(|| sim.objective().center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::archetype::Archetype;
    use skirmish_core::terrain::GridMap;

    fn px(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_int(x, y)
    }

    #[test]
    fn test_heads_for_objective_when_nothing_is_spotted() {
        let mut sim = Simulation::with_map(GridMap::new(40, 30, 32));
        sim.spawn_unit(Archetype::Humvee, Faction::Coalition, px(100, 100));
        sim.spawn_unit(Archetype::Turret, Faction::Insurgents, px(1200, 900));

        let mut pilot = Autopilot::new(30);
        let command = pilot.step(&mut sim);
        assert_eq!(command, Some(IssuedCommand::Move(sim.objective().center)));
    }

    #[test]
    fn test_attacks_spotted_enemy() {
        let mut sim = Simulation::with_map(GridMap::new(40, 30, 32));
        sim.spawn_unit(Archetype::Humvee, Faction::Coalition, px(100, 100));
        let buggy = sim.spawn_unit(Archetype::Buggy, Faction::Insurgents, px(200, 100));
        sim.update(Fixed::ONE / 20);

        let mut pilot = Autopilot::new(30);
        assert_eq!(pilot.step(&mut sim), Some(IssuedCommand::Attack(buggy)));
    }

    #[test]
    fn test_waits_for_interval() {
        let mut sim = Simulation::with_map(GridMap::new(40, 30, 32));
        sim.spawn_unit(Archetype::Humvee, Faction::Coalition, px(100, 100));

        let mut pilot = Autopilot::new(5);
        assert!(pilot.step(&mut sim).is_some());
        for _ in 0..4 {
            sim.update(Fixed::ONE / 20);
            assert!(pilot.step(&mut sim).is_none());
        }
        sim.update(Fixed::ONE / 20);
        assert!(pilot.step(&mut sim).is_some());
    }

    #[test]
    fn test_idle_without_task_force() {
        let mut sim = Simulation::with_map(GridMap::new(40, 30, 32));
        sim.spawn_unit(Archetype::Buggy, Faction::Insurgents, px(200, 100));
        assert_eq!(Autopilot::new(1).step(&mut sim), None);
    }
}
