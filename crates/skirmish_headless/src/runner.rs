//! Headless mission driver.
//!
//! Runs the mission with a fixed frame clock, optionally under the
//! autopilot, and condenses the outcome into a serializable report.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::factions::Faction;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::pathfinding::{find_path, path_cost};
use skirmish_core::simulation::Simulation;
use skirmish_core::unit::UnitId;
use tracing::{debug, info, warn};

use crate::autopilot::Autopilot;
use crate::config::{RunConfig, RunnerError};

/// Outcome of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Terrain seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final mission state.
    pub mission: String,
    /// Tick on which the mission was won or lost.
    pub decided_at: Option<u64>,
    /// Tick on which reinforcements arrived.
    pub reinforcements_at: Option<u64>,
    /// Projectiles fired.
    pub shots_fired: u64,
    /// Total health removed by impacts.
    pub damage_dealt: u64,
    /// Coalition units lost.
    pub coalition_losses: u32,
    /// Insurgent units destroyed.
    pub insurgent_losses: u32,
    /// Coalition units alive at the end.
    pub coalition_alive: u32,
    /// Insurgent units alive at the end.
    pub insurgents_alive: u32,
    /// Tiles explored.
    pub revealed_tiles: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Number of runs compared.
    pub runs: u32,
    /// Final hash of each run.
    pub final_hashes: Vec<u64>,
    /// First tick at which any run disagreed with the first one.
    pub first_divergence: Option<u64>,
}

impl VerifyReport {
    /// Whether every run produced the same hash sequence.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.first_divergence.is_none()
    }
}

/// A planned path between two pixel positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    /// Start, in pixels.
    pub from: (i32, i32),
    /// Goal, in pixels.
    pub to: (i32, i32),
    /// Waypoints as tile coordinates.
    pub tiles: Vec<(i32, i32)>,
    /// Cost in tile units.
    pub cost: f64,
}

/// Drives one mission to completion.
#[derive(Debug)]
pub struct MissionRunner {
    config: RunConfig,
    sim: Simulation,
    autopilot: Option<Autopilot>,
    factions: HashMap<UnitId, Faction>,
    report: RunReport,
}

impl MissionRunner {
    /// Set up the mission from `config`.
    pub fn new(config: RunConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let sim = Simulation::new(&config.mission)?;
        let autopilot = config
            .autopilot
            .then(|| Autopilot::new(config.autopilot_interval));
        let factions = sim.units().iter().map(|u| (u.id, u.faction)).collect();
        let report = RunReport {
            seed: config.mission.map_seed,
            ..RunReport::default()
        };

        Ok(Self {
            config,
            sim,
            autopilot,
            factions,
            report,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Whether the run has nothing left to do.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.sim.mission_state().is_terminal() || self.sim.tick() >= self.config.ticks
    }

    /// Advance one frame. Returns the state hash after it.
    pub fn step(&mut self) -> u64 {
        if let Some(autopilot) = &mut self.autopilot {
            autopilot.step(&mut self.sim);
        }

        let events = self.sim.update(self.config.frame_dt());

        self.report.shots_fired += events.shots.len() as u64;
        self.report.damage_dealt += events
            .damage_events
            .iter()
            .map(|d| u64::from(d.amount))
            .sum::<u64>();
        for id in &events.spawned {
            if let Some(unit) = self.sim.unit(*id) {
                self.factions.insert(unit.id, unit.faction);
            }
        }
        for id in &events.deaths {
            match self.factions.get(id) {
                Some(Faction::Coalition) => self.report.coalition_losses += 1,
                Some(Faction::Insurgents) => self.report.insurgent_losses += 1,
                _ => {}
            }
        }
        if let Some(transition) = events.mission {
            if transition.to.is_terminal() {
                self.report.decided_at = Some(self.sim.tick());
            } else {
                self.report.reinforcements_at = Some(self.sim.tick());
            }
        }

        self.sim.state_hash()
    }

    /// Run to completion, calling `on_frame` after every tick.
    pub fn run_with(mut self, mut on_frame: impl FnMut(&Simulation)) -> RunReport {
        while !self.is_finished() {
            self.step();
            on_frame(&self.sim);
        }
        self.finish()
    }

    /// Run to completion.
    pub fn run(self) -> RunReport {
        self.run_with(|_| {})
    }

    /// Run to completion, collecting the hash after every tick.
    pub fn hash_trace(mut self) -> Vec<u64> {
        let mut hashes = vec![self.sim.state_hash()];
        while !self.is_finished() {
            hashes.push(self.step());
        }
        hashes
    }

    fn finish(mut self) -> RunReport {
        self.report.ticks = self.sim.tick();
        self.report.mission = self.sim.mission_state().name().to_string();
        self.report.coalition_alive = self.sim.faction_strength(Faction::Coalition) as u32;
        self.report.insurgents_alive = self.sim.faction_strength(Faction::Insurgents) as u32;
        self.report.revealed_tiles = self.sim.map().revealed_count() as u32;
        self.report.final_state_hash = self.sim.state_hash();

        info!(
            mission = %self.report.mission,
            ticks = self.report.ticks,
            coalition_losses = self.report.coalition_losses,
            insurgent_losses = self.report.insurgent_losses,
            "Run finished"
        );
        self.report
    }
}

/// Run the mission once.
pub fn run_mission(config: &RunConfig) -> Result<RunReport, RunnerError> {
    Ok(MissionRunner::new(config.clone())?.run())
}

/// Run the same mission `runs` times in parallel and compare every tick.
pub fn verify_determinism(config: &RunConfig, runs: u32) -> Result<VerifyReport, RunnerError> {
    let runs = runs.max(2);
    let traces: Vec<Vec<u64>> = (0..runs)
        .into_par_iter()
        .map(|i| {
            debug!(run = i, "Starting verification run");
            MissionRunner::new(config.clone()).map(MissionRunner::hash_trace)
        })
        .collect::<Result<_, _>>()?;

    let first = &traces[0];
    let first_divergence = traces
        .iter()
        .skip(1)
        .filter_map(|trace| {
            let common = first.len().min(trace.len());
            (0..common)
                .find(|&tick| first[tick] != trace[tick])
                .or((first.len() != trace.len()).then_some(common))
        })
        .min()
        .map(|tick| tick as u64);

    if let Some(tick) = first_divergence {
        warn!(tick, "Runs diverged");
    }

    Ok(VerifyReport {
        runs,
        final_hashes: traces.iter().filter_map(|t| t.last().copied()).collect(),
        first_divergence,
    })
}

/// Plan a path on the mission map between two pixel positions.
pub fn plan_path(
    config: &RunConfig,
    from: (i32, i32),
    to: (i32, i32),
) -> Result<PathReport, RunnerError> {
    config.validate()?;
    let sim = Simulation::new(&config.mission)?;
    let map = sim.map();

    let path = find_path(
        map,
        Vec2Fixed::from_int(from.0, from.1),
        Vec2Fixed::from_int(to.0, to.1),
    );
    Ok(PathReport {
        from,
        to,
        tiles: path.iter().map(|p| map.pixel_to_tile(*p)).collect(),
        cost: path_cost(map, &path).to_num::<f64>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_run(ticks: u64) -> RunConfig {
        RunConfig {
            ticks,
            frame_ms: 50,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_run_respects_tick_budget() {
        let report = run_mission(&short_run(40)).unwrap();
        assert!(report.ticks <= 40);
        assert_eq!(report.seed, 1944);
        assert!(report.revealed_tiles > 0);
    }

    #[test]
    fn test_runs_are_repeatable() {
        let a = run_mission(&short_run(300)).unwrap();
        let b = run_mission(&short_run(300)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_reports_no_divergence() {
        let report = verify_determinism(&short_run(150), 3).unwrap();
        assert_eq!(report.runs, 3);
        assert!(report.is_deterministic());
        assert!(report.final_hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_idle_run_keeps_forces() {
        let config = RunConfig {
            autopilot: false,
            ..short_run(20)
        };
        let report = run_mission(&config).unwrap();
        assert_eq!(report.coalition_alive, 4);
        assert_eq!(report.shots_fired, 0);
        assert_eq!(report.mission, "start");
    }

    #[test]
    fn test_plan_path_on_open_ground() {
        let report = plan_path(&RunConfig::default(), (48, 880), (208, 880)).unwrap();
        assert_eq!(report.tiles.first(), Some(&(1, 27)));
        assert_eq!(report.tiles.last(), Some(&(6, 27)));
        assert!(report.cost >= 5.0);
    }
}
