//! Core simulation loop.
//!
//! The [`Simulation`] owns the map, the unit roster and the projectiles, and
//! advances them one tick at a time. Commands from the player arrive between
//! ticks and take effect on the next one.
//!
//! # Tick order
//!
//! 1. Clamp `dt` to `[0, max_step]` and advance the simulation clock
//! 2. Prune dead units
//! 3. Unit pass in roster order; requested shots become projectiles
//! 4. Projectile pass; arrivals resolve one impact each
//! 5. Prune spent projectiles and units killed this tick
//! 6. Reveal fog around surviving Coalition units
//! 7. Evaluate mission objectives (skipped once the mission is over)
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness or wall-clock time
//! - Rosters are dense vectors iterated in spawn order
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use skirmish_core::archetype::Archetype;
//! use skirmish_core::factions::Faction;
//! use skirmish_core::math::{Fixed, Vec2Fixed};
//! use skirmish_core::simulation::Simulation;
//! use skirmish_core::terrain::GridMap;
//!
//! let mut sim = Simulation::with_map(GridMap::new(20, 20, 32));
//! let humvee = sim.spawn_unit(Archetype::Humvee, Faction::Coalition, Vec2Fixed::from_int(48, 48));
//!
//! sim.select_in_box(Vec2Fixed::ZERO, Vec2Fixed::from_int(100, 100));
//! sim.issue_move(Vec2Fixed::from_int(400, 48));
//!
//! for _ in 0..10 {
//!     sim.update(Fixed::ONE / 10);
//! }
//! assert!(sim.unit(humvee).unwrap().position.x > Fixed::from_num(48));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::archetype::Archetype;
use crate::combat::resolve_impact;
use crate::config::MissionConfig;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::map_generation::generate_mission_map;
use crate::math::{Fixed, Vec2Fixed};
use crate::mission::{MissionScript, MissionState, Objective};
use crate::pathfinding::find_path;
use crate::projectile::{Projectile, ProjectileId, ProjectileKind};
use crate::terrain::GridMap;
use crate::unit::{RosterView, ShotRequest, Travel, Unit, UnitId};

/// Click radius used by [`Simulation::command_at`], in pixels.
pub const PICK_RADIUS: i32 = 20;

/// A projectile launched this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotEvent {
    /// The new projectile.
    pub projectile: ProjectileId,
    /// Unit that fired.
    pub shooter: UnitId,
    /// Unit aimed at.
    pub target: UnitId,
    /// Projectile class.
    pub kind: ProjectileKind,
}

/// Damage applied by a projectile impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Projectile that landed.
    pub projectile: ProjectileId,
    /// Unit that was hit.
    pub victim: UnitId,
    /// Health actually removed.
    pub amount: u32,
    /// Whether the hit was fatal.
    pub killed: bool,
}

/// A change of mission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionTransition {
    /// State before the tick.
    pub from: MissionState,
    /// State after the tick.
    pub to: MissionState,
}

/// Events generated during a simulation tick.
///
/// These events can be used by a presentation layer to trigger effects,
/// sounds and messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Projectiles launched.
    pub shots: Vec<ShotEvent>,
    /// Damage from impacts.
    pub damage_events: Vec<DamageEvent>,
    /// Units that died this tick.
    pub deaths: Vec<UnitId>,
    /// Units spawned this tick.
    pub spawned: Vec<UnitId>,
    /// Mission state change, if any.
    pub mission: Option<MissionTransition>,
}

/// What a context click turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuedCommand {
    /// Selected units ordered to move to a point.
    Move(Vec2Fixed),
    /// Selected units ordered to attack a unit.
    Attack(UnitId),
}

/// The mission simulation.
///
/// Owns all mission state and advances it deterministically. Units hold
/// only [`UnitId`] handles to each other; every handle is resolved against
/// the roster when it is used.
#[derive(Debug, Clone)]
pub struct Simulation {
    map: GridMap,
    script: MissionScript,
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    mission: MissionState,
    tick: u64,
    clock_ms: Fixed,
    max_step: Fixed,
    next_unit_id: u32,
    next_projectile_id: u32,
}

impl Simulation {
    /// Set up the scripted mission described by `config`.
    ///
    /// Generates the map, spawns both forces and reveals the fog around the
    /// Coalition's starting position.
    pub fn new(config: &MissionConfig) -> Result<Self> {
        config.validate()?;

        let map = generate_mission_map(&config.map_config());
        let script = MissionScript::new(
            config.world_width,
            config.world_height,
            config.objective_radius(),
        );
        let mut sim = Self::build(map, script, config.max_step());

        for placement in sim.script.initial_forces() {
            sim.spawn_unit(placement.archetype, placement.faction, placement.position);
        }
        sim.reveal_fog();

        tracing::info!(
            units = sim.units.len(),
            seed = config.map_seed,
            revealed = sim.map.revealed_count(),
            "Mission started"
        );
        Ok(sim)
    }

    /// An empty battlefield on an existing map.
    ///
    /// No units are spawned and the fog is untouched. The objective sits at
    /// its usual relative position with the default radius.
    #[must_use]
    pub fn with_map(map: GridMap) -> Self {
        let defaults = MissionConfig::default();
        let script = MissionScript::new(
            map.width() * map.tile_size(),
            map.height() * map.tile_size(),
            defaults.objective_radius(),
        );
        Self::build(map, script, defaults.max_step())
    }

    fn build(map: GridMap, script: MissionScript, max_step: Fixed) -> Self {
        Self {
            map,
            script,
            units: Vec::new(),
            projectiles: Vec::new(),
            mission: MissionState::Start,
            tick: 0,
            clock_ms: Fixed::ZERO,
            max_step,
            next_unit_id: 1,
            next_projectile_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Read-only state
    // ------------------------------------------------------------------

    /// Live units in roster (spawn) order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Terrain and fog.
    #[must_use]
    pub const fn map(&self) -> &GridMap {
        &self.map
    }

    /// Current mission state.
    #[must_use]
    pub const fn mission_state(&self) -> MissionState {
        self.mission
    }

    /// The reinforcement trigger.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.script.objective()
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time in milliseconds.
    ///
    /// Saturates after about 24 days of simulated time. Fire timing does not
    /// read it.
    #[must_use]
    pub const fn clock_ms(&self) -> Fixed {
        self.clock_ms
    }

    /// Largest step a single tick simulates, in seconds.
    #[must_use]
    pub const fn max_step(&self) -> Fixed {
        self.max_step
    }

    /// Look up a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id && unit.is_alive())
    }

    /// Ids of the selected units, in roster order.
    #[must_use]
    pub fn selected_units(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.selected)
            .map(|unit| unit.id)
            .collect()
    }

    /// Number of live units fighting for `faction`.
    #[must_use]
    pub fn faction_strength(&self, faction: Faction) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.faction == faction && unit.is_alive())
            .count()
    }

    /// Compute a hash of the current simulation state.
    ///
    /// Two simulations fed the same inputs produce the same hash after
    /// every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.clock_ms.to_bits().hash(&mut hasher);
        self.mission.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in &self.projectiles {
            projectile.hash(&mut hasher);
        }

        self.map.shroud().hash(&mut hasher);

        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Add a unit at full health. Ids are never reused.
    pub fn spawn_unit(
        &mut self,
        archetype: Archetype,
        faction: Faction,
        position: Vec2Fixed,
    ) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.push(Unit::new(id, archetype, faction, position));
        tracing::debug!(unit = %id, archetype = archetype.name(), ?faction, "Spawned unit");
        id
    }

    /// Box selection.
    ///
    /// Player units inside the rectangle (bounds inclusive, corners in any
    /// order) become selected and every other player unit is deselected.
    /// Other factions are never selectable. Returns the selection size.
    pub fn select_in_box(&mut self, corner_a: Vec2Fixed, corner_b: Vec2Fixed) -> usize {
        let min_x = corner_a.x.min(corner_b.x);
        let max_x = corner_a.x.max(corner_b.x);
        let min_y = corner_a.y.min(corner_b.y);
        let max_y = corner_a.y.max(corner_b.y);

        let mut count = 0;
        for unit in self.units.iter_mut().filter(|u| u.faction.is_player_controlled()) {
            let p = unit.position;
            unit.selected = p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y;
            count += usize::from(unit.selected);
        }
        count
    }

    /// Order every selected unit to move to `point`.
    ///
    /// Each unit gets its own A* path; when none exists it walks straight
    /// there. Any attack target is dropped.
    pub fn issue_move(&mut self, point: Vec2Fixed) {
        let map = &self.map;
        for unit in self.units.iter_mut().filter(|u| u.selected) {
            let path = find_path(map, unit.position, point);
            unit.order_move(Travel::from_path(path, point));
        }
    }

    /// Order every selected unit to attack `target`.
    ///
    /// Each unit paths to the target's current position, falling back to a
    /// straight approach.
    pub fn issue_attack(&mut self, target: UnitId) -> Result<()> {
        let target_position = self
            .unit(target)
            .map(|unit| unit.position)
            .ok_or(GameError::UnitNotFound(target))?;

        let map = &self.map;
        for unit in self.units.iter_mut().filter(|u| u.selected) {
            let path = find_path(map, unit.position, target_position);
            unit.order_attack(target, Travel::from_path(path, target_position));
        }
        Ok(())
    }

    /// First unit whose pick circle contains `point`.
    ///
    /// Non-player units are checked first so that a click on an enemy
    /// standing next to a friendly unit targets the enemy. Large archetypes
    /// get a larger circle.
    #[must_use]
    pub fn pick_unit_at(&self, point: Vec2Fixed, radius: Fixed) -> Option<UnitId> {
        let others = self.units.iter().filter(|u| !u.faction.is_player_controlled());
        let own = self.units.iter().filter(|u| u.faction.is_player_controlled());
        others
            .chain(own)
            .find(|unit| unit.is_alive() && unit.contains_point(point, radius))
            .map(|unit| unit.id)
    }

    /// Resolve a context click at `point`.
    ///
    /// A click on a unit hostile to the player becomes an attack order,
    /// anything else a move order. Ignored once the mission is over.
    pub fn command_at(&mut self, point: Vec2Fixed) -> Option<IssuedCommand> {
        if self.mission.is_terminal() {
            return None;
        }

        let hostile = self
            .pick_unit_at(point, Fixed::from_num(PICK_RADIUS))
            .filter(|id| {
                self.unit(*id)
                    .is_some_and(|unit| Faction::Coalition.is_hostile_to(unit.faction))
            });

        match hostile {
            Some(target) => {
                self.issue_attack(target).ok()?;
                Some(IssuedCommand::Attack(target))
            }
            None => {
                self.issue_move(point);
                Some(IssuedCommand::Move(point))
            }
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt` is clamped to `[0, max_step]`.
    pub fn update(&mut self, dt: Fixed) -> TickEvents {
        let mut events = TickEvents::default();
        let dt = dt.clamp(Fixed::ZERO, self.max_step);
        self.clock_ms = self.clock_ms.saturating_add(dt * 1000);

        self.units.retain(Unit::is_alive);

        // 1. Units
        let shots = self.run_unit_pass(dt);
        for shot in shots {
            let projectile = self.launch(shot);
            events.shots.push(ShotEvent {
                projectile,
                shooter: shot.shooter,
                target: shot.target,
                kind: shot.kind,
            });
        }

        // 2. Projectiles
        self.run_projectile_pass(dt, &mut events);

        // 3. Cleanup
        self.projectiles.retain(|p| !p.dead);
        for unit in self.units.iter().filter(|u| !u.is_alive()) {
            tracing::debug!(unit = %unit.id, archetype = unit.archetype.name(), "Unit destroyed");
            events.deaths.push(unit.id);
        }
        self.units.retain(Unit::is_alive);

        // 4. Visibility
        self.reveal_fog();

        // 5. Objectives
        self.evaluate_objectives(&mut events);

        self.tick += 1;

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_unit_pass(&mut self, dt: Fixed) -> Vec<ShotRequest> {
        let mut shots = Vec::new();
        for index in 0..self.units.len() {
            let (before, rest) = self.units.split_at_mut(index);
            let Some((unit, after)) = rest.split_first_mut() else {
                break;
            };
            let roster = RosterView::new(before, after);
            unit.update(&roster, dt, &mut shots);
        }
        shots
    }

    fn launch(&mut self, shot: ShotRequest) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile::new(
            id,
            shot.faction,
            shot.kind,
            shot.origin,
            shot.destination,
            shot.damage,
        ));
        id
    }

    fn run_projectile_pass(&mut self, dt: Fixed, events: &mut TickEvents) {
        for projectile in &mut self.projectiles {
            if !projectile.advance(dt) {
                continue;
            }

            let Some(impact) = resolve_impact(
                &self.units,
                projectile.position,
                projectile.faction,
                projectile.damage,
            ) else {
                continue;
            };

            let victim = &mut self.units[impact.index];
            let amount = victim.health.apply_damage(impact.damage);
            events.damage_events.push(DamageEvent {
                projectile: projectile.id,
                victim: impact.victim,
                amount,
                killed: victim.health.is_dead(),
            });
        }
    }

    fn reveal_fog(&mut self) {
        for unit in self.units.iter().filter(|u| u.faction.grants_visibility()) {
            self.map.reveal(unit.position, unit.stats().view_radius);
        }
    }

    fn evaluate_objectives(&mut self, events: &mut TickEvents) {
        if self.mission.is_terminal() {
            return;
        }

        let insurgents_alive = self.units.iter().any(|u| u.faction.is_autonomous());
        let coalition_alive = self.units.iter().any(|u| u.faction.is_player_controlled());

        if !insurgents_alive && coalition_alive {
            self.transition(MissionState::Victory, events);
            return;
        }

        if self.mission == MissionState::Start {
            let objective = self.script.objective();
            let reached = self
                .units
                .iter()
                .any(|u| u.faction.is_player_controlled() && objective.is_reached_by(u.position));
            if reached {
                self.transition(MissionState::ReinforcementsArrived, events);
                for placement in self.script.reinforcements() {
                    let id =
                        self.spawn_unit(placement.archetype, placement.faction, placement.position);
                    events.spawned.push(id);
                }
                tracing::info!(count = events.spawned.len(), "Reinforcements arrived");
            }
        }

        if !self.units.iter().any(|u| u.faction.is_player_controlled()) {
            self.transition(MissionState::Defeat, events);
        }
    }

    fn transition(&mut self, to: MissionState, events: &mut TickEvents) {
        debug_assert!(self.mission.can_advance_to(to), "{:?} -> {to:?}", self.mission);
        let from = self.mission;
        self.mission = to;
        events.mission = Some(MissionTransition { from, to });
        tracing::info!(
            tick = self.tick,
            from = from.name(),
            to = to.name(),
            "Mission state changed"
        );
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        assert!(
            self.units.windows(2).all(|pair| pair[0].id < pair[1].id),
            "roster out of spawn order"
        );
        assert!(self.units.iter().all(Unit::is_alive), "dead unit survived cleanup");
        assert!(
            self.units
                .iter()
                .all(|u| !u.selected || u.faction.is_player_controlled()),
            "non-player unit selected"
        );
        assert!(
            self.units.iter().all(|u| !matches!(
                u.state.travel(),
                Some(Travel::Path(path)) if path.is_empty()
            )),
            "empty waypoint path"
        );
        assert!(self.projectiles.iter().all(|p| !p.dead), "spent projectile survived cleanup");
    }
}
