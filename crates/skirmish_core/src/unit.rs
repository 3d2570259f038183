//! Units and their movement/combat state machine.
//!
//! A unit never holds a reference to another unit. Attack targets are
//! [`UnitId`] handles resolved against a [`RosterView`] every tick, and a
//! handle that no longer resolves is dropped on the spot. Shots are not
//! spawned directly: the unit pushes a [`ShotRequest`] into an out-buffer
//! that the engine drains after the unit pass.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, ArchetypeStats};
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::projectile::ProjectileKind;

/// Tolerance added to the per-tick step when checking waypoint arrival.
const ARRIVAL_SLACK: Fixed = Fixed::ONE;

/// Unique identifier for a unit. Assigned in spawn order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hit points of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the unit is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (self.current * 100) / self.max
        }
    }
}

/// How a unit is getting somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Travel {
    /// Straight line to a point, ignoring terrain.
    Direct(Vec2Fixed),
    /// Pathfinder waypoints, consumed from the front. Never empty.
    Path(VecDeque<Vec2Fixed>),
}

impl Travel {
    /// Build a travel plan from a pathfinder result, falling back to a
    /// straight line to `fallback` when the path is empty.
    #[must_use]
    pub fn from_path(path: Vec<Vec2Fixed>, fallback: Vec2Fixed) -> Self {
        if path.is_empty() {
            Self::Direct(fallback)
        } else {
            Self::Path(path.into())
        }
    }

    /// The point the unit is currently heading for.
    #[must_use]
    pub fn next_point(&self) -> Option<Vec2Fixed> {
        match self {
            Self::Direct(point) => Some(*point),
            Self::Path(path) => path.front().copied(),
        }
    }
}

/// Movement and combat state of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum UnitState {
    /// Standing still with nothing to do.
    #[default]
    Idle,
    /// Executing a move order.
    Moving(Travel),
    /// Target in range; standing still and firing.
    Engaging(UnitId),
    /// Target out of range; closing in.
    ///
    /// A `Direct` travel is re-aimed at the target's current position every
    /// tick. A `Path` travel is followed to its end first.
    Pursuing {
        /// Unit being chased.
        target: UnitId,
        /// Current approach, if any.
        travel: Option<Travel>,
    },
}

impl UnitState {
    /// The attack target, if any.
    #[must_use]
    pub const fn attack_target(&self) -> Option<UnitId> {
        match self {
            Self::Engaging(target) | Self::Pursuing { target, .. } => Some(*target),
            Self::Idle | Self::Moving(_) => None,
        }
    }

    /// The active travel plan, if any.
    #[must_use]
    pub const fn travel(&self) -> Option<&Travel> {
        match self {
            Self::Moving(travel)
            | Self::Pursuing {
                travel: Some(travel),
                ..
            } => Some(travel),
            _ => None,
        }
    }

    fn travel_mut(&mut self) -> Option<&mut Travel> {
        match self {
            Self::Moving(travel)
            | Self::Pursuing {
                travel: Some(travel),
                ..
            } => Some(travel),
            _ => None,
        }
    }

    /// Drop the travel plan after arrival.
    fn arrive(&mut self) {
        *self = match std::mem::take(self) {
            Self::Pursuing { target, .. } => Self::Pursuing {
                target,
                travel: None,
            },
            Self::Engaging(target) => Self::Engaging(target),
            Self::Idle | Self::Moving(_) => Self::Idle,
        };
    }
}

/// A shot the unit wants fired this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotRequest {
    /// Unit that fired.
    pub shooter: UnitId,
    /// Unit aimed at.
    pub target: UnitId,
    /// Shooter's faction.
    pub faction: Faction,
    /// Projectile class.
    pub kind: ProjectileKind,
    /// Muzzle position.
    pub origin: Vec2Fixed,
    /// Target's position at the moment of firing.
    pub destination: Vec2Fixed,
    /// Damage before armor.
    pub damage: u32,
}

/// Every unit except the one being updated, in roster order.
///
/// Units before the updated one have already moved this tick.
#[derive(Debug, Clone, Copy)]
pub struct RosterView<'a> {
    before: &'a [Unit],
    after: &'a [Unit],
}

impl<'a> RosterView<'a> {
    /// View over the two halves of the roster around the updated unit.
    #[must_use]
    pub const fn new(before: &'a [Unit], after: &'a [Unit]) -> Self {
        Self { before, after }
    }

    /// Iterate units in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Unit> {
        self.before.iter().chain(self.after.iter())
    }

    /// Resolve a handle to a live unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&'a Unit> {
        self.iter().find(|unit| unit.id == id && unit.is_alive())
    }
}

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Owning faction.
    pub faction: Faction,
    /// Immutable archetype.
    pub archetype: Archetype,
    /// Pixel position.
    pub position: Vec2Fixed,
    /// Hull facing in radians.
    pub heading: Fixed,
    /// Gun facing in radians.
    pub turret_angle: Fixed,
    /// Hit points.
    pub health: Health,
    /// Selection flag. Only player-controlled units are ever selected.
    pub selected: bool,
    /// Movement/combat state.
    pub state: UnitState,
    /// Simulated time since the last shot, in milliseconds. `None` until
    /// the first shot.
    pub since_fired_ms: Option<Fixed>,
}

impl Unit {
    /// Create a unit at full health, idle.
    #[must_use]
    pub fn new(id: UnitId, archetype: Archetype, faction: Faction, position: Vec2Fixed) -> Self {
        Self {
            id,
            faction,
            archetype,
            position,
            heading: Fixed::ZERO,
            turret_angle: Fixed::ZERO,
            health: Health::new(archetype.stats().max_health),
            selected: false,
            state: UnitState::Idle,
            since_fired_ms: None,
        }
    }

    /// Stat block of this unit's archetype.
    #[must_use]
    pub const fn stats(&self) -> &'static ArchetypeStats {
        self.archetype.stats()
    }

    /// Whether the unit still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Current attack target handle.
    #[must_use]
    pub const fn attack_target(&self) -> Option<UnitId> {
        self.state.attack_target()
    }

    /// Remaining waypoints, empty unless following a path.
    #[must_use]
    pub fn path(&self) -> Vec<Vec2Fixed> {
        match self.state.travel() {
            Some(Travel::Path(path)) => path.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Straight-line destination, if moving directly.
    #[must_use]
    pub fn move_target(&self) -> Option<Vec2Fixed> {
        match self.state.travel() {
            Some(Travel::Direct(point)) => Some(*point),
            _ => None,
        }
    }

    /// Replace whatever the unit was doing with a move order.
    pub fn order_move(&mut self, travel: Travel) {
        self.state = UnitState::Moving(travel);
    }

    /// Replace whatever the unit was doing with an attack order.
    pub fn order_attack(&mut self, target: UnitId, travel: Travel) {
        self.state = UnitState::Pursuing {
            target,
            travel: Some(travel),
        };
    }

    /// Whether `point` lies inside this unit's pick circle.
    #[must_use]
    pub fn contains_point(&self, point: Vec2Fixed, base_radius: Fixed) -> bool {
        let radius = self.archetype.hit_radius(base_radius);
        self.position.distance_squared(point) <= radius * radius
    }

    /// Whether more than the fire interval has passed since the last shot.
    #[must_use]
    pub fn ready_to_fire(&self) -> bool {
        let interval_ms = self.stats().fire_interval * 1000;
        self.since_fired_ms
            .map_or(true, |since| since > interval_ms)
    }

    /// Advance the unit by one tick.
    ///
    /// Order: resolve the attack target and fire, then move, then (for
    /// autonomous factions) acquire a new target.
    pub fn update(
        &mut self,
        roster: &RosterView<'_>,
        dt: Fixed,
        shots: &mut Vec<ShotRequest>,
    ) {
        let stats = self.stats();
        if let Some(since) = &mut self.since_fired_ms {
            // Saturates: a unit idle for weeks of simulated time stays ready.
            *since = since.saturating_add(dt * 1000);
        }
        self.engage(roster, shots);
        self.advance(stats.speed * dt);

        if self.faction.is_autonomous() && self.attack_target().is_none() {
            self.acquire_target(roster);
        }
    }

    fn engage(&mut self, roster: &RosterView<'_>, shots: &mut Vec<ShotRequest>) {
        let Some(target_id) = self.attack_target() else {
            return;
        };

        let Some(target) = roster.get(target_id) else {
            // Target gone: a queued path survives as a plain move.
            self.state = match std::mem::take(&mut self.state) {
                UnitState::Pursuing {
                    travel: Some(Travel::Path(path)),
                    ..
                } => UnitState::Moving(Travel::Path(path)),
                _ => UnitState::Idle,
            };
            return;
        };

        let stats = self.stats();
        let target_position = target.position;
        let distance_sq = self.position.distance_squared(target_position);

        if distance_sq <= stats.range * stats.range {
            self.turret_angle = (target_position - self.position).angle();
            self.state = UnitState::Engaging(target_id);

            if self.ready_to_fire() {
                shots.push(ShotRequest {
                    shooter: self.id,
                    target: target_id,
                    faction: self.faction,
                    kind: self.archetype.projectile_kind(),
                    origin: self.position,
                    destination: target_position,
                    damage: stats.damage,
                });
                self.since_fired_ms = Some(Fixed::ZERO);
            }
        } else if !matches!(
            self.state,
            UnitState::Pursuing {
                travel: Some(Travel::Path(_)),
                ..
            }
        ) {
            self.state = UnitState::Pursuing {
                target: target_id,
                travel: Some(Travel::Direct(target_position)),
            };
        }
    }

    fn advance(&mut self, step: Fixed) {
        let arrived = match self.state.travel_mut() {
            None => return,
            Some(Travel::Path(path)) => match path.front().copied() {
                Some(next) if self.position.distance(next) >= step + ARRIVAL_SLACK => {
                    if step > Fixed::ZERO {
                        self.heading = (next - self.position).angle();
                    }
                    self.position = self.position.step_toward(next, step);
                    false
                }
                _ => {
                    path.pop_front();
                    path.is_empty()
                }
            },
            Some(Travel::Direct(point)) => {
                let point = *point;
                if self.position.distance(point) >= step + ARRIVAL_SLACK {
                    if step > Fixed::ZERO {
                        self.heading = (point - self.position).angle();
                    }
                    self.position = self.position.step_toward(point, step);
                    false
                } else {
                    true
                }
            }
        };

        if arrived {
            self.state.arrive();
        }
    }

    /// Adopt the nearest hostile within 1.5x the squared view radius.
    fn acquire_target(&mut self, roster: &RosterView<'_>) {
        let view = self.stats().view_radius;
        let mut best_distance_sq = view * view * 3 / 2;
        let mut nearest = None;

        for other in roster.iter() {
            if !other.is_alive() || !self.faction.is_hostile_to(other.faction) {
                continue;
            }
            let distance_sq = self.position.distance_squared(other.position);
            if distance_sq < best_distance_sq {
                best_distance_sq = distance_sq;
                nearest = Some(other.id);
            }
        }

        if let Some(target) = nearest {
            tracing::trace!(unit = %self.id, %target, "Acquired target");
            self.state = match std::mem::take(&mut self.state) {
                UnitState::Moving(travel) => UnitState::Pursuing {
                    target,
                    travel: Some(travel),
                },
                _ => UnitState::Pursuing {
                    target,
                    travel: None,
                },
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_int(x, y)
    }

    fn tenth() -> Fixed {
        Fixed::from_num(0.1)
    }

    fn unit(id: u32, archetype: Archetype, faction: Faction, x: i32, y: i32) -> Unit {
        Unit::new(UnitId(id), archetype, faction, px(x, y))
    }

    #[test]
    fn test_health_saturates() {
        let mut health = Health::new(50);
        assert_eq!(health.apply_damage(20), 20);
        assert_eq!(health.percentage(), 60);
        assert_eq!(health.apply_damage(100), 30);
        assert!(health.is_dead());
    }

    #[test]
    fn test_direct_move_and_arrival() {
        let mut humvee = unit(1, Archetype::Humvee, Faction::Coalition, 0, 0);
        humvee.order_move(Travel::Direct(px(100, 0)));
        let roster = RosterView::new(&[], &[]);
        let mut shots = Vec::new();

        // 140 px/s * 0.1 s = 14 px per tick
        humvee.update(&roster, tenth(), &mut shots);
        assert!(humvee.position.x > Fixed::from_num(13) && humvee.position.x < Fixed::from_num(15));
        assert_eq!(humvee.move_target(), Some(px(100, 0)));

        for _ in 0..10 {
            humvee.update(&roster, tenth(), &mut shots);
        }
        assert_eq!(humvee.state, UnitState::Idle);
        // Stops short of the point, within one step plus slack.
        assert!(humvee.position.distance(px(100, 0)) < Fixed::from_num(16));
        assert!(shots.is_empty());
    }

    #[test]
    fn test_waypoint_pop_does_not_move() {
        let mut apc = unit(1, Archetype::Apc, Faction::Coalition, 0, 0);
        apc.order_move(Travel::Path(VecDeque::from(vec![px(0, 0), px(200, 0)])));
        let roster = RosterView::new(&[], &[]);

        apc.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(apc.position, px(0, 0));
        assert_eq!(apc.path(), vec![px(200, 0)]);

        apc.update(&roster, tenth(), &mut Vec::new());
        assert!(apc.position.x > Fixed::ZERO);
        assert_eq!(apc.heading, Fixed::ZERO);
    }

    #[test]
    fn test_fires_when_in_range_and_respects_interval() {
        let mut tank = unit(1, Archetype::MediumTank, Faction::Coalition, 0, 0);
        let target = unit(2, Archetype::Buggy, Faction::Insurgents, 150, 0);
        let after = [target];
        let roster = RosterView::new(&[], &after);
        tank.order_attack(UnitId(2), Travel::Direct(px(150, 0)));

        let quarter = Fixed::ONE / 4;
        let mut shots = Vec::new();
        tank.update(&roster, quarter, &mut shots);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].kind, ProjectileKind::Shell);
        assert_eq!(shots[0].damage, 40);
        assert_eq!(shots[0].destination, px(150, 0));
        assert_eq!(tank.state, UnitState::Engaging(UnitId(2)));
        assert_eq!(tank.position, px(0, 0));

        // 1.5 s interval, strict: exactly 1500 ms later is still too soon
        for _ in 0..6 {
            tank.update(&roster, quarter, &mut shots);
        }
        assert_eq!(tank.since_fired_ms, Some(Fixed::from_num(1500)));
        assert_eq!(shots.len(), 1);
        tank.update(&roster, quarter, &mut shots);
        assert_eq!(shots.len(), 2);
        assert_eq!(tank.since_fired_ms, Some(Fixed::ZERO));
    }

    #[test]
    fn test_long_idle_gap_saturates_and_still_fires() {
        let mut tank = unit(1, Archetype::MediumTank, Faction::Coalition, 0, 0);
        let after = [unit(2, Archetype::Buggy, Faction::Insurgents, 150, 0)];
        let roster = RosterView::new(&[], &after);
        tank.since_fired_ms = Some(Fixed::MAX - Fixed::from_num(10));

        let mut shots = Vec::new();
        tank.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(tank.since_fired_ms, Some(Fixed::MAX));

        tank.order_attack(UnitId(2), Travel::Direct(px(150, 0)));
        tank.update(&roster, tenth(), &mut shots);
        assert_eq!(shots.len(), 1);
    }

    #[test]
    fn test_turret_angle_tracks_target() {
        let mut tank = unit(1, Archetype::MediumTank, Faction::Coalition, 100, 100);
        let south = [unit(2, Archetype::Buggy, Faction::Insurgents, 100, 250)];
        tank.order_attack(UnitId(2), Travel::Direct(px(100, 250)));
        tank.update(&RosterView::new(&[], &south), tenth(), &mut Vec::new());

        let expected = Fixed::from_num(std::f64::consts::FRAC_PI_2);
        assert!((tank.turret_angle - expected).abs() < Fixed::from_num(0.01));
        // The hull does not turn to aim.
        assert_eq!(tank.heading, Fixed::ZERO);
    }

    #[test]
    fn test_heading_follows_travel() {
        let mut humvee = unit(1, Archetype::Humvee, Faction::Coalition, 500, 500);
        humvee.order_move(Travel::Direct(px(300, 300)));
        humvee.update(&RosterView::new(&[], &[]), tenth(), &mut Vec::new());

        let expected = Fixed::from_num(-(std::f64::consts::PI - std::f64::consts::FRAC_PI_4));
        assert!((humvee.heading - expected).abs() < Fixed::from_num(0.01));
        assert!(humvee.position.x < px(500, 500).x);
    }

    #[test]
    fn test_stationary_tick_keeps_heading() {
        let mut humvee = unit(1, Archetype::Humvee, Faction::Coalition, 0, 0);
        humvee.order_move(Travel::Direct(px(0, 200)));
        let roster = RosterView::new(&[], &[]);
        humvee.update(&roster, tenth(), &mut Vec::new());
        let heading = humvee.heading;
        assert!(heading > Fixed::ONE);

        // Zero-length step: no movement, no turn.
        humvee.update(&roster, Fixed::ZERO, &mut Vec::new());
        assert_eq!(humvee.heading, heading);

        // Arrival and idling leave the last heading in place.
        humvee.order_move(Travel::Direct(humvee.position));
        humvee.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(humvee.state, UnitState::Idle);
        assert_eq!(humvee.heading, heading);
    }

    #[test]
    fn test_pursuit_retargets_each_tick() {
        let mut minigunner = unit(1, Archetype::Minigunner, Faction::Coalition, 0, 0);
        minigunner.order_attack(UnitId(2), Travel::Direct(px(300, 0)));

        let moved = [unit(2, Archetype::Buggy, Faction::Insurgents, 300, 80)];
        let roster = RosterView::new(&moved, &[]);
        minigunner.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(minigunner.move_target(), Some(px(300, 80)));
        assert_eq!(minigunner.attack_target(), Some(UnitId(2)));
    }

    #[test]
    fn test_lost_target_keeps_path_as_move() {
        let mut tank = unit(1, Archetype::MediumTank, Faction::Coalition, 0, 0);
        tank.order_attack(
            UnitId(9),
            Travel::Path(VecDeque::from(vec![px(0, 0), px(32, 0), px(64, 0)])),
        );
        let roster = RosterView::new(&[], &[]);
        tank.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(tank.attack_target(), None);
        assert!(matches!(tank.state, UnitState::Moving(Travel::Path(_))));

        let mut humvee = unit(3, Archetype::Humvee, Faction::Coalition, 0, 0);
        humvee.order_attack(UnitId(9), Travel::Direct(px(500, 0)));
        humvee.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(humvee.state, UnitState::Idle);
        assert_eq!(humvee.position, px(0, 0));
    }

    #[test]
    fn test_autonomous_acquisition_picks_nearest_hostile() {
        let mut buggy = unit(1, Archetype::Buggy, Faction::Insurgents, 0, 0);
        let others = [
            unit(2, Archetype::Humvee, Faction::Coalition, 200, 0),
            unit(3, Archetype::Minigunner, Faction::Coalition, 100, 0),
            unit(4, Archetype::Minigunner, Faction::Insurgents, 10, 0),
        ];
        let roster = RosterView::new(&[], &others);
        buggy.update(&roster, tenth(), &mut Vec::new());
        assert_eq!(buggy.attack_target(), Some(UnitId(3)));
    }

    #[test]
    fn test_acquisition_threshold_is_strict() {
        // view 200: threshold d^2 < 60000, sqrt ~ 244.9
        let mut buggy = unit(1, Archetype::Buggy, Faction::Insurgents, 0, 0);
        let far = [unit(2, Archetype::Humvee, Faction::Coalition, 245, 0)];
        buggy.update(&RosterView::new(&[], &far), tenth(), &mut Vec::new());
        assert_eq!(buggy.attack_target(), None);

        let near = [unit(2, Archetype::Humvee, Faction::Coalition, 244, 0)];
        buggy.update(&RosterView::new(&[], &near), tenth(), &mut Vec::new());
        assert_eq!(buggy.attack_target(), Some(UnitId(2)));
    }

    #[test]
    fn test_player_units_never_self_acquire() {
        let mut tank = unit(1, Archetype::MediumTank, Faction::Coalition, 0, 0);
        let enemies = [unit(2, Archetype::Buggy, Faction::Insurgents, 50, 0)];
        tank.update(&RosterView::new(&enemies, &[]), tenth(), &mut Vec::new());
        assert_eq!(tank.attack_target(), None);
        assert_eq!(tank.state, UnitState::Idle);
    }

    #[test]
    fn test_turret_never_moves() {
        let mut turret = unit(1, Archetype::Turret, Faction::Insurgents, 0, 0);
        let far = [unit(2, Archetype::Humvee, Faction::Coalition, 300, 0)];
        let roster = RosterView::new(&[], &far);
        for _ in 0..5 {
            turret.update(&roster, tenth(), &mut Vec::new());
        }
        assert_eq!(turret.position, px(0, 0));
        assert_eq!(turret.heading, Fixed::ZERO);
        assert_eq!(turret.attack_target(), Some(UnitId(2)));
    }

    #[test]
    fn test_pick_circle_is_enlarged_for_large_units() {
        let base = Fixed::from_num(20);
        let tank = unit(1, Archetype::MediumTank, Faction::Insurgents, 100, 100);
        let rifle = unit(2, Archetype::Minigunner, Faction::Insurgents, 100, 100);
        assert!(tank.contains_point(px(125, 100), base));
        assert!(!rifle.contains_point(px(125, 100), base));
        assert!(rifle.contains_point(px(120, 100), base));
    }
}
