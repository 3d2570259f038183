//! Test fixtures and helpers.
//!
//! Pre-built maps and mission states for consistent testing, plus an
//! exhaustive shortest-path search to check the pathfinder against.

use fixed::types::I32F32;
use skirmish_core::archetype::Archetype;
use skirmish_core::config::MissionConfig;
use skirmish_core::factions::Faction;
use skirmish_core::math::{Vec2Fixed, SQRT_2};
use skirmish_core::simulation::Simulation;
use skirmish_core::terrain::{GridMap, Tile};
use skirmish_core::unit::UnitId;

/// Tile size used by every fixture map.
pub const TILE: u32 = 32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// A pixel position.
#[must_use]
pub fn px(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// An all-open map.
#[must_use]
pub fn open_map(width: u32, height: u32) -> GridMap {
    GridMap::new(width, height, TILE)
}

/// Build a map from rows of characters.
///
/// `.` open, `~` water, `#` cliff, `=` bridge, `r` road, `f` forest,
/// `s` settlement. Any other character is open ground.
///
/// # Panics
///
/// Panics if `rows` is empty or the first row is empty.
#[must_use]
pub fn map_from_ascii(rows: &[&str]) -> GridMap {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.chars().count()) as u32;
    let mut map = GridMap::new(width, height, TILE);

    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let tile = match ch {
                '~' => Tile::Water,
                '#' => Tile::Cliff,
                '=' => Tile::Bridge,
                'r' => Tile::Road,
                'f' => Tile::Forest,
                's' => Tile::Settlement,
                _ => Tile::Open,
            };
            map.set_tile(col as i32, row as i32, tile);
        }
    }
    map
}

/// Exhaustive shortest-path cost between two tiles.
///
/// Plain Dijkstra with a linear scan for the next node and no expansion
/// limit, over the same 8-connected grid and step costs as the pathfinder.
/// Returns `None` when the goal is unreachable or either end is blocked.
#[must_use]
pub fn shortest_path_cost(map: &GridMap, start: (i32, i32), goal: (i32, i32)) -> Option<I32F32> {
    if !map.is_tile_passable(start.0, start.1) || !map.is_tile_passable(goal.0, goal.1) {
        return None;
    }

    let width = map.width() as i32;
    let height = map.height() as i32;
    let index = |(col, row): (i32, i32)| (row * width + col) as usize;
    let cells = (width * height) as usize;

    let mut dist: Vec<Option<I32F32>> = vec![None; cells];
    let mut done = vec![false; cells];
    dist[index(start)] = Some(I32F32::ZERO);

    loop {
        let mut current: Option<((i32, i32), I32F32)> = None;
        for row in 0..height {
            for col in 0..width {
                let i = index((col, row));
                if done[i] {
                    continue;
                }
                if let Some(d) = dist[i] {
                    if current.map_or(true, |(_, best)| d < best) {
                        current = Some(((col, row), d));
                    }
                }
            }
        }

        let ((col, row), d) = current?;
        if (col, row) == goal {
            return Some(d);
        }
        done[index((col, row))] = true;

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let next = (col + dx, row + dy);
                if !map.is_tile_passable(next.0, next.1) {
                    continue;
                }
                let step = if dx != 0 && dy != 0 { SQRT_2 } else { I32F32::ONE };
                let candidate = d + step;
                let slot = &mut dist[index(next)];
                if slot.map_or(true, |old| candidate < old) {
                    *slot = Some(candidate);
                }
            }
        }
    }
}

/// The scripted mission with a given map seed.
///
/// # Panics
///
/// Panics if the default config fails validation (it never does).
#[must_use]
pub fn mission(seed: u64) -> Simulation {
    Simulation::new(&MissionConfig::default().with_seed(seed))
        .expect("default mission config is valid")
}

/// Ids of a scripted one-on-one engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duel {
    /// The Coalition attacker.
    pub attacker: UnitId,
    /// The Insurgent defender.
    pub defender: UnitId,
}

/// A Coalition unit facing an Insurgent unit on an open 40x30 map.
///
/// Both stand in the north-west, well away from the objective, `gap` pixels
/// apart on the same row.
#[must_use]
pub fn duel(attacker: Archetype, defender: Archetype, gap: i32) -> (Simulation, Duel) {
    let mut sim = Simulation::with_map(open_map(40, 30));
    let attacker = sim.spawn_unit(attacker, Faction::Coalition, px(100, 100));
    let defender = sim.spawn_unit(defender, Faction::Insurgents, px(100 + gap, 100));
    (sim, Duel { attacker, defender })
}
