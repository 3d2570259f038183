//! Mission map generation.
//!
//! Produces the fixed river-crossing layout:
//! - A winding river with a single bridge
//! - A road through the bridge that bends toward the eastern town
//! - Two settlement clusters
//! - Two cliff bands leaving a central gap
//! - Scattered single-tile forest
//!
//! Shapes are computed with `f32` (generation only); the result is a plain
//! tile grid and the simulation never touches floats afterwards.

use serde::{Deserialize, Serialize};

use crate::terrain::{GridMap, Tile};

/// Number of forest placement attempts.
const FOREST_ATTEMPTS: u32 = 60;

/// Chance (out of 10000) that a settlement lot is built up.
const SETTLEMENT_FILL: u64 = 6000;

/// Map configuration for generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Tile size in pixels.
    pub tile_size: u32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            tile_size: 32,
            seed: 1944,
        }
    }
}

impl MapConfig {
    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Simple deterministic RNG for map generation.
struct MapRng {
    state: u64,
}

impl MapRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }

    fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next() % u64::from(bound)) as u32
    }

    /// Returns true with probability `chance / 10000`.
    fn chance(&mut self, chance: u64) -> bool {
        self.next() % 10_000 < chance
    }
}

/// Column of the river's center line at a given row.
fn river_column(width: u32, height: u32, row: i32) -> i32 {
    let w = width as f32;
    let h = height as f32;
    let base = (w * 0.4).floor() as i32;
    let y = row as f32;
    if y > h * 0.3 && y < h * 0.7 {
        base + (((y - h * 0.3) * 0.2).sin() * 8.0).floor() as i32
    } else {
        base
    }
}

/// Row of the bridge crossing.
#[must_use]
pub fn bridge_row(height: u32) -> i32 {
    (height as f32 * 0.5).floor() as i32
}

/// Generate the mission map described by `config`.
///
/// The same config (including seed) always produces the same grid.
#[must_use]
pub fn generate_mission_map(config: &MapConfig) -> GridMap {
    let mut map = GridMap::new(config.width, config.height, config.tile_size);
    let mut rng = MapRng::new(config.seed);
    let (w, h) = (config.width as f32, config.height as f32);

    // River, three tiles wide
    for row in 0..config.height as i32 {
        let col = river_column(config.width, config.height, row);
        for offset in -1..=1 {
            map.set_tile(col + offset, row, Tile::Water);
        }
    }

    // Bridge
    let bridge = bridge_row(config.height);
    let river_at_bridge = river_column(config.width, config.height, bridge);
    for col in (river_at_bridge - 2)..=(river_at_bridge + 3) {
        map.set_tile(col, bridge, Tile::Bridge);
    }

    // Road: straight up to the bridge, then a gentle diagonal east of it
    for col in 0..config.width as i32 {
        let row = if col < river_at_bridge {
            bridge
        } else {
            bridge + ((col - river_at_bridge) as f32 * 0.2).floor() as i32
        };
        if map.tile(col, row) != Some(Tile::Bridge) {
            map.set_tile(col, row, Tile::Road);
        }
    }

    // Settlements
    place_settlement(
        &mut map,
        &mut rng,
        (w * 0.3).floor() as i32,
        (h * 0.2).floor() as i32,
        3,
    );
    place_settlement(
        &mut map,
        &mut rng,
        (w * 0.8).floor() as i32,
        (h * 0.6).floor() as i32,
        5,
    );

    // Cliff bands with a gap around the road
    let cliff_col = (w * 0.6).floor() as i32;
    for row in 0..config.height as i32 {
        let y = row as f32;
        if y < h * 0.4 || y >= (h * 0.7).floor() {
            map.set_tile(cliff_col, row, Tile::Cliff);
        }
    }

    // Forest on open ground only
    for _ in 0..FOREST_ATTEMPTS {
        let col = rng.next_below(config.width) as i32;
        let row = rng.next_below(config.height) as i32;
        if map.tile(col, row) == Some(Tile::Open) {
            map.set_tile(col, row, Tile::Forest);
        }
    }

    tracing::debug!(
        width = config.width,
        height = config.height,
        seed = config.seed,
        "Generated mission map"
    );

    map
}

fn place_settlement(map: &mut GridMap, rng: &mut MapRng, col: i32, row: i32, size: i32) {
    for i in 0..size {
        for j in 0..size {
            if rng.chance(SETTLEMENT_FILL) {
                map.set_tile(col + i, row + j, Tile::Settlement);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(map: &GridMap, tile: Tile) -> usize {
        map.tiles().iter().filter(|t| **t == tile).count()
    }

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.width, 40);
        assert_eq!(config.height, 30);
        assert_eq!(config.tile_size, 32);
    }

    #[test]
    fn test_every_feature_is_present() {
        let map = generate_mission_map(&MapConfig::default());
        assert!(count(&map, Tile::Water) > 0);
        assert!(count(&map, Tile::Bridge) > 0);
        assert!(count(&map, Tile::Road) > 0);
        assert!(count(&map, Tile::Cliff) > 0);
        assert!(count(&map, Tile::Settlement) > 0);
        assert!(count(&map, Tile::Forest) > 0);
    }

    #[test]
    fn test_river_blocks_every_row_except_bridge() {
        let config = MapConfig::default();
        let map = generate_mission_map(&config);
        let bridge = bridge_row(config.height);

        for row in 0..config.height as i32 {
            let col = river_column(config.width, config.height, row);
            if row == bridge {
                assert_eq!(map.tile(col, row), Some(Tile::Bridge));
            } else {
                assert_eq!(map.tile(col, row), Some(Tile::Water), "row {row}");
            }
        }
    }

    #[test]
    fn test_cliff_band_leaves_gap() {
        let config = MapConfig::default();
        let map = generate_mission_map(&config);
        let cliff_col = (config.width as f32 * 0.6).floor() as i32;

        assert_eq!(map.tile(cliff_col, 0), Some(Tile::Cliff));
        assert_eq!(map.tile(cliff_col, config.height as i32 - 1), Some(Tile::Cliff));
        assert!(map.is_tile_passable(cliff_col, bridge_row(config.height)));
    }

    #[test]
    fn test_determinism() {
        let config = MapConfig::default().with_seed(7);
        assert_eq!(generate_mission_map(&config), generate_mission_map(&config));
    }

    #[test]
    fn test_different_seeds() {
        let a = generate_mission_map(&MapConfig::default().with_seed(1));
        let b = generate_mission_map(&MapConfig::default().with_seed(2));
        assert_ne!(a.tiles(), b.tiles());
    }

    #[test]
    fn test_starts_fully_shrouded() {
        let map = generate_mission_map(&MapConfig::default());
        assert_eq!(map.revealed_count(), 0);
    }
}
