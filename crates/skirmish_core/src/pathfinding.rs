//! Grid-based pathfinding using the A* algorithm.
//!
//! Searches the 8-connected tile grid with unit cost for straight steps and
//! √2 for diagonal steps, guided by the octile distance heuristic. All
//! costs are fixed-point so the expansion order, and therefore the returned
//! path, is identical on every platform.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::math::{Fixed, Vec2Fixed, SQRT_2};
use crate::terrain::GridMap;

/// Maximum number of node expansions before the search gives up.
pub const MAX_EXPANSIONS: usize = 2000;

/// Tile coordinates.
pub type TilePos = (i32, i32);

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    tile: TilePos,
    /// g_score + heuristic.
    f_score: Fixed,
    /// Push order; equal f-scores pop first-in first-out.
    sequence: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so compare reversed for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Cost of a single step in tile units.
#[inline]
#[must_use]
pub fn step_cost(dx: i32, dy: i32) -> Fixed {
    if dx != 0 && dy != 0 {
        SQRT_2
    } else {
        Fixed::ONE
    }
}

/// Octile distance: `(dx + dy) + (√2 − 2)·min(dx, dy)`.
///
/// Exact cost of the cheapest route on an open 8-connected grid, so it is
/// admissible and consistent.
#[inline]
#[must_use]
pub fn octile_heuristic(a: TilePos, b: TilePos) -> Fixed {
    let dx = a.0.abs_diff(b.0);
    let dy = a.1.abs_diff(b.1);
    let (low, high) = if dx < dy { (dx, dy) } else { (dy, dx) };
    Fixed::from_num(high - low) + SQRT_2 * Fixed::from_num(low)
}

/// Find a path between two pixel positions.
///
/// Returns tile-center waypoints in start-to-goal order, starting with the
/// center of the start tile. The result is empty when:
/// - the goal tile is impassable or off the map,
/// - start and goal fall in the same tile,
/// - the goal cannot be reached,
/// - the search exceeds [`MAX_EXPANSIONS`].
///
/// Callers treat an empty path as "walk straight there".
#[must_use]
pub fn find_path(map: &GridMap, start: Vec2Fixed, goal: Vec2Fixed) -> Vec<Vec2Fixed> {
    let start_tile = map.pixel_to_tile(start);
    let goal_tile = map.pixel_to_tile(goal);

    if !map.is_tile_passable(goal_tile.0, goal_tile.1) {
        return Vec::new();
    }
    if start_tile == goal_tile {
        return Vec::new();
    }

    find_path_tiles(map, start_tile, goal_tile)
        .map(|tiles| {
            tiles
                .into_iter()
                .map(|(col, row)| map.tile_center(col, row))
                .collect()
        })
        .unwrap_or_default()
}

/// A* on tile coordinates. Returns the tile sequence including both ends.
fn find_path_tiles(map: &GridMap, start: TilePos, goal: TilePos) -> Option<Vec<TilePos>> {
    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
    let mut g_score: HashMap<TilePos, Fixed> = HashMap::new();
    let mut closed: HashSet<TilePos> = HashSet::new();
    let mut sequence: u64 = 0;
    let mut expansions = 0usize;

    g_score.insert(start, Fixed::ZERO);
    open_set.push(AStarNode {
        tile: start,
        f_score: octile_heuristic(start, goal),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        // Stale entry left behind by a relaxation
        if closed.contains(&current.tile) {
            continue;
        }

        if current.tile == goal {
            return Some(reconstruct_path(&came_from, goal));
        }

        if expansions >= MAX_EXPANSIONS {
            tracing::debug!(
                ?start,
                ?goal,
                expansions,
                "Pathfinding expansion budget exhausted"
            );
            return None;
        }
        expansions += 1;
        closed.insert(current.tile);

        let current_g = g_score.get(&current.tile).copied().unwrap_or(Fixed::MAX);

        for &(dx, dy) in &DIRECTIONS {
            let neighbor = (current.tile.0 + dx, current.tile.1 + dy);

            if !map.is_tile_passable(neighbor.0, neighbor.1) || closed.contains(&neighbor) {
                continue;
            }

            let tentative_g = current_g + step_cost(dx, dy);
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(Fixed::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.tile);
                g_score.insert(neighbor, tentative_g);
                sequence += 1;
                open_set.push(AStarNode {
                    tile: neighbor,
                    f_score: tentative_g + octile_heuristic(neighbor, goal),
                    sequence,
                });
            }
        }
    }

    None
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<TilePos, TilePos>, goal: TilePos) -> Vec<TilePos> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// Total step cost of a waypoint path, in tile units.
///
/// Consecutive waypoints must be neighbouring tile centers, as produced by
/// [`find_path`].
#[must_use]
pub fn path_cost(map: &GridMap, path: &[Vec2Fixed]) -> Fixed {
    path.windows(2)
        .map(|pair| {
            let a = map.pixel_to_tile(pair[0]);
            let b = map.pixel_to_tile(pair[1]);
            step_cost(b.0 - a.0, b.1 - a.1)
        })
        .fold(Fixed::ZERO, |acc, cost| acc + cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Tile;

    fn center(map: &GridMap, col: i32, row: i32) -> Vec2Fixed {
        map.tile_center(col, row)
    }

    #[test]
    fn test_heuristic_values() {
        assert_eq!(octile_heuristic((0, 0), (5, 0)), Fixed::from_num(5));
        assert_eq!(octile_heuristic((0, 0), (3, 3)), SQRT_2 * 3);
        assert_eq!(
            octile_heuristic((0, 0), (3, 7)),
            Fixed::from_num(4) + SQRT_2 * 3
        );
        assert_eq!(octile_heuristic((5, 5), (5, 5)), Fixed::ZERO);
    }

    #[test]
    fn test_diagonal_path_on_open_grid() {
        let map = GridMap::new(10, 10, 32);
        let path = find_path(&map, center(&map, 0, 0), center(&map, 9, 9));

        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&center(&map, 0, 0)));
        assert_eq!(path.last(), Some(&center(&map, 9, 9)));

        let cost = path_cost(&map, &path);
        assert_eq!(cost, SQRT_2 * 9);
        // ≈ 12.73
        assert!(cost > Fixed::from_num(12.72) && cost < Fixed::from_num(12.74));
    }

    #[test]
    fn test_path_around_wall() {
        let mut map = GridMap::new(10, 10, 32);
        for row in 2..8 {
            map.set_tile(5, row, Tile::Cliff);
        }

        let path = find_path(&map, center(&map, 2, 5), center(&map, 8, 5));
        assert!(!path.is_empty());
        for point in &path {
            assert!(map.is_pixel_passable(*point), "path crosses {point:?}");
        }
    }

    #[test]
    fn test_no_path_through_complete_barrier() {
        let mut map = GridMap::new(10, 10, 32);
        for row in 0..10 {
            map.set_tile(5, row, Tile::Water);
        }

        let path = find_path(&map, center(&map, 2, 5), center(&map, 8, 5));
        assert!(path.is_empty());
    }

    #[test]
    fn test_same_tile_is_empty() {
        let map = GridMap::new(10, 10, 32);
        let start = Vec2Fixed::from_int(40, 40);
        let goal = Vec2Fixed::from_int(60, 60);
        assert!(find_path(&map, start, goal).is_empty());
    }

    #[test]
    fn test_blocked_goal_is_empty() {
        let mut map = GridMap::new(10, 10, 32);
        map.set_tile(5, 5, Tile::Cliff);
        assert!(find_path(&map, center(&map, 0, 0), center(&map, 5, 5)).is_empty());
    }

    #[test]
    fn test_off_map_goal_is_empty() {
        let map = GridMap::new(10, 10, 32);
        let goal = Vec2Fixed::from_int(-50, 40);
        assert!(find_path(&map, center(&map, 0, 0), goal).is_empty());
    }

    #[test]
    fn test_diagonal_may_pass_between_blocked_corners() {
        let mut map = GridMap::new(3, 3, 32);
        // Only the anti-diagonal is open.
        for (col, row) in [(1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2)] {
            map.set_tile(col, row, Tile::Water);
        }
        let path = find_path(&map, center(&map, 0, 0), center(&map, 2, 2));
        assert_eq!(path.len(), 3);
        assert_eq!(path_cost(&map, &path), SQRT_2 * 2);
    }

    #[test]
    fn test_unreachable_goal_hits_expansion_cap() {
        // Large open field with the goal sealed in a ring of cliffs.
        let mut map = GridMap::new(80, 80, 32);
        for col in 69..=71 {
            for row in 69..=71 {
                if (col, row) != (70, 70) {
                    map.set_tile(col, row, Tile::Cliff);
                }
            }
        }

        let path = find_path(&map, center(&map, 0, 0), center(&map, 70, 70));
        assert!(path.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut map = GridMap::new(20, 20, 32);
        for row in 5..15 {
            map.set_tile(10, row, Tile::Cliff);
        }

        let start = center(&map, 5, 10);
        let goal = center(&map, 15, 10);
        let path1 = find_path(&map, start, goal);
        let path2 = find_path(&map, start, goal);
        assert!(!path1.is_empty());
        assert_eq!(path1, path2);
    }
}
