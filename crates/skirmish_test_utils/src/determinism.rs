//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the simulation has to avoid:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Rosters are plain vectors iterated in spawn order.
//!
//! - **Wall-clock time**: Fire timing counts simulated milliseconds, never
//!   host time.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual modules (pathfinding, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full mission runs are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::thread;

use skirmish_core::math::Fixed;
use skirmish_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run `setup` twice for `num_ticks` ticks of `dt` and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.update(dt);
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Per-tick hash trace of one run, starting with the state before tick 1.
pub fn hash_trace<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Vec<u64>
where
    F: FnOnce() -> Simulation,
{
    let mut sim = setup_fn();
    let mut trace = Vec::with_capacity(num_ticks as usize + 1);
    trace.push(sim.state_hash());
    for _ in 0..num_ticks {
        sim.update(dt);
        trace.push(sim.state_hash());
    }
    trace
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
    dt: Fixed,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.update(dt);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// simulations start to differ.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.update(dt);
        sim2.update(dt);

        let (a, b) = (sim1.state_hash(), sim2.state_hash());
        if a != b {
            tracing::warn!(tick, hash_a = a, hash_b = b, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation inputs.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::archetype::Archetype;
    use skirmish_core::math::{Fixed, Vec2Fixed};
    use skirmish_core::terrain::{GridMap, Tile};

    use crate::fixtures::TILE;

    /// A player input between ticks.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Input {
        /// Box selection between two corners.
        Select(Vec2Fixed, Vec2Fixed),
        /// Context click.
        Click(Vec2Fixed),
        /// Let a number of ticks pass.
        Wait(u8),
    }

    /// Whole-pixel coordinate inside a `limit`-pixel span.
    pub fn arb_pixel(limit: i32) -> impl Strategy<Value = Fixed> {
        (0..limit).prop_map(Fixed::from_num)
    }

    /// Pixel position inside a `width` x `height` pixel world.
    pub fn arb_point(width: i32, height: i32) -> impl Strategy<Value = Vec2Fixed> {
        (arb_pixel(width), arb_pixel(height)).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Tick length between 0 and 150 ms (values above the cap get clamped).
    pub fn arb_dt() -> impl Strategy<Value = Fixed> {
        (0i32..=150).prop_map(|ms| Fixed::from_num(ms) / 1000)
    }

    /// Any archetype.
    pub fn arb_archetype() -> impl Strategy<Value = Archetype> {
        proptest::sample::select(Archetype::ALL.to_vec())
    }

    /// Generate damage values (0-100).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        0u32..=100u32
    }

    /// Generate armor values (0-10).
    pub fn arb_armor() -> impl Strategy<Value = u32> {
        0u32..=10u32
    }

    /// A map of the given size with roughly `blocked_percent` impassable tiles.
    pub fn arb_map(width: u32, height: u32, blocked_percent: u32) -> impl Strategy<Value = GridMap> {
        let cells = (width * height) as usize;
        proptest::collection::vec(0u32..100, cells).prop_map(move |rolls| {
            let mut map = GridMap::new(width, height, TILE);
            for (i, roll) in rolls.into_iter().enumerate() {
                if roll < blocked_percent {
                    let col = (i as u32 % width) as i32;
                    let row = (i as u32 / width) as i32;
                    map.set_tile(col, row, if roll % 2 == 0 { Tile::Water } else { Tile::Cliff });
                }
            }
            map
        })
    }

    /// A tile coordinate on a `width` x `height` map.
    pub fn arb_tile(width: u32, height: u32) -> impl Strategy<Value = (i32, i32)> {
        (0..width as i32, 0..height as i32)
    }

    /// One player input.
    pub fn arb_input(width: i32, height: i32) -> impl Strategy<Value = Input> {
        prop_oneof![
            (arb_point(width, height), arb_point(width, height))
                .prop_map(|(a, b)| Input::Select(a, b)),
            arb_point(width, height).prop_map(Input::Click),
            (1u8..30).prop_map(Input::Wait),
        ]
    }

    /// Generate a sequence of inputs.
    pub fn arb_input_script(
        width: i32,
        height: i32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<Input>> {
        proptest::collection::vec(arb_input(width, height), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::archetype::Archetype;
    use skirmish_core::factions::Faction;

    use crate::fixtures::{duel, mission, open_map, px};

    fn tick() -> Fixed {
        Fixed::ONE / 20
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_simulation_determinism() {
        assert!(verify_simulation_determinism(
            || Simulation::with_map(open_map(10, 10)),
            100,
            tick()
        ));
    }

    #[test]
    fn test_duel_determinism() {
        let is_det = verify_simulation_determinism(
            || duel(Archetype::MediumTank, Archetype::LightTank, 150).0,
            300,
            tick(),
        );
        assert!(is_det);
    }

    #[test]
    fn test_mission_has_no_divergence() {
        let divergence = find_first_divergence(|| mission(1944), 200, tick());
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_parallel_runs_match() {
        let result = run_parallel_simulations(
            || {
                let mut sim = mission(7);
                sim.select_in_box(px(0, 700), px(300, 960));
                sim.issue_move(px(600, 480));
                sim
            },
            4,
            150,
            tick(),
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_hash_trace_changes_as_units_move() {
        let trace = hash_trace(
            || {
                let mut sim = Simulation::with_map(open_map(20, 20));
                sim.spawn_unit(Archetype::Humvee, Faction::Coalition, px(48, 48));
                sim.select_in_box(px(0, 0), px(64, 64));
                sim.issue_move(px(500, 48));
                sim
            },
            5,
            tick(),
        );
        assert_eq!(trace.len(), 6);
        assert!(trace.windows(2).all(|w| w[0] != w[1]));
    }
}
