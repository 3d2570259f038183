//! Headless mission runner for scripted play-throughs and CI verification.
//!
//! Drives the deterministic core without graphics:
//!
//! - **Play-throughs**: run the mission under a scripted autopilot and report
//!   the outcome as JSON
//! - **Determinism checks**: run the same mission several times in parallel
//!   and compare the state hash after every tick
//! - **Path queries**: print the A* route between two points on the mission map
//!
//! # Example
//!
//! ```bash
//! # Play the default mission and print a JSON summary
//! cargo run -p skirmish_headless -- run --json
//!
//! # Watch the battlefield every 200 ticks
//! cargo run -p skirmish_headless -- run --ascii --seed 7
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --runs 4
//! ```

pub mod ascii;
pub mod autopilot;
pub mod config;
pub mod runner;

pub use ascii::{render_battlefield, AsciiConfig};
pub use autopilot::Autopilot;
pub use config::{RunConfig, RunnerError};
pub use runner::{
    plan_path, run_mission, verify_determinism, MissionRunner, PathReport, RunReport,
    VerifyReport,
};
