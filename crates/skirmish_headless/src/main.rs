//! Headless skirmish mission runner.
//!
//! Runs the mission without graphics. Results go to stdout, logs to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play the mission under the autopilot
//! cargo run -p skirmish_headless -- run --config mission.ron --ticks 6000
//!
//! # Verify determinism across parallel runs
//! cargo run -p skirmish_headless -- verify --runs 8
//!
//! # Ask the pathfinder for a route
//! cargo run -p skirmish_headless -- path --from 50,860 --to 1024,576
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_headless::{
    plan_path, render_battlefield, verify_determinism, AsciiConfig, MissionRunner, RunConfig,
    RunnerError,
};

/// Ticks between ASCII frames in `run --ascii`.
const ASCII_EVERY: u64 = 200;

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish mission runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the mission once
    Run {
        /// Run config file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tick budget (overrides the config)
        #[arg(long)]
        ticks: Option<u64>,

        /// Frame length in milliseconds (overrides the config)
        #[arg(long)]
        frame_ms: Option<u32>,

        /// Map seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Leave the task force idle
        #[arg(long)]
        no_autopilot: bool,

        /// Print the battlefield periodically and at the end
        #[arg(long)]
        ascii: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify determinism by running the same mission several times
    Verify {
        /// Run config file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of parallel runs
        #[arg(short, long, default_value = "4")]
        runs: u32,

        /// Tick budget (overrides the config)
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Print the A* path between two pixel positions
    Path {
        /// Start as X,Y in pixels
        #[arg(long, value_parser = parse_point)]
        from: (i32, i32),

        /// Goal as X,Y in pixels
        #[arg(long, value_parser = parse_point)]
        to: (i32, i32),

        /// Run config file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_point(text: &str) -> Result<(i32, i32), String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{text}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            config,
            ticks,
            frame_ms,
            seed,
            no_autopilot,
            ascii,
            json,
        } => load(config).and_then(|mut run| {
            if let Some(ticks) = ticks {
                run.ticks = ticks;
            }
            if let Some(frame_ms) = frame_ms {
                run.frame_ms = frame_ms;
            }
            if let Some(seed) = seed {
                run.mission.map_seed = seed;
            }
            run.autopilot &= !no_autopilot;
            cmd_run(run, ascii, json)
        }),
        Commands::Verify {
            config,
            runs,
            ticks,
        } => load(config).and_then(|mut run| {
            if let Some(ticks) = ticks {
                run.ticks = ticks;
            }
            cmd_verify(&run, runs)
        }),
        Commands::Path { from, to, config } => {
            load(config).and_then(|run| cmd_path(&run, from, to))
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<PathBuf>) -> Result<RunConfig, RunnerError> {
    if let Some(path) = &path {
        tracing::info!("Loading run config from: {}", path.display());
    }
    RunConfig::load_or_default(path.as_deref())
}

/// Play the mission once
fn cmd_run(config: RunConfig, ascii: bool, json: bool) -> Result<ExitCode, RunnerError> {
    tracing::info!(
        seed = config.mission.map_seed,
        ticks = config.ticks,
        frame_ms = config.frame_ms,
        autopilot = config.autopilot,
        "Starting run"
    );

    config.validate()?;
    let runner = MissionRunner::new(config)?;
    let view = AsciiConfig::default();
    if ascii {
        println!("{}", render_battlefield(runner.simulation(), &view));
    }

    let mut last_frame = None;
    let report = runner.run_with(|sim| {
        if ascii && sim.tick() % ASCII_EVERY == 0 {
            println!("{}", render_battlefield(sim, &view));
        }
        if ascii && sim.mission_state().is_terminal() {
            last_frame = Some(render_battlefield(sim, &view));
        }
    });
    if let Some(frame) = last_frame {
        println!("{frame}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Mission: {} after {} ticks", report.mission, report.ticks);
        println!(
            "Losses: coalition {} / insurgents {}",
            report.coalition_losses, report.insurgent_losses
        );
        println!("Shots fired: {}  damage dealt: {}", report.shots_fired, report.damage_dealt);
        if let Some(tick) = report.reinforcements_at {
            println!("Reinforcements arrived at tick {tick}");
        }
        println!("State hash: {:016x}", report.final_state_hash);
    }
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism
fn cmd_verify(config: &RunConfig, runs: u32) -> Result<ExitCode, RunnerError> {
    tracing::info!(
        "Verifying determinism: seed {} ({} runs, {} ticks)",
        config.mission.map_seed,
        runs,
        config.ticks
    );

    let report = verify_determinism(config, runs)?;
    if report.is_deterministic() {
        println!("PASS: All {} runs produced identical results", report.runs);
        if let Some(hash) = report.final_hashes.first() {
            println!("  Final hash: {hash:016x}");
        }
        Ok(ExitCode::SUCCESS)
    } else {
        println!("FAIL: Non-determinism detected!");
        if let Some(tick) = report.first_divergence {
            println!("  First divergence at tick {tick}");
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Print a planned path
fn cmd_path(config: &RunConfig, from: (i32, i32), to: (i32, i32)) -> Result<ExitCode, RunnerError> {
    let report = plan_path(config, from, to)?;
    if report.tiles.is_empty() {
        println!("No path from {from:?} to {to:?}");
        return Ok(ExitCode::FAILURE);
    }
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::SUCCESS)
}
