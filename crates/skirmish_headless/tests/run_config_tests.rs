//! Run config files on disk and end-to-end runs built from them.

use std::io::Write;

use skirmish_headless::{run_mission, verify_determinism, RunConfig, RunnerError};

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn loads_partial_config_from_disk() {
    let file = write_config(
        r"(
            mission: (map_seed: 42, objective_radius: 300),
            ticks: 90,
            autopilot: false,
        )",
    );

    let config = RunConfig::load(file.path()).unwrap();
    assert_eq!(config.mission.map_seed, 42);
    assert_eq!(config.mission.objective_radius, 300);
    assert_eq!(config.mission.world_width, 1280);
    assert_eq!(config.ticks, 90);
    assert!(!config.autopilot);
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_config("(ticks: \"many\")");
    let err = RunConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::ParseError(_)));
}

#[test]
fn invalid_mission_in_file_is_rejected() {
    let file = write_config("(mission: (world_width: 8, tile_size: 32))");
    let err = RunConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, RunnerError::Game(_)));
}

#[test]
fn config_from_disk_drives_a_run() {
    let file = write_config("(ticks: 100, frame_ms: 50, mission: (map_seed: 5))");
    let config = RunConfig::load(file.path()).unwrap();

    let report = run_mission(&config).unwrap();
    assert_eq!(report.seed, 5);
    assert!(report.ticks <= 100);
    assert!(report.coalition_alive + report.coalition_losses >= 4);
}

#[test]
fn report_serializes_to_json() {
    let config = RunConfig {
        ticks: 30,
        ..RunConfig::default()
    };
    let report = run_mission(&config).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["seed"], 1944);
    assert_eq!(json["ticks"], 30);
    assert!(json["final_state_hash"].is_u64());
}

#[test]
fn verify_catches_no_divergence_for_file_config() {
    let file = write_config("(ticks: 120, frame_ms: 33)");
    let config = RunConfig::load(file.path()).unwrap();
    let report = verify_determinism(&config, 3).unwrap();
    assert!(report.is_deterministic());
}
