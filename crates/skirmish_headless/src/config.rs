//! Run configuration loading.
//!
//! A run file wraps a [`MissionConfig`] with the settings of the headless
//! driver itself:
//!
//! ```text
//! (
//!     mission: (map_seed: 7),
//!     ticks: 6000,
//!     frame_ms: 16,
//!     autopilot: true,
//!     autopilot_interval: 60,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::config::{MissionConfig, MAX_STEP_MS};
use skirmish_core::error::GameError;
use skirmish_core::math::Fixed;
use thiserror::Error;

/// Error type for runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// File not found.
    #[error("Run config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read run config: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse run config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to encode a report.
    #[error("Failed to encode report: {0}")]
    JsonError(#[from] serde_json::Error),
    /// The simulation rejected the mission.
    #[error(transparent)]
    Game(#[from] GameError),
    /// A run setting is unusable.
    #[error("Invalid run config: {0}")]
    Invalid(String),
}

/// Everything a headless run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// The mission itself.
    pub mission: MissionConfig,
    /// Tick budget for a run.
    pub ticks: u64,
    /// Simulated frame length in milliseconds.
    pub frame_ms: u32,
    /// Let the scripted player issue orders.
    pub autopilot: bool,
    /// Ticks between autopilot decisions.
    pub autopilot_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mission: MissionConfig::default(),
            ticks: 6000,
            frame_ms: 16,
            autopilot: true,
            autopilot_interval: 60,
        }
    }
}

impl RunConfig {
    /// Load a run config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RunnerError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, RunnerError> {
        let config: RunConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, RunnerError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Check the driver settings and the mission.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.frame_ms == 0 || self.frame_ms > MAX_STEP_MS {
            return Err(RunnerError::Invalid(format!(
                "frame_ms must be in 1..={MAX_STEP_MS}, got {}",
                self.frame_ms
            )));
        }
        if self.autopilot_interval == 0 {
            return Err(RunnerError::Invalid("autopilot_interval must be positive".into()));
        }
        self.mission.validate()?;
        Ok(())
    }

    /// Frame length in seconds.
    #[must_use]
    pub fn frame_dt(&self) -> Fixed {
        Fixed::from_num(self.frame_ms) / 1000
    }
}
