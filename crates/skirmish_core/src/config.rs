//! Mission configuration.
//!
//! Parsed from RON text. File loading lives in the runner; the core only
//! ever sees a string.
//!
//! ```text
//! (
//!     world_width: 1280,
//!     world_height: 960,
//!     tile_size: 32,
//!     map_seed: 1944,
//!     max_step_ms: 100,
//!     objective_radius: 250,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::map_generation::MapConfig;
use crate::math::Fixed;

/// Upper bound on either world dimension, in pixels.
///
/// Keeps squared pixel distances inside the fixed-point range.
pub const MAX_WORLD_SIZE: u32 = 16_384;

/// Upper bound on `max_step_ms`.
pub const MAX_STEP_MS: u32 = 1_000;

/// Tunable parameters of a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// World width in pixels.
    pub world_width: u32,
    /// World height in pixels.
    pub world_height: u32,
    /// Tile edge in pixels.
    pub tile_size: u32,
    /// Seed for terrain generation.
    pub map_seed: u64,
    /// Largest time step a single tick may simulate, in milliseconds.
    pub max_step_ms: u32,
    /// Distance from the town center that triggers reinforcements.
    pub objective_radius: u32,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            world_width: 1280,
            world_height: 960,
            tile_size: 32,
            map_seed: 1944,
            max_step_ms: 100,
            objective_radius: 250,
        }
    }
}

impl MissionConfig {
    /// Parse and validate a RON document. Missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::ConfigParse {
                message: e.to_string(),
            }
        })
    }

    /// Check that the values describe a usable mission.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(GameError::InvalidConfig("tile_size must be positive".into()));
        }
        if self.world_width < self.tile_size || self.world_height < self.tile_size {
            return Err(GameError::InvalidConfig(format!(
                "world {}x{} is smaller than one {} px tile",
                self.world_width, self.world_height, self.tile_size
            )));
        }
        if self.world_width > MAX_WORLD_SIZE || self.world_height > MAX_WORLD_SIZE {
            return Err(GameError::InvalidConfig(format!(
                "world {}x{} exceeds {MAX_WORLD_SIZE} px",
                self.world_width, self.world_height
            )));
        }
        if self.max_step_ms == 0 || self.max_step_ms > MAX_STEP_MS {
            return Err(GameError::InvalidConfig(format!(
                "max_step_ms must be in 1..={MAX_STEP_MS}, got {}",
                self.max_step_ms
            )));
        }
        if self.objective_radius == 0 || self.objective_radius > MAX_WORLD_SIZE {
            return Err(GameError::InvalidConfig(format!(
                "objective_radius must be in 1..={MAX_WORLD_SIZE}, got {}",
                self.objective_radius
            )));
        }
        Ok(())
    }

    /// Map size in whole tiles (partial tiles at the edge are dropped).
    #[must_use]
    pub const fn map_config(&self) -> MapConfig {
        MapConfig {
            width: self.world_width / self.tile_size,
            height: self.world_height / self.tile_size,
            tile_size: self.tile_size,
            seed: self.map_seed,
        }
    }

    /// Largest tick step in seconds.
    #[must_use]
    pub fn max_step(&self) -> Fixed {
        Fixed::from_num(self.max_step_ms) / 1000
    }

    /// Objective trigger radius.
    #[must_use]
    pub fn objective_radius(&self) -> Fixed {
        Fixed::from_num(self.objective_radius)
    }

    /// Replace the map seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.map_seed = seed;
        self
    }
}
