//! # Skirmish Core
//!
//! Deterministic simulation core for a river-crossing skirmish mission.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness or wall-clock time
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! Rendering, input capture and UI live outside. They read the public state
//! (unit positions, health, selection, fog, mission state) and feed back
//! box selections, move orders and attack orders.
//!
//! ## Crate Structure
//!
//! - [`terrain`] - Tile grid and fog of war
//! - [`map_generation`] - Seeded mission map layout
//! - [`pathfinding`] - A* over the tile grid
//! - [`archetype`] - Unit stat blocks
//! - [`unit`] - Unit state machine
//! - [`projectile`] - Projectiles in flight
//! - [`combat`] - Damage and impact resolution
//! - [`mission`] - Objectives and scripted layout
//! - [`simulation`] - Core simulation loop
//! - [`config`] - Mission configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod combat;
pub mod config;
pub mod error;
pub mod factions;
pub mod map_generation;
pub mod math;
pub mod mission;
pub mod pathfinding;
pub mod projectile;
pub mod simulation;
pub mod terrain;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{Archetype, ArchetypeStats};
    pub use crate::config::MissionConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::factions::Faction;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::mission::MissionState;
    pub use crate::projectile::{Projectile, ProjectileId, ProjectileKind};
    pub use crate::simulation::{IssuedCommand, Simulation, TickEvents};
    pub use crate::terrain::{GridMap, Tile};
    pub use crate::unit::{Unit, UnitId, UnitState};
}
