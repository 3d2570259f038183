//! Error types for the mission simulation.

use thiserror::Error;

use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all mission simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A unit handle no longer resolves to a live unit.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Mission configuration parsing error.
    #[error("Failed to parse mission config: {message}")]
    ConfigParse {
        /// Error message from the parser.
        message: String,
    },

    /// Mission configuration is well-formed but unusable.
    #[error("Invalid mission config: {0}")]
    InvalidConfig(String),
}
