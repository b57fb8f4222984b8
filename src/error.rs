//! Construction-time validation errors
//!
//! Everything past construction is total; these are the only failures.

use thiserror::Error;

/// Error type for building bodies, rings, configs and scenarios.
#[derive(Debug, Error)]
pub enum SimError {
    /// Radius must be finite and strictly positive.
    #[error("invalid radius {0}: must be finite and > 0")]
    InvalidRadius(f64),
    /// Restitution outside [0, 2].
    #[error("invalid restitution {0}: must be within [0, 2]")]
    InvalidRestitution(f64),
    /// Opening width outside [0, 360).
    #[error("invalid opening width {0}: must be within [0, 360)")]
    InvalidOpening(f64),
    /// Ring thickness must be finite and non-negative.
    #[error("invalid thickness {0}: must be finite and >= 0")]
    InvalidThickness(f64),
    /// Ring life below zero.
    #[error("negative ring life {0}")]
    NegativeLife(i64),
    /// A position, velocity or other scalar was NaN or infinite.
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    /// Bounce-on-contact and break-in-opening were both requested.
    #[error("collision_on_contact and break_in_opening are mutually exclusive")]
    ConflictingPolicy,
    /// Playfield dimensions, margin or quadtree limits are unusable.
    #[error("invalid playfield: {0}")]
    InvalidPlayfield(String),
    /// No built-in scenario with this name.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    /// I/O error while reading/writing a scenario file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Scenario JSON failed to (de)serialize.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
