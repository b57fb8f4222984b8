//! Ring Bounce - bouncing balls inside rotating, breakable rings
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, collisions, quadtree, frame step)
//! - `scenario`: Serializable spawn/config layer with built-in presets
//! - `error`: Validation errors raised at construction time

pub mod error;
pub mod scenario;
pub mod sim;

pub use error::SimError;
pub use scenario::{Preset, Scenario};
pub use sim::{RingDestroyed, RingPolicy, SimConfig, Simulation};

use glam::DVec2;

/// Simulation constants
pub mod consts {
    /// Screen-space gravity (px/s²), stand-in for 9.8 m/s²
    pub const GRAVITY_BASE: f64 = 980.0;
    /// Ball-ball restitution; the impulse uses (1 + this)
    pub const DEFAULT_RESTITUTION_COMBINED: f64 = 0.8;

    /// Squared distance under which two bodies count as coincident
    pub const COINCIDENT_DIST_SQ: f64 = 1e-4;
    /// Separation assumed for coincident bodies
    pub const COINCIDENT_DISTANCE: f64 = 0.01;
    /// Floor for derived masses
    pub const MIN_MASS: f64 = 1e-4;
    /// Gap left between a body and a ring surface after a bounce
    pub const RING_CONTACT_EPSILON: f64 = 0.01;
    /// Distance below which a body sits on a ring's center
    pub const DISTANCE_EPSILON: f64 = 1e-9;

    /// Playfield defaults (pixels)
    pub const PLAYFIELD_WIDTH: f64 = 1200.0;
    pub const PLAYFIELD_HEIGHT: f64 = 800.0;
    /// Bodies further than this outside the playfield are removed
    pub const CULL_MARGIN: f64 = 100.0;

    /// Quadtree defaults
    pub const QUADTREE_CAPACITY: usize = 4;
    pub const QUADTREE_MAX_DEPTH: u32 = 10;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest angular distance between two angles, in [0, 180]
#[inline]
pub fn angular_distance_deg(a: f64, b: f64) -> f64 {
    let d = normalize_degrees(a - b);
    if d > 180.0 { 360.0 - d } else { d }
}

/// Unit vector pointing at `theta` degrees
#[inline]
pub fn direction_deg(theta: f64) -> DVec2 {
    let rad = theta.to_radians();
    DVec2::new(rad.cos(), rad.sin())
}

/// Convert cartesian (x, y) to polar (r, theta in degrees [0, 360))
#[inline]
pub fn cartesian_to_polar_deg(pos: DVec2) -> (f64, f64) {
    (pos.length(), normalize_degrees(pos.y.atan2(pos.x).to_degrees()))
}
