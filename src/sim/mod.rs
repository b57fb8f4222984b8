//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Single-threaded, fixed phase order per step
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod quadtree;
pub mod ring;
pub mod state;
pub mod tick;

pub use body::{Body, mass_for_radius};
pub use collision::{
    RingHit, RingPolicy, RingProbe, RingSide, probe_ring, reflect_velocity, resolve_body_pair,
    resolve_body_ring, subtended_half_width_deg,
};
pub use quadtree::{Quadtree, Rect, broad_phase_pairs, brute_force_pairs};
pub use ring::RingObstacle;
pub use state::{BodyView, Playfield, RingDestroyed, RingView, SimConfig, Simulation, Snapshot};
pub use tick::{LogObserver, StepObserver, StepSummary, step};
