//! Simulation state and configuration
//!
//! The simulation owns every body and ring for the length of a run. Rendering
//! and effects collaborators only see snapshots and drained events.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::RingPolicy;
use super::ring::RingObstacle;
use super::tick::{StepObserver, StepSummary};
use crate::consts::*;
use crate::error::SimError;

/// Visible area; bodies are culled `cull_margin` beyond it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
        }
    }
}

/// Physics configuration, fixed for the lifetime of a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Base gravity (px/s²), scaled per body
    pub gravity: f64,
    /// Ball-ball restitution; impulse factor is (1 + this)
    pub restitution_combined: f64,
    pub policy: RingPolicy,
    pub playfield: Playfield,
    pub cull_margin: f64,
    pub quadtree_capacity: usize,
    pub quadtree_max_depth: u32,
    /// Seed for the RNG that separates coincident bodies
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY_BASE,
            restitution_combined: DEFAULT_RESTITUTION_COMBINED,
            policy: RingPolicy::default(),
            playfield: Playfield::default(),
            cull_margin: CULL_MARGIN,
            quadtree_capacity: QUADTREE_CAPACITY,
            quadtree_max_depth: QUADTREE_MAX_DEPTH,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        let Playfield { width, height } = self.playfield;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SimError::InvalidPlayfield(format!("size {width}x{height}")));
        }
        if !self.cull_margin.is_finite() || self.cull_margin < 0.0 {
            return Err(SimError::InvalidPlayfield(format!("cull margin {}", self.cull_margin)));
        }
        if self.quadtree_capacity == 0 {
            return Err(SimError::InvalidPlayfield("quadtree capacity 0".to_string()));
        }
        if !self.gravity.is_finite() {
            return Err(SimError::NonFinite("gravity"));
        }
        if !self.restitution_combined.is_finite() || self.restitution_combined < 0.0 {
            return Err(SimError::InvalidRestitution(self.restitution_combined));
        }
        Ok(())
    }
}

/// Emitted once per destroyed ring, for the visual-effects collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingDestroyed {
    pub ring_id: u32,
    /// Last contact point (ring center if it never had one)
    pub position: DVec2,
    pub radius: f64,
}

/// Read-only body data for drawing
#[derive(Debug, Clone, Serialize)]
pub struct BodyView {
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
}

/// Read-only ring data for drawing
#[derive(Debug, Clone, Serialize)]
pub struct RingView {
    pub id: u32,
    pub center: DVec2,
    pub radius: f64,
    pub thickness: f64,
    pub opening_width_deg: f64,
    pub rotation_deg: f64,
    pub life: u32,
    pub life_max: u32,
    pub color: [u8; 3],
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub bodies: Vec<BodyView>,
    pub rings: Vec<RingView>,
}

/// Complete simulation state (deterministic for a given dt sequence)
pub struct Simulation {
    pub(crate) config: SimConfig,
    /// Active bodies, in spawn order
    pub(crate) bodies: Vec<Body>,
    /// Active rings, in spawn order
    pub(crate) rings: Vec<RingObstacle>,
    /// Destruction events not yet drained
    pub(crate) events: Vec<RingDestroyed>,
    pub(crate) rng: Pcg32,
    pub(crate) observer: Option<Box<dyn StepObserver>>,
    /// Simulated seconds
    pub(crate) time: f64,
    pub(crate) step_index: u64,
    pub(crate) last_summary: Option<StepSummary>,
    next_id: u32,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("bodies", &self.bodies.len())
            .field("rings", &self.rings.len())
            .field("pending_events", &self.events.len())
            .field("time", &self.time)
            .field("step_index", &self.step_index)
            .finish()
    }
}

impl Simulation {
    /// Create an empty simulation
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let rng = Pcg32::seed_from_u64(config.seed);
        Ok(Self {
            config,
            bodies: Vec::new(),
            rings: Vec::new(),
            events: Vec::new(),
            rng,
            observer: None,
            time: 0.0,
            step_index: 0,
            last_summary: None,
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a body; returns its id
    pub fn spawn_body(
        &mut self,
        pos: DVec2,
        vel: DVec2,
        radius: f64,
        restitution: f64,
        gravity_scale: f64,
    ) -> Result<u32, SimError> {
        let id = self.next_id;
        let body = Body::new(id, pos, vel, radius, restitution, gravity_scale)?;
        self.next_id += 1;
        self.bodies.push(body);
        Ok(id)
    }

    /// Add a ring; returns its id
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_ring(
        &mut self,
        center: DVec2,
        radius: f64,
        thickness: f64,
        opening_width_deg: f64,
        rotation_deg: f64,
        rotation_speed_deg_per_s: f64,
        life: i64,
    ) -> Result<u32, SimError> {
        let id = self.next_id;
        let ring = RingObstacle::new(
            id,
            center,
            radius,
            thickness,
            opening_width_deg,
            rotation_deg,
            rotation_speed_deg_per_s,
            life,
        )?;
        self.next_id += 1;
        self.rings.push(ring);
        Ok(id)
    }

    /// Install the observability hook (replaces any previous one)
    pub fn set_observer(&mut self, observer: Box<dyn StepObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn rings(&self) -> &[RingObstacle] {
        &self.rings
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    /// Summary of the most recent non-empty step
    pub fn last_summary(&self) -> Option<&StepSummary> {
        self.last_summary.as_ref()
    }

    /// Pending destruction events (not cleared)
    pub fn events(&self) -> &[RingDestroyed] {
        &self.events
    }

    /// Take and clear pending destruction events
    pub fn drain_events(&mut self) -> Vec<RingDestroyed> {
        std::mem::take(&mut self.events)
    }

    /// True once nothing is left that could still change
    pub fn is_finished(&self) -> bool {
        self.bodies.is_empty() || (self.rings.is_empty() && self.config.policy != RingPolicy::Inert)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.time,
            bodies: self
                .bodies
                .iter()
                .map(|b| BodyView {
                    id: b.id,
                    pos: b.pos,
                    vel: b.vel,
                    radius: b.radius,
                })
                .collect(),
            rings: self
                .rings
                .iter()
                .map(|r| RingView {
                    id: r.id,
                    center: r.center,
                    radius: r.radius,
                    thickness: r.thickness,
                    opening_width_deg: r.opening_width_deg,
                    rotation_deg: r.rotation_deg,
                    life: r.life,
                    life_max: r.life_max,
                    color: r.color(),
                })
                .collect(),
        }
    }

    /// Advance by `dt` seconds (see `tick::step`)
    pub fn step(&mut self, dt: f64) -> StepSummary {
        super::tick::step(self, dt)
    }
}
