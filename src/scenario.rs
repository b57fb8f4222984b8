//! Scenario files: the spawn list plus screen/physics settings
//!
//! Scenarios are plain JSON so they can be written by hand or by an editor.
//! Every field has a default, so `{}` is a valid (empty) scenario.

use std::fs;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::sim::{Playfield, RingPolicy, SimConfig, Simulation};

/// Built-in scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// Nested rotating rings, balls bounce and wear them down
    #[default]
    Classic,
    /// Balls never bounce; threading an opening shatters the ring
    Piercing,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Classic, Preset::Piercing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Classic => "classic",
            Preset::Piercing => "piercing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "classique" => Some(Preset::Classic),
            "piercing" | "pierce" => Some(Preset::Piercing),
            _ => None,
        }
    }
}

/// Window/run settings and physics knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSpec {
    pub width: f64,
    pub height: f64,
    /// Frames per second; the driver steps with dt = 1/fps
    pub fps: u32,
    /// Stop after this many simulated seconds (None = until finished)
    pub duration_secs: Option<f64>,
    pub collision_on_contact: bool,
    pub break_in_opening: bool,
    pub cull_margin: f64,
    pub gravity: f64,
    pub restitution_combined: f64,
    pub seed: u64,
}

impl Default for ScreenSpec {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            fps: 60,
            duration_secs: None,
            collision_on_contact: true,
            break_in_opening: false,
            cull_margin: CULL_MARGIN,
            gravity: GRAVITY_BASE,
            restitution_combined: DEFAULT_RESTITUTION_COMBINED,
            seed: 0,
        }
    }
}

/// Initial state of one ball
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    pub restitution: f64,
    pub gravity_scale: f64,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            position: DVec2::new(100.0, 100.0),
            velocity: DVec2::new(150.0, 100.0),
            radius: 15.0,
            restitution: 1.0,
            gravity_scale: 0.5,
        }
    }
}

/// Initial state of one ring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSpec {
    pub center: DVec2,
    pub radius: f64,
    pub thickness: f64,
    pub opening_deg: f64,
    pub rotation_deg: f64,
    pub rotation_speed_deg_per_s: f64,
    /// Signed so that negative values are reported, not silently wrapped
    pub life: i64,
}

impl Default for RingSpec {
    fn default() -> Self {
        Self {
            center: DVec2::new(400.0, 300.0),
            radius: 80.0,
            thickness: 2.0,
            opening_deg: 0.0,
            rotation_deg: 0.0,
            rotation_speed_deg_per_s: 0.0,
            life: 1,
        }
    }
}

/// A full scenario: settings plus everything to spawn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub title: String,
    pub screen: ScreenSpec,
    pub bodies: Vec<BodySpec>,
    pub rings: Vec<RingSpec>,
}

impl Scenario {
    /// Built-in scenario by name
    pub fn preset(name: &str) -> Result<Self, SimError> {
        Preset::from_str(name)
            .map(Self::from_preset)
            .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
    }

    pub fn from_preset(preset: Preset) -> Self {
        let screen = ScreenSpec::default();
        let center = DVec2::new(screen.width / 2.0, screen.height / 2.0);
        match preset {
            Preset::Classic => Self {
                title: "Classic".to_string(),
                screen,
                bodies: vec![
                    BodySpec {
                        position: center + DVec2::new(-20.0, -40.0),
                        velocity: DVec2::new(180.0, -60.0),
                        ..Default::default()
                    },
                    BodySpec {
                        position: center + DVec2::new(25.0, 10.0),
                        velocity: DVec2::new(-120.0, -150.0),
                        radius: 12.0,
                        ..Default::default()
                    },
                ],
                rings: (0..4)
                    .map(|i| RingSpec {
                        center,
                        radius: 120.0 + 60.0 * f64::from(i),
                        thickness: 4.0,
                        opening_deg: 50.0,
                        rotation_deg: 90.0 * f64::from(i),
                        rotation_speed_deg_per_s: if i % 2 == 0 { 30.0 } else { -30.0 },
                        life: 3 + i64::from(i),
                    })
                    .collect(),
            },
            Preset::Piercing => Self {
                title: "Piercing".to_string(),
                screen: ScreenSpec {
                    collision_on_contact: false,
                    break_in_opening: true,
                    ..screen
                },
                bodies: vec![BodySpec {
                    position: center,
                    velocity: DVec2::new(90.0, -380.0),
                    radius: 10.0,
                    gravity_scale: 0.3,
                    ..Default::default()
                }],
                rings: (0..6)
                    .map(|i| RingSpec {
                        center,
                        radius: 80.0 + 45.0 * f64::from(i),
                        thickness: 3.0,
                        opening_deg: 70.0,
                        rotation_deg: 60.0 * f64::from(i),
                        rotation_speed_deg_per_s: 45.0 + 10.0 * f64::from(i),
                        life: 1,
                    })
                    .collect(),
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let scenario = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!(
            "Loaded scenario '{}' from {} ({} bodies, {} rings)",
            scenario.title,
            path.display(),
            scenario.bodies.len(),
            scenario.rings.len()
        );
        Ok(scenario)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Scenario saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Fixed timestep the driver should use
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.screen.fps.max(1))
    }

    pub fn config(&self) -> Result<SimConfig, SimError> {
        let screen = &self.screen;
        Ok(SimConfig {
            gravity: screen.gravity,
            restitution_combined: screen.restitution_combined,
            policy: RingPolicy::from_flags(screen.collision_on_contact, screen.break_in_opening)?,
            playfield: Playfield {
                width: screen.width,
                height: screen.height,
            },
            cull_margin: screen.cull_margin,
            seed: screen.seed,
            ..Default::default()
        })
    }

    /// Validate everything and spawn it into a fresh simulation
    pub fn build(&self) -> Result<Simulation, SimError> {
        let mut sim = Simulation::new(self.config()?)?;
        for ring in &self.rings {
            sim.spawn_ring(
                ring.center,
                ring.radius,
                ring.thickness,
                ring.opening_deg,
                ring.rotation_deg,
                ring.rotation_speed_deg_per_s,
                ring.life,
            )?;
        }
        for body in &self.bodies {
            sim.spawn_body(
                body.position,
                body.velocity,
                body.radius,
                body.restitution,
                body.gravity_scale,
            )?;
        }
        Ok(sim)
    }
}
