//! Moving circular bodies and their integration

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_MASS;
use crate::error::SimError;

/// A ball: a circular point-mass subject to gravity and collisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Always > 0 (checked at construction)
    pub radius: f64,
    /// Coefficient of restitution for ring bounces; > 1 energizes
    pub restitution: f64,
    /// Multiplier on the simulation's base gravity
    pub gravity_scale: f64,
}

impl Body {
    pub fn new(
        id: u32,
        pos: DVec2,
        vel: DVec2,
        radius: f64,
        restitution: f64,
        gravity_scale: f64,
    ) -> Result<Self, SimError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimError::InvalidRadius(radius));
        }
        if !(0.0..=2.0).contains(&restitution) {
            return Err(SimError::InvalidRestitution(restitution));
        }
        if !pos.is_finite() {
            return Err(SimError::NonFinite("body position"));
        }
        if !vel.is_finite() {
            return Err(SimError::NonFinite("body velocity"));
        }
        if !gravity_scale.is_finite() {
            return Err(SimError::NonFinite("body gravity scale"));
        }
        Ok(Self {
            id,
            pos,
            vel,
            radius,
            restitution,
            gravity_scale,
        })
    }

    /// Mass derived from volume (uniform density), floored at `MIN_MASS`
    #[inline]
    pub fn mass(&self) -> f64 {
        mass_for_radius(self.radius)
    }

    /// Semi-implicit Euler: gravity first, then position
    ///
    /// A non-positive `dt` leaves the body untouched.
    pub fn integrate(&mut self, dt: f64, gravity: f64) {
        if dt <= 0.0 {
            return;
        }
        self.vel.y += gravity * self.gravity_scale * dt;
        self.pos += self.vel * dt;
    }

    /// True when the body lies more than `margin` outside a `width` x `height` field
    pub fn is_out_of_bounds(&self, width: f64, height: f64, margin: f64) -> bool {
        self.pos.x < -margin
            || self.pos.x > width + margin
            || self.pos.y < -margin
            || self.pos.y > height + margin
    }
}

/// Volume-proxy mass (r³)
#[inline]
pub fn mass_for_radius(radius: f64) -> f64 {
    (radius * radius * radius).max(MIN_MASS)
}
