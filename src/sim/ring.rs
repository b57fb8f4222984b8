//! Ring obstacles with a rotating angular opening
//!
//! A ring is a circle of `radius` around `center`, drawn with some
//! `thickness`. An optional opening of `opening_width_deg` degrees is centered
//! on `rotation_deg`:
//! - opening = 0: closed ring
//! - opening interval: [rotation - opening/2, rotation + opening/2] (mod 360)

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::{angular_distance_deg, direction_deg, normalize_degrees};

/// A stationary or rotating partial ring with finite durability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingObstacle {
    pub id: u32,
    pub center: DVec2,
    /// Centerline radius
    pub radius: f64,
    /// Radial thickness (band extends radius ± thickness/2)
    pub thickness: f64,
    /// Angular width of the gap, in [0, 360)
    pub opening_width_deg: f64,
    /// Angle of the opening's center, normalized to [0, 360)
    pub rotation_deg: f64,
    pub rotation_speed_deg_per_s: f64,
    pub life: u32,
    /// Starting life; only used for cosmetic color interpolation
    pub life_max: u32,
    /// Where the last qualifying contact happened
    #[serde(skip)]
    pub last_contact: Option<DVec2>,
}

impl RingObstacle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        center: DVec2,
        radius: f64,
        thickness: f64,
        opening_width_deg: f64,
        rotation_deg: f64,
        rotation_speed_deg_per_s: f64,
        life: i64,
    ) -> Result<Self, SimError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimError::InvalidRadius(radius));
        }
        if !thickness.is_finite() || thickness < 0.0 {
            return Err(SimError::InvalidThickness(thickness));
        }
        if !(0.0..360.0).contains(&opening_width_deg) {
            return Err(SimError::InvalidOpening(opening_width_deg));
        }
        if life < 0 {
            return Err(SimError::NegativeLife(life));
        }
        if !center.is_finite() {
            return Err(SimError::NonFinite("ring center"));
        }
        if !rotation_deg.is_finite() || !rotation_speed_deg_per_s.is_finite() {
            return Err(SimError::NonFinite("ring rotation"));
        }
        let life = u32::try_from(life).unwrap_or(u32::MAX);
        Ok(Self {
            id,
            center,
            radius,
            thickness,
            opening_width_deg,
            rotation_deg: normalize_degrees(rotation_deg),
            rotation_speed_deg_per_s,
            life,
            life_max: life,
            last_contact: None,
        })
    }

    /// Inner edge of the ring band
    #[inline]
    pub fn inner_radius(&self) -> f64 {
        self.radius - self.thickness / 2.0
    }

    /// Outer edge of the ring band
    #[inline]
    pub fn outer_radius(&self) -> f64 {
        self.radius + self.thickness / 2.0
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.opening_width_deg <= 0.0
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.life == 0
    }

    /// Advance the opening by its rotation speed
    pub fn rotate(&mut self, dt: f64) {
        if self.rotation_speed_deg_per_s != 0.0 && dt > 0.0 {
            self.rotation_deg =
                normalize_degrees(self.rotation_deg + self.rotation_speed_deg_per_s * dt);
        }
    }

    /// Opening as (start, end) degrees in [0, 360); start > end means it wraps past 0°
    pub fn opening_interval(&self) -> (f64, f64) {
        let half = self.opening_width_deg / 2.0;
        (
            normalize_degrees(self.rotation_deg - half),
            normalize_degrees(self.rotation_deg + half),
        )
    }

    /// Check if an angle falls inside the opening (edges included)
    pub fn opening_contains_angle(&self, theta: f64) -> bool {
        if self.is_closed() {
            return false;
        }
        angular_distance_deg(theta, self.rotation_deg) <= self.opening_width_deg / 2.0
    }

    /// Check if the whole angular span [theta - half_width, theta + half_width]
    /// lies within the opening
    pub fn opening_contains_span(&self, theta: f64, half_width: f64) -> bool {
        if self.is_closed() {
            return false;
        }
        angular_distance_deg(theta, self.rotation_deg) + half_width
            <= self.opening_width_deg / 2.0
    }

    /// Point on the centerline at `theta` degrees
    pub fn point_at(&self, theta: f64) -> DVec2 {
        self.center + direction_deg(theta) * self.radius
    }

    /// Remaining life in [0, 1]
    pub fn life_fraction(&self) -> f64 {
        if self.life_max == 0 {
            return 0.0;
        }
        (f64::from(self.life) / f64::from(self.life_max)).clamp(0.0, 1.0)
    }

    /// Display color, green at full life fading to red
    pub fn color(&self) -> [u8; 3] {
        let ratio = self.life_fraction();
        let r = (255.0 * (1.0 - ratio)) as u8;
        let g = (255.0 * ratio) as u8;
        [r, g, 0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(opening: f64, rotation: f64) -> RingObstacle {
        RingObstacle::new(1, DVec2::ZERO, 100.0, 4.0, opening, rotation, 0.0, 3).unwrap()
    }

    #[test]
    fn test_rejects_invalid_construction() {
        assert!(matches!(
            RingObstacle::new(1, DVec2::ZERO, -1.0, 2.0, 0.0, 0.0, 0.0, 1),
            Err(SimError::InvalidRadius(_))
        ));
        assert!(matches!(
            RingObstacle::new(1, DVec2::ZERO, 10.0, 2.0, 360.0, 0.0, 0.0, 1),
            Err(SimError::InvalidOpening(_))
        ));
        assert!(matches!(
            RingObstacle::new(1, DVec2::ZERO, 10.0, 2.0, 0.0, 0.0, 0.0, -1),
            Err(SimError::NegativeLife(-1))
        ));
        assert!(RingObstacle::new(1, DVec2::ZERO, 10.0, 2.0, 0.0, 0.0, 0.0, 0).is_ok());
    }

    #[test]
    fn test_opening_interval_no_wrap() {
        let r = ring(60.0, 90.0);
        let (start, end) = r.opening_interval();
        assert!((start - 60.0).abs() < 1e-9);
        assert!((end - 120.0).abs() < 1e-9);
        assert!(r.opening_contains_angle(100.0));
        assert!(!r.opening_contains_angle(130.0));
    }

    #[test]
    fn test_opening_interval_wraparound() {
        let r = ring(40.0, 0.0);
        let (start, end) = r.opening_interval();
        assert!((start - 340.0).abs() < 1e-9);
        assert!((end - 20.0).abs() < 1e-9);
        assert!(r.opening_contains_angle(350.0));
        assert!(r.opening_contains_angle(10.0));
        assert!(!r.opening_contains_angle(180.0));
    }

    #[test]
    fn test_closed_ring_has_no_opening() {
        let r = ring(0.0, 0.0);
        assert!(r.is_closed());
        assert!(!r.opening_contains_angle(0.0));
        assert!(!r.opening_contains_span(0.0, 0.0));
    }

    #[test]
    fn test_span_straddling_edge_not_contained() {
        let r = ring(60.0, 0.0);
        assert!(r.opening_contains_span(0.0, 29.0));
        // Center inside, footprint pokes past the 30° edge
        assert!(r.opening_contains_angle(20.0));
        assert!(!r.opening_contains_span(20.0, 15.0));
    }

    #[test]
    fn test_rotate_wraps() {
        let mut r = ring(30.0, 350.0);
        r.rotation_speed_deg_per_s = 30.0;
        r.rotate(1.0);
        assert!((r.rotation_deg - 20.0).abs() < 1e-9);
        r.rotation_speed_deg_per_s = -45.0;
        r.rotate(1.0);
        assert!((r.rotation_deg - 335.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_interpolates_with_life() {
        let mut r = ring(0.0, 0.0);
        assert_eq!(r.color(), [0, 255, 0]);
        r.life = 0;
        assert_eq!(r.color(), [255, 0, 0]);
    }

    #[test]
    fn test_band_edges() {
        let r = ring(0.0, 0.0);
        assert!((r.inner_radius() - 98.0).abs() < 1e-9);
        assert!((r.outer_radius() - 102.0).abs() < 1e-9);
        assert!((r.point_at(90.0) - DVec2::new(0.0, 100.0)).length() < 1e-9);
    }
}
