//! Narrow-phase collision detection and response
//!
//! Two kinds of contact:
//! - body vs body: elastic impulse along the center line plus positional correction
//! - body vs ring: occlusion test against the ring band and its opening, then
//!   bounce (life - 1) or shatter (life = 0) depending on the ring policy

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::ring::RingObstacle;
use crate::consts::{COINCIDENT_DISTANCE, COINCIDENT_DIST_SQ, DISTANCE_EPSILON, RING_CONTACT_EPSILON};
use crate::error::SimError;
use crate::cartesian_to_polar_deg;

/// How rings react to bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RingPolicy {
    /// Rings are decorations; bodies pass through untouched
    Inert,
    /// Bodies bounce off any part of the ring outside the opening
    #[default]
    BounceOnContact,
    /// Bodies never bounce; a body passing fully through the opening shatters the ring
    BreakInOpening,
}

impl RingPolicy {
    /// Build from the two boundary flags (mutually exclusive; both false = inert)
    pub fn from_flags(collision_on_contact: bool, break_in_opening: bool) -> Result<Self, SimError> {
        match (collision_on_contact, break_in_opening) {
            (true, true) => Err(SimError::ConflictingPolicy),
            (true, false) => Ok(RingPolicy::BounceOnContact),
            (false, true) => Ok(RingPolicy::BreakInOpening),
            (false, false) => Ok(RingPolicy::Inert),
        }
    }
}

/// Which side of the ring a body approached from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingSide {
    Inside,
    Outside,
}

/// Geometry of one body relative to one ring
#[derive(Debug, Clone)]
pub struct RingProbe {
    /// Body footprint touches the ring band
    pub near: bool,
    /// Approach side: from the radial velocity, or from position when it is zero
    pub side: RingSide,
    /// Unit vector from ring center toward the body
    pub normal: DVec2,
    pub distance: f64,
    /// Body center angle around the ring, degrees [0, 360)
    pub angle: f64,
    /// Angular half-width the body subtends at this distance, degrees
    pub half_width: f64,
    /// The whole body footprint lies inside the opening
    pub fully_in_opening: bool,
    /// Radial velocity along `normal` (> 0 moves away from the center)
    pub radial_speed: f64,
    /// Body disc is clear of the centerline and moving further away from it
    pub departing: bool,
}

/// Outcome of a body-ring check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RingHit {
    /// Body bounced; ring lost one life
    Bounced { contact: DVec2 },
    /// Body passed through the opening and shattered the ring
    Shattered { contact: DVec2 },
}

/// Resolve a body-body contact. Returns true if an impulse was applied.
///
/// Overlapping pairs are always pushed apart by half the overlap each; the
/// impulse is only applied when the pair is closing.
pub fn resolve_body_pair<R: Rng + ?Sized>(
    a: &mut Body,
    b: &mut Body,
    restitution_combined: f64,
    rng: &mut R,
) -> bool {
    let delta = b.pos - a.pos;
    let dist_sq = delta.length_squared();
    let sum_radii = a.radius + b.radius;

    // Cheap rejection before any sqrt
    if dist_sq > sum_radii * sum_radii {
        return false;
    }

    let (normal, distance) = if dist_sq < COINCIDENT_DIST_SQ {
        // Coincident centers: pick an arbitrary separation axis
        let angle = rng.random_range(0.0..std::f64::consts::TAU);
        (DVec2::new(angle.cos(), angle.sin()), COINCIDENT_DISTANCE)
    } else {
        let distance = dist_sq.sqrt();
        (delta / distance, distance)
    };

    let overlap = sum_radii - distance;
    if overlap <= 0.0 {
        return false;
    }

    let closing_speed = (b.vel - a.vel).dot(normal);
    let mut impulse_applied = false;
    if closing_speed < 0.0 {
        let inv_a = 1.0 / a.mass();
        let inv_b = 1.0 / b.mass();
        let j = -(1.0 + restitution_combined) * closing_speed / (inv_a + inv_b);
        a.vel -= normal * (j * inv_a);
        b.vel += normal * (j * inv_b);
        impulse_applied = true;
    }

    let correction = normal * (overlap / 2.0);
    a.pos -= correction;
    b.pos += correction;

    impulse_applied
}

/// Angular half-width (degrees) subtended by a body of `radius` at `distance`
///
/// Bodies too close to measure (distance <= radius) report 90°.
pub fn subtended_half_width_deg(radius: f64, distance: f64) -> f64 {
    if distance <= radius {
        return 90.0;
    }
    (radius / distance).clamp(0.0, 1.0).asin().to_degrees()
}

/// Measure a body against a ring without modifying either
pub fn probe_ring(body: &Body, ring: &RingObstacle) -> RingProbe {
    let direction = body.pos - ring.center;
    let (mut distance, mut angle) = cartesian_to_polar_deg(direction);
    let normal = if distance < DISTANCE_EPSILON {
        distance = 0.0;
        angle = 0.0;
        DVec2::X
    } else {
        direction / distance
    };

    let near = distance + body.radius >= ring.inner_radius()
        && distance - body.radius <= ring.outer_radius();

    let radial_speed = body.vel.dot(normal);
    // A body too large to sit inside the band can only be pushed outward
    let fits_inside = ring.inner_radius() - body.radius - RING_CONTACT_EPSILON > 0.0;
    let side = if !fits_inside || radial_speed < 0.0 {
        RingSide::Outside
    } else if radial_speed > 0.0 || distance < ring.radius {
        RingSide::Inside
    } else {
        RingSide::Outside
    };

    let half_width = subtended_half_width_deg(body.radius, distance);
    let fully_in_opening = ring.opening_contains_span(angle, half_width);

    let departing = (radial_speed > 0.0 && distance - body.radius > ring.radius)
        || (radial_speed < 0.0 && distance + body.radius < ring.radius);

    RingProbe {
        near,
        side,
        normal,
        distance,
        angle,
        half_width,
        fully_in_opening,
        radial_speed,
        departing,
    }
}

/// Run the occlusion test for one (body, ring) pair and apply the policy
///
/// Depleted rings are ignored. Returns what happened, if anything.
pub fn resolve_body_ring(body: &mut Body, ring: &mut RingObstacle, policy: RingPolicy) -> Option<RingHit> {
    if ring.is_destroyed() || policy == RingPolicy::Inert {
        return None;
    }

    let probe = probe_ring(body, ring);
    if !probe.near {
        return None;
    }

    match policy {
        RingPolicy::Inert => None,
        RingPolicy::BounceOnContact => {
            if probe.fully_in_opening || probe.departing {
                return None;
            }

            ring.life = ring.life.saturating_sub(1);

            // Send the body back to the side it came from, parked clear of the band
            let (parked, moving_into_wall) = match probe.side {
                RingSide::Inside => (
                    ring.inner_radius() - body.radius - RING_CONTACT_EPSILON,
                    probe.radial_speed > 0.0,
                ),
                RingSide::Outside => (
                    ring.outer_radius() + body.radius + RING_CONTACT_EPSILON,
                    probe.radial_speed < 0.0,
                ),
            };
            if moving_into_wall {
                body.vel = reflect_velocity(body.vel, probe.normal, body.restitution);
            }
            body.pos = ring.center + probe.normal * parked;

            let contact = ring.center + probe.normal * ring.radius;
            ring.last_contact = Some(contact);
            Some(RingHit::Bounced { contact })
        }
        RingPolicy::BreakInOpening => {
            if !probe.fully_in_opening {
                return None;
            }
            ring.life = 0;
            ring.last_contact = Some(body.pos);
            Some(RingHit::Shattered { contact: body.pos })
        }
    }
}

/// Reflect velocity off a surface, scaling the normal component by restitution
///
/// v' = v - (1 + e)(v·n)n; e = 1 is the mirror reflection v - 2(v·n)n.
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2, restitution: f64) -> DVec2 {
    velocity - (1.0 + restitution) * velocity.dot(normal) * normal
}
