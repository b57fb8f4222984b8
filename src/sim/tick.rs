//! Frame step
//!
//! One call advances the simulation by `dt` in a fixed phase order:
//! 1. integrate bodies, rotate rings
//! 2. cull bodies outside the playfield margin
//! 3. quadtree broad phase, then body-body resolution (each pair once)
//! 4. body-ring occlusion/bounce for every pair
//! 5. remove depleted rings and queue one `RingDestroyed` each

use serde::Serialize;

use super::body::Body;
use super::collision::{RingHit, resolve_body_pair, resolve_body_ring};
use super::quadtree::broad_phase_pairs;
use super::state::{RingDestroyed, Simulation};

/// What happened during one step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepSummary {
    pub step_index: u64,
    pub dt: f64,
    pub bodies_alive: usize,
    pub bodies_culled: usize,
    /// Touching body pairs reported by the broad phase
    pub candidate_pairs: usize,
    /// Pairs that received an impulse
    pub body_impacts: usize,
    pub ring_bounces: usize,
    pub rings_shattered: usize,
    pub rings_destroyed: usize,
}

/// Optional hook called at the end of every step
pub trait StepObserver {
    /// `destroyed` holds only the events produced by this step
    fn on_step(&mut self, summary: &StepSummary, destroyed: &[RingDestroyed]);
}

/// Observer that forwards step summaries to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StepObserver for LogObserver {
    fn on_step(&mut self, summary: &StepSummary, destroyed: &[RingDestroyed]) {
        log::debug!(
            "step {}: {} bodies ({} culled), {} pairs, {} impacts, {} bounces",
            summary.step_index,
            summary.bodies_alive,
            summary.bodies_culled,
            summary.candidate_pairs,
            summary.body_impacts,
            summary.ring_bounces
        );
        for event in destroyed {
            log::info!(
                "ring {} destroyed at ({:.1}, {:.1}), radius {}",
                event.ring_id,
                event.position.x,
                event.position.y,
                event.radius
            );
        }
    }
}

/// Advance the simulation by `dt` seconds
///
/// Total for any input: a non-positive or non-finite `dt` is a no-op.
pub fn step(sim: &mut Simulation, dt: f64) -> StepSummary {
    if !dt.is_finite() || dt <= 0.0 {
        return StepSummary {
            step_index: sim.step_index,
            dt,
            bodies_alive: sim.bodies.len(),
            ..Default::default()
        };
    }

    sim.step_index += 1;
    sim.time += dt;

    let gravity = sim.config.gravity;
    let policy = sim.config.policy;
    let restitution = sim.config.restitution_combined;
    let playfield = sim.config.playfield;
    let margin = sim.config.cull_margin;

    // --- INTEGRATE ---
    for body in &mut sim.bodies {
        body.integrate(dt, gravity);
    }
    for ring in &mut sim.rings {
        ring.rotate(dt);
    }

    // --- CULL ---
    let before = sim.bodies.len();
    sim.bodies
        .retain(|b| !b.is_out_of_bounds(playfield.width, playfield.height, margin));
    let bodies_culled = before - sim.bodies.len();

    // --- BODY-BODY ---
    let pairs = broad_phase_pairs(
        &sim.bodies,
        sim.config.quadtree_capacity,
        sim.config.quadtree_max_depth,
    );
    let mut body_impacts = 0;
    for &(i, j) in &pairs {
        let (a, b) = pair_mut(&mut sim.bodies, i, j);
        if resolve_body_pair(a, b, restitution, &mut sim.rng) {
            body_impacts += 1;
        }
    }

    // --- BODY-RING ---
    let mut ring_bounces = 0;
    let mut rings_shattered = 0;
    for body in &mut sim.bodies {
        for ring in &mut sim.rings {
            match resolve_body_ring(body, ring, policy) {
                Some(RingHit::Bounced { .. }) => ring_bounces += 1,
                Some(RingHit::Shattered { .. }) => rings_shattered += 1,
                None => {}
            }
        }
    }

    // --- LIFECYCLE ---
    let first_new = sim.events.len();
    let events = &mut sim.events;
    sim.rings.retain(|ring| {
        if !ring.is_destroyed() {
            return true;
        }
        events.push(RingDestroyed {
            ring_id: ring.id,
            position: ring.last_contact.unwrap_or(ring.center),
            radius: ring.radius,
        });
        false
    });

    let summary = StepSummary {
        step_index: sim.step_index,
        dt,
        bodies_alive: sim.bodies.len(),
        bodies_culled,
        candidate_pairs: pairs.len(),
        body_impacts,
        ring_bounces,
        rings_shattered,
        rings_destroyed: sim.events.len() - first_new,
    };

    if let Some(observer) = sim.observer.as_mut() {
        observer.on_step(&summary, &sim.events[first_new..]);
    }
    sim.last_summary = Some(summary.clone());
    summary
}

/// Two distinct mutable bodies, `i < j`
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    let (left, right) = bodies.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::RingPolicy;
    use crate::sim::state::SimConfig;
    use glam::DVec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f64 = 1.0 / 120.0;

    fn sim_with(policy: RingPolicy) -> Simulation {
        Simulation::new(SimConfig {
            policy,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_closed_ring_destroyed_on_first_contact() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_ring(DVec2::ZERO, 100.0, 2.0, 0.0, 0.0, 0.0, 1).unwrap();
        sim.spawn_body(DVec2::new(106.0, 0.0), DVec2::new(-200.0, 0.0), 5.0, 1.0, 0.0)
            .unwrap();

        let summary = sim.step(1.0 / 60.0);
        assert_eq!(summary.ring_bounces, 1);
        assert_eq!(summary.rings_destroyed, 1);
        assert!(sim.rings().is_empty());

        let events = sim.drain_events();
        assert_eq!(events.len(), 1);
        assert!((events[0].position - DVec2::new(100.0, 0.0)).length() < 1e-6);
        assert_eq!(events[0].radius, 100.0);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_body_reaching_ring_radius_destroys_ring() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_ring(DVec2::ZERO, 100.0, 2.0, 0.0, 0.0, 0.0, 1).unwrap();
        sim.spawn_body(DVec2::new(100.0, 0.0), DVec2::new(-200.0, 0.0), 5.0, 1.0, 0.0)
            .unwrap();

        let summary = sim.step(1.0 / 60.0);
        assert_eq!(summary.ring_bounces, 1);
        assert!(sim.rings().is_empty());

        let events = sim.drain_events();
        assert_eq!(events.len(), 1);
        assert!((events[0].position - DVec2::new(100.0, 0.0)).length() < 1e-6);
        assert!(sim.bodies()[0].vel.x > 0.0);
    }

    #[test]
    fn test_fast_body_cannot_escape_closed_ring() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        let center = DVec2::new(600.0, 400.0);
        sim.spawn_ring(center, 100.0, 2.0, 0.0, 0.0, 0.0, 3).unwrap();
        sim.spawn_body(center + DVec2::new(96.0, 0.0), DVec2::new(480.0, 0.0), 5.0, 1.0, 0.0)
            .unwrap();

        // Center ends this step past the centerline
        let summary = sim.step(1.0 / 60.0);
        assert_eq!(summary.ring_bounces, 1);
        assert_eq!(sim.rings()[0].life, 2);

        for _ in 0..29 {
            sim.step(1.0 / 60.0);
        }
        assert_eq!(sim.rings().len(), 1);
        assert!((sim.bodies()[0].pos - center).length() < 100.0);
    }

    #[test]
    fn test_ring_life_counts_each_bounce_once() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        let center = DVec2::new(600.0, 400.0);
        sim.spawn_ring(center, 100.0, 2.0, 0.0, 0.0, 0.0, 3).unwrap();
        sim.spawn_body(center, DVec2::new(300.0, 0.0), 5.0, 1.0, 0.0).unwrap();

        let mut lives = vec![3];
        let mut bounces = 0;
        let mut destroyed = 0;
        for _ in 0..600 {
            let summary = sim.step(DT);
            bounces += summary.ring_bounces;
            destroyed += summary.rings_destroyed;
            if let Some(ring) = sim.rings().first() {
                lives.push(ring.life);
            }
        }

        assert_eq!(bounces, 3);
        assert_eq!(destroyed, 1);
        assert_eq!(sim.drain_events().len(), 1);
        // Never skips a value, never goes back up
        for w in lives.windows(2) {
            assert!(w[0] >= w[1] && w[0] - w[1] <= 1);
        }
        assert_eq!(*lives.last().unwrap(), 1);
    }

    #[test]
    fn test_break_in_opening_shatters_on_exit() {
        let mut sim = sim_with(RingPolicy::BreakInOpening);
        let center = DVec2::new(600.0, 400.0);
        // Opening faces up (270° in screen coordinates)
        sim.spawn_ring(center, 100.0, 2.0, 90.0, 270.0, 0.0, 5).unwrap();
        sim.spawn_body(center, DVec2::new(0.0, -300.0), 5.0, 1.0, 0.0).unwrap();

        let mut events = Vec::new();
        for _ in 0..120 {
            sim.step(DT);
            events.extend(sim.drain_events());
        }
        assert_eq!(events.len(), 1);
        assert!(events[0].position.y < center.y - 90.0);
        // Body kept going straight up
        assert_eq!(sim.bodies()[0].vel, DVec2::new(0.0, -300.0));
    }

    #[test]
    fn test_break_policy_body_misses_opening() {
        let mut sim = sim_with(RingPolicy::BreakInOpening);
        let center = DVec2::new(600.0, 400.0);
        sim.spawn_ring(center, 100.0, 2.0, 90.0, 270.0, 0.0, 5).unwrap();
        sim.spawn_body(center, DVec2::new(300.0, 0.0), 5.0, 1.0, 0.0).unwrap();
        for _ in 0..120 {
            sim.step(DT);
        }
        assert_eq!(sim.rings().len(), 1);
        assert_eq!(sim.rings()[0].life, 5);
    }

    #[test]
    fn test_inert_rings_never_destroyed() {
        let mut sim = sim_with(RingPolicy::Inert);
        let center = DVec2::new(600.0, 400.0);
        sim.spawn_ring(center, 100.0, 2.0, 0.0, 0.0, 45.0, 1).unwrap();
        sim.spawn_body(center, DVec2::new(300.0, 0.0), 5.0, 1.0, 0.0).unwrap();
        for _ in 0..240 {
            sim.step(DT);
        }
        assert_eq!(sim.rings().len(), 1);
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_zero_life_ring_removed_at_center() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_ring(DVec2::new(50.0, 60.0), 30.0, 2.0, 0.0, 0.0, 0.0, 0).unwrap();
        sim.step(DT);
        let events = sim.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].position, DVec2::new(50.0, 60.0));
    }

    #[test]
    fn test_out_of_bounds_bodies_culled() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_body(DVec2::new(-150.0, 10.0), DVec2::ZERO, 5.0, 1.0, 0.0).unwrap();
        sim.spawn_body(DVec2::new(-50.0, 10.0), DVec2::ZERO, 5.0, 1.0, 0.0).unwrap();
        let summary = sim.step(DT);
        assert_eq!(summary.bodies_culled, 1);
        assert_eq!(sim.bodies().len(), 1);
        assert_eq!(sim.bodies()[0].id, 2);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_body(DVec2::new(10.0, 10.0), DVec2::new(5.0, 5.0), 5.0, 1.0, 1.0).unwrap();
        sim.step(0.0);
        sim.step(-1.0);
        sim.step(f64::NAN);
        assert_eq!(sim.step_index(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.bodies()[0].pos, DVec2::new(10.0, 10.0));
    }

    #[test]
    fn test_rings_rotate_each_step() {
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.spawn_ring(DVec2::new(600.0, 400.0), 100.0, 2.0, 60.0, 0.0, 90.0, 1).unwrap();
        sim.step(0.5);
        assert!((sim.rings()[0].rotation_deg - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_pairs_resolved_once() {
        let mut sim = sim_with(RingPolicy::Inert);
        sim.spawn_body(DVec2::new(300.0, 300.0), DVec2::new(50.0, 0.0), 10.0, 1.0, 0.0)
            .unwrap();
        sim.spawn_body(DVec2::new(315.0, 300.0), DVec2::new(-50.0, 0.0), 10.0, 1.0, 0.0)
            .unwrap();
        let summary = sim.step(DT);
        assert_eq!(summary.candidate_pairs, 1);
        assert_eq!(summary.body_impacts, 1);
        let [a, b] = sim.bodies() else {
            panic!("expected two bodies");
        };
        assert!(a.vel.x < 0.0 && b.vel.x > 0.0);
        assert!(((b.pos - a.pos).length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let build = || {
            let mut sim = Simulation::new(SimConfig {
                seed: 42,
                ..Default::default()
            })
            .unwrap();
            sim.spawn_ring(DVec2::new(600.0, 400.0), 300.0, 4.0, 50.0, 0.0, 40.0, 20)
                .unwrap();
            for i in 0..30 {
                let x = 450.0 + (i % 6) as f64 * 40.0;
                let y = 300.0 + (i / 6) as f64 * 40.0;
                sim.spawn_body(DVec2::new(x, y), DVec2::new(120.0, -60.0 + i as f64), 12.0, 1.0, 0.5)
                    .unwrap();
            }
            sim
        };
        let mut s1 = build();
        let mut s2 = build();
        for _ in 0..300 {
            s1.step(DT);
            s2.step(DT);
        }
        let (a, b) = (s1.snapshot(), s2.snapshot());
        assert_eq!(a.bodies.len(), b.bodies.len());
        for (x, y) in a.bodies.iter().zip(&b.bodies) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
        }
        assert_eq!(s1.drain_events(), s2.drain_events());
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<StepSummary>,
        destroyed: usize,
    }

    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl StepObserver for SharedRecorder {
        fn on_step(&mut self, summary: &StepSummary, destroyed: &[RingDestroyed]) {
            let mut rec = self.0.borrow_mut();
            rec.steps.push(summary.clone());
            rec.destroyed += destroyed.len();
        }
    }

    #[test]
    fn test_observer_sees_every_step() {
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let mut sim = sim_with(RingPolicy::BounceOnContact);
        sim.set_observer(Box::new(SharedRecorder(rec.clone())));
        sim.spawn_ring(DVec2::ZERO, 100.0, 2.0, 0.0, 0.0, 0.0, 1).unwrap();
        sim.spawn_body(DVec2::new(106.0, 0.0), DVec2::new(-200.0, 0.0), 5.0, 1.0, 0.0)
            .unwrap();
        for _ in 0..3 {
            sim.step(1.0 / 60.0);
        }
        let rec = rec.borrow();
        assert_eq!(rec.steps.len(), 3);
        assert_eq!(rec.steps[2].step_index, 3);
        assert_eq!(rec.destroyed, 1);
        assert_eq!(sim.last_summary(), rec.steps.last());
    }
}
