//! Fixed-step simulation tick
//!
//! Phases run strictly in order, each finishing before the next starts:
//! index → forces → collisions → behaviors → integrate → prune.

use glam::DVec2;

use super::behavior::{BehaviorEngine, BehaviorStats};
use super::body::{Body, BodyId};
use super::collision::{CollisionResolver, CollisionStats};
use super::forces::ForceField;
use super::quadtree::{Boundary, QuadTree};
use super::state::Simulation;
use crate::clamp_speed;
use crate::config::PhysicsConfig;
use crate::error::PhysicsFault;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number (1 for the first tick)
    pub tick: u64,
    /// Forces came from the quadtree rather than direct summation
    pub used_barnes_hut: bool,
    pub collisions: CollisionStats,
    pub behaviors: BehaviorStats,
    /// Bodies pruned at the end of the tick
    pub removed: Vec<BodyId>,
    /// Recovered per-body failures
    pub faults: Vec<PhysicsFault>,
}

/// Advance the simulation by one frame
pub fn tick(sim: &mut Simulation) {
    if sim.paused {
        return;
    }

    let Simulation {
        bodies,
        config,
        bounds,
        debug,
        time_ticks,
        rng,
        quadtree,
        last_report,
        ..
    } = sim;

    *time_ticks += 1;
    let mut report = TickReport {
        tick: *time_ticks,
        ..Default::default()
    };

    // Index
    let tree = (bodies.len() >= config.optimization_threshold)
        .then(|| QuadTree::build(bodies, *bounds, config.quadtree_capacity));
    report.used_barnes_hut = tree.is_some();

    // Forces
    let forces = ForceField::new(config).compute(bodies, tree.as_ref(), &mut report.faults);
    ForceField::apply(bodies, &forces);
    *quadtree = if *debug { tree } else { None };

    // Collisions
    report.collisions = CollisionResolver::new(config).resolve_all(bodies);

    // Behaviors
    report.behaviors =
        BehaviorEngine::new(config, *time_ticks).apply_all(bodies, rng, &mut report.faults);

    // Integrate
    for body in bodies.iter_mut().filter(|b| !b.pending_removal) {
        integrate(body, config);
        apply_boundary(body, bounds, config.allow_wrapping);
        body.update_effects(rng);
    }

    // Prune
    report.removed = prune(bodies);

    if let Some(first) = report.faults.first() {
        log::warn!(
            "Tick {}: {} physics fault(s), first: {}",
            report.tick,
            report.faults.len(),
            first
        );
    }
    if !report.removed.is_empty() {
        log::debug!(
            "Tick {}: {} merge(s), {} capture(s), removed {:?}",
            report.tick,
            report.collisions.merges,
            report.behaviors.captured,
            report.removed
        );
    }

    *last_report = report;
}

/// Semi-implicit step: position moves with the clamped old velocity, then
/// velocity picks up this tick's acceleration
pub fn integrate(body: &mut Body, config: &PhysicsConfig) {
    body.velocity = clamp_speed(body.velocity, config.min_speed, config.max_speed);
    body.position += body.velocity;
    body.velocity += body.acceleration;
    body.acceleration = DVec2::ZERO;
}

/// Keep a body in the world: wrap past the far edge, or bounce
pub fn apply_boundary(body: &mut Body, bounds: &Boundary, wrap: bool) {
    if wrap {
        let margin = body.radius();
        body.position.x = wrap_axis(body.position.x, bounds.x, bounds.right(), margin);
        body.position.y = wrap_axis(body.position.y, bounds.y, bounds.bottom(), margin);
        return;
    }

    // Reflect only when heading further out, so a body that is already
    // turning back is not flipped again
    let (pos, vel) = (body.position, &mut body.velocity);
    if (pos.x > bounds.right() && vel.x > 0.0) || (pos.x < bounds.x && vel.x < 0.0) {
        vel.x = -vel.x;
    }
    if (pos.y > bounds.bottom() && vel.y > 0.0) || (pos.y < bounds.y && vel.y < 0.0) {
        vel.y = -vel.y;
    }
}

fn wrap_axis(value: f64, min: f64, max: f64, margin: f64) -> f64 {
    if value > max + margin {
        min - margin
    } else if value < min - margin {
        max + margin
    } else {
        value
    }
}

/// Drop every body flagged this tick, returning their ids in list order
pub fn prune(bodies: &mut Vec<Body>) -> Vec<BodyId> {
    let removed: Vec<BodyId> = bodies
        .iter()
        .filter(|b| b.pending_removal)
        .map(|b| b.id)
        .collect();
    if !removed.is_empty() {
        bodies.retain(|b| !b.pending_removal);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyConfig, CelestialType};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn asteroid(x: f64, y: f64) -> BodyConfig {
        BodyConfig::new(CelestialType::Asteroid, DVec2::new(x, y), 200.0, 30.0)
    }

    fn loose_body(x: f64, y: f64, vx: f64, vy: f64) -> Body {
        let config = asteroid(x, y).with_velocity(DVec2::new(vx, vy));
        Body::from_config(BodyId(1), config)
    }

    #[test]
    fn test_tick_pause() {
        let mut sim = Simulation::new(800.0, 600.0);
        sim.create_body(asteroid(100.0, 100.0).with_velocity(DVec2::new(1.0, 0.0)))
            .unwrap();

        sim.pause();
        sim.tick();
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.bodies()[0].position, DVec2::new(100.0, 100.0));

        sim.resume();
        sim.tick();
        assert_eq!(sim.ticks(), 1);
        assert_eq!(sim.bodies()[0].position, DVec2::new(101.0, 100.0));
    }

    #[test]
    fn test_integrate_uses_old_velocity_for_position() {
        let config = PhysicsConfig::default();
        let mut body = loose_body(0.0, 0.0, 1.0, 0.0);
        body.acceleration = DVec2::new(0.0, 2.0);
        integrate(&mut body, &config);
        assert_eq!(body.position, DVec2::new(1.0, 0.0));
        assert_eq!(body.velocity, DVec2::new(1.0, 2.0));
        assert_eq!(body.acceleration, DVec2::ZERO);
    }

    #[test]
    fn test_integrate_clamps_speed_before_moving() {
        let config = PhysicsConfig::default();
        let mut body = loose_body(0.0, 0.0, 20.0, 0.0);
        integrate(&mut body, &config);
        assert!((body.position.x - config.max_speed).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_uses_radius_margin() {
        let bounds = Boundary::new(0.0, 0.0, 800.0, 600.0);
        // radius 15
        let mut body = loose_body(810.0, 300.0, 1.0, 0.0);
        apply_boundary(&mut body, &bounds, true);
        assert_eq!(body.position.x, 810.0);

        body.position.x = 816.0;
        apply_boundary(&mut body, &bounds, true);
        assert_eq!(body.position.x, -15.0);

        body.position.y = -16.0;
        apply_boundary(&mut body, &bounds, true);
        assert_eq!(body.position.y, 615.0);
    }

    #[test]
    fn test_bounce_only_reflects_outgoing_motion() {
        let bounds = Boundary::new(0.0, 0.0, 800.0, 600.0);
        let mut body = loose_body(801.0, 300.0, 2.0, 0.0);
        apply_boundary(&mut body, &bounds, false);
        assert_eq!(body.velocity.x, -2.0);

        // Still outside but already returning
        apply_boundary(&mut body, &bounds, false);
        assert_eq!(body.velocity.x, -2.0);

        let mut body = loose_body(400.0, -1.0, 0.0, -3.0);
        apply_boundary(&mut body, &bounds, false);
        assert_eq!(body.velocity.y, 3.0);
    }

    #[test]
    fn test_merge_prunes_and_keeps_mass() {
        let mut sim = Simulation::new(800.0, 600.0);
        sim.create_body(asteroid(100.0, 100.0).with_velocity(DVec2::new(1.0, 0.0)))
            .unwrap();
        sim.create_body(asteroid(105.0, 100.0).with_velocity(DVec2::new(-1.0, 0.0)))
            .unwrap();
        let mass_before = sim.total_mass();

        let report = sim.tick().clone();
        assert_eq!(report.collisions.merges, 1);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(sim.len(), 1);
        assert!((sim.total_mass() - mass_before).abs() < 1e-9);
    }

    #[test]
    fn test_barnes_hut_kicks_in_at_threshold() {
        let mut sim = Simulation::with_seed(1000.0, 1000.0, 7);
        let threshold = sim.config().optimization_threshold;
        // Spread on a grid so nothing overlaps
        for i in 0..(threshold - 1) {
            let (x, y) = ((i % 10) as f64 * 90.0 + 40.0, (i / 10) as f64 * 90.0 + 40.0);
            sim.create_body(BodyConfig::new(CelestialType::Asteroid, DVec2::new(x, y), 1.0, 2.0))
                .unwrap();
        }
        assert!(!sim.tick().used_barnes_hut);

        sim.create_body(BodyConfig::new(
            CelestialType::Asteroid,
            DVec2::new(990.0, 990.0),
            1.0,
            2.0,
        ))
        .unwrap();
        assert!(sim.tick().used_barnes_hut);
    }

    #[test]
    fn test_debug_keeps_last_tree() {
        let mut sim = Simulation::new(1000.0, 1000.0);
        for i in 0..60 {
            let (x, y) = ((i % 10) as f64 * 90.0 + 40.0, (i / 10) as f64 * 90.0 + 40.0);
            sim.create_body(BodyConfig::new(CelestialType::Asteroid, DVec2::new(x, y), 1.0, 2.0))
                .unwrap();
        }
        sim.tick();
        assert!(sim.quadtree_nodes().is_empty());

        sim.toggle_debug();
        sim.tick();
        let nodes = sim.quadtree_nodes();
        assert!(!nodes.is_empty());
        assert!((nodes[0].total_mass - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_determinism() {
        // Two simulations with the same seed and scene stay bit-identical
        fn build(seed: u64) -> Simulation {
            let mut sim = Simulation::with_seed(1200.0, 900.0, seed);
            let mut scene = Pcg32::seed_from_u64(seed);
            for _ in 0..30 {
                let kind = CelestialType::sample(&mut scene);
                let pos = DVec2::new(
                    scene.random_range(0.0..1200.0),
                    scene.random_range(0.0..900.0),
                );
                sim.create_body(BodyConfig::sampled(kind, pos, &mut scene))
                    .unwrap();
            }
            sim
        }

        let mut sim1 = build(99999);
        let mut sim2 = build(99999);
        for _ in 0..200 {
            sim1.tick();
            sim2.tick();
        }

        assert_eq!(sim1.ticks(), sim2.ticks());
        assert_eq!(sim1.len(), sim2.len());
        for (a, b) in sim1.bodies().iter().zip(sim2.bodies()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.position, b.position);
            assert_eq!(a.velocity, b.velocity);
        }
    }
}
