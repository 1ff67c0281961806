//! Per-type special behaviors
//!
//! One pass over the body list after collisions. Each behavior first computes
//! everything it wants to change, checks it is finite, and only then writes,
//! so a faulty source leaves the rest of the population untouched.

use glam::DVec2;
use rand::Rng;

use super::body::{Behavior, Body, CaptureEvent, CelestialType, EffectState, Particle};
use crate::config::PhysicsConfig;
use crate::consts::*;
use crate::error::PhysicsFault;
use crate::{heading, unit_from_angle};

impl Behavior {
    /// Whether this behavior acts on a body of `kind`
    pub fn affects(&self, kind: CelestialType) -> bool {
        match self {
            Behavior::RadiativePush => {
                matches!(kind, CelestialType::Asteroid | CelestialType::Comet)
            }
            Behavior::AmplifiedPull | Behavior::Capture => true,
            Behavior::TailEmission => false,
        }
    }
}

/// Per-pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BehaviorStats {
    pub pushed: usize,
    pub pulled: usize,
    pub captured: usize,
    pub tail_particles: usize,
}

/// Behavior pass bound to one tick
pub struct BehaviorEngine<'a> {
    config: &'a PhysicsConfig,
    tick: u64,
}

impl<'a> BehaviorEngine<'a> {
    pub fn new(config: &'a PhysicsConfig, tick: u64) -> Self {
        Self { config, tick }
    }

    /// Run every body's behavior once, in list order
    pub fn apply_all<R: Rng + ?Sized>(
        &self,
        bodies: &mut [Body],
        rng: &mut R,
        faults: &mut Vec<PhysicsFault>,
    ) -> BehaviorStats {
        let mut stats = BehaviorStats::default();
        for index in 0..bodies.len() {
            if bodies[index].pending_removal {
                continue;
            }
            let Some(behavior) = bodies[index].behavior() else {
                continue;
            };
            let result = match behavior {
                Behavior::RadiativePush => self.radiative_push(index, bodies),
                Behavior::AmplifiedPull => self.amplified_pull(index, bodies),
                Behavior::Capture => self.capture(index, bodies),
                Behavior::TailEmission => self.tail_emission(index, bodies, rng),
            };
            match result {
                Ok(count) => match behavior {
                    Behavior::RadiativePush => stats.pushed += count,
                    Behavior::AmplifiedPull => stats.pulled += count,
                    Behavior::Capture => stats.captured += count,
                    Behavior::TailEmission => stats.tail_particles += count,
                },
                Err(fault) => faults.push(fault),
            }
        }
        stats
    }

    /// Indices of live bodies other than `source` that `behavior` acts on
    fn targets<'b>(
        bodies: &'b [Body],
        source: usize,
        behavior: Behavior,
    ) -> impl Iterator<Item = (usize, &'b Body)> + 'b {
        bodies.iter().enumerate().filter(move |(j, target)| {
            *j != source && !target.pending_removal && behavior.affects(target.kind)
        })
    }

    fn apply_forces(
        bodies: &mut [Body],
        source: usize,
        behavior: Behavior,
        forces: Vec<(usize, DVec2)>,
    ) -> Result<usize, PhysicsFault> {
        if forces.iter().any(|(_, force)| !force.is_finite()) {
            return Err(PhysicsFault::BehaviorFault {
                body: bodies[source].id,
                behavior: behavior.name(),
            });
        }
        let count = forces.len();
        for (j, force) in forces {
            bodies[j].apply_force(force);
        }
        Ok(count)
    }

    /// Push affected bodies outward, fading linearly to zero at the effect radius
    pub fn radiative_push(&self, source: usize, bodies: &mut [Body]) -> Result<usize, PhysicsFault> {
        let behavior = Behavior::RadiativePush;
        let origin = &bodies[source];
        let Some(radius) = origin.kind.effect_radius() else {
            return Ok(0);
        };

        let forces: Vec<(usize, DVec2)> = Self::targets(bodies, source, behavior)
            .filter_map(|(j, target)| {
                let offset = target.position - origin.position;
                let distance = offset.length();
                (distance > 0.0 && distance < radius).then(|| {
                    let strength = RADIATIVE_PUSH_FORCE * (1.0 - distance / radius);
                    (j, offset / distance * strength)
                })
            })
            .collect();
        Self::apply_forces(bodies, source, behavior, forces)
    }

    /// Extra attraction toward the source, on top of regular gravity
    pub fn amplified_pull(&self, source: usize, bodies: &mut [Body]) -> Result<usize, PhysicsFault> {
        let behavior = Behavior::AmplifiedPull;
        let origin = &bodies[source];
        let constant = self.config.max_gravity * AMPLIFIED_PULL_MULTIPLIER;

        let forces: Vec<(usize, DVec2)> = Self::targets(bodies, source, behavior)
            .filter_map(|(j, target)| {
                let offset = origin.position - target.position;
                let distance = offset.length();
                (distance >= self.config.min_distance && distance > 0.0).then(|| {
                    let strength = constant * origin.mass * target.mass / (distance * distance);
                    (j, offset / distance * strength)
                })
            })
            .collect();
        Self::apply_forces(bodies, source, behavior, forces)
    }

    /// Swallow everything within the capture threshold
    ///
    /// The source gains half of each captured mass. Momentum is not merged:
    /// the captured body's velocity is simply lost.
    pub fn capture(&self, source: usize, bodies: &mut [Body]) -> Result<usize, PhysicsFault> {
        let behavior = Behavior::Capture;
        let origin = bodies[source].position;

        let captured: Vec<(usize, DVec2, f64)> = Self::targets(bodies, source, behavior)
            .filter(|(_, target)| target.position.distance(origin) < CAPTURE_THRESHOLD)
            .map(|(j, target)| (j, target.position, target.mass))
            .collect();
        if captured.is_empty() {
            return Ok(0);
        }

        let gained: f64 = captured
            .iter()
            .map(|(_, _, mass)| mass * CAPTURE_MASS_FRACTION)
            .sum();
        if !gained.is_finite() {
            return Err(PhysicsFault::BehaviorFault {
                body: bodies[source].id,
                behavior: behavior.name(),
            });
        }

        for (j, _, _) in &captured {
            bodies[*j].pending_removal = true;
        }
        let hole = &mut bodies[source];
        hole.mass += gained;
        if let EffectState::Accretion { captured: events, .. } = &mut hole.effect {
            events.extend(captured.iter().map(|(_, position, _)| CaptureEvent {
                position: *position,
                tick: self.tick,
            }));
            if events.len() > CAPTURE_LOG_CAPACITY {
                events.drain(..events.len() - CAPTURE_LOG_CAPACITY);
            }
        }
        log::debug!("{} captured {} bodies", hole.id, captured.len());
        Ok(captured.len())
    }

    /// Shed a tail particle away from the nearest star and age the tail
    ///
    /// Returns the number of particles spawned (0 or 1).
    pub fn tail_emission<R: Rng + ?Sized>(
        &self,
        source: usize,
        bodies: &mut [Body],
        rng: &mut R,
    ) -> Result<usize, PhysicsFault> {
        let comet = &bodies[source];
        let position = comet.position;
        let nearest_star = bodies
            .iter()
            .enumerate()
            .filter(|(j, body)| *j != source && !body.pending_removal && body.kind.is_stellar())
            .map(|(_, body)| body.position)
            .min_by(|a, b| {
                a.distance_squared(position)
                    .partial_cmp(&b.distance_squared(position))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let id = comet.id;
        let EffectState::Tail { particles, .. } = &mut bodies[source].effect else {
            return Ok(0);
        };

        let mut spawned = 0;
        if let Some(star) = nearest_star
            && particles.len() < TAIL_PARTICLE_CAPACITY
        {
            let angle = heading(position - star) + rng.random_range(-TAIL_SPREAD..TAIL_SPREAD);
            let speed = rng.random_range(1.0..3.0);
            let particle = Particle {
                pos: position,
                vel: unit_from_angle(angle) * speed,
                life: PARTICLE_LIFE,
                max_life: rng.random_range(20.0..40.0),
                size: rng.random_range(2.0..5.0),
            };
            if !particle.vel.is_finite() {
                return Err(PhysicsFault::BehaviorFault {
                    body: id,
                    behavior: Behavior::TailEmission.name(),
                });
            }
            particles.push(particle);
            spawned = 1;
        }

        particles.retain_mut(Particle::step);
        Ok(spawned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyConfig, BodyId};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn body(id: u32, kind: CelestialType, x: f64, y: f64, mass: f64) -> Body {
        let config = BodyConfig::new(kind, DVec2::new(x, y), mass, 10.0);
        Body::from_config(BodyId(id), config)
    }

    fn tail_len(body: &Body) -> usize {
        match &body.effect {
            EffectState::Tail { particles, .. } => particles.len(),
            _ => 0,
        }
    }

    #[test]
    fn test_radiative_push_only_hits_light_types_inside_radius() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 0);
        let mut bodies = vec![
            body(0, CelestialType::Star, 0.0, 0.0, 500.0),
            body(1, CelestialType::Asteroid, 250.0, 0.0, 2.0),
            body(2, CelestialType::Planet, 100.0, 0.0, 2.0),
            body(3, CelestialType::Comet, 600.0, 0.0, 2.0),
        ];
        assert_eq!(engine.radiative_push(0, &mut bodies), Ok(1));
        // 0.5 * (1 - 250/500) / mass 2
        assert!((bodies[1].acceleration.x - 0.125).abs() < 1e-12);
        assert_eq!(bodies[2].acceleration, DVec2::ZERO);
        assert_eq!(bodies[3].acceleration, DVec2::ZERO);
    }

    #[test]
    fn test_amplified_pull_attracts_everything() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 0);
        let mut bodies = vec![
            body(0, CelestialType::NeutronStar, 0.0, 0.0, 100.0),
            body(1, CelestialType::Planet, 0.0, 50.0, 4.0),
            body(2, CelestialType::Asteroid, 0.5, 0.0, 4.0),
        ];
        assert_eq!(engine.amplified_pull(0, &mut bodies), Ok(1));
        // 10 * 2.5 * 100 * 4 / 2500 = 1, over mass 4
        assert!((bodies[1].acceleration.y + 0.25).abs() < 1e-12);
        // Too close: skipped
        assert_eq!(bodies[2].acceleration, DVec2::ZERO);
        assert_eq!(bodies[0].acceleration, DVec2::ZERO);
    }

    #[test]
    fn test_capture_flags_target_and_adds_half_mass() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 17);
        let mut bodies = vec![
            body(0, CelestialType::BlackHole, 0.0, 0.0, 30_000.0),
            body(1, CelestialType::Planet, 40.0, 0.0, 2000.0),
            body(2, CelestialType::Planet, 60.0, 0.0, 2000.0),
        ];
        assert_eq!(engine.capture(0, &mut bodies), Ok(1));
        assert!(bodies[1].pending_removal);
        assert!(!bodies[2].pending_removal);
        assert_eq!(bodies[0].mass, 31_000.0);

        let EffectState::Accretion { captured, .. } = &bodies[0].effect else {
            panic!("black hole should track captures");
        };
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].tick, 17);
        assert_eq!(captured[0].position, DVec2::new(40.0, 0.0));
    }

    #[test]
    fn test_capture_log_keeps_most_recent() {
        let config = PhysicsConfig::default();
        let mut bodies = vec![
            body(0, CelestialType::BlackHole, 0.0, 0.0, 30_000.0),
            body(1, CelestialType::Asteroid, 10.0, 0.0, 2.0),
        ];
        let rounds = CAPTURE_LOG_CAPACITY as u64 + 8;
        for tick in 0..rounds {
            bodies[1].pending_removal = false;
            let engine = BehaviorEngine::new(&config, tick);
            assert_eq!(engine.capture(0, &mut bodies), Ok(1));
        }

        let EffectState::Accretion { captured, .. } = &bodies[0].effect else {
            panic!("black hole should track captures");
        };
        assert_eq!(captured.len(), CAPTURE_LOG_CAPACITY);
        assert_eq!(captured.first().map(|e| e.tick), Some(8));
        assert_eq!(captured.last().map(|e| e.tick), Some(rounds - 1));
    }

    #[test]
    fn test_first_black_hole_wins_and_captured_holes_stay_passive() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 0);
        let mut rng = Pcg32::seed_from_u64(0);
        let mut faults = Vec::new();
        let mut bodies = vec![
            body(0, CelestialType::BlackHole, 0.0, 0.0, 30_000.0),
            body(1, CelestialType::BlackHole, 20.0, 0.0, 40_000.0),
        ];
        let stats = engine.apply_all(&mut bodies, &mut rng, &mut faults);
        assert_eq!(stats.captured, 1);
        assert!(bodies[1].pending_removal);
        assert!(!bodies[0].pending_removal);
        assert_eq!(bodies[0].mass, 50_000.0);
        assert!(faults.is_empty());
    }

    #[test]
    fn test_tail_needs_a_star_and_is_bounded() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 0);
        let mut rng = Pcg32::seed_from_u64(3);

        let mut lonely = vec![body(0, CelestialType::Comet, 0.0, 0.0, 300.0)];
        assert_eq!(engine.tail_emission(0, &mut lonely, &mut rng), Ok(0));
        assert_eq!(tail_len(&lonely[0]), 0);

        let mut bodies = vec![
            body(0, CelestialType::Comet, 100.0, 0.0, 300.0),
            body(1, CelestialType::Star, 0.0, 0.0, 500.0),
        ];
        for _ in 0..100 {
            engine.tail_emission(0, &mut bodies, &mut rng).unwrap();
            assert!(tail_len(&bodies[0]) <= TAIL_PARTICLE_CAPACITY);
        }
        assert_eq!(tail_len(&bodies[0]), TAIL_PARTICLE_CAPACITY);

        // Particles stream away from the star
        let EffectState::Tail { particles, .. } = &bodies[0].effect else {
            panic!("comet should carry a tail");
        };
        assert!(particles.iter().all(|p| p.vel.x > 0.0));
    }

    #[test]
    fn test_non_finite_push_is_isolated() {
        let config = PhysicsConfig::default();
        let engine = BehaviorEngine::new(&config, 0);
        let mut rng = Pcg32::seed_from_u64(0);
        let mut faults = Vec::new();
        let mut bodies = vec![
            body(0, CelestialType::NeutronStar, 0.0, 0.0, f64::INFINITY),
            body(1, CelestialType::Asteroid, 10.0, 0.0, 5.0),
        ];
        engine.apply_all(&mut bodies, &mut rng, &mut faults);
        assert_eq!(faults.len(), 1);
        assert_eq!(bodies[1].acceleration, DVec2::ZERO);
    }
}
