//! Collision detection and response
//!
//! Broad phase is a plain O(n²) sweep over unordered pairs; the population cap
//! keeps it cheap. Each overlapping, approaching pair either merges, bounces
//! with an impulse, gets pushed apart, or some combination, depending on the
//! configuration.

use super::body::{Body, BodyId};
use crate::config::PhysicsConfig;

/// What happened to a single overlapping pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// Collisions are switched off
    Ignored,
    /// Already moving apart, nothing applied
    Separating,
    /// Combined into `kept`; `removed` is flagged for pruning
    Merged { kept: BodyId, removed: BodyId },
    /// Impulse and/or repulsion applied
    Bounced,
}

/// Per-pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub contacts: usize,
    pub merges: usize,
    pub bounces: usize,
}

/// Collision response bound to one tick's configuration
pub struct CollisionResolver<'a> {
    config: &'a PhysicsConfig,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(config: &'a PhysicsConfig) -> Self {
        Self { config }
    }

    /// Resolve every overlapping pair in ascending index order
    ///
    /// Bodies flagged for removal earlier in the pass take no further part.
    pub fn resolve_all(&self, bodies: &mut [Body]) -> CollisionStats {
        let mut stats = CollisionStats::default();
        if !self.config.allow_collisions {
            return stats;
        }

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (head, tail) = bodies.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                if a.pending_removal || b.pending_removal {
                    continue;
                }
                let contact_distance = (a.diameter + b.diameter) * 0.5;
                if a.position.distance(b.position) >= contact_distance {
                    continue;
                }

                stats.contacts += 1;
                match self.resolve_pair(a, b) {
                    CollisionOutcome::Merged { kept, removed } => {
                        stats.merges += 1;
                        log::debug!("Merged {} into {}", removed, kept);
                    }
                    CollisionOutcome::Bounced => stats.bounces += 1,
                    CollisionOutcome::Separating | CollisionOutcome::Ignored => {}
                }
            }
        }
        stats
    }

    /// Respond to contact between `a` and `b`
    ///
    /// The normal points from `b` toward `a`; the pair is separating when the
    /// relative velocity `a.v - b.v` has a positive component along it.
    pub fn resolve_pair(&self, a: &mut Body, b: &mut Body) -> CollisionOutcome {
        if !self.config.allow_collisions {
            return CollisionOutcome::Ignored;
        }

        let offset = a.position - b.position;
        let distance = offset.length();
        let normal = offset.normalize_or_zero();
        let normal_velocity = (a.velocity - b.velocity).dot(normal);
        if normal_velocity > 0.0 {
            return CollisionOutcome::Separating;
        }

        let merge_distance = (a.diameter + b.diameter) * self.config.merger_threshold;
        if self.config.allow_merging && distance < merge_distance {
            let (kept, removed) = merge_bodies(a, b);
            return CollisionOutcome::Merged { kept, removed };
        }

        if self.config.conserve_momentum {
            let e = self.config.elastic_collision;
            let j = -(1.0 + e) * normal_velocity / (1.0 / a.mass + 1.0 / b.mass);
            a.velocity += normal * (j / a.mass);
            b.velocity -= normal * (j / b.mass);
        }

        if self.config.use_repulsion {
            let push = normal * self.config.repulsion_factor;
            a.acceleration += push;
            b.acceleration -= push;
        }

        CollisionOutcome::Bounced
    }
}

/// Merge two bodies, conserving mass, momentum, barycenter and volume
///
/// The heavier body survives and is updated in place; the other is flagged
/// for removal. On an exact mass tie `a` survives: an arbitrary choice that
/// keeps the earlier body in iteration order.
pub fn merge_bodies(a: &mut Body, b: &mut Body) -> (BodyId, BodyId) {
    let total_mass = a.mass + b.mass;
    let position = (a.position * a.mass + b.position * b.mass) / total_mass;
    let velocity = (a.momentum() + b.momentum()) / total_mass;
    let diameter = (a.diameter.powi(3) + b.diameter.powi(3)).cbrt();

    let (kept, removed) = if b.mass > a.mass { (b, a) } else { (a, b) };
    kept.mass = total_mass;
    kept.position = position;
    kept.velocity = velocity;
    kept.diameter = diameter;
    removed.pending_removal = true;
    (kept.id, removed.id)
}
