//! Gravity and short-range repulsion
//!
//! Two evaluation modes share one pairwise law:
//! - direct summation over every other body, O(n²)
//! - Barnes-Hut traversal of a [`QuadTree`], O(n log n)
//!
//! Forces are accumulated per body into a [`ForceBreakdown`] and only written
//! back to the bodies once every body has been evaluated, so each body's
//! computation reads a consistent snapshot.

use std::ops::AddAssign;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::quadtree::{NodeId, QuadTree};
use crate::config::PhysicsConfig;
use crate::error::PhysicsFault;

/// Net force on one body, split by origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceBreakdown {
    pub gravity: DVec2,
    pub repulsion: DVec2,
}

impl ForceBreakdown {
    #[inline]
    pub fn total(&self) -> DVec2 {
        self.gravity + self.repulsion
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.gravity.is_finite() && self.repulsion.is_finite()
    }
}

impl AddAssign for ForceBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.gravity += rhs.gravity;
        self.repulsion += rhs.repulsion;
    }
}

/// Force evaluator bound to one tick's configuration
pub struct ForceField<'a> {
    config: &'a PhysicsConfig,
}

impl<'a> ForceField<'a> {
    pub fn new(config: &'a PhysicsConfig) -> Self {
        Self { config }
    }

    /// Force on `a` exerted by `b`
    ///
    /// Pairs closer than the softening distance contribute nothing.
    pub fn pairwise(&self, a: &Body, b: &Body) -> ForceBreakdown {
        let mut forces = ForceBreakdown::default();
        let separation = b.position - a.position;
        let distance = separation.length();
        if distance < self.config.gravitational_softening || distance == 0.0 {
            return forces;
        }
        let direction = separation / distance;

        let strength = self.config.gravitational_constant * a.mass * b.mass / (distance * distance);
        forces.gravity = direction * strength;

        let min_distance = (a.diameter + b.diameter) * 0.5 * self.config.min_separation_scale;
        if distance < min_distance {
            let strength = self.config.repulsion_factor
                * (1.0 - distance / min_distance).powf(self.config.repulsion_falloff);
            forces.repulsion = -direction * strength;
        }
        forces
    }

    /// Sum of pairwise forces on `bodies[index]` from every other body
    pub fn direct(&self, index: usize, bodies: &[Body]) -> ForceBreakdown {
        let body = &bodies[index];
        let mut forces = ForceBreakdown::default();
        for (j, other) in bodies.iter().enumerate() {
            if j != index {
                forces += self.pairwise(body, other);
            }
        }
        forces
    }

    /// Barnes-Hut approximation of the force on `bodies[index]`
    ///
    /// Distant nodes contribute gravity only, as a point mass at their centre
    /// of mass. Leaves and bodies outside the tree are summed exactly. Errors
    /// only on a tree that does not match `bodies`; a non-finite sum is
    /// returned as is.
    pub fn barnes_hut(
        &self,
        index: usize,
        bodies: &[Body],
        tree: &QuadTree,
    ) -> Result<ForceBreakdown, PhysicsFault> {
        let body = &bodies[index];
        let mut forces = ForceBreakdown::default();
        self.visit(index, body, bodies, tree, tree.root(), &mut forces)?;

        for &outlier in tree.outliers() {
            if outlier == index {
                continue;
            }
            let other = bodies
                .get(outlier)
                .ok_or(PhysicsFault::StaleEntry { index: outlier })?;
            forces += self.pairwise(body, other);
        }
        Ok(forces)
    }

    fn visit(
        &self,
        index: usize,
        body: &Body,
        bodies: &[Body],
        tree: &QuadTree,
        id: NodeId,
        forces: &mut ForceBreakdown,
    ) -> Result<(), PhysicsFault> {
        let node = tree
            .node(id)
            .ok_or(PhysicsFault::MalformedNode { node: id.0 })?;
        if node.total_mass <= 0.0 {
            return Ok(());
        }

        let Some(children) = node.children else {
            for entry in &node.entries {
                if entry.index == index {
                    continue;
                }
                let other = bodies
                    .get(entry.index)
                    .ok_or(PhysicsFault::StaleEntry { index: entry.index })?;
                *forces += self.pairwise(body, other);
            }
            return Ok(());
        };

        // A node holding the body would pull it toward its own mass
        let separation = node.center_of_mass - body.position;
        let distance = separation.length();
        if !node.boundary.contains(body.position)
            && distance >= self.config.gravitational_softening
            && distance > 0.0
            && node.boundary.w / distance < self.config.barnes_hut_theta
        {
            let strength = self.config.gravitational_constant * body.mass * node.total_mass
                / (distance * distance);
            forces.gravity += separation / distance * strength;
            return Ok(());
        }

        for child in children {
            self.visit(index, body, bodies, tree, child, forces)?;
        }
        Ok(())
    }

    /// Evaluate every body, direct or via the tree
    ///
    /// A failed traversal falls back to direct summation for that body; a
    /// non-finite result is discarded. Both are recorded in `faults`.
    pub fn compute(
        &self,
        bodies: &[Body],
        tree: Option<&QuadTree>,
        faults: &mut Vec<PhysicsFault>,
    ) -> Vec<ForceBreakdown> {
        (0..bodies.len())
            .map(|index| {
                let forces = match tree {
                    Some(tree) => match self.barnes_hut(index, bodies, tree) {
                        Ok(forces) => forces,
                        Err(fault) => {
                            faults.push(PhysicsFault::IndexFallback {
                                body: bodies[index].id,
                                reason: fault.to_string(),
                            });
                            self.direct(index, bodies)
                        }
                    },
                    None => self.direct(index, bodies),
                };
                if forces.is_finite() {
                    forces
                } else {
                    faults.push(PhysicsFault::NonFiniteForce {
                        body: bodies[index].id,
                    });
                    ForceBreakdown::default()
                }
            })
            .collect()
    }

    /// Replace each body's acceleration with its net force over mass
    pub fn apply(bodies: &mut [Body], forces: &[ForceBreakdown]) {
        for (body, force) in bodies.iter_mut().zip(forces) {
            body.forces = *force;
            body.acceleration = force.total() / body.mass;
        }
    }
}
