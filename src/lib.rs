//! Gravity Sandbox - a 2D celestial physics engine
//!
//! Core modules:
//! - `sim`: Physics core (bodies, quadtree, forces, collisions, behaviors, tick)
//! - `config`: Externally tunable physics toggles and parameters
//! - `error`: Error taxonomy surfaced to callers and collected per tick
//!
//! Rendering, input handling and scene seeding live outside this crate; they
//! read the body list and debug snapshots exposed by [`sim::Simulation`].

pub mod config;
pub mod error;
pub mod sim;

pub use config::{Parameter, PhysicsConfig, Toggle};
pub use error::{PhysicsFault, SimError};
pub use sim::Simulation;

use glam::DVec2;

/// Physics configuration constants
pub mod consts {
    /// Velocity magnitude cap applied during integration
    pub const MAX_SPEED: f64 = 8.0;
    /// Upper bound for the gravitational constant; also the amplified-pull constant
    pub const MAX_GRAVITY: f64 = 10.0;
    /// Below this separation the amplified pull is skipped
    pub const MIN_DISTANCE: f64 = 1.0;

    /// Population limit
    pub const MAX_BODIES: usize = 100;

    /// Barnes-Hut defaults
    pub const QUADTREE_CAPACITY: usize = 4;
    pub const BARNES_HUT_THETA: f64 = 0.5;
    /// Population at which the quadtree replaces direct summation
    pub const OPTIMIZATION_THRESHOLD: usize = 50;
    /// Coincident bodies stop subdividing here
    pub const MAX_TREE_DEPTH: u32 = 32;

    /// Short-range repulsion kicks in below (diamA + diamB) / 2 * this
    pub const MIN_SEPARATION_SCALE: f64 = 1.2;

    /// Radiative push strength (star → asteroids/comets)
    pub const RADIATIVE_PUSH_FORCE: f64 = 0.5;
    /// Neutron star pull multiplier
    pub const AMPLIFIED_PULL_MULTIPLIER: f64 = 2.5;
    /// Black hole capture distance
    pub const CAPTURE_THRESHOLD: f64 = 50.0;
    /// Fraction of captured mass the black hole gains
    pub const CAPTURE_MASS_FRACTION: f64 = 0.5;
    /// Most recent captures a black hole remembers
    pub const CAPTURE_LOG_CAPACITY: usize = 32;

    /// Comet tail buffer capacity
    pub const TAIL_PARTICLE_CAPACITY: usize = 20;
    /// Angular spread (radians) around the away-from-star direction
    pub const TAIL_SPREAD: f64 = 0.2;
    /// Positional trail length for comets
    pub const TRAIL_LENGTH: usize = 20;
    /// Stellar wind particle cap
    pub const WIND_PARTICLE_CAPACITY: usize = 20;
    pub const WIND_PARTICLE_SPEED: f64 = 2.0;
    /// Accretion disk spin per tick (radians)
    pub const ACCRETION_SPIN: f64 = 0.02;

    /// Particle life at spawn and decay per tick
    pub const PARTICLE_LIFE: f64 = 255.0;
    pub const PARTICLE_DECAY: f64 = 5.0;

    /// Intended ticks per second
    pub const UPDATE_RATE: u32 = 60;
}

/// Unit vector for an angle in radians
#[inline]
pub fn unit_from_angle(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

/// Heading of a vector in radians, in (-π, π]
#[inline]
pub fn heading(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}

/// Clamp a velocity's magnitude into `[min_speed, max_speed]`
///
/// A zero vector has no direction and is returned unchanged. Negative
/// bounds are treated as zero so the result never flips direction.
pub fn clamp_speed(velocity: DVec2, min_speed: f64, max_speed: f64) -> DVec2 {
    let speed = velocity.length();
    if speed == 0.0 || !speed.is_finite() {
        return velocity;
    }
    let max_speed = max_speed.max(0.0);
    let min_speed = min_speed.max(0.0);
    if speed > max_speed {
        velocity * (max_speed / speed)
    } else if speed < min_speed {
        velocity * (min_speed / speed)
    } else {
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_speed_caps_magnitude() {
        let v = clamp_speed(DVec2::new(30.0, 40.0), 0.0, 8.0);
        assert!((v.length() - 8.0).abs() < 1e-12);
        assert!((heading(v) - heading(DVec2::new(3.0, 4.0))).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_speed_floor_and_zero() {
        let v = clamp_speed(DVec2::new(0.1, 0.0), 1.0, 8.0);
        assert!((v.x - 1.0).abs() < 1e-12);
        assert_eq!(clamp_speed(DVec2::ZERO, 1.0, 8.0), DVec2::ZERO);
    }

    #[test]
    fn test_clamp_speed_never_reverses() {
        let v = clamp_speed(DVec2::new(2.0, 0.0), 0.0, -3.0);
        assert_eq!(v, DVec2::ZERO);
        let v = clamp_speed(DVec2::new(2.0, 0.0), -5.0, 8.0);
        assert_eq!(v, DVec2::new(2.0, 0.0));
    }

    #[test]
    fn test_unit_from_angle() {
        let v = unit_from_angle(std::f64::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }
}
