//! Simulation state
//!
//! Owns the body list, the physics configuration and the RNG. Everything the
//! tick reads or writes lives here; rendering reads it back through the
//! accessors between ticks.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyConfig, BodyId, BodyInfo};
use super::forces::ForceBreakdown;
use super::quadtree::{Boundary, QuadNodeInfo, QuadTree};
use super::tick::{self, TickReport};
use crate::config::{Parameter, PhysicsConfig};
use crate::error::SimError;

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// A running gravity sandbox
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Live bodies in creation order
    pub(crate) bodies: Vec<Body>,
    pub(crate) config: PhysicsConfig,
    /// World rectangle: quadtree root and wrap/bounce edges
    pub(crate) bounds: Boundary,
    /// Pass-through for renderers
    pub(crate) view_scale: f64,
    pub(crate) paused: bool,
    pub(crate) debug: bool,
    pub(crate) time_ticks: u64,
    pub(crate) seed: u64,
    pub(crate) rng: Pcg32,
    /// Last tick's index, kept only while debug is on
    pub(crate) quadtree: Option<QuadTree>,
    pub(crate) last_report: TickReport,
    next_id: u32,
}

impl Simulation {
    /// Empty world of the given size with default physics
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_seed(width, height, DEFAULT_SEED)
    }

    pub fn with_seed(width: f64, height: f64, seed: u64) -> Self {
        Self {
            bodies: Vec::new(),
            config: PhysicsConfig::default(),
            bounds: Boundary::new(0.0, 0.0, width, height),
            view_scale: 1.0,
            paused: false,
            debug: false,
            time_ticks: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            quadtree: None,
            last_report: TickReport::default(),
            next_id: 1,
        }
    }

    pub fn with_config(width: f64, height: f64, config: PhysicsConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut sim = Self::new(width, height);
        sim.config = config;
        Ok(sim)
    }

    // === Bodies ===

    /// Add a body; rejected with the body list unchanged when invalid or full
    pub fn create_body(&mut self, config: BodyConfig) -> Result<BodyId, SimError> {
        config.validate()?;
        if self.bodies.len() >= self.config.max_bodies {
            return Err(SimError::MaxBodiesReached {
                max: self.config.max_bodies,
            });
        }

        let id = BodyId(self.next_id);
        self.next_id += 1;
        log::debug!("Created {} {}", config.kind.name(), id);
        self.bodies.push(Body::from_config(id, config));
        Ok(id)
    }

    /// Remove a body immediately; false if it was not present
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.id != id);
        self.bodies.len() != before
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.quadtree = None;
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Direct access for drag-style manipulation between ticks
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn info(&self, id: BodyId) -> Option<BodyInfo> {
        self.body(id).map(Body::info)
    }

    /// First body whose disc contains `point`, topmost (newest) first
    pub fn body_at(&self, point: DVec2) -> Option<BodyId> {
        self.bodies
            .iter()
            .rev()
            .find(|b| b.contains_point(point))
            .map(|b| b.id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    // === Ticking ===

    /// Advance one frame; no-op while paused
    pub fn tick(&mut self) -> &TickReport {
        tick::tick(self);
        &self.last_report
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    // === Settings ===

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) -> Result<(), SimError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Clamped to `[0, max_gravity]`
    pub fn set_gravitational_constant(&mut self, value: f64) {
        let value = value.clamp(0.0, self.config.max_gravity);
        self.config
            .set_parameter(Parameter::GravitationalConstant, value);
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.config.gravitational_constant
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.view_scale = scale;
        }
    }

    pub fn view_scale(&self) -> f64 {
        self.view_scale
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.bounds = Boundary::new(0.0, 0.0, width, height);
    }

    pub fn bounds(&self) -> Boundary {
        self.bounds
    }

    // === Debug ===

    /// Flip the debug overlay; returns the new state
    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        if !self.debug {
            self.quadtree = None;
        }
        self.debug
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Gravity and repulsion each body received in the last force pass
    pub fn debug_forces(&self) -> Vec<(BodyId, ForceBreakdown)> {
        self.bodies.iter().map(|b| (b.id, b.forces)).collect()
    }

    /// Nodes of the last tick's quadtree; empty unless debug is on and the
    /// population was large enough to build one
    pub fn quadtree_nodes(&self) -> Vec<QuadNodeInfo> {
        self.quadtree
            .as_ref()
            .map(QuadTree::snapshot)
            .unwrap_or_default()
    }

    // === Diagnostics ===

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }

    pub fn total_momentum(&self) -> DVec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }
}
