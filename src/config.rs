//! Physics toggles and parameters
//!
//! Owned by the simulation and written by the control layer between ticks.
//! Every phase reads it through a shared reference, so a tick always sees one
//! consistent snapshot.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Boolean behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toggle {
    Merging,
    Collisions,
    Wrapping,
    Repulsion,
    TidalForces,
    ConserveMomentum,
}

impl Toggle {
    pub const ALL: [Toggle; 6] = [
        Toggle::Merging,
        Toggle::Collisions,
        Toggle::Wrapping,
        Toggle::Repulsion,
        Toggle::TidalForces,
        Toggle::ConserveMomentum,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Toggle::Merging => "Allow Merging",
            Toggle::Collisions => "Allow Collisions",
            Toggle::Wrapping => "Allow Wrapping",
            Toggle::Repulsion => "Use Repulsion",
            Toggle::TidalForces => "Use Tidal Forces",
            Toggle::ConserveMomentum => "Conserve Momentum",
        }
    }
}

/// Numeric parameters addressable by key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    CollisionThreshold,
    ElasticCollision,
    RepulsionFactor,
    RepulsionFalloff,
    DampingFactor,
    MinSeparationScale,
    TidalForceFactor,
    GravitationalSoftening,
    MergerThreshold,
    BarnesHutTheta,
    GravitationalConstant,
    MinSpeed,
    MaxSpeed,
    MaxGravity,
    MinDistance,
}

impl Parameter {
    /// Range a written value is clamped into, if the parameter has one
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Parameter::ElasticCollision => Some((0.0, 1.0)),
            Parameter::RepulsionFactor => Some((0.0, 20.0)),
            Parameter::MergerThreshold => Some((0.1, 1.0)),
            Parameter::MinSpeed
            | Parameter::MaxSpeed
            | Parameter::MaxGravity
            | Parameter::MinDistance
            | Parameter::GravitationalSoftening
            | Parameter::BarnesHutTheta
            | Parameter::GravitationalConstant => Some((0.0, f64::INFINITY)),
            _ => None,
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // === Toggles ===
    pub allow_merging: bool,
    pub allow_collisions: bool,
    /// Wrap around world edges (otherwise bounce)
    pub allow_wrapping: bool,
    pub use_repulsion: bool,
    /// Carried for the control panel; no physics reads it
    pub use_tidal_forces: bool,
    /// Apply impulses on non-merging contact
    pub conserve_momentum: bool,

    // === Contact ===
    pub collision_threshold: f64,
    /// Restitution: 1 = perfectly elastic, 0 = perfectly inelastic
    pub elastic_collision: f64,
    pub repulsion_factor: f64,
    pub repulsion_falloff: f64,
    /// Carried for the control panel; no physics reads it
    pub damping_factor: f64,
    pub min_separation_scale: f64,
    /// Carried for the control panel; no physics reads it
    pub tidal_force_factor: f64,
    /// Fraction of combined diameter below which contact merges
    pub merger_threshold: f64,

    // === Gravity ===
    pub gravitational_constant: f64,
    /// Pairs closer than this are skipped
    pub gravitational_softening: f64,
    pub max_gravity: f64,
    pub min_distance: f64,

    // === Barnes-Hut ===
    pub barnes_hut_theta: f64,
    pub quadtree_capacity: usize,
    pub optimization_threshold: usize,

    // === Limits ===
    pub max_bodies: usize,
    /// 0 disables the speed floor
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            allow_merging: true,
            allow_collisions: true,
            allow_wrapping: true,
            use_repulsion: true,
            use_tidal_forces: false,
            conserve_momentum: true,

            collision_threshold: 0.8,
            elastic_collision: 0.8,
            repulsion_factor: 10.0,
            repulsion_falloff: 2.0,
            damping_factor: 0.95,
            min_separation_scale: MIN_SEPARATION_SCALE,
            tidal_force_factor: 0.1,
            merger_threshold: 0.4,

            gravitational_constant: MAX_GRAVITY / 2.0,
            gravitational_softening: 0.1,
            max_gravity: MAX_GRAVITY,
            min_distance: MIN_DISTANCE,

            barnes_hut_theta: BARNES_HUT_THETA,
            quadtree_capacity: QUADTREE_CAPACITY,
            optimization_threshold: OPTIMIZATION_THRESHOLD,

            max_bodies: MAX_BODIES,
            min_speed: 0.0,
            max_speed: MAX_SPEED,
        }
    }
}

impl PhysicsConfig {
    pub fn is_enabled(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Merging => self.allow_merging,
            Toggle::Collisions => self.allow_collisions,
            Toggle::Wrapping => self.allow_wrapping,
            Toggle::Repulsion => self.use_repulsion,
            Toggle::TidalForces => self.use_tidal_forces,
            Toggle::ConserveMomentum => self.conserve_momentum,
        }
    }

    pub fn set_toggle(&mut self, toggle: Toggle, enabled: bool) {
        let slot = match toggle {
            Toggle::Merging => &mut self.allow_merging,
            Toggle::Collisions => &mut self.allow_collisions,
            Toggle::Wrapping => &mut self.allow_wrapping,
            Toggle::Repulsion => &mut self.use_repulsion,
            Toggle::TidalForces => &mut self.use_tidal_forces,
            Toggle::ConserveMomentum => &mut self.conserve_momentum,
        };
        *slot = enabled;
    }

    /// Flip a toggle, returning the new state
    pub fn toggle(&mut self, toggle: Toggle) -> bool {
        let enabled = !self.is_enabled(toggle);
        self.set_toggle(toggle, enabled);
        enabled
    }

    pub fn parameter(&self, param: Parameter) -> f64 {
        match param {
            Parameter::CollisionThreshold => self.collision_threshold,
            Parameter::ElasticCollision => self.elastic_collision,
            Parameter::RepulsionFactor => self.repulsion_factor,
            Parameter::RepulsionFalloff => self.repulsion_falloff,
            Parameter::DampingFactor => self.damping_factor,
            Parameter::MinSeparationScale => self.min_separation_scale,
            Parameter::TidalForceFactor => self.tidal_force_factor,
            Parameter::GravitationalSoftening => self.gravitational_softening,
            Parameter::MergerThreshold => self.merger_threshold,
            Parameter::BarnesHutTheta => self.barnes_hut_theta,
            Parameter::GravitationalConstant => self.gravitational_constant,
            Parameter::MinSpeed => self.min_speed,
            Parameter::MaxSpeed => self.max_speed,
            Parameter::MaxGravity => self.max_gravity,
            Parameter::MinDistance => self.min_distance,
        }
    }

    /// Set a parameter, clamping to its range
    ///
    /// Non-finite values are ignored. The speed bounds never cross: a floor
    /// above the cap is lowered to it, and a cap below the floor is raised.
    pub fn set_parameter(&mut self, param: Parameter, value: f64) {
        if !value.is_finite() {
            log::warn!("Ignoring non-finite value for {:?}", param);
            return;
        }
        let value = match param.range() {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        };
        let value = match param {
            Parameter::MinSpeed => value.min(self.max_speed),
            Parameter::MaxSpeed => value.max(self.min_speed),
            _ => value,
        };
        let slot = match param {
            Parameter::CollisionThreshold => &mut self.collision_threshold,
            Parameter::ElasticCollision => &mut self.elastic_collision,
            Parameter::RepulsionFactor => &mut self.repulsion_factor,
            Parameter::RepulsionFalloff => &mut self.repulsion_falloff,
            Parameter::DampingFactor => &mut self.damping_factor,
            Parameter::MinSeparationScale => &mut self.min_separation_scale,
            Parameter::TidalForceFactor => &mut self.tidal_force_factor,
            Parameter::GravitationalSoftening => &mut self.gravitational_softening,
            Parameter::MergerThreshold => &mut self.merger_threshold,
            Parameter::BarnesHutTheta => &mut self.barnes_hut_theta,
            Parameter::GravitationalConstant => &mut self.gravitational_constant,
            Parameter::MinSpeed => &mut self.min_speed,
            Parameter::MaxSpeed => &mut self.max_speed,
            Parameter::MaxGravity => &mut self.max_gravity,
            Parameter::MinDistance => &mut self.min_distance,
        };
        *slot = value;
    }

    /// Check structural constraints the physics relies on
    pub fn validate(&self) -> Result<(), SimError> {
        if self.quadtree_capacity == 0 {
            return Err(SimError::Config("quadtree_capacity must be at least 1".into()));
        }
        if self.max_bodies == 0 {
            return Err(SimError::Config("max_bodies must be at least 1".into()));
        }
        if !(self.barnes_hut_theta >= 0.0) {
            return Err(SimError::Config("barnes_hut_theta must be non-negative".into()));
        }
        if !(self.gravitational_softening >= 0.0) {
            return Err(SimError::Config(
                "gravitational_softening must be non-negative".into(),
            ));
        }
        if !(self.min_speed >= 0.0 && self.min_speed <= self.max_speed) {
            return Err(SimError::Config(format!(
                "speed range [{}, {}] is empty",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded physics config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Physics config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Load from disk, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Using default physics config: {}", err);
                Self::default()
            }
        }
    }
}
