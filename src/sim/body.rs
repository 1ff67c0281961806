//! Bodies and the celestial type catalogue
//!
//! A body is a point mass with a diameter, a closed type tag and a per-type
//! effect payload. Types carry their default ranges; callers sample from them
//! when building a [`BodyConfig`], the engine never does.

use std::collections::VecDeque;
use std::fmt;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::forces::ForceBreakdown;
use crate::consts::*;
use crate::error::SimError;
use crate::unit_from_angle;

/// Stable handle for a body within one simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed interval used for type defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            self.min
        } else {
            rng.random_range(self.min..self.max)
        }
    }
}

/// Special behavior attached to a celestial type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Stellar wind pushing light bodies outward
    RadiativePush,
    /// Extra attraction on top of regular gravity
    AmplifiedPull,
    /// Swallows anything that comes too close
    Capture,
    /// Sheds tail particles away from the nearest star
    TailEmission,
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::RadiativePush => "radiative push",
            Behavior::AmplifiedPull => "amplified pull",
            Behavior::Capture => "capture",
            Behavior::TailEmission => "tail emission",
        }
    }
}

/// Celestial body types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CelestialType {
    Star,
    NeutronStar,
    BlackHole,
    Planet,
    #[default]
    Asteroid,
    Comet,
}

impl CelestialType {
    pub const ALL: [CelestialType; 6] = [
        CelestialType::Star,
        CelestialType::NeutronStar,
        CelestialType::BlackHole,
        CelestialType::Planet,
        CelestialType::Asteroid,
        CelestialType::Comet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CelestialType::Star => "Star",
            CelestialType::NeutronStar => "Neutron Star",
            CelestialType::BlackHole => "Black Hole",
            CelestialType::Planet => "Planet",
            CelestialType::Asteroid => "Asteroid",
            CelestialType::Comet => "Comet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CelestialType::Star => "Massive, luminous spheres of plasma",
            CelestialType::NeutronStar => {
                "Ultra-dense stellar remnants with extreme gravitational pull"
            }
            CelestialType::BlackHole => {
                "Region of spacetime with gravitational pull so strong that nothing can escape"
            }
            CelestialType::Planet => "Rocky or gaseous celestial bodies orbiting stars",
            CelestialType::Asteroid => "Small rocky bodies",
            CelestialType::Comet => "Icy bodies that produce tails when near stars",
        }
    }

    pub fn mass_range(&self) -> ValueRange {
        match self {
            CelestialType::Star => ValueRange::new(100.0, 800.0),
            CelestialType::NeutronStar => ValueRange::new(100_000.0, 120_000.0),
            CelestialType::BlackHole => ValueRange::new(25_000.0, 50_000.0),
            CelestialType::Planet => ValueRange::new(1000.0, 3000.0),
            CelestialType::Asteroid => ValueRange::new(100.0, 400.0),
            CelestialType::Comet => ValueRange::new(200.0, 600.0),
        }
    }

    pub fn diameter_range(&self) -> ValueRange {
        match self {
            CelestialType::Star => ValueRange::new(400.0, 1000.0),
            CelestialType::NeutronStar => ValueRange::new(5.0, 20.0),
            CelestialType::BlackHole => ValueRange::new(30.0, 60.0),
            CelestialType::Planet => ValueRange::new(100.0, 200.0),
            CelestialType::Asteroid => ValueRange::new(20.0, 40.0),
            CelestialType::Comet => ValueRange::new(30.0, 60.0),
        }
    }

    pub fn luminosity_range(&self) -> ValueRange {
        match self {
            CelestialType::Star => ValueRange::new(0.8, 1.0),
            CelestialType::NeutronStar => ValueRange::new(0.9, 1.0),
            CelestialType::Comet => ValueRange::new(0.1, 0.3),
            _ => ValueRange::new(0.0, 0.0),
        }
    }

    /// Colour palette as 0xRRGGBB
    pub fn palette(&self) -> &'static [u32] {
        match self {
            CelestialType::Star => &[0xFFD700, 0xFFA500, 0xFF4500, 0xF0FFF0, 0xFF69B4],
            CelestialType::NeutronStar => &[0xE0FFFF, 0x87CEEB, 0xB0C4DE],
            CelestialType::BlackHole => &[0x000000],
            CelestialType::Planet => &[0x4169E1, 0x8B4513, 0xCD853F, 0x20B2AA, 0xFF6347],
            CelestialType::Asteroid => &[0x696969, 0xA9A9A9, 0x8B4513, 0x556B2F],
            CelestialType::Comet => &[0x87CEEB, 0xB0E0E6, 0xADD8E6, 0xE0FFFF],
        }
    }

    /// Relative spawn weight for random scenes
    pub fn probability(&self) -> f64 {
        match self {
            CelestialType::Star => 0.1,
            CelestialType::NeutronStar => 0.05,
            CelestialType::BlackHole => 0.02,
            CelestialType::Planet => 0.3,
            CelestialType::Asteroid => 0.3,
            CelestialType::Comet => 0.1,
        }
    }

    pub fn behavior(&self) -> Option<Behavior> {
        match self {
            CelestialType::Star => Some(Behavior::RadiativePush),
            CelestialType::NeutronStar => Some(Behavior::AmplifiedPull),
            CelestialType::BlackHole => Some(Behavior::Capture),
            CelestialType::Comet => Some(Behavior::TailEmission),
            CelestialType::Planet | CelestialType::Asteroid => None,
        }
    }

    /// Reach of the type's special effect
    pub fn effect_radius(&self) -> Option<f64> {
        match self {
            CelestialType::Star => Some(500.0),
            CelestialType::NeutronStar => Some(800.0),
            CelestialType::BlackHole => Some(1000.0),
            _ => None,
        }
    }

    /// Whether tails point away from this type
    pub fn is_stellar(&self) -> bool {
        matches!(self, CelestialType::Star | CelestialType::NeutronStar)
    }

    /// Pick a type weighted by probability (Asteroid when the roll misses)
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.random();
        let mut cumulative = 0.0;
        for kind in Self::ALL {
            cumulative += kind.probability();
            if roll <= cumulative {
                return kind;
            }
        }
        CelestialType::Asteroid
    }

    pub fn sample_mass<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.mass_range().sample(rng)
    }

    pub fn sample_diameter<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.diameter_range().sample(rng)
    }

    pub fn sample_color<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let palette = self.palette();
        palette[rng.random_range(0..palette.len())]
    }

    pub fn sample_luminosity<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.luminosity_range().sample(rng)
    }
}

/// A short-lived visual particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    /// Remaining life, counts down from `PARTICLE_LIFE`
    pub life: f64,
    pub max_life: f64,
    pub size: f64,
}

impl Particle {
    /// Advance one tick; returns false once the particle is spent
    pub fn step(&mut self) -> bool {
        self.pos += self.vel;
        self.life -= PARTICLE_DECAY;
        self.life > 0.0
    }
}

/// A body swallowed by a black hole
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub position: DVec2,
    pub tick: u64,
}

/// Per-type effect payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum EffectState {
    #[default]
    None,
    /// Star: stellar wind particles
    Wind { particles: Vec<Particle> },
    /// Neutron star: nothing to track
    Pull,
    /// Black hole: recent captures (oldest first, bounded) and accretion disk rotation
    Accretion {
        captured: Vec<CaptureEvent>,
        angle: f64,
    },
    /// Comet: tail particles and recent positions (oldest first)
    Tail {
        particles: Vec<Particle>,
        trail: VecDeque<DVec2>,
    },
}

impl EffectState {
    pub fn for_type(kind: CelestialType) -> Self {
        match kind.behavior() {
            Some(Behavior::RadiativePush) => EffectState::Wind {
                particles: Vec::with_capacity(WIND_PARTICLE_CAPACITY),
            },
            Some(Behavior::AmplifiedPull) => EffectState::Pull,
            Some(Behavior::Capture) => EffectState::Accretion {
                captured: Vec::new(),
                angle: 0.0,
            },
            Some(Behavior::TailEmission) => EffectState::Tail {
                particles: Vec::with_capacity(TAIL_PARTICLE_CAPACITY),
                trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            },
            None => EffectState::None,
        }
    }
}

/// Creation request for a body
///
/// Mass and diameter are mandatory; use [`BodyConfig::sampled`] to draw them
/// from the type's ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyConfig {
    pub kind: CelestialType,
    pub position: DVec2,
    pub velocity: DVec2,
    pub mass: f64,
    pub diameter: f64,
    pub color: Option<u32>,
    pub luminosity: Option<f64>,
}

impl BodyConfig {
    pub fn new(kind: CelestialType, position: DVec2, mass: f64, diameter: f64) -> Self {
        Self {
            kind,
            position,
            velocity: DVec2::ZERO,
            mass,
            diameter,
            color: None,
            luminosity: None,
        }
    }

    /// Fill every field from the type's ranges, with a random unit velocity
    pub fn sampled<R: Rng + ?Sized>(kind: CelestialType, position: DVec2, rng: &mut R) -> Self {
        let heading = rng.random_range(0.0..std::f64::consts::TAU);
        Self {
            kind,
            position,
            velocity: unit_from_angle(heading),
            mass: kind.sample_mass(rng),
            diameter: kind.sample_diameter(rng),
            color: Some(kind.sample_color(rng)),
            luminosity: Some(kind.sample_luminosity(rng)),
        }
    }

    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_luminosity(mut self, luminosity: f64) -> Self {
        self.luminosity = Some(luminosity);
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for (field, value) in [("mass", self.mass), ("diameter", self.diameter)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidBody { field, value });
            }
        }
        let finite = self.position.is_finite() && self.velocity.is_finite();
        if !finite {
            return Err(SimError::InvalidBody {
                field: "position/velocity",
                value: f64::NAN,
            });
        }
        Ok(())
    }
}

/// Snapshot for info panels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyInfo {
    pub type_name: &'static str,
    pub mass: f64,
    pub diameter: f64,
    pub speed: f64,
    pub momentum: f64,
    pub description: &'static str,
}

/// A gravitating body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub kind: CelestialType,
    pub position: DVec2,
    pub velocity: DVec2,
    /// Reset every tick
    pub acceleration: DVec2,
    pub mass: f64,
    pub diameter: f64,
    pub color: u32,
    pub luminosity: f64,
    /// Removed at the end of the current tick
    pub pending_removal: bool,
    pub effect: EffectState,
    /// Gravity and repulsion accumulated in the last force pass
    #[serde(skip)]
    pub forces: ForceBreakdown,
}

impl Body {
    /// Build from a config that already passed validation
    pub(crate) fn from_config(id: BodyId, config: BodyConfig) -> Self {
        let kind = config.kind;
        Self {
            id,
            kind,
            position: config.position,
            velocity: config.velocity,
            acceleration: DVec2::ZERO,
            mass: config.mass,
            diameter: config.diameter,
            color: config.color.unwrap_or(kind.palette()[0]),
            luminosity: config.luminosity.unwrap_or(kind.luminosity_range().min),
            pending_removal: false,
            effect: EffectState::for_type(kind),
            forces: ForceBreakdown::default(),
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }

    #[inline]
    pub fn behavior(&self) -> Option<Behavior> {
        self.kind.behavior()
    }

    /// Accumulate a force as acceleration (F / m)
    #[inline]
    pub fn apply_force(&mut self, force: DVec2) {
        self.acceleration += force / self.mass;
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn momentum(&self) -> DVec2 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        self.position.distance(point) < self.radius()
    }

    pub fn info(&self) -> BodyInfo {
        let speed = self.speed();
        BodyInfo {
            type_name: self.kind.name(),
            mass: self.mass,
            diameter: self.diameter,
            speed,
            momentum: speed * self.mass,
            description: self.kind.description(),
        }
    }

    /// Advance visual effect state (after integration)
    pub fn update_effects<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let position = self.position;
        let radius = self.radius();
        match &mut self.effect {
            EffectState::Wind { particles } => {
                if particles.len() < WIND_PARTICLE_CAPACITY {
                    let dir = unit_from_angle(rng.random_range(0.0..std::f64::consts::TAU));
                    particles.push(Particle {
                        pos: position + dir * radius,
                        vel: dir * WIND_PARTICLE_SPEED,
                        life: PARTICLE_LIFE,
                        max_life: PARTICLE_LIFE,
                        size: 4.0,
                    });
                }
                particles.retain_mut(Particle::step);
            }
            EffectState::Accretion { angle, .. } => {
                *angle += ACCRETION_SPIN;
            }
            EffectState::Tail { trail, .. } => {
                trail.push_back(position);
                while trail.len() > TRAIL_LENGTH {
                    trail.pop_front();
                }
            }
            EffectState::Pull | EffectState::None => {}
        }
    }
}
