//! Physics core
//!
//! Everything here is deterministic for a given seed and call sequence:
//! - one fixed step per tick, no wall-clock time
//! - all randomness from the simulation's seeded RNG
//! - bodies processed in list (creation) order
//! - no rendering or platform dependencies

pub mod behavior;
pub mod body;
pub mod collision;
pub mod forces;
pub mod quadtree;
pub mod state;
pub mod tick;

pub use behavior::{BehaviorEngine, BehaviorStats};
pub use body::{
    Behavior, Body, BodyConfig, BodyId, BodyInfo, CaptureEvent, CelestialType, EffectState,
    Particle, ValueRange,
};
pub use collision::{CollisionOutcome, CollisionResolver, CollisionStats, merge_bodies};
pub use forces::{ForceBreakdown, ForceField};
pub use quadtree::{Boundary, NodeId, QuadEntry, QuadNode, QuadNodeInfo, QuadTree};
pub use state::{DEFAULT_SEED, Simulation};
pub use tick::{TickReport, apply_boundary, integrate, prune, tick};
