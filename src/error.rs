//! Error types for the physics engine.
//!
//! `SimError` is returned to callers. `PhysicsFault` never leaves a tick: it is
//! recovered locally and collected into the tick report.

use thiserror::Error;

use crate::sim::BodyId;

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum SimError {
    /// Body rejected before insertion (non-positive or non-finite field).
    #[error("invalid body: {field} must be positive and finite, got {value}")]
    InvalidBody {
        /// Offending field name.
        field: &'static str,
        /// Value supplied.
        value: f64,
    },

    /// Population is at capacity; the body list is unchanged.
    #[error("maximum number of bodies reached ({max})")]
    MaxBodiesReached {
        /// Configured population cap.
        max: usize,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading or writing a configuration file failed.
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Config(err.to_string())
    }
}

/// A per-body failure recovered inside a tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsFault {
    /// Barnes-Hut traversal failed and the body fell back to direct summation.
    #[error("body {body}: quadtree traversal failed ({reason}), used direct summation")]
    IndexFallback { body: BodyId, reason: String },

    /// A node handle pointed outside the arena.
    #[error("quadtree node {node} does not exist")]
    MalformedNode { node: u32 },

    /// A tree entry or outlier refers to a body index past the end of the list.
    #[error("quadtree refers to body index {index}, which does not exist")]
    StaleEntry { index: usize },

    /// Accumulated force was NaN or infinite; the body got no force this tick.
    #[error("body {body}: non-finite force discarded")]
    NonFiniteForce { body: BodyId },

    /// A behavior produced a non-finite value and was skipped for this tick.
    #[error("body {body}: {behavior} produced a non-finite value")]
    BehaviorFault { body: BodyId, behavior: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::MaxBodiesReached { max: 100 };
        assert_eq!(err.to_string(), "maximum number of bodies reached (100)");

        let err = SimError::InvalidBody {
            field: "mass",
            value: -1.0,
        };
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn test_json_error_converts_to_config() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: SimError = parse.unwrap_err().into();
        assert!(matches!(err, SimError::Config(_)));
    }
}
