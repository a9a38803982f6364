//! Error types surfaced by the simulation core.
//!
//! Only configuration problems are user visible. Extinctions and degenerate
//! selection are recovered internally and reported through the event log.

use super::dna::Gene;
use super::species::Species;

/// Rejected configuration at world init or reset.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// World width or height is not a positive finite number.
    #[error("world dimensions must be positive (got {width} x {height})")]
    InvalidWorldSize {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// A count or size that must be at least one is zero.
    #[error("{name} must be at least 1")]
    Zero {
        /// Parameter name.
        name: &'static str,
    },
    /// A probability or fraction outside `[0, 1]`.
    #[error("{name} must be within [0, 1] (got {value})")]
    OutOfUnitRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A quantity that must be finite and non-negative.
    #[error("{name} must be finite and non-negative (got {value})")]
    Negative {
        /// Parameter name.
        name: String,
        /// Offending value.
        value: f32,
    },
    /// A DNA range with `min > max` or non-finite bounds.
    #[error("invalid range for {species} gene {gene}: [{min}, {max}]")]
    InvalidGeneRange {
        /// Species owning the range.
        species: Species,
        /// Gene the range applies to.
        gene: Gene,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// Initial energy must lie in `(0, max_energy]`.
    #[error("{species}: initial energy {initial} must be in (0, {max}]")]
    InvalidEnergy {
        /// Species with the bad energy settings.
        species: Species,
        /// Configured initial energy.
        initial: f32,
        /// Configured maximum energy.
        max: f32,
    },
    /// Configuration JSON could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure while saving or loading world state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Filesystem error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The stored configuration no longer validates.
    #[error("stored configuration rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Failure inside a tick.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The spatial index could not be built, usually from a non-finite position.
    #[error("spatial index build failed: {0}")]
    SpatialIndex(String),
}
