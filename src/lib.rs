//! # Ecosim - Multi-Species Evolutionary Ecosystem
//!
//! A headless 2D ecosystem where seven species with hand-written behaviors
//! hunt, graze, scavenge, protect, parasitize and swim. Survivors pass their
//! DNA to the next generation through tournament selection, crossover and
//! Gaussian mutation.
//!
//! ## Features
//!
//! - Deterministic, seeded ticks with parallel decisions and ordered effects
//! - Per-species trait ranges and fitness weights loaded from JSON
//! - Water bands, obstacles, rocks and buildable shelters
//! - Earthquakes, tsunamis and meteors with shelter mitigation and a
//!   per-species casualty cap
//! - Top-K archive for extinction recovery
//! - Snapshots, save/load and per-generation stats export
//!
//! ## Core Modules
//!
//! - [`simulation::world`] - Tick loop and episode controller
//! - [`simulation::behavior`] - Species decision rules and fitness
//! - [`simulation::events`] - Ordered application of decided actions
//! - [`simulation::evolution`] - Selection, breeding and recovery
//! - [`simulation::disaster`] - Disaster state machine and damage model
//! - [`simulation::spatial`] - KD-tree neighbor queries

/// Core simulation logic and data structures.
pub mod simulation {
    /// Agents, their status effects and fitness accumulators.
    pub mod agent;
    /// Top-K genome archive per species.
    pub mod archive;
    /// Species decision rules and fitness functions.
    pub mod behavior;
    /// Front-end commands applied at tick boundaries.
    pub mod command;
    /// Disaster state machine and damage model.
    pub mod disaster;
    /// Genes, ranges and genetic operators.
    pub mod dna;
    /// Error types.
    pub mod error;
    /// Bounded log of notable events.
    pub mod event_log;
    /// Ordered application of decided actions.
    pub mod events;
    /// Selection, breeding and extinction recovery.
    pub mod evolution;
    /// Plants and carcasses.
    pub mod food;
    /// Geometric utility functions for distance calculations.
    pub mod geometric_utils;
    /// Trait for entities with a position and a radius.
    pub mod locatable;
    /// Simulation parameters.
    pub mod params;
    /// Seeded random streams.
    pub mod rng;
    /// Snapshots and saved world state.
    pub mod snapshot;
    /// KD-tree neighbor queries.
    pub mod spatial;
    /// The seven species and their food web.
    pub mod species;
    /// Per-generation statistics.
    pub mod stats;
    /// Rocks, shelters, obstacles and water.
    pub mod terrain;
    /// World state and episode controller.
    pub mod world;
}
