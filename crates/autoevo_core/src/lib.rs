//! # Auto-evo Core
//!
//! Once per generation, decides how every species' population changes by
//! letting species compete for the finite energy of each patch, and records
//! the result in a replayable history.
//!
//! This crate contains:
//! - Food sources (photosynthetic, chemosynthetic, heterotrophic) and their fitness scoring
//! - The patch ecosystem and the parallel generation solver
//! - Species and generation records chained into a history
//! - A simulation driver committing one generation at a time
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use autoevo_core::config::AutoEvoConfig;
//! use autoevo_core::registry::Registry;
//! use autoevo_core::simulation::Simulation;
//! use autoevo_data::{BiomeConditions, Patch, Species};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::standard().unwrap());
//! let algae = Species::new(1, "Algae", "single").with_organelle("chloroplast");
//! let shore = Patch::new(0, "Shore", BiomeConditions::default().with_dissolved("sunlight", 50.0))
//!     .with_population(1, 100);
//!
//! let mut sim = Simulation::new(AutoEvoConfig::default(), registry, vec![algae], vec![shore]).unwrap();
//! let outcome = sim.advance_generation().unwrap();
//! assert!(outcome.species[&1].population > 100);
//! ```

/// Balance constants and world parameters
pub mod config;
/// Food sources competing species are scored against
pub mod food_source;
/// Per-patch source enumeration and energy allocation
pub mod ecosystem;
/// Error types
pub mod error;
/// Generation history and backward lookups
pub mod history;
/// Solve metrics and logging setup
pub mod metrics;
/// Split phylogeny built from history
pub mod phylogeny;
/// Species and generation records
pub mod record;
/// Compound, process, organelle and membrane catalogue
pub mod registry;
/// Generation-by-generation driver
pub mod simulation;
/// Per-generation species trait snapshots
pub mod snapshot;
/// Parallel generation solver
pub mod solver;

pub use error::{AutoEvoError, Result};
pub use history::{GenerationHistory, PopulationDiff};
pub use metrics::{init_logging, GenerationMetrics};
pub use record::{GenerationRecord, Lineage, SpeciesRecord, SpeciesRecordFull};
pub use registry::{Registry, SimulationParameters};
pub use simulation::Simulation;
pub use solver::{GenerationOutcome, GenerationSolver, SpeciesOutcome};
