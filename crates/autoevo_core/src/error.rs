//! Error types for the auto-evo core.
//!
//! Configuration and history-corruption errors are fatal for the generation
//! being solved; callers abort the whole advance rather than recover.

use autoevo_data::{PatchId, SpeciesId};
use thiserror::Error;

/// Main error type for auto-evo operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutoEvoError {
    /// A compound name not present in the registry.
    #[error("Unknown compound: {0}")]
    UnknownCompound(String),

    /// A process id not present in the registry.
    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    /// An organelle name not present in the registry.
    #[error("Unknown organelle: {0}")]
    UnknownOrganelle(String),

    /// A membrane name not present in the registry.
    #[error("Unknown membrane: {0}")]
    UnknownMembrane(String),

    /// A patch references a species nobody supplied traits for.
    #[error("Patch {patch} references unknown species {species}")]
    UnknownSpecies { patch: PatchId, species: SpeciesId },

    /// Species data that cannot be scored at all.
    #[error("Malformed species {species}: {reason}")]
    MalformedSpecies { species: SpeciesId, reason: String },

    /// Two species (or patches) share one id.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// The registry failed validation.
    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),

    /// Invalid simulation configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No generation up to the requested one carries full data for a species.
    #[error("No full species data for species {species} at or before generation {generation}")]
    SpeciesDataNotFound {
        species: SpeciesId,
        generation: u32,
    },

    /// The requested generation was never recorded.
    #[error("Generation {0} not found in history")]
    GenerationNotFound(u32),

    /// History appends must be contiguous.
    #[error("Expected generation {expected}, got {found}")]
    NonSequentialGeneration { expected: u32, found: u32 },

    /// History time must strictly increase.
    #[error("Time elapsed {found} does not advance past {previous}")]
    TimeNotIncreasing { previous: f64, found: f64 },

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// The solve was abandoned by the caller.
    #[error("Generation solve cancelled")]
    Cancelled,
}

/// Result type alias for auto-evo operations.
pub type Result<T> = std::result::Result<T, AutoEvoError>;

impl AutoEvoError {
    /// Creates a malformed species error.
    #[must_use]
    pub fn malformed<S: Into<String>>(species: SpeciesId, reason: S) -> Self {
        Self::MalformedSpecies {
            species,
            reason: reason.into(),
        }
    }

    /// Whether this error indicates bad input data rather than a runtime condition.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownCompound(_)
                | Self::UnknownProcess(_)
                | Self::UnknownOrganelle(_)
                | Self::UnknownMembrane(_)
                | Self::UnknownSpecies { .. }
                | Self::MalformedSpecies { .. }
                | Self::DuplicateId(_)
                | Self::InvalidRegistry(_)
                | Self::Config(_)
        )
    }
}
