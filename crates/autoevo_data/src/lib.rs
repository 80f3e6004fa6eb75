//! Plain data definitions shared by the auto-evo crates.
//!
//! Everything here is read-only from the point of view of the solver: the
//! species registry and world map hand these values in, the simulation core
//! reads them and reports populations back.

pub mod data;

pub use data::compound::{BioProcess, CompoundDefinition};
pub use data::organelle::{MembraneType, OrganelleDefinition};
pub use data::patch::{BiomeConditions, EnvironmentalCompound, Patch, PatchId};
pub use data::species::{BehaviourStats, Species, SpeciesId};
