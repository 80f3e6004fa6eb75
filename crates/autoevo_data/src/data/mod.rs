//! Core data structures for the auto-evo simulation.

pub mod compound;
pub mod organelle;
pub mod patch;
pub mod species;
