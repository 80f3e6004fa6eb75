//! # Auto-evo
//!
//! Command line front end and scenario loading for the auto-evo ecosystem
//! simulation. The solver itself lives in `autoevo_core`; persistence lives
//! in `autoevo_io`.

pub mod report;
pub mod scenario;

pub use scenario::Scenario;
