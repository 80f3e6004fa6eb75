//! # Auto-evo IO
//!
//! Persistence layer for auto-evo generation history.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - JSON and gzip serialization helpers
//! - Versioned archive records with strict version checks
//! - Checksummed save files
//! - A JSONL generation event log

/// Versioned archive layout of generation and species records
pub mod archive;
/// Error types and result aliases for I/O operations
pub mod error;
/// JSONL generation event logging
pub mod log;
/// Save file encoding and loading
pub mod persistence;
/// Validated serialization helpers for JSON and gzip
pub mod serialization;

pub use archive::{
    check_version, GENERATION_RECORD_VERSION, SAVE_FILE_VERSION, SPECIES_RECORD_VERSION,
};
pub use error::{IoError, Result};
pub use log::{GenerationEvent, GenerationLogger};
pub use persistence::{
    decode_save, encode_save, load_history, save_history, LoadedSave, SaveMetadata,
};
pub use serialization::{
    from_json, read_json_file, to_json, to_json_pretty, validate_json, write_json_file,
};
