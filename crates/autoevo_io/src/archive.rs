//! Versioned on-disk layout of generation records.
//!
//! Every persisted group carries its own `i32` version. A reader accepts
//! versions in `1..=CURRENT` and refuses anything else instead of guessing.

use crate::error::{IoError, Result};
use autoevo_core::{GenerationHistory, GenerationRecord, SpeciesRecord};
use autoevo_data::SpeciesId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SAVE_FILE_VERSION: i32 = 1;
pub const GENERATION_RECORD_VERSION: i32 = 1;
pub const SPECIES_RECORD_VERSION: i32 = 1;

/// Rejects versions that are non-positive or newer than `current`.
pub fn check_version(kind: &'static str, version: i32, current: i32) -> Result<()> {
    if version <= 0 {
        return Err(IoError::InvalidVersion { kind, version });
    }
    if version > current {
        return Err(IoError::UnsupportedVersion {
            kind,
            version,
            current,
        });
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArchivedSpeciesRecord {
    pub version: i32,
    pub record: SpeciesRecord,
}

impl From<&SpeciesRecord> for ArchivedSpeciesRecord {
    fn from(record: &SpeciesRecord) -> Self {
        Self {
            version: SPECIES_RECORD_VERSION,
            record: record.clone(),
        }
    }
}

impl ArchivedSpeciesRecord {
    pub fn restore(self) -> Result<SpeciesRecord> {
        check_version("species record", self.version, SPECIES_RECORD_VERSION)?;
        Ok(self.record)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArchivedGenerationRecord {
    pub version: i32,
    pub time_elapsed: f64,
    pub species: BTreeMap<SpeciesId, ArchivedSpeciesRecord>,
}

impl From<&GenerationRecord> for ArchivedGenerationRecord {
    fn from(record: &GenerationRecord) -> Self {
        Self {
            version: GENERATION_RECORD_VERSION,
            time_elapsed: record.time_elapsed,
            species: record
                .species
                .iter()
                .map(|(&id, s)| (id, ArchivedSpeciesRecord::from(s)))
                .collect(),
        }
    }
}

impl ArchivedGenerationRecord {
    pub fn restore(self) -> Result<GenerationRecord> {
        check_version("generation record", self.version, GENERATION_RECORD_VERSION)?;
        let species = self
            .species
            .into_iter()
            .map(|(id, s)| {
                s.restore()
                    .map(|record| (id, record))
                    .map_err(|e| e.with_context(format!("species {id}")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(GenerationRecord {
            time_elapsed: self.time_elapsed,
            species,
        })
    }
}

/// Archives every generation of `history`, keyed by generation index.
#[must_use]
pub fn archive_history(history: &GenerationHistory) -> BTreeMap<u32, ArchivedGenerationRecord> {
    history
        .iter()
        .map(|(generation, record)| (generation, ArchivedGenerationRecord::from(record)))
        .collect()
}

/// Rebuilds a history, re-checking every version and history invariant.
pub fn restore_history(
    archived: BTreeMap<u32, ArchivedGenerationRecord>,
) -> Result<GenerationHistory> {
    let mut history = GenerationHistory::new();
    for (generation, record) in archived {
        let record = record
            .restore()
            .map_err(|e| e.with_context(format!("generation {generation}")))?;
        history.insert(generation, record)?;
    }
    Ok(history)
}
