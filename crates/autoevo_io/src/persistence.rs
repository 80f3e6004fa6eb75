//! Gzip-compressed, checksummed save files for generation history.

use crate::archive::{
    archive_history, check_version, restore_history, ArchivedGenerationRecord, SAVE_FILE_VERSION,
};
use crate::error::{IoError, Result};
use crate::serialization::{compress, decompress, from_json, to_json};
use autoevo_core::config::AutoEvoConfig;
use autoevo_core::GenerationHistory;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level save file layout.
///
/// The history is stored as an embedded JSON string so the checksum covers
/// exactly the bytes that were written.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct SaveFile {
    version: i32,
    created_at: String,
    config_fingerprint: String,
    generations: usize,
    checksum: String,
    history: String,
}

/// Descriptive fields of a loaded save.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SaveMetadata {
    pub version: i32,
    /// RFC 3339 UTC timestamp of when the save was written.
    pub created_at: String,
    pub config_fingerprint: String,
    pub generations: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedSave {
    pub metadata: SaveMetadata,
    pub history: GenerationHistory,
}

impl LoadedSave {
    /// Whether the save was produced with the same balance values as `config`.
    #[must_use]
    pub fn matches_config(&self, config: &AutoEvoConfig) -> bool {
        self.metadata.config_fingerprint == config.fingerprint()
    }
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Encodes `history` into compressed save bytes.
pub fn encode_save(history: &GenerationHistory, config: &AutoEvoConfig) -> Result<Vec<u8>> {
    let payload = to_json(&archive_history(history))?;
    let save = SaveFile {
        version: SAVE_FILE_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        config_fingerprint: config.fingerprint(),
        generations: history.len(),
        checksum: checksum(&payload),
        history: payload,
    };
    compress(to_json(&save)?.as_bytes())
}

/// Decodes save bytes, verifying versions, checksum and history invariants.
pub fn decode_save(bytes: &[u8]) -> Result<LoadedSave> {
    let json = String::from_utf8(decompress(bytes)?)
        .map_err(|e| IoError::validation(format!("Save is not UTF-8: {}", e)))?;
    let save: SaveFile = from_json(&json)?;
    check_version("save file", save.version, SAVE_FILE_VERSION)?;

    let found = checksum(&save.history);
    if found != save.checksum {
        return Err(IoError::ChecksumMismatch {
            expected: save.checksum,
            found,
        });
    }

    let archived: BTreeMap<u32, ArchivedGenerationRecord> = from_json(&save.history)?;
    let history = restore_history(archived)?;
    if history.len() != save.generations {
        return Err(IoError::validation(format!(
            "Save declares {} generations but contains {}",
            save.generations,
            history.len()
        )));
    }

    Ok(LoadedSave {
        metadata: SaveMetadata {
            version: save.version,
            created_at: save.created_at,
            config_fingerprint: save.config_fingerprint,
            generations: save.generations,
        },
        history,
    })
}

/// Writes `history` to `path`.
pub fn save_history<P: AsRef<Path>>(
    history: &GenerationHistory,
    config: &AutoEvoConfig,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_save(history, config)?;
    std::fs::write(path, bytes)
        .map_err(|e| IoError::FileSystem(e).with_context(format!("writing save {:?}", path)))?;
    tracing::info!(path = %path.display(), generations = history.len(), "History saved");
    Ok(())
}

/// Reads a save written by [`save_history`].
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<LoadedSave> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| IoError::FileSystem(e).with_context(format!("reading save {:?}", path)))?;
    decode_save(&bytes).map_err(|e| e.with_context(format!("loading save {:?}", path)))
}
