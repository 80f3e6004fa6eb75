mod common;

use autoevo_core::config::AutoEvoConfig;
use autoevo_io::serialization::{compress, decompress};
use autoevo_io::{decode_save, encode_save, load_history, save_history, IoError};
use common::{algae, chemotroph, hunter, sunlit, ScenarioBuilder};
use serde_json::Value;
use tempfile::tempdir;

fn simulated_history() -> autoevo_core::GenerationHistory {
    let mut sim = ScenarioBuilder::new()
        .with_species(algae(1))
        .with_species(chemotroph(2))
        .with_species(hunter(3))
        .with_patch(0, sunlit(60.0).with_cloud("hydrogensulfide", 0.3, 200.0))
        .with_population(0, 1, 100)
        .with_population(0, 2, 40)
        .with_population(0, 3, 5)
        .build();
    for _ in 0..4 {
        sim.advance_generation().expect("Failed to advance");
    }
    sim.into_history()
}

fn rewrite_save(bytes: &[u8], edit: impl FnOnce(&mut Value)) -> Vec<u8> {
    let json = decompress(bytes).unwrap();
    let mut value: Value = serde_json::from_slice(&json).unwrap();
    edit(&mut value);
    compress(value.to_string().as_bytes()).unwrap()
}

#[test]
fn test_save_load_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.sav");
    let history = simulated_history();
    let config = AutoEvoConfig::default();

    save_history(&history, &config, &path).expect("Failed to save");
    let loaded = load_history(&path).expect("Failed to load");

    assert_eq!(loaded.history, history);
    assert_eq!(loaded.metadata.generations, 5);
    assert!(loaded.matches_config(&config));

    let mut other = config.clone();
    other.energy.sunlight_energy_constant = 2.0;
    assert!(!loaded.matches_config(&other));
}

#[test]
fn test_loaded_history_resolves_full_records() {
    let history = simulated_history();
    let bytes = encode_save(&history, &AutoEvoConfig::default()).unwrap();
    let loaded = decode_save(&bytes).unwrap().history;
    let latest = loaded.latest_generation().unwrap();
    for id in loaded.latest().unwrap().species.keys() {
        assert_eq!(
            loaded.get_full_species_record(*id, latest).unwrap(),
            history.get_full_species_record(*id, latest).unwrap()
        );
    }
}

#[test]
fn test_newer_save_version_rejected() {
    let bytes = encode_save(&simulated_history(), &AutoEvoConfig::default()).unwrap();
    let newer = rewrite_save(&bytes, |v| v["version"] = Value::from(2));
    let err = decode_save(&newer).unwrap_err();
    assert!(err.is_version_error(), "unexpected error: {err}");
    assert!(matches!(err, IoError::UnsupportedVersion { version: 2, .. }));
}

#[test]
fn test_non_positive_save_version_rejected() {
    let bytes = encode_save(&simulated_history(), &AutoEvoConfig::default()).unwrap();
    for version in [0, -3] {
        let broken = rewrite_save(&bytes, |v| v["version"] = Value::from(version));
        let err = decode_save(&broken).unwrap_err();
        assert!(matches!(err, IoError::InvalidVersion { .. }), "unexpected error: {err}");
    }
}

#[test]
fn test_tampered_history_detected() {
    let bytes = encode_save(&simulated_history(), &AutoEvoConfig::default()).unwrap();
    let tampered = rewrite_save(&bytes, |v| {
        let history = v["history"].as_str().unwrap().replace("\"population\":100", "\"population\":101");
        v["history"] = Value::from(history);
    });
    assert!(matches!(
        decode_save(&tampered).unwrap_err(),
        IoError::ChecksumMismatch { .. }
    ));
}

#[test]
fn test_missing_save_is_not_found() {
    let dir = tempdir().unwrap();
    let err = load_history(dir.path().join("absent.sav")).unwrap_err();
    assert!(matches!(err, IoError::NotFound(_)));
}
