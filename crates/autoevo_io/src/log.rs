//! Append-only JSONL log of generation events.

use crate::error::{IoError, Result};
use autoevo_core::{GenerationMetrics, GenerationOutcome, GenerationRecord};
use autoevo_data::SpeciesId;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event")]
pub enum GenerationEvent {
    Solved {
        generation: u32,
        time_elapsed: f64,
        metrics: GenerationMetrics,
        timestamp: String,
    },
    Extinction {
        species: SpeciesId,
        generation: u32,
        timestamp: String,
    },
    Split {
        parent: SpeciesId,
        child: SpeciesId,
        generation: u32,
        timestamp: String,
    },
    Failed {
        generation: u32,
        reason: String,
        timestamp: String,
    },
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl GenerationEvent {
    /// Events describing a committed generation: the solve, splits recorded
    /// in `record` and any extinctions.
    #[must_use]
    pub fn from_outcome(
        generation: u32,
        record: &GenerationRecord,
        outcome: &GenerationOutcome,
    ) -> Vec<Self> {
        let timestamp = now();
        let mut events = vec![Self::Solved {
            generation,
            time_elapsed: record.time_elapsed,
            metrics: outcome.metrics.clone(),
            timestamp: timestamp.clone(),
        }];
        events.extend(record.species.iter().filter_map(|(&child, entry)| {
            entry.split_from_id().map(|parent| Self::Split {
                parent,
                child,
                generation,
                timestamp: timestamp.clone(),
            })
        }));
        events.extend(outcome.extinct().map(|species| Self::Extinction {
            species,
            generation,
            timestamp: timestamp.clone(),
        }));
        events
    }

    #[must_use]
    pub fn split(parent: SpeciesId, child: SpeciesId, generation: u32) -> Self {
        Self::Split {
            parent,
            child,
            generation,
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn failed(generation: u32, reason: impl Into<String>) -> Self {
        Self::Failed {
            generation,
            reason: reason.into(),
            timestamp: now(),
        }
    }
}

pub struct GenerationLogger {
    file: Option<BufWriter<File>>,
    path: PathBuf,
}

impl GenerationLogger {
    /// Appends to `path`, creating parent directories as needed.
    pub fn new_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| IoError::FileSystem(e).with_context(format!("opening log {:?}", path)))?;
        Ok(Self {
            file: Some(BufWriter::new(file)),
            path,
        })
    }

    /// A logger that discards everything.
    pub fn new_dummy() -> Self {
        Self {
            file: None,
            path: PathBuf::new(),
        }
    }

    pub fn log_event(&mut self, event: &GenerationEvent) -> Result<()> {
        if let Some(ref mut file) = self.file {
            let json = serde_json::to_string(event)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Reads back every parseable event. Malformed lines are skipped.
    pub fn read_events(&self) -> Result<Vec<GenerationEvent>> {
        if self.file.is_none() {
            return Ok(Vec::new());
        }
        read_events(&self.path)
    }
}

/// Reads the events of a log written by [`GenerationLogger`].
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<GenerationEvent>> {
    let file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(_) => return Ok(vec![]),
    };
    let reader = BufReader::new(file);
    let mut events = Vec::new();
    for line in reader.lines().map_while(std::result::Result::ok) {
        match serde_json::from_str::<GenerationEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(error = %e, "Skipping malformed log line"),
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = GenerationLogger::new_at(dir.path().join("logs/run.jsonl")).unwrap();
        logger.log_event(&GenerationEvent::split(1, 2, 4)).unwrap();
        logger
            .log_event(&GenerationEvent::failed(5, "cancelled"))
            .unwrap();

        let events = logger.read_events().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            GenerationEvent::Split {
                parent: 1,
                child: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_committed_split_is_logged() {
        use autoevo_core::config::AutoEvoConfig;
        use autoevo_core::registry::Registry;
        use autoevo_core::Simulation;
        use autoevo_data::{BiomeConditions, Patch, Species};
        use std::sync::Arc;

        let algae = Species::new(1, "Algae", "single")
            .with_organelle("chloroplast")
            .with_behaviour(0.0, 0.0);
        let light = BiomeConditions::default().with_dissolved("sunlight", 30.0);
        let patch = Patch::new(0, "Shore", light).with_population(1, 10);
        let mut sim = Simulation::new(
            AutoEvoConfig::default(),
            Arc::new(Registry::standard().unwrap()),
            vec![algae],
            vec![patch],
        )
        .unwrap();
        let child = Species::new(2, "Walled algae", "cellulose")
            .with_organelle("chloroplast")
            .with_behaviour(0.0, 0.0);
        sim.split_species(1, child, &[(0, 5)]).unwrap();
        let outcome = sim.advance_generation().unwrap();

        let events = GenerationEvent::from_outcome(1, sim.history().latest().unwrap(), &outcome);
        match &events[0] {
            GenerationEvent::Solved {
                generation,
                time_elapsed,
                ..
            } => {
                assert_eq!(*generation, 1);
                assert_eq!(*time_elapsed, sim.time_elapsed());
            }
            other => panic!("expected Solved first, got {other:?}"),
        }
        let splits: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GenerationEvent::Split {
                        parent: 1,
                        child: 2,
                        generation: 1,
                        ..
                    }
                )
            })
            .collect();
        assert_eq!(splits.len(), 1);

        let outcome = sim.advance_generation().unwrap();
        let events = GenerationEvent::from_outcome(2, sim.history().latest().unwrap(), &outcome);
        assert!(!events.iter().any(|e| matches!(e, GenerationEvent::Split { .. })));
    }

    #[test]
    fn test_dummy_logger_discards() {
        let mut logger = GenerationLogger::new_dummy();
        logger.log_event(&GenerationEvent::failed(0, "x")).unwrap();
        assert!(logger.read_events().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let line = r#"{"event":"Failed","generation":1,"reason":"r","timestamp":"t"}"#;
        std::fs::write(&path, format!("not json\n{line}\n")).unwrap();
        assert_eq!(read_events(&path).unwrap().len(), 1);
    }
}
