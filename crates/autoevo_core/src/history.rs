//! The chain of generation records.
//!
//! History is append-only. The single exception is [`GenerationHistory::update_species_data`],
//! which may rewrite one species in the latest generation after the player
//! edited it.

use crate::error::{AutoEvoError, Result};
use crate::record::{GenerationRecord, SpeciesRecord, SpeciesRecordFull};
use autoevo_data::{Species, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Population changes between two generations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationDiff {
    /// Living in `to` but not in `from`.
    pub appeared: Vec<SpeciesId>,
    /// Living in `from` but not in `to`.
    pub extinct: Vec<SpeciesId>,
    /// Nonzero population changes of species living in both.
    pub changed: BTreeMap<SpeciesId, i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(try_from = "RawHistory")]
pub struct GenerationHistory {
    generations: BTreeMap<u32, GenerationRecord>,
}

#[derive(Deserialize)]
struct RawHistory {
    generations: BTreeMap<u32, GenerationRecord>,
}

impl TryFrom<RawHistory> for GenerationHistory {
    type Error = AutoEvoError;

    fn try_from(raw: RawHistory) -> Result<Self> {
        let mut history = Self::new();
        for (generation, record) in raw.generations {
            history.insert(generation, record)?;
        }
        Ok(history)
    }
}

fn living(record: &GenerationRecord) -> impl Iterator<Item = (SpeciesId, i64)> + '_ {
    record
        .species
        .iter()
        .map(|(&id, r)| (id, r.population()))
        .filter(|&(_, population)| population > 0)
}

impl GenerationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Index the next pushed record will receive.
    #[must_use]
    pub fn next_generation(&self) -> u32 {
        self.latest_generation().map_or(0, |g| g + 1)
    }

    #[must_use]
    pub fn latest_generation(&self) -> Option<u32> {
        self.generations.keys().next_back().copied()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&GenerationRecord> {
        self.generations.values().next_back()
    }

    #[must_use]
    pub fn get(&self, generation: u32) -> Option<&GenerationRecord> {
        self.generations.get(&generation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &GenerationRecord)> {
        self.generations.iter().map(|(&g, r)| (g, r))
    }

    /// Appends a record as the next generation and returns its index.
    pub fn push(&mut self, record: GenerationRecord) -> Result<u32> {
        let generation = self.next_generation();
        self.insert(generation, record)?;
        Ok(generation)
    }

    /// Appends a record at an explicit index, which must be the next one.
    pub fn insert(&mut self, generation: u32, record: GenerationRecord) -> Result<()> {
        let expected = self.next_generation();
        if generation != expected {
            return Err(AutoEvoError::NonSequentialGeneration {
                expected,
                found: generation,
            });
        }
        if let Some(previous) = self.latest() {
            if record.time_elapsed <= previous.time_elapsed || record.time_elapsed.is_nan() {
                return Err(AutoEvoError::TimeNotIncreasing {
                    previous: previous.time_elapsed,
                    found: record.time_elapsed,
                });
            }
        }
        self.generations.insert(generation, record);
        Ok(())
    }

    /// Replaces the latest generation's record for `species` with full data.
    ///
    /// Population and lineage are carried over. Returns `false` and logs a
    /// warning when the species is not in the latest generation.
    pub fn update_species_data(&mut self, species: Arc<Species>) -> bool {
        let Some((&generation, record)) = self.generations.iter_mut().next_back() else {
            tracing::warn!(species = species.id, "No generation recorded, species update dropped");
            return false;
        };
        let Some(entry) = record.species.get_mut(&species.id) else {
            tracing::warn!(
                species = species.id,
                generation = generation,
                "Species missing from latest generation, update dropped"
            );
            return false;
        };
        *entry = SpeciesRecord::full(species, entry.population(), entry.lineage());
        true
    }

    /// Resolves full data for `id` as of `generation`.
    ///
    /// Walks back from `generation` to the nearest record carrying the species
    /// definition and combines it with the target generation's population and
    /// lineage.
    pub fn get_full_species_record(
        &self,
        id: SpeciesId,
        generation: u32,
    ) -> Result<SpeciesRecordFull> {
        let target = self
            .get(generation)
            .ok_or(AutoEvoError::GenerationNotFound(generation))?;
        let not_found = AutoEvoError::SpeciesDataNotFound {
            species: id,
            generation,
        };
        let record = target.get(id).ok_or_else(|| not_found.clone())?;
        if let SpeciesRecord::Full(full) = record {
            return Ok(full.clone());
        }

        let species = self
            .generations
            .range(..generation)
            .rev()
            .find_map(|(_, r)| r.get(id).and_then(SpeciesRecord::species))
            .ok_or(not_found)?;

        Ok(SpeciesRecordFull {
            species: Arc::clone(species),
            population: record.population(),
            lineage: record.lineage(),
        })
    }

    /// Which species appeared, died out or changed between two generations.
    pub fn population_diff(&self, from: u32, to: u32) -> Result<PopulationDiff> {
        let before: BTreeMap<_, _> = living(
            self.get(from)
                .ok_or(AutoEvoError::GenerationNotFound(from))?,
        )
        .collect();
        let after: BTreeMap<_, _> =
            living(self.get(to).ok_or(AutoEvoError::GenerationNotFound(to))?).collect();

        let mut diff = PopulationDiff::default();
        for (&id, &population) in &after {
            match before.get(&id) {
                None => diff.appeared.push(id),
                Some(&old) if old != population => {
                    diff.changed.insert(id, population - old);
                }
                Some(_) => {}
            }
        }
        diff.extinct = before
            .keys()
            .filter(|id| !after.contains_key(id))
            .copied()
            .collect();
        Ok(diff)
    }

    /// Population of `id` in every generation that recorded it.
    #[must_use]
    pub fn species_population_series(&self, id: SpeciesId) -> Vec<(u32, i64)> {
        self.iter()
            .filter_map(|(g, r)| r.get(id).map(|s| (g, s.population())))
            .collect()
    }
}
