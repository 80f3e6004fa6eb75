//! Per-generation species records.
//!
//! A record either carries the full species definition or only the population.
//! Lineage changes live inside [`SpeciesRecordFull`], so a lite record cannot
//! claim a mutation or split without also carrying the definition it refers to.

use autoevo_data::{Species, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What happened to a species' lineage during one generation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "change")]
pub enum Lineage {
    #[default]
    Unchanged,
    /// The definition was replaced by the mutated properties of `properties_id`.
    Mutated { properties_id: SpeciesId },
    /// A new species split off from `from` this generation.
    Split { from: SpeciesId },
}

impl Lineage {
    #[must_use]
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesRecordFull {
    pub species: Arc<Species>,
    pub population: i64,
    #[serde(default)]
    pub lineage: Lineage,
}

/// One species' entry in a [`GenerationRecord`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeciesRecord {
    Lite { population: i64 },
    Full(SpeciesRecordFull),
}

impl SpeciesRecord {
    #[must_use]
    pub fn lite(population: i64) -> Self {
        Self::Lite { population }
    }

    #[must_use]
    pub fn full(species: Arc<Species>, population: i64, lineage: Lineage) -> Self {
        Self::Full(SpeciesRecordFull {
            species,
            population,
            lineage,
        })
    }

    #[must_use]
    pub fn population(&self) -> i64 {
        match self {
            Self::Lite { population } => *population,
            Self::Full(full) => full.population,
        }
    }

    #[must_use]
    pub fn lineage(&self) -> Lineage {
        match self {
            Self::Lite { .. } => Lineage::Unchanged,
            Self::Full(full) => full.lineage,
        }
    }

    #[must_use]
    pub fn mutated_properties_id(&self) -> Option<SpeciesId> {
        match self.lineage() {
            Lineage::Mutated { properties_id } => Some(properties_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn split_from_id(&self) -> Option<SpeciesId> {
        match self.lineage() {
            Lineage::Split { from } => Some(from),
            _ => None,
        }
    }

    /// Inline species data, if this record carries any.
    #[must_use]
    pub fn species(&self) -> Option<&Arc<Species>> {
        match self {
            Self::Lite { .. } => None,
            Self::Full(full) => Some(&full.species),
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Input to [`record_generation`] for one species.
#[derive(Debug, Clone)]
pub struct SpeciesResult {
    pub species: Arc<Species>,
    pub population: i64,
    pub lineage: Lineage,
    /// Forces full data even without a lineage change, e.g. for first appearance.
    pub store_full: bool,
}

impl SpeciesResult {
    fn into_record(self) -> SpeciesRecord {
        if self.store_full || self.lineage.is_change() {
            SpeciesRecord::full(self.species, self.population, self.lineage)
        } else {
            SpeciesRecord::lite(self.population)
        }
    }
}

/// Snapshot of every species' population at the end of one generation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GenerationRecord {
    pub time_elapsed: f64,
    pub species: BTreeMap<SpeciesId, SpeciesRecord>,
}

impl GenerationRecord {
    #[must_use]
    pub fn get(&self, id: SpeciesId) -> Option<&SpeciesRecord> {
        self.species.get(&id)
    }

    #[must_use]
    pub fn total_population(&self) -> i64 {
        self.species.values().map(SpeciesRecord::population).sum()
    }
}

/// Builds the record of a finished generation. Pure.
pub fn record_generation<I>(time_elapsed: f64, results: I) -> GenerationRecord
where
    I: IntoIterator<Item = SpeciesResult>,
{
    let species = results
        .into_iter()
        .map(|result| (result.species.id, result.into_record()))
        .collect();
    GenerationRecord {
        time_elapsed,
        species,
    }
}
