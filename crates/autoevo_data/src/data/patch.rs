use crate::data::species::SpeciesId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique patch identifier.
pub type PatchId = u32;

/// Amount of one compound in a patch's environment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvironmentalCompound {
    /// Cloud density.
    #[serde(default)]
    pub density: f64,
    /// Cloud amount.
    #[serde(default)]
    pub amount: f64,
    /// Dissolved level (gases, sunlight).
    #[serde(default)]
    pub dissolved: f64,
}

/// Snapshot of a patch's environmental conditions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BiomeConditions {
    pub compounds: BTreeMap<String, EnvironmentalCompound>,
}

impl BiomeConditions {
    #[must_use]
    pub fn compound(&self, name: &str) -> Option<&EnvironmentalCompound> {
        self.compounds.get(name)
    }

    #[must_use]
    pub fn with_cloud(mut self, name: impl Into<String>, density: f64, amount: f64) -> Self {
        let entry = self.compounds.entry(name.into()).or_default();
        entry.density = density;
        entry.amount = amount;
        self
    }

    #[must_use]
    pub fn with_dissolved(mut self, name: impl Into<String>, dissolved: f64) -> Self {
        self.compounds.entry(name.into()).or_default().dissolved = dissolved;
        self
    }
}

/// A habitat region with its own biome and resident populations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Patch {
    pub id: PatchId,
    pub name: String,
    pub biome: BiomeConditions,
    /// Population of each species living here.
    #[serde(default)]
    pub populations: BTreeMap<SpeciesId, i64>,
}

impl Patch {
    #[must_use]
    pub fn new(id: PatchId, name: impl Into<String>, biome: BiomeConditions) -> Self {
        Self {
            id,
            name: name.into(),
            biome,
            populations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_population(mut self, species: SpeciesId, population: i64) -> Self {
        self.populations.insert(species, population);
        self
    }

    /// Population of `species` here; unknown species count as extinct.
    #[must_use]
    pub fn population(&self, species: SpeciesId) -> i64 {
        self.populations.get(&species).copied().unwrap_or(0)
    }

    /// Species with a strictly positive population, in id order.
    pub fn present_species(&self) -> impl Iterator<Item = (SpeciesId, i64)> + '_ {
        self.populations
            .iter()
            .filter(|&(_, &population)| population > 0)
            .map(|(&id, &population)| (id, population))
    }
}
