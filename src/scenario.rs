//! Scenario files: the starting species and patches of a run.
//!
//! ## Example scenario
//!
//! ```toml
//! name = "Tide pool"
//!
//! [[patch]]
//! id = 0
//! name = "Shallows"
//! dissolved = { sunlight = 100.0 }
//! clouds = { hydrogensulfide = { density = 0.5, amount = 400.0 } }
//!
//! [[species]]
//! id = 1
//! name = "Algae"
//! membrane = "single"
//! organelles = ["chloroplast", "cytoplasm"]
//! aggression = 0.0
//! populations = [{ patch = 0, count = 500 }]
//! ```

use anyhow::{bail, Context, Result};
use autoevo_core::config::AutoEvoConfig;
use autoevo_core::{Registry, Simulation};
use autoevo_data::{BehaviourStats, BiomeConditions, Patch, PatchId, Species, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CloudEntry {
    pub density: f64,
    pub amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PatchEntry {
    pub id: PatchId,
    pub name: String,
    #[serde(default)]
    pub dissolved: BTreeMap<String, f64>,
    #[serde(default)]
    pub clouds: BTreeMap<String, CloudEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PopulationEntry {
    pub patch: PatchId,
    pub count: i64,
}

fn default_aggression() -> f64 {
    BehaviourStats::default().aggression
}

fn default_activity() -> f64 {
    BehaviourStats::default().activity
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesEntry {
    pub id: SpeciesId,
    pub name: String,
    pub membrane: String,
    pub organelles: Vec<String>,
    #[serde(default = "default_aggression")]
    pub aggression: f64,
    #[serde(default = "default_activity")]
    pub activity: f64,
    #[serde(default)]
    pub populations: Vec<PopulationEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    /// Custom registry file, relative to the scenario. Defaults to the standard registry.
    #[serde(default)]
    pub registry: Option<PathBuf>,
    #[serde(default, rename = "patch")]
    pub patches: Vec<PatchEntry>,
    #[serde(default, rename = "species")]
    pub species: Vec<SpeciesEntry>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Loads a scenario, resolving its registry path against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let mut scenario =
            Self::from_toml(&content).with_context(|| format!("parsing scenario {}", path.display()))?;
        if let (Some(registry), Some(dir)) = (scenario.registry.as_mut(), path.parent()) {
            if registry.is_relative() {
                *registry = dir.join(&*registry);
            }
        }
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.patches.is_empty(), "Scenario has no patches");
        for entry in &self.species {
            for population in &entry.populations {
                if !self.patches.iter().any(|p| p.id == population.patch) {
                    bail!(
                        "Species {} is placed in unknown patch {}",
                        entry.id,
                        population.patch
                    );
                }
                anyhow::ensure!(
                    population.count >= 0,
                    "Species {} has negative population in patch {}",
                    entry.id,
                    population.patch
                );
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn species(&self) -> Vec<Species> {
        self.species
            .iter()
            .map(|entry| {
                Species::new(entry.id, entry.name.clone(), entry.membrane.clone())
                    .with_organelles(entry.organelles.iter().cloned())
                    .with_behaviour(entry.aggression, entry.activity)
            })
            .collect()
    }

    #[must_use]
    pub fn patches(&self) -> Vec<Patch> {
        self.patches
            .iter()
            .map(|entry| {
                let mut biome = BiomeConditions::default();
                for (name, &level) in &entry.dissolved {
                    biome = biome.with_dissolved(name.clone(), level);
                }
                for (name, cloud) in &entry.clouds {
                    biome = biome.with_cloud(name.clone(), cloud.density, cloud.amount);
                }
                let mut patch = Patch::new(entry.id, entry.name.clone(), biome);
                for species in &self.species {
                    for population in species.populations.iter().filter(|p| p.patch == entry.id) {
                        *patch.populations.entry(species.id).or_insert(0) += population.count;
                    }
                }
                patch
            })
            .collect()
    }

    pub fn registry(&self) -> Result<Registry> {
        match &self.registry {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading registry {}", path.display()))?;
                Ok(Registry::from_toml(&content)?)
            }
            None => Ok(Registry::standard()?),
        }
    }

    /// Validates the scenario against its registry and starts a simulation.
    pub fn build_simulation(&self, config: AutoEvoConfig) -> Result<Simulation> {
        let registry = Arc::new(self.registry()?);
        let simulation = Simulation::new(config, registry, self.species(), self.patches())
            .with_context(|| format!("building scenario '{}'", self.name))?;
        Ok(simulation)
    }
}
