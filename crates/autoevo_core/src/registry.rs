//! Read-only catalogue of compounds, processes, organelles and membranes.
//!
//! Food sources and trait snapshots receive the catalogue as a
//! [`SimulationParameters`] reference instead of reaching for global state,
//! so tests can inject small synthetic registries.

use crate::config::AutoEvoConfig;
use crate::error::{AutoEvoError, Result};
use autoevo_data::{BioProcess, CompoundDefinition, MembraneType, OrganelleDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const STANDARD_REGISTRY: &str = include_str!("../assets/standard_registry.toml");

/// Lookup capability for simulation definitions.
pub trait SimulationParameters: Send + Sync {
    fn compound(&self, name: &str) -> Option<&CompoundDefinition>;
    fn process(&self, id: &str) -> Option<&BioProcess>;
    fn organelle(&self, name: &str) -> Option<&OrganelleDefinition>;
    fn membrane(&self, name: &str) -> Option<&MembraneType>;

    /// Compounds that can form chemosynthetic food sources, in name order.
    fn cloud_compounds(&self) -> Vec<&CompoundDefinition>;

    fn require_compound(&self, name: &str) -> Result<&CompoundDefinition> {
        self.compound(name)
            .ok_or_else(|| AutoEvoError::UnknownCompound(name.to_string()))
    }

    fn require_process(&self, id: &str) -> Result<&BioProcess> {
        self.process(id)
            .ok_or_else(|| AutoEvoError::UnknownProcess(id.to_string()))
    }

    fn require_organelle(&self, name: &str) -> Result<&OrganelleDefinition> {
        self.organelle(name)
            .ok_or_else(|| AutoEvoError::UnknownOrganelle(name.to_string()))
    }

    fn require_membrane(&self, name: &str) -> Result<&MembraneType> {
        self.membrane(name)
            .ok_or_else(|| AutoEvoError::UnknownMembrane(name.to_string()))
    }

    /// Checks that the compounds the scoring formulas rely on are registered.
    fn check_config(&self, config: &AutoEvoConfig) -> Result<()> {
        let names = &config.compounds;
        for name in [&names.sunlight, &names.glucose, &names.atp, &names.toxin] {
            self.require_compound(name)?;
        }
        Ok(())
    }
}

/// On-disk layout of a registry file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RegistryFile {
    #[serde(default, rename = "compound")]
    pub compounds: Vec<CompoundDefinition>,
    #[serde(default, rename = "process")]
    pub processes: Vec<BioProcess>,
    #[serde(default, rename = "organelle")]
    pub organelles: Vec<OrganelleDefinition>,
    #[serde(default, rename = "membrane")]
    pub membranes: Vec<MembraneType>,
}

/// Validated, map-backed [`SimulationParameters`] implementation.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    compounds: BTreeMap<String, CompoundDefinition>,
    processes: BTreeMap<String, BioProcess>,
    organelles: BTreeMap<String, OrganelleDefinition>,
    membranes: BTreeMap<String, MembraneType>,
}

impl Registry {
    /// The built-in catalogue.
    pub fn standard() -> Result<Self> {
        Self::from_toml(STANDARD_REGISTRY)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| AutoEvoError::InvalidRegistry(e.to_string()))?;
        Self::from_file(file)
    }

    /// Builds a registry, checking every cross reference.
    pub fn from_file(file: RegistryFile) -> Result<Self> {
        let mut registry = Self::default();

        for compound in file.compounds {
            let name = compound.name.clone();
            if registry.compounds.insert(name.clone(), compound).is_some() {
                return Err(AutoEvoError::DuplicateId(format!("compound {name}")));
            }
        }

        for process in file.processes {
            registry.check_process(&process)?;
            let id = process.id.clone();
            if registry.processes.insert(id.clone(), process).is_some() {
                return Err(AutoEvoError::DuplicateId(format!("process {id}")));
            }
        }

        for organelle in file.organelles {
            if organelle.hexes == 0 {
                return Err(AutoEvoError::InvalidRegistry(format!(
                    "organelle {} occupies no hexes",
                    organelle.name
                )));
            }
            if !organelle.momentum.is_finite() || organelle.momentum < 0.0 {
                return Err(AutoEvoError::InvalidRegistry(format!(
                    "organelle {} has invalid momentum {}",
                    organelle.name, organelle.momentum
                )));
            }
            for process in &organelle.processes {
                registry.require_process(process)?;
            }
            let name = organelle.name.clone();
            if registry.organelles.insert(name.clone(), organelle).is_some() {
                return Err(AutoEvoError::DuplicateId(format!("organelle {name}")));
            }
        }

        for membrane in file.membranes {
            if !(membrane.osmoregulation_factor > 0.0 && membrane.movement_factor > 0.0) {
                return Err(AutoEvoError::InvalidRegistry(format!(
                    "membrane {} needs positive osmoregulation and movement factors",
                    membrane.name
                )));
            }
            let name = membrane.name.clone();
            if registry.membranes.insert(name.clone(), membrane).is_some() {
                return Err(AutoEvoError::DuplicateId(format!("membrane {name}")));
            }
        }

        tracing::debug!(
            compounds = registry.compounds.len(),
            processes = registry.processes.len(),
            organelles = registry.organelles.len(),
            membranes = registry.membranes.len(),
            "Registry loaded"
        );
        Ok(registry)
    }

    fn check_process(&self, process: &BioProcess) -> Result<()> {
        for (compound, &amount) in &process.inputs {
            self.require_compound(compound)?;
            // Fitness formulas divide by input amounts.
            if !(amount > 0.0 && amount.is_finite()) {
                return Err(AutoEvoError::InvalidRegistry(format!(
                    "process {} declares non-positive input {compound} = {amount}",
                    process.id
                )));
            }
        }
        for (compound, &amount) in &process.outputs {
            self.require_compound(compound)?;
            if !(amount >= 0.0 && amount.is_finite()) {
                return Err(AutoEvoError::InvalidRegistry(format!(
                    "process {} declares invalid output {compound} = {amount}",
                    process.id
                )));
            }
        }
        Ok(())
    }

    pub fn compound_names(&self) -> impl Iterator<Item = &str> {
        self.compounds.keys().map(String::as_str)
    }

    pub fn organelle_names(&self) -> impl Iterator<Item = &str> {
        self.organelles.keys().map(String::as_str)
    }
}

impl SimulationParameters for Registry {
    fn compound(&self, name: &str) -> Option<&CompoundDefinition> {
        self.compounds.get(name)
    }

    fn process(&self, id: &str) -> Option<&BioProcess> {
        self.processes.get(id)
    }

    fn organelle(&self, name: &str) -> Option<&OrganelleDefinition> {
        self.organelles.get(name)
    }

    fn membrane(&self, name: &str) -> Option<&MembraneType> {
        self.membranes.get(name)
    }

    fn cloud_compounds(&self) -> Vec<&CompoundDefinition> {
        self.compounds.values().filter(|c| c.cloud).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_loads() {
        let registry = Registry::standard().unwrap();
        assert!(registry.compound("sunlight").is_some());
        assert!(registry.organelle("chloroplast").is_some());
        assert!(registry.membrane("cellulose").unwrap().cell_wall);
        registry.check_config(&AutoEvoConfig::default()).unwrap();
    }

    #[test]
    fn test_cloud_compounds_sorted() {
        let registry = Registry::standard().unwrap();
        let clouds: Vec<_> = registry
            .cloud_compounds()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            clouds,
            vec!["ammonia", "glucose", "hydrogensulfide", "iron", "phosphates"]
        );
    }

    #[test]
    fn test_zero_input_rejected() {
        let result = Registry::from_toml(
            r#"
            [[compound]]
            name = "sunlight"
            [[compound]]
            name = "glucose"

            [[process]]
            id = "broken"
            inputs = { sunlight = 0.0 }
            outputs = { glucose = 1.0 }
            "#,
        );
        assert!(matches!(result, Err(AutoEvoError::InvalidRegistry(_))));
    }

    #[test]
    fn test_unknown_process_compound_rejected() {
        let result = Registry::from_toml(
            r#"
            [[process]]
            id = "alchemy"
            inputs = { lead = 1.0 }
            "#,
        );
        assert_eq!(
            result.unwrap_err(),
            AutoEvoError::UnknownCompound("lead".to_string())
        );
    }

    #[test]
    fn test_unknown_organelle_process_rejected() {
        let result = Registry::from_toml(
            r#"
            [[organelle]]
            name = "nucleus"
            hexes = 3
            processes = ["transcription"]
            "#,
        );
        assert_eq!(
            result.unwrap_err(),
            AutoEvoError::UnknownProcess("transcription".to_string())
        );
    }

    #[test]
    fn test_duplicate_compound_rejected() {
        let result = Registry::from_toml(
            r#"
            [[compound]]
            name = "iron"
            [[compound]]
            name = "iron"
            "#,
        );
        assert!(matches!(result, Err(AutoEvoError::DuplicateId(_))));
    }

    #[test]
    fn test_check_config_missing_toxin() {
        let registry = Registry::from_toml(
            r#"
            [[compound]]
            name = "sunlight"
            [[compound]]
            name = "glucose"
            [[compound]]
            name = "atp"
            "#,
        )
        .unwrap();
        assert_eq!(
            registry.check_config(&AutoEvoConfig::default()).unwrap_err(),
            AutoEvoError::UnknownCompound("oxytoxy".to_string())
        );
    }
}
