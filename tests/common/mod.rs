use autoevo_core::config::AutoEvoConfig;
use autoevo_core::registry::Registry;
use autoevo_core::snapshot::{build_snapshots, SnapshotMap};
use autoevo_core::Simulation;
use autoevo_data::{BiomeConditions, Patch, PatchId, Species, SpeciesId};
use std::sync::Arc;

type ConfigMod = Box<dyn FnOnce(&mut AutoEvoConfig)>;

#[allow(dead_code)]
pub struct ScenarioBuilder {
    config: AutoEvoConfig,
    species: Vec<Species>,
    patches: Vec<Patch>,
    config_mods: Vec<ConfigMod>,
}

#[allow(dead_code)]
impl ScenarioBuilder {
    pub fn new() -> Self {
        let mut config = AutoEvoConfig::default();
        config.world.seed = Some(0);
        Self {
            config,
            species: Vec::new(),
            patches: Vec::new(),
            config_mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AutoEvoConfig) + 'static,
    {
        self.config_mods.push(Box::new(modifier));
        self
    }

    pub fn with_species(mut self, species: Species) -> Self {
        self.species.push(species);
        self
    }

    pub fn with_patch(mut self, id: PatchId, biome: BiomeConditions) -> Self {
        self.patches.push(Patch::new(id, format!("Patch {id}"), biome));
        self
    }

    pub fn with_population(mut self, patch: PatchId, species: SpeciesId, population: i64) -> Self {
        if let Some(p) = self.patches.iter_mut().find(|p| p.id == patch) {
            p.populations.insert(species, population);
        }
        self
    }

    pub fn build_parts(mut self) -> (AutoEvoConfig, Vec<Species>, Vec<Patch>) {
        for modifier in self.config_mods.drain(..) {
            modifier(&mut self.config);
        }
        (self.config, self.species, self.patches)
    }

    pub fn build(self) -> Simulation {
        let (config, species, patches) = self.build_parts();
        Simulation::new(config, Arc::new(registry()), species, patches)
            .expect("Failed to build simulation")
    }
}

#[allow(dead_code)]
pub fn registry() -> Registry {
    Registry::standard().expect("standard registry")
}

#[allow(dead_code)]
pub fn snapshots(species: &[Species], config: &AutoEvoConfig) -> SnapshotMap {
    build_snapshots(species, &registry(), config).expect("valid species")
}

#[allow(dead_code)]
pub fn algae(id: SpeciesId) -> Species {
    Species::new(id, format!("Algae {id}"), "single")
        .with_organelle("chloroplast")
        .with_behaviour(0.0, 0.0)
}

#[allow(dead_code)]
pub fn chemotroph(id: SpeciesId) -> Species {
    Species::new(id, format!("Chemotroph {id}"), "single")
        .with_organelles(["chemoplast", "cytoplasm"])
        .with_behaviour(0.0, 0.0)
}

#[allow(dead_code)]
pub fn hunter(id: SpeciesId) -> Species {
    Species::new(id, format!("Hunter {id}"), "single")
        .with_organelles(["cytoplasm", "cytoplasm", "cytoplasm", "cytoplasm", "flagellum", "pilus"])
        .with_behaviour(400.0, 100.0)
}

#[allow(dead_code)]
pub fn sunlit(level: f64) -> BiomeConditions {
    BiomeConditions::default().with_dissolved("sunlight", level)
}
