//! Generation-by-generation driver around the solver and the history.

use crate::config::AutoEvoConfig;
use crate::error::{AutoEvoError, Result};
use crate::history::GenerationHistory;
use crate::record::{record_generation, Lineage, SpeciesResult};
use crate::registry::SimulationParameters;
use crate::snapshot::{build_snapshots, MicrobeSnapshot};
use crate::solver::{GenerationOutcome, GenerationSolver};
use autoevo_data::{Patch, PatchId, Species, SpeciesId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Owns the live world state and commits one generation at a time.
///
/// A generation either commits fully (patch populations, time and a new
/// history record) or leaves the simulation untouched.
pub struct Simulation {
    config: AutoEvoConfig,
    registry: Arc<dyn SimulationParameters>,
    species: BTreeMap<SpeciesId, Arc<Species>>,
    patches: Vec<Patch>,
    history: GenerationHistory,
    pending: BTreeMap<SpeciesId, Lineage>,
    time_elapsed: f64,
    cancel: Arc<AtomicBool>,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Validates the world and records generation 0 with full species data.
    pub fn new(
        config: AutoEvoConfig,
        registry: Arc<dyn SimulationParameters>,
        species: Vec<Species>,
        patches: Vec<Patch>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AutoEvoError::Config(e.to_string()))?;
        registry.check_config(&config)?;

        let mut live = BTreeMap::new();
        for s in species {
            MicrobeSnapshot::build(&s, registry.as_ref(), &config)?;
            let id = s.id;
            if live.insert(id, Arc::new(s)).is_some() {
                return Err(AutoEvoError::DuplicateId(format!("species {id}")));
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for patch in &patches {
            if !seen.insert(patch.id) {
                return Err(AutoEvoError::DuplicateId(format!("patch {}", patch.id)));
            }
            if let Some(&species) = patch.populations.keys().find(|id| !live.contains_key(*id)) {
                return Err(AutoEvoError::UnknownSpecies {
                    patch: patch.id,
                    species,
                });
            }
        }

        let rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut simulation = Self {
            config,
            registry,
            species: live,
            patches,
            history: GenerationHistory::new(),
            pending: BTreeMap::new(),
            time_elapsed: 0.0,
            cancel: Arc::new(AtomicBool::new(false)),
            rng,
        };

        let totals = simulation.total_populations();
        let initial = record_generation(
            0.0,
            simulation.species.values().map(|s| SpeciesResult {
                species: Arc::clone(s),
                population: totals.get(&s.id).copied().unwrap_or(0),
                lineage: Lineage::Unchanged,
                store_full: true,
            }),
        );
        simulation.history.push(initial)?;

        tracing::info!(
            species = simulation.species.len(),
            patches = simulation.patches.len(),
            "Simulation initialised"
        );
        Ok(simulation)
    }

    fn total_populations(&self) -> BTreeMap<SpeciesId, i64> {
        let mut totals = BTreeMap::new();
        for patch in &self.patches {
            for (id, population) in patch.present_species() {
                *totals.entry(id).or_insert(0) += population;
            }
        }
        totals
    }

    /// Solves and commits the next generation.
    pub fn advance_generation(&mut self) -> Result<GenerationOutcome> {
        let generation = self.history.next_generation();
        let result = self.try_advance(generation);
        if let Err(e) = &result {
            tracing::error!(generation = generation, error = %e, "auto-evo failed");
        }
        result
    }

    fn try_advance(&mut self, generation: u32) -> Result<GenerationOutcome> {
        let snapshots = build_snapshots(
            self.species.values().map(|s| &**s),
            self.registry.as_ref(),
            &self.config,
        )?;
        let outcome = GenerationSolver::new(self.registry.as_ref(), &self.config)
            .with_cancel_flag(&self.cancel)
            .solve(&self.patches, &snapshots)?;

        let time_elapsed = self.time_elapsed + self.config.world.years_per_generation;
        let record = record_generation(
            time_elapsed,
            self.species.values().map(|s| SpeciesResult {
                species: Arc::clone(s),
                population: outcome.species.get(&s.id).map_or(0, |o| o.population),
                lineage: self.pending.get(&s.id).copied().unwrap_or_default(),
                store_full: false,
            }),
        );
        // Last fallible step; everything below must not fail.
        self.history.insert(generation, record)?;

        for (patch, result) in self.patches.iter_mut().zip(&outcome.patches) {
            for species in &result.species {
                patch.populations.insert(species.species, species.population);
            }
            patch.populations.retain(|_, population| *population > 0);
        }

        let extinct: Vec<SpeciesId> = self
            .species
            .keys()
            .filter(|&&id| outcome.species.get(&id).map_or(true, |o| o.population <= 0))
            .copied()
            .collect();
        for id in extinct {
            self.species.remove(&id);
            tracing::info!(species = id, generation = generation, "Species went extinct");
        }

        self.pending.clear();
        self.time_elapsed = time_elapsed;
        outcome.metrics.log(generation);
        Ok(outcome)
    }

    /// Replaces the definition of `id` with `mutant`.
    ///
    /// The mutant's own id is recorded as the mutated properties id in the
    /// next generation.
    pub fn apply_mutation(&mut self, id: SpeciesId, mutant: Species) -> Result<()> {
        if !self.species.contains_key(&id) {
            return Err(AutoEvoError::malformed(id, "cannot mutate an unknown species"));
        }
        let properties_id = mutant.id;
        let mutant = Species { id, ..mutant };
        MicrobeSnapshot::build(&mutant, self.registry.as_ref(), &self.config)?;
        self.species.insert(id, Arc::new(mutant));
        self.pending.insert(id, Lineage::Mutated { properties_id });
        Ok(())
    }

    /// Introduces `child` as a new species split off `parent`.
    ///
    /// `populations` seeds the child in the listed patches.
    pub fn split_species(
        &mut self,
        parent: SpeciesId,
        child: Species,
        populations: &[(PatchId, i64)],
    ) -> Result<()> {
        if !self.species.contains_key(&parent) {
            return Err(AutoEvoError::malformed(parent, "cannot split an unknown species"));
        }
        let reused = self.history.iter().any(|(_, r)| r.get(child.id).is_some());
        if reused || self.species.contains_key(&child.id) {
            return Err(AutoEvoError::DuplicateId(format!("species {}", child.id)));
        }
        MicrobeSnapshot::build(&child, self.registry.as_ref(), &self.config)?;
        for (patch_id, _) in populations {
            if !self.patches.iter().any(|p| p.id == *patch_id) {
                return Err(AutoEvoError::Config(format!("unknown patch {patch_id}")));
            }
        }

        for &(patch_id, population) in populations {
            if let Some(patch) = self.patches.iter_mut().find(|p| p.id == patch_id) {
                patch.populations.insert(child.id, population);
            }
        }
        let id = child.id;
        self.species.insert(id, Arc::new(child));
        self.pending.insert(id, Lineage::Split { from: parent });
        tracing::info!(parent = parent, child = id, "Species split");
        Ok(())
    }

    /// Stores an edited definition both live and in the latest record.
    ///
    /// Species that are not live or not in the latest record, such as a
    /// child split off since the last generation, are logged and left alone.
    pub fn update_species_data(&mut self, species: Species) -> bool {
        if !self.species.contains_key(&species.id) {
            tracing::warn!(species = species.id, "Update for species not in the simulation dropped");
            return false;
        }
        let species = Arc::new(species);
        if !self.history.update_species_data(Arc::clone(&species)) {
            return false;
        }
        self.species.insert(species.id, species);
        true
    }

    /// Flag that abandons an in-flight solve when set.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Seeded RNG for mutation decisions taken between generations.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    #[must_use]
    pub fn config(&self) -> &AutoEvoConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &GenerationHistory {
        &self.history
    }

    #[must_use]
    pub fn into_history(self) -> GenerationHistory {
        self.history
    }

    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[must_use]
    pub fn species(&self, id: SpeciesId) -> Option<&Arc<Species>> {
        self.species.get(&id)
    }

    /// Ids of living species.
    pub fn species_ids(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.species.keys().copied()
    }

    #[must_use]
    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }

    /// Index of the latest committed generation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.history.latest_generation().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use autoevo_data::BiomeConditions;
    use std::sync::atomic::Ordering;

    fn simulation() -> Simulation {
        let mut config = AutoEvoConfig::default();
        config.world.seed = Some(7);
        let species = vec![
            Species::new(1, "Algae", "single")
                .with_organelle("chloroplast")
                .with_behaviour(0.0, 0.0),
            Species::new(2, "Drifter", "single")
                .with_organelle("cytoplasm")
                .with_behaviour(0.0, 0.0),
        ];
        let patches = vec![Patch::new(
            0,
            "Surface",
            BiomeConditions::default().with_dissolved("sunlight", 30.0),
        )
        .with_population(1, 10)
        .with_population(2, 10)];
        Simulation::new(config, Arc::new(Registry::standard().unwrap()), species, patches).unwrap()
    }

    #[test]
    fn test_generation_zero_is_full() {
        let sim = simulation();
        let first = sim.history().get(0).unwrap();
        assert!(first.species.values().all(|r| r.is_full()));
        assert_eq!(first.get(1).unwrap().population(), 10);
    }

    #[test]
    fn test_advance_commits_and_retires_extinct() {
        let mut sim = simulation();
        let outcome = sim.advance_generation().unwrap();
        assert_eq!(outcome.species[&1].population, 1000);
        // The drifter has no food source it can use.
        assert_eq!(outcome.species[&2].population, 0);

        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.time_elapsed(), 100_000_000.0);
        assert_eq!(sim.patches()[0].population(1), 1000);
        assert_eq!(sim.patches()[0].population(2), 0);
        assert!(sim.species(2).is_none());

        let record = sim.history().get(1).unwrap();
        assert!(!record.get(1).unwrap().is_full());
        assert_eq!(record.get(2).unwrap().population(), 0);
    }

    #[test]
    fn test_cancelled_generation_commits_nothing() {
        let mut sim = simulation();
        sim.cancel_flag().store(true, Ordering::Relaxed);
        assert_eq!(sim.advance_generation().unwrap_err(), AutoEvoError::Cancelled);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.patches()[0].population(1), 10);
        assert_eq!(sim.time_elapsed(), 0.0);
    }

    #[test]
    fn test_split_recorded_with_parent() {
        let mut sim = simulation();
        let child = Species::new(3, "Walled algae", "cellulose").with_organelle("chloroplast");
        sim.split_species(1, child, &[(0, 5)]).unwrap();
        sim.advance_generation().unwrap();
        let entry = sim.history().latest().unwrap().get(3).unwrap();
        assert!(entry.is_full());
        assert_eq!(entry.split_from_id(), Some(1));
    }

    #[test]
    fn test_split_rejects_unknown_patch_and_duplicate() {
        let mut sim = simulation();
        let child = Species::new(3, "Walled algae", "cellulose").with_organelle("chloroplast");
        assert!(sim.split_species(1, child.clone(), &[(9, 5)]).is_err());
        let dup = Species::new(2, "Copy", "single").with_organelle("cytoplasm");
        assert!(matches!(
            sim.split_species(1, dup, &[(0, 5)]),
            Err(AutoEvoError::DuplicateId(_))
        ));
        assert!(sim.split_species(1, child, &[(0, 5)]).is_ok());
    }

    #[test]
    fn test_mutation_recorded_once() {
        let mut sim = simulation();
        let mutant = Species::new(40, "Algae", "double")
            .with_organelles(["chloroplast", "cytoplasm"])
            .with_behaviour(0.0, 0.0);
        sim.apply_mutation(1, mutant).unwrap();
        assert_eq!(sim.species(1).unwrap().membrane, "double");

        sim.advance_generation().unwrap();
        let entry = sim.history().latest().unwrap().get(1).unwrap();
        assert_eq!(entry.mutated_properties_id(), Some(40));

        sim.advance_generation().unwrap();
        let entry = sim.history().latest().unwrap().get(1).unwrap();
        assert!(!entry.is_full());
        let full = sim.history().get_full_species_record(1, 2).unwrap();
        assert_eq!(full.species.membrane, "double");
    }

    #[test]
    fn test_update_species_data() {
        let mut sim = simulation();
        let edited = Species::new(1, "Algae", "double").with_organelle("chloroplast");
        assert!(sim.update_species_data(edited));
        assert_eq!(sim.species(1).unwrap().membrane, "double");
        assert_eq!(
            sim.history().latest().unwrap().get(1).unwrap().species().unwrap().membrane,
            "double"
        );
        assert!(!sim.update_species_data(Species::new(77, "Ghost", "single")));
    }

    #[test]
    fn test_update_for_unrecorded_child_leaves_live_definition() {
        let mut sim = simulation();
        let child = Species::new(3, "Walled algae", "cellulose").with_organelle("chloroplast");
        sim.split_species(1, child, &[(0, 5)]).unwrap();

        let edited = Species::new(3, "Walled algae", "chitin").with_organelle("chloroplast");
        assert!(!sim.update_species_data(edited));
        assert_eq!(sim.species(3).unwrap().membrane, "cellulose");
        assert!(sim.history().latest().unwrap().get(3).is_none());

        sim.advance_generation().unwrap();
        let entry = sim.history().latest().unwrap().get(3).unwrap();
        assert_eq!(entry.species().unwrap().membrane, "cellulose");
    }

    #[test]
    fn test_rejects_unknown_species_in_patch() {
        let patches = vec![Patch::new(0, "Void", BiomeConditions::default()).with_population(5, 1)];
        let err = Simulation::new(
            AutoEvoConfig::default(),
            Arc::new(Registry::standard().unwrap()),
            vec![],
            patches,
        )
        .err()
        .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        use rand::Rng;
        let a: u64 = simulation().rng().gen();
        let b: u64 = simulation().rng().gen();
        assert_eq!(a, b);
    }
}
