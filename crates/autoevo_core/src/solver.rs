//! Generation solver: every patch in parallel, then one aggregation pass.
//!
//! Patches share no mutable state while they are scored, so each one is a
//! unit of rayon work. Results are collected in patch order and summed on the
//! calling thread, which keeps the output bit-reproducible regardless of how
//! the work was scheduled.

use crate::config::AutoEvoConfig;
use crate::ecosystem::{PatchEcosystem, PatchOutcome};
use crate::error::{AutoEvoError, Result};
use crate::metrics::GenerationMetrics;
use crate::registry::SimulationParameters;
use crate::snapshot::SnapshotMap;
use autoevo_data::{Patch, SpeciesId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// One species' population change summed over every patch it occupies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeciesOutcome {
    pub previous_population: i64,
    pub population: i64,
    pub delta: i64,
    /// Patches where the species still lives after the solve.
    pub patches: usize,
}

/// The complete, uncommitted result of one generation solve.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub patches: Vec<PatchOutcome>,
    pub species: BTreeMap<SpeciesId, SpeciesOutcome>,
    pub metrics: GenerationMetrics,
}

impl GenerationOutcome {
    /// Population deltas per species.
    #[must_use]
    pub fn deltas(&self) -> BTreeMap<SpeciesId, i64> {
        self.species.iter().map(|(&id, s)| (id, s.delta)).collect()
    }

    /// Species whose total population dropped to zero this generation.
    pub fn extinct(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.species
            .iter()
            .filter(|(_, s)| s.population == 0 && s.previous_population > 0)
            .map(|(&id, _)| id)
    }
}

pub struct GenerationSolver<'a> {
    registry: &'a dyn SimulationParameters,
    config: &'a AutoEvoConfig,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> GenerationSolver<'a> {
    #[must_use]
    pub fn new(registry: &'a dyn SimulationParameters, config: &'a AutoEvoConfig) -> Self {
        Self {
            registry,
            config,
            cancel: None,
        }
    }

    /// Abandons the solve once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn solve_patch(&self, patch: &Patch, snapshots: &SnapshotMap) -> Result<PatchOutcome> {
        if self.cancelled() {
            return Err(AutoEvoError::Cancelled);
        }
        let ecosystem = PatchEcosystem::build(patch, snapshots, self.registry, self.config)?;
        Ok(ecosystem.solve(self.config))
    }

    fn solve_patches(&self, patches: &[Patch], snapshots: &SnapshotMap) -> Result<Vec<PatchOutcome>> {
        let run = || {
            patches
                .par_iter()
                .map(|patch| self.solve_patch(patch, snapshots))
                .collect::<Result<Vec<_>>>()
        };
        match self.config.world.worker_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| AutoEvoError::ThreadPool(e.to_string()))?
                .install(run),
            None => run(),
        }
    }

    /// Solves every patch and aggregates the per-species results.
    ///
    /// Any error aborts the whole generation; nothing partial is returned.
    pub fn solve(&self, patches: &[Patch], snapshots: &SnapshotMap) -> Result<GenerationOutcome> {
        let start = Instant::now();
        let outcomes = self.solve_patches(patches, snapshots)?;
        if self.cancelled() {
            return Err(AutoEvoError::Cancelled);
        }

        let mut species: BTreeMap<SpeciesId, SpeciesOutcome> = BTreeMap::new();
        let mut metrics = GenerationMetrics {
            patches: outcomes.len(),
            ..Default::default()
        };

        for outcome in &outcomes {
            metrics.food_sources += outcome.sources.len();
            metrics.total_energy += outcome.total_energy();
            metrics.allocated_energy += outcome.allocated_energy();
            for result in &outcome.species {
                let entry = species.entry(result.species).or_default();
                entry.previous_population += result.previous_population;
                entry.population += result.population;
                entry.delta += result.delta;
                if result.population > 0 {
                    entry.patches += 1;
                }
            }
        }

        metrics.species = species.len();
        metrics.extinctions = species
            .values()
            .filter(|s| s.population == 0 && s.previous_population > 0)
            .count();
        metrics.duration = start.elapsed();

        Ok(GenerationOutcome {
            patches: outcomes,
            species,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::snapshot::build_snapshots;
    use autoevo_data::{BiomeConditions, Species};

    fn species() -> Vec<Species> {
        vec![
            Species::new(1, "Algae", "single")
                .with_organelle("chloroplast")
                .with_behaviour(0.0, 0.0),
            Species::new(2, "Vent dweller", "single")
                .with_organelle("chemoplast")
                .with_behaviour(0.0, 50.0),
        ]
    }

    fn patches() -> Vec<Patch> {
        vec![
            Patch::new(0, "Surface", BiomeConditions::default().with_dissolved("sunlight", 30.0))
                .with_population(1, 10),
            Patch::new(
                1,
                "Vents",
                BiomeConditions::default().with_cloud("hydrogensulfide", 1.0, 20.0),
            )
            .with_population(1, 5)
            .with_population(2, 10),
        ]
    }

    #[test]
    fn test_aggregates_across_patches() {
        let registry = Registry::standard().unwrap();
        let config = AutoEvoConfig::default();
        let snapshots = build_snapshots(&species(), &registry, &config).unwrap();
        let outcome = GenerationSolver::new(&registry, &config)
            .solve(&patches(), &snapshots)
            .unwrap();

        assert_eq!(outcome.patches.len(), 2);
        let algae = outcome.species[&1];
        // Surface: 30 / 0.03 = 1000. Vents: no light, algae starves.
        assert_eq!(algae.previous_population, 15);
        assert_eq!(algae.population, 1000);
        assert_eq!(algae.delta, 985);
        assert_eq!(algae.patches, 1);

        let dweller = outcome.species[&2];
        assert!(dweller.population > 0);
        assert_eq!(outcome.deltas().len(), 2);
        assert_eq!(outcome.metrics.patches, 2);
        assert_eq!(outcome.extinct().count(), 0);
    }

    #[test]
    fn test_dedicated_pool_matches_global_pool() {
        let registry = Registry::standard().unwrap();
        let config = AutoEvoConfig::default();
        let mut pooled = AutoEvoConfig::default();
        pooled.world.worker_threads = Some(2);
        let snapshots = build_snapshots(&species(), &registry, &config).unwrap();

        let a = GenerationSolver::new(&registry, &config)
            .solve(&patches(), &snapshots)
            .unwrap();
        let b = GenerationSolver::new(&registry, &pooled)
            .solve(&patches(), &snapshots)
            .unwrap();
        assert_eq!(a.patches, b.patches);
        assert_eq!(a.species, b.species);
    }

    #[test]
    fn test_cancelled_solve_returns_nothing() {
        let registry = Registry::standard().unwrap();
        let config = AutoEvoConfig::default();
        let snapshots = build_snapshots(&species(), &registry, &config).unwrap();
        let flag = AtomicBool::new(true);
        let result = GenerationSolver::new(&registry, &config)
            .with_cancel_flag(&flag)
            .solve(&patches(), &snapshots);
        assert_eq!(result.unwrap_err(), AutoEvoError::Cancelled);
    }

    #[test]
    fn test_unknown_species_aborts_generation() {
        let registry = Registry::standard().unwrap();
        let config = AutoEvoConfig::default();
        let snapshots = build_snapshots(&species(), &registry, &config).unwrap();
        let mut patches = patches();
        patches[1].populations.insert(42, 7);
        let result = GenerationSolver::new(&registry, &config).solve(&patches, &snapshots);
        assert!(result.unwrap_err().is_configuration());
    }
}
