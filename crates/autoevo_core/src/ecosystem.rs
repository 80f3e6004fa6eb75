//! The food sources and competitors of a single patch.

use crate::config::{AutoEvoConfig, WorldConfig};
use crate::error::{AutoEvoError, Result};
use crate::food_source::{FoodSource, FoodSourceKind};
use crate::registry::SimulationParameters;
use crate::snapshot::{MicrobeSnapshot, SnapshotMap, SpeciesTraits};
use autoevo_data::{Patch, PatchId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A species with nonzero population competing in a patch.
#[derive(Debug, Clone)]
pub struct Competitor {
    pub species: Arc<MicrobeSnapshot>,
    pub population: i64,
}

/// How much of one source was handed out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SourceAllocation {
    pub kind: FoodSourceKind,
    pub total_energy: f64,
    pub allocated: f64,
    pub competitors: usize,
}

/// One species' result in one patch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesPatchResult {
    pub species: SpeciesId,
    pub energy: f64,
    pub previous_population: i64,
    pub population: i64,
    pub delta: i64,
}

/// Everything the solver decided for one patch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub patch: PatchId,
    pub sources: Vec<SourceAllocation>,
    pub species: Vec<SpeciesPatchResult>,
}

impl PatchOutcome {
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.sources.iter().map(|s| s.total_energy).sum()
    }

    #[must_use]
    pub fn allocated_energy(&self) -> f64 {
        self.sources.iter().map(|s| s.allocated).sum()
    }
}

/// Splits `total` proportionally to `scores`.
///
/// When every score is zero nothing is handed out. The sum of the returned
/// allocations never exceeds `total`.
#[must_use]
pub fn share_energy(total: f64, scores: &[f64]) -> Vec<f64> {
    let sum: f64 = scores.iter().sum();
    let competable = sum > 0.0 && total > 0.0;
    if !competable {
        return vec![0.0; scores.len()];
    }
    let mut shares: Vec<f64> = scores.iter().map(|score| total * (score / sum)).collect();

    // The best scorer takes the remainder so rounding cannot overshoot `total`.
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    shares[best] = 0.0;
    shares[best] = (total - handed_out(&shares)).max(0.0);
    while shares[best] > 0.0 && handed_out(&shares) > total {
        shares[best] = f64::from_bits(shares[best].to_bits() - 1);
    }
    shares
}

/// Sum of `shares` in competitor order, matching how [`PatchEcosystem::solve`] accumulates.
fn handed_out(shares: &[f64]) -> f64 {
    shares.iter().fold(0.0, |acc, share| acc + share)
}

/// Sustainable population for `energy` given a per-individual upkeep.
#[must_use]
pub fn population_from_energy(energy: f64, individual_upkeep: f64, world: &WorldConfig) -> i64 {
    if individual_upkeep <= 0.0 || individual_upkeep.is_nan() || !energy.is_finite() {
        return 0;
    }
    let raw = (energy / individual_upkeep).floor();
    let population = raw.clamp(0.0, world.max_population_per_patch as f64) as i64;
    if population < world.minimum_viable_population {
        0
    } else {
        population
    }
}

/// Food sources active in one patch plus the species competing for them.
#[derive(Debug, Clone)]
pub struct PatchEcosystem {
    patch: PatchId,
    food_sources: Vec<FoodSource>,
    competitors: Vec<Competitor>,
    /// Listed species with a non-positive population, clamped to extinct.
    absent: Vec<(SpeciesId, i64)>,
}

impl PatchEcosystem {
    /// Enumerates the patch's food sources and competitors.
    ///
    /// Sources are ordered sunlight, cloud compounds by name, then prey by
    /// species id, which keeps the floating point summation order fixed.
    pub fn build(
        patch: &Patch,
        snapshots: &SnapshotMap,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        let mut competitors = Vec::new();
        let mut absent = Vec::new();
        for (&id, &population) in &patch.populations {
            let species = snapshots.get(&id).ok_or(AutoEvoError::UnknownSpecies {
                patch: patch.id,
                species: id,
            })?;
            if population > 0 {
                competitors.push(Competitor {
                    species: Arc::clone(species),
                    population,
                });
            } else {
                absent.push((id, population));
            }
        }

        let mut food_sources = Vec::new();

        let sunlight = patch
            .biome
            .compound(&config.compounds.sunlight)
            .map_or(0.0, |c| c.dissolved);
        if sunlight > 0.0 {
            food_sources.push(FoodSource::photosynthetic(patch, registry, config)?);
        }

        for compound in registry.cloud_compounds() {
            let density = patch
                .biome
                .compound(&compound.name)
                .map_or(0.0, |c| c.density);
            if density > 0.0 {
                food_sources.push(FoodSource::chemosynthetic(
                    patch,
                    &compound.name,
                    registry,
                    config,
                )?);
            }
        }

        for prey in &competitors {
            food_sources.push(FoodSource::heterotrophic(
                patch,
                prey.species.as_ref(),
                registry,
                config,
            )?);
        }

        Ok(Self {
            patch: patch.id,
            food_sources,
            competitors,
            absent,
        })
    }

    #[must_use]
    pub fn patch(&self) -> PatchId {
        self.patch
    }

    #[must_use]
    pub fn food_sources(&self) -> &[FoodSource] {
        &self.food_sources
    }

    #[must_use]
    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    /// Energy each competitor receives from `source`, in competitor order.
    #[must_use]
    pub fn allocate(&self, source: &FoodSource) -> Vec<f64> {
        let scores: Vec<f64> = self
            .competitors
            .iter()
            .map(|c| source.fitness_score(c.species.as_ref()))
            .collect();
        share_energy(source.total_energy_available(), &scores)
    }

    /// Allocates every source and converts the energy into populations.
    #[must_use]
    pub fn solve(&self, config: &AutoEvoConfig) -> PatchOutcome {
        let mut energy = vec![0.0; self.competitors.len()];
        let mut sources = Vec::with_capacity(self.food_sources.len());

        for source in &self.food_sources {
            let shares = self.allocate(source);
            let mut allocated = 0.0;
            for (total, &share) in energy.iter_mut().zip(&shares) {
                *total += share;
                allocated += share;
            }
            sources.push(SourceAllocation {
                kind: source.kind(),
                total_energy: source.total_energy_available(),
                allocated,
                competitors: shares.iter().filter(|&&share| share > 0.0).count(),
            });
        }

        let mut species: Vec<SpeciesPatchResult> = self
            .competitors
            .iter()
            .zip(&energy)
            .map(|(competitor, &energy)| {
                let upkeep = competitor.species.base_osmoregulation_cost()
                    * config.energy.individual_upkeep_multiplier;
                let population = population_from_energy(energy, upkeep, &config.world);
                SpeciesPatchResult {
                    species: competitor.species.id(),
                    energy,
                    previous_population: competitor.population,
                    population,
                    delta: population - competitor.population,
                }
            })
            .collect();

        species.extend(
            self.absent
                .iter()
                .map(|&(id, previous)| SpeciesPatchResult {
                    species: id,
                    energy: 0.0,
                    previous_population: previous,
                    population: 0,
                    delta: -previous,
                }),
        );
        species.sort_by_key(|r| r.species);

        tracing::debug!(
            patch = self.patch,
            sources = sources.len(),
            competitors = self.competitors.len(),
            "Patch solved"
        );

        PatchOutcome {
            patch: self.patch,
            sources,
            species,
        }
    }
}
