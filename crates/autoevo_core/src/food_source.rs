//! Competable energy opportunities within one patch.
//!
//! Every source exposes a fixed energy pool for the generation and a fitness
//! score per candidate species. Scores are only meaningful relative to the
//! other competitors of the same source instance.

use crate::config::{AutoEvoConfig, ScoringConfig};
use crate::error::Result;
use crate::registry::SimulationParameters;
use crate::snapshot::SpeciesTraits;
use autoevo_data::{Patch, PatchId, SpeciesId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of energy a source offers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FoodSourceKind {
    Photosynthetic,
    Chemosynthetic { compound: String },
    Heterotrophic { prey: SpeciesId },
}

impl fmt::Display for FoodSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodSourceKind::Photosynthetic => write!(f, "sunlight"),
            FoodSourceKind::Chemosynthetic { compound } => write!(f, "{compound}"),
            FoodSourceKind::Heterotrophic { prey } => write!(f, "species #{prey}"),
        }
    }
}

/// Non-finite or negative values collapse to zero.
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Glucose/ATP yield scoring shared by the environmental sources.
#[derive(Debug, Clone, PartialEq)]
struct YieldScoring {
    glucose: String,
    atp: String,
    glucose_divisor: f64,
    atp_divisor: f64,
}

impl YieldScoring {
    fn new(registry: &dyn SimulationParameters, config: &AutoEvoConfig) -> Result<Self> {
        let glucose = registry.require_compound(&config.compounds.glucose)?;
        let atp = registry.require_compound(&config.compounds.atp)?;
        Ok(Self {
            glucose: glucose.name.clone(),
            atp: atp.name.clone(),
            glucose_divisor: config.scoring.glucose_divisor,
            atp_divisor: config.scoring.atp_divisor,
        })
    }

    /// Energy the species extracts per unit of `input` across all its processes.
    fn energy_yield(&self, species: &dyn SpeciesTraits, input: &str) -> f64 {
        let mut score = 0.0;
        for organelle in species.organelles() {
            for process in &organelle.processes {
                let Some(amount) = process.input(input) else {
                    continue;
                };
                // Registry load rejects these, but a hand-built process could slip through.
                if amount <= 0.0 {
                    continue;
                }
                if let Some(glucose) = process.output(&self.glucose) {
                    score += glucose / amount / self.glucose_divisor;
                }
                if let Some(atp) = process.output(&self.atp) {
                    score += atp / amount / self.atp_divisor;
                }
            }
        }
        score
    }
}

/// Sunlight in one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotosyntheticSource {
    patch: PatchId,
    sunlight: String,
    total_energy: f64,
    yields: YieldScoring,
    activity_upkeep_factor: f64,
    max_behaviour_value: f64,
}

impl PhotosyntheticSource {
    pub fn new(
        patch: &Patch,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        let sunlight = registry.require_compound(&config.compounds.sunlight)?;
        let dissolved = patch
            .biome
            .compound(&sunlight.name)
            .map_or(0.0, |c| c.dissolved);
        Ok(Self {
            patch: patch.id,
            sunlight: sunlight.name.clone(),
            total_energy: non_negative(dissolved * config.energy.sunlight_energy_constant),
            yields: YieldScoring::new(registry, config)?,
            activity_upkeep_factor: config.energy.activity_upkeep_factor,
            max_behaviour_value: config.scoring.max_behaviour_value,
        })
    }

    fn fitness_score(&self, species: &dyn SpeciesTraits) -> f64 {
        let energy_creation = self.yields.energy_yield(species, &self.sunlight);
        // Active cells burn more of what they make.
        let activity = species.behaviour().activity / self.max_behaviour_value;
        let upkeep =
            species.base_osmoregulation_cost() * (1.0 + activity * self.activity_upkeep_factor);
        if upkeep <= 0.0 {
            return 0.0;
        }
        non_negative(energy_creation / upkeep)
    }
}

/// One cloud compound in one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemosyntheticSource {
    patch: PatchId,
    compound: String,
    total_energy: f64,
    yields: YieldScoring,
}

impl ChemosyntheticSource {
    pub fn new(
        patch: &Patch,
        compound: &str,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        let compound = registry.require_compound(compound)?;
        let total_energy = patch
            .biome
            .compound(&compound.name)
            .map_or(0.0, |c| non_negative(c.density * c.amount));
        Ok(Self {
            patch: patch.id,
            compound: compound.name.clone(),
            total_energy,
            yields: YieldScoring::new(registry, config)?,
        })
    }

    fn fitness_score(&self, species: &dyn SpeciesTraits) -> f64 {
        let energy_creation = self.yields.energy_yield(species, &self.compound);
        let upkeep = species.base_osmoregulation_cost();
        if upkeep <= 0.0 {
            return 0.0;
        }
        non_negative(energy_creation / upkeep)
    }
}

/// What a predator needs to know about its prey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreyProfile {
    pub id: SpeciesId,
    pub hex_count: f64,
    pub speed: f64,
    pub population: i64,
}

/// One prey species' population in one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct HeterotrophicSource {
    patch: PatchId,
    prey: PreyProfile,
    total_energy: f64,
    toxin: String,
    scoring: ScoringConfig,
}

impl HeterotrophicSource {
    pub fn new(
        patch: &Patch,
        prey: &dyn SpeciesTraits,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        let toxin = registry.require_compound(&config.compounds.toxin)?;
        // The prey may have died out here since the source was enumerated.
        let population = patch.population(prey.id());
        let total_energy = non_negative(
            population.max(0) as f64
                * prey.base_osmoregulation_cost()
                * config.energy.predation_energy_multiplier,
        );
        Ok(Self {
            patch: patch.id,
            prey: PreyProfile {
                id: prey.id(),
                hex_count: prey.hex_count(),
                speed: prey.base_speed(),
                population,
            },
            total_energy,
            toxin: toxin.name.clone(),
            scoring: config.scoring,
        })
    }

    #[must_use]
    pub fn prey(&self) -> &PreyProfile {
        &self.prey
    }

    fn fitness_score(&self, predator: &dyn SpeciesTraits) -> f64 {
        // No cannibalism.
        if predator.id() == self.prey.id {
            return 0.0;
        }

        let behaviour = predator.behaviour().aggression / self.scoring.max_behaviour_value;
        let predator_hexes = predator.hex_count();
        let predator_speed = predator.base_speed();

        let mut pilus = 0.0;
        let mut toxin = 0.0;
        for organelle in predator.organelles() {
            if organelle.pilus {
                pilus += self.scoring.pilus_predation_score;
            }
            if organelle.produces(&self.toxin) {
                toxin += self.scoring.toxin_predation_score;
            }
        }
        pilus *= predator_speed;

        let mut engulf = 0.0;
        if self.prey.hex_count > 0.0
            && predator_hexes / self.prey.hex_count > self.scoring.engulf_size_ratio
            && !predator.has_cell_wall()
        {
            engulf = self.scoring.engulf_predation_score;
        }
        // Too slow to catch the prey; only lucky catches remain.
        if predator_speed <= self.prey.speed {
            engulf *= self.scoring.slow_predator_penalty;
        }

        // Predator size counts at face value.
        non_negative(behaviour * (pilus + engulf + predator_hexes + toxin))
    }
}

/// A competable energy opportunity scoped to one patch.
#[derive(Debug, Clone, PartialEq)]
pub enum FoodSource {
    Photosynthetic(PhotosyntheticSource),
    Chemosynthetic(ChemosyntheticSource),
    Heterotrophic(HeterotrophicSource),
}

impl FoodSource {
    pub fn photosynthetic(
        patch: &Patch,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        PhotosyntheticSource::new(patch, registry, config).map(Self::Photosynthetic)
    }

    pub fn chemosynthetic(
        patch: &Patch,
        compound: &str,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        ChemosyntheticSource::new(patch, compound, registry, config).map(Self::Chemosynthetic)
    }

    pub fn heterotrophic(
        patch: &Patch,
        prey: &dyn SpeciesTraits,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        HeterotrophicSource::new(patch, prey, registry, config).map(Self::Heterotrophic)
    }

    #[must_use]
    pub fn kind(&self) -> FoodSourceKind {
        match self {
            FoodSource::Photosynthetic(_) => FoodSourceKind::Photosynthetic,
            FoodSource::Chemosynthetic(s) => FoodSourceKind::Chemosynthetic {
                compound: s.compound.clone(),
            },
            FoodSource::Heterotrophic(s) => FoodSourceKind::Heterotrophic { prey: s.prey.id },
        }
    }

    #[must_use]
    pub fn patch(&self) -> PatchId {
        match self {
            FoodSource::Photosynthetic(s) => s.patch,
            FoodSource::Chemosynthetic(s) => s.patch,
            FoodSource::Heterotrophic(s) => s.patch,
        }
    }

    /// Total exploitable energy this generation; never negative.
    #[must_use]
    pub fn total_energy_available(&self) -> f64 {
        match self {
            FoodSource::Photosynthetic(s) => s.total_energy,
            FoodSource::Chemosynthetic(s) => s.total_energy,
            FoodSource::Heterotrophic(s) => s.total_energy,
        }
    }

    /// Relative aptitude of `species` at exploiting this source; never negative.
    #[must_use]
    pub fn fitness_score(&self, species: &dyn SpeciesTraits) -> f64 {
        match self {
            FoodSource::Photosynthetic(s) => s.fitness_score(species),
            FoodSource::Chemosynthetic(s) => s.fitness_score(species),
            FoodSource::Heterotrophic(s) => s.fitness_score(species),
        }
    }
}
