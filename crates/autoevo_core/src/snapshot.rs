//! Per-generation trait snapshots of species.
//!
//! Fitness functions never look at a raw [`Species`]; they score anything
//! implementing [`SpeciesTraits`]. [`MicrobeSnapshot`] is the concrete
//! snapshot built once per generation from the registry and shared read-only
//! between patch workers.

use crate::config::AutoEvoConfig;
use crate::error::{AutoEvoError, Result};
use crate::registry::SimulationParameters;
use autoevo_data::{BehaviourStats, BioProcess, Species, SpeciesId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One organelle with its definition resolved against the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrganelle {
    pub name: String,
    pub hexes: u32,
    pub processes: Vec<BioProcess>,
    pub momentum: f64,
    pub pilus: bool,
}

impl ResolvedOrganelle {
    /// Whether any runnable process produces `compound`.
    #[must_use]
    pub fn produces(&self, compound: &str) -> bool {
        self.processes
            .iter()
            .any(|p| p.output(compound).is_some_and(|amount| amount > 0.0))
    }
}

/// Capability needed to score a species against a food source.
pub trait SpeciesTraits: Send + Sync {
    fn id(&self) -> SpeciesId;
    fn hex_count(&self) -> f64;
    fn organelles(&self) -> &[ResolvedOrganelle];
    fn has_cell_wall(&self) -> bool;
    fn behaviour(&self) -> BehaviourStats;
    fn base_speed(&self) -> f64;
    /// Baseline per-individual energy upkeep.
    fn base_osmoregulation_cost(&self) -> f64;
}

/// Immutable view of one microbe species for the current generation.
#[derive(Debug, Clone, PartialEq)]
pub struct MicrobeSnapshot {
    id: SpeciesId,
    name: String,
    organelles: Vec<ResolvedOrganelle>,
    hex_count: f64,
    cell_wall: bool,
    behaviour: BehaviourStats,
    base_speed: f64,
    base_osmoregulation_cost: f64,
}

impl MicrobeSnapshot {
    /// Resolves `species` against the registry.
    ///
    /// Unknown organelles, processes or membranes are configuration errors.
    pub fn build(
        species: &Species,
        registry: &dyn SimulationParameters,
        config: &AutoEvoConfig,
    ) -> Result<Self> {
        if species.organelles.is_empty() {
            return Err(AutoEvoError::malformed(species.id, "species has no organelles"));
        }
        let behaviour = species.behaviour;
        let max = config.scoring.max_behaviour_value;
        for (label, value) in [
            ("aggression", behaviour.aggression),
            ("activity", behaviour.activity),
        ] {
            if !(0.0..=max).contains(&value) {
                return Err(AutoEvoError::malformed(
                    species.id,
                    format!("{label} {value} outside [0, {max}]"),
                ));
            }
        }

        let membrane = registry.require_membrane(&species.membrane)?;

        let mut organelles = Vec::with_capacity(species.organelles.len());
        for name in &species.organelles {
            let definition = registry.require_organelle(name)?;
            let processes = definition
                .processes
                .iter()
                .map(|id| registry.require_process(id).cloned())
                .collect::<Result<Vec<_>>>()?;
            organelles.push(ResolvedOrganelle {
                name: definition.name.clone(),
                hexes: definition.hexes,
                processes,
                momentum: definition.momentum,
                pilus: definition.pilus,
            });
        }

        let hex_count: f64 = organelles.iter().map(|o| f64::from(o.hexes)).sum();
        let momentum: f64 = organelles.iter().map(|o| o.momentum).sum();
        let base_speed =
            (config.energy.base_cell_speed + momentum) * membrane.movement_factor / hex_count;
        let base_osmoregulation_cost = hex_count
            * config.energy.osmoregulation_cost_per_hex
            * membrane.osmoregulation_factor;

        Ok(Self {
            id: species.id,
            name: species.name.clone(),
            organelles,
            hex_count,
            cell_wall: membrane.cell_wall,
            behaviour,
            base_speed,
            base_osmoregulation_cost,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SpeciesTraits for MicrobeSnapshot {
    fn id(&self) -> SpeciesId {
        self.id
    }

    fn hex_count(&self) -> f64 {
        self.hex_count
    }

    fn organelles(&self) -> &[ResolvedOrganelle] {
        &self.organelles
    }

    fn has_cell_wall(&self) -> bool {
        self.cell_wall
    }

    fn behaviour(&self) -> BehaviourStats {
        self.behaviour
    }

    fn base_speed(&self) -> f64 {
        self.base_speed
    }

    fn base_osmoregulation_cost(&self) -> f64 {
        self.base_osmoregulation_cost
    }
}

/// Snapshots for every species taking part in one generation.
pub type SnapshotMap = BTreeMap<SpeciesId, Arc<MicrobeSnapshot>>;

/// Builds snapshots for all `species`; the first invalid one aborts.
pub fn build_snapshots<'a, I>(
    species: I,
    registry: &dyn SimulationParameters,
    config: &AutoEvoConfig,
) -> Result<SnapshotMap>
where
    I: IntoIterator<Item = &'a Species>,
{
    species
        .into_iter()
        .map(|s| Ok((s.id, Arc::new(MicrobeSnapshot::build(s, registry, config)?))))
        .collect()
}
