//! Configuration management for auto-evo parameters.
//!
//! Strongly-typed configuration structures that map onto `config.toml`.
//! Every balance constant used by the food sources and the generation solver
//! lives here so that tests and scenarios can tweak them without touching
//! code.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! seed = 42
//! max_population_per_patch = 1000000
//! minimum_viable_population = 0
//! years_per_generation = 100000000.0
//!
//! [energy]
//! sunlight_energy_constant = 1.0
//! predation_energy_multiplier = 0.1
//!
//! [scoring]
//! engulf_size_ratio = 1.5
//! ```

use serde::{Deserialize, Serialize};

/// World-level parameters of a generation solve.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the follow-up mutation RNG. `None` uses entropy.
    pub seed: Option<u64>,
    /// Upper clamp on a species' population in a single patch.
    pub max_population_per_patch: i64,
    /// Populations below this collapse to zero.
    pub minimum_viable_population: i64,
    /// In-game time advanced by one generation.
    pub years_per_generation: f64,
    /// Dedicated patch worker pool size. `None` uses the global rayon pool.
    pub worker_threads: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_population_per_patch: 1_000_000_000,
            minimum_viable_population: 0,
            years_per_generation: 100_000_000.0,
            worker_threads: None,
        }
    }
}

/// Energy pool and upkeep parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    /// Energy per unit of dissolved sunlight.
    pub sunlight_energy_constant: f64,
    /// Fraction of the prey population's upkeep available to predators.
    pub predation_energy_multiplier: f64,
    /// Osmoregulation upkeep paid per hex.
    pub osmoregulation_cost_per_hex: f64,
    /// How strongly activity raises upkeep for photosynthesisers.
    pub activity_upkeep_factor: f64,
    /// Energy one individual needs per unit of osmoregulation cost.
    pub individual_upkeep_multiplier: f64,
    /// Speed of a cell without any flagella before size scaling.
    pub base_cell_speed: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            sunlight_energy_constant: 1.0,
            predation_energy_multiplier: 0.1,
            osmoregulation_cost_per_hex: 1.0,
            activity_upkeep_factor: 1.0,
            individual_upkeep_multiplier: 0.01,
            base_cell_speed: 1.0,
        }
    }
}

/// Fitness scoring constants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub glucose_divisor: f64,
    pub atp_divisor: f64,
    /// Predator/prey hex ratio required to engulf.
    pub engulf_size_ratio: f64,
    pub engulf_predation_score: f64,
    pub pilus_predation_score: f64,
    pub toxin_predation_score: f64,
    /// Multiplier on the engulf score when the predator is not faster than its prey.
    pub slow_predator_penalty: f64,
    /// Upper bound of the aggression and activity scales.
    pub max_behaviour_value: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            glucose_divisor: 1.0,
            atp_divisor: 10.0,
            engulf_size_ratio: 1.5,
            engulf_predation_score: 100.0,
            pilus_predation_score: 20.0,
            toxin_predation_score: 50.0,
            slow_predator_penalty: 0.1,
            max_behaviour_value: 400.0,
        }
    }
}

/// Names of the compounds the scoring formulas are keyed on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompoundNames {
    pub sunlight: String,
    pub glucose: String,
    pub atp: String,
    pub toxin: String,
}

impl Default for CompoundNames {
    fn default() -> Self {
        Self {
            sunlight: "sunlight".to_string(),
            glucose: "glucose".to_string(),
            atp: "atp".to_string(),
            toxin: "oxytoxy".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AutoEvoConfig {
    pub world: WorldConfig,
    pub energy: EnergyConfig,
    pub scoring: ScoringConfig,
    pub compounds: CompoundNames,
}

impl AutoEvoConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(
            self.world.max_population_per_patch > 0,
            "Max population per patch must be positive"
        );
        anyhow::ensure!(
            self.world.minimum_viable_population >= 0,
            "Minimum viable population must be non-negative"
        );
        anyhow::ensure!(
            self.world.minimum_viable_population <= self.world.max_population_per_patch,
            "Minimum viable population exceeds max population per patch"
        );
        anyhow::ensure!(
            self.world.years_per_generation > 0.0,
            "Years per generation must be positive"
        );
        anyhow::ensure!(
            self.world.worker_threads != Some(0),
            "Worker thread count must be positive"
        );

        // Energy validation
        anyhow::ensure!(
            self.energy.sunlight_energy_constant >= 0.0,
            "Sunlight energy constant must be non-negative"
        );
        anyhow::ensure!(
            self.energy.predation_energy_multiplier >= 0.0,
            "Predation energy multiplier must be non-negative"
        );
        anyhow::ensure!(
            self.energy.osmoregulation_cost_per_hex > 0.0,
            "Osmoregulation cost per hex must be positive"
        );
        anyhow::ensure!(
            self.energy.activity_upkeep_factor >= 0.0,
            "Activity upkeep factor must be non-negative"
        );
        anyhow::ensure!(
            self.energy.individual_upkeep_multiplier > 0.0,
            "Individual upkeep multiplier must be positive"
        );
        anyhow::ensure!(
            self.energy.base_cell_speed >= 0.0,
            "Base cell speed must be non-negative"
        );

        // Scoring validation
        anyhow::ensure!(
            self.scoring.glucose_divisor > 0.0,
            "Glucose divisor must be positive"
        );
        anyhow::ensure!(self.scoring.atp_divisor > 0.0, "ATP divisor must be positive");
        anyhow::ensure!(
            self.scoring.engulf_size_ratio > 0.0,
            "Engulf size ratio must be positive"
        );
        anyhow::ensure!(
            self.scoring.engulf_predation_score >= 0.0
                && self.scoring.pilus_predation_score >= 0.0
                && self.scoring.toxin_predation_score >= 0.0,
            "Predation scores must be non-negative"
        );
        anyhow::ensure!(
            self.scoring.slow_predator_penalty >= 0.0 && self.scoring.slow_predator_penalty <= 1.0,
            "Slow predator penalty must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.scoring.max_behaviour_value > 0.0,
            "Max behaviour value must be positive"
        );

        // Compound names
        anyhow::ensure!(
            !self.compounds.sunlight.is_empty()
                && !self.compounds.glucose.is_empty()
                && !self.compounds.atp.is_empty()
                && !self.compounds.toxin.is_empty(),
            "Compound names must not be empty"
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Hash of every parameter that influences the solve.
    ///
    /// Stored alongside saves so a replay with different balance values can
    /// be detected.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world.max_population_per_patch).as_bytes());
        hasher.update(format!("{:?}", self.world.minimum_viable_population).as_bytes());
        hasher.update(format!("{:?}", self.energy).as_bytes());
        hasher.update(format!("{:?}", self.scoring).as_bytes());
        hasher.update(format!("{:?}", self.compounds).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AutoEvoConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_population_rejected() {
        let config = AutoEvoConfig {
            world: WorldConfig {
                max_population_per_patch: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_worker_threads_rejected() {
        let config = AutoEvoConfig {
            world: WorldConfig {
                worker_threads: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_penalty_out_of_range_rejected() {
        let config = AutoEvoConfig {
            scoring: ScoringConfig {
                slow_predator_penalty: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AutoEvoConfig::from_toml(
            r#"
            [world]
            seed = 7

            [scoring]
            engulf_size_ratio = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.scoring.engulf_size_ratio, 2.0);
        assert_eq!(config.scoring.slow_predator_penalty, 0.1);
        assert_eq!(config.compounds.sunlight, "sunlight");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(AutoEvoConfig::from_toml("[energy]\nosmoregulation_cost_per_hex = -1.0").is_err());
    }

    #[test]
    fn test_fingerprint_consistency() {
        let a = AutoEvoConfig::default();
        let mut b = AutoEvoConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.scoring.atp_divisor = 3.0;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_ignores_seed() {
        let a = AutoEvoConfig::default();
        let mut b = AutoEvoConfig::default();
        b.world.seed = Some(99);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
