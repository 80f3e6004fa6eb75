//! Solve metrics and structured logging setup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary statistics of one generation solve.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GenerationMetrics {
    pub patches: usize,
    pub food_sources: usize,
    pub species: usize,
    pub total_energy: f64,
    pub allocated_energy: f64,
    pub extinctions: usize,
    /// Wall-clock time spent solving. Not part of the deterministic output.
    #[serde(skip)]
    pub duration: Duration,
}

impl GenerationMetrics {
    /// Fraction of the available energy that found a consumer.
    #[must_use]
    pub fn utilisation(&self) -> f64 {
        if self.total_energy > 0.0 {
            self.allocated_energy / self.total_energy
        } else {
            0.0
        }
    }

    pub fn log(&self, generation: u32) {
        tracing::info!(
            generation = generation,
            patches = self.patches,
            food_sources = self.food_sources,
            species = self.species,
            total_energy = self.total_energy,
            utilisation = self.utilisation(),
            extinctions = self.extinctions,
            duration_ms = self.duration.as_millis() as u64,
            "Generation solved"
        );
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilisation() {
        let metrics = GenerationMetrics {
            total_energy: 200.0,
            allocated_energy: 50.0,
            ..Default::default()
        };
        assert_eq!(metrics.utilisation(), 0.25);
    }

    #[test]
    fn test_utilisation_without_energy() {
        assert_eq!(GenerationMetrics::default().utilisation(), 0.0);
    }

    #[test]
    fn test_log_does_not_panic() {
        init_logging();
        GenerationMetrics::default().log(3);
    }
}
