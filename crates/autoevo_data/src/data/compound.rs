use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A chemical compound known to the simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompoundDefinition {
    /// Registry key, e.g. `"glucose"`.
    pub name: String,
    /// Whether the compound floats around in clouds a cell can absorb.
    #[serde(default)]
    pub cloud: bool,
}

impl CompoundDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, cloud: bool) -> Self {
        Self {
            name: name.into(),
            cloud,
        }
    }
}

/// A metabolic process turning input compounds into output compounds.
///
/// Amounts are per unit of process rate. Ordered maps keep iteration (and
/// therefore floating point summation order) stable between runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BioProcess {
    /// Registry key, e.g. `"photosynthesis"`.
    pub id: String,
    /// Consumed compounds.
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
    /// Produced compounds.
    #[serde(default)]
    pub outputs: BTreeMap<String, f64>,
}

impl BioProcess {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_input(mut self, compound: impl Into<String>, amount: f64) -> Self {
        self.inputs.insert(compound.into(), amount);
        self
    }

    #[must_use]
    pub fn with_output(mut self, compound: impl Into<String>, amount: f64) -> Self {
        self.outputs.insert(compound.into(), amount);
        self
    }

    /// Amount of `compound` consumed, if this process consumes it at all.
    #[must_use]
    pub fn input(&self, compound: &str) -> Option<f64> {
        self.inputs.get(compound).copied()
    }

    /// Amount of `compound` produced, if this process produces it at all.
    #[must_use]
    pub fn output(&self, compound: &str) -> Option<f64> {
        self.outputs.get(compound).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_builder_lookup() {
        let process = BioProcess::new("glycolysis")
            .with_input("glucose", 1.0)
            .with_output("atp", 2.0);
        assert_eq!(process.input("glucose"), Some(1.0));
        assert_eq!(process.output("atp"), Some(2.0));
        assert_eq!(process.input("atp"), None);
    }

    #[test]
    fn test_compound_cloud_defaults_false() {
        let compound: CompoundDefinition = serde_json::from_str(r#"{"name":"atp"}"#).unwrap();
        assert!(!compound.cloud);
    }
}
