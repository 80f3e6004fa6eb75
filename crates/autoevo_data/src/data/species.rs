use serde::{Deserialize, Serialize};

/// Unique species identifier.
pub type SpeciesId = u32;

/// Scalar behaviour traits of a species.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BehaviourStats {
    /// How readily the species attacks other cells.
    pub aggression: f64,
    /// How much the species moves around when not chasing anything.
    pub activity: f64,
}

impl Default for BehaviourStats {
    fn default() -> Self {
        Self {
            aggression: 100.0,
            activity: 100.0,
        }
    }
}

/// One species definition as supplied by the species registry.
///
/// The auto-evo core only reads these; population lives on [`crate::Patch`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Species {
    /// Unique identifier.
    pub id: SpeciesId,
    /// Display name, e.g. `"Primum thrivium"`.
    pub name: String,
    /// Organelle instances by definition name, in placement order.
    pub organelles: Vec<String>,
    /// Membrane type name.
    pub membrane: String,
    /// Behaviour scalars.
    #[serde(default)]
    pub behaviour: BehaviourStats,
}

impl Species {
    #[must_use]
    pub fn new(id: SpeciesId, name: impl Into<String>, membrane: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            organelles: Vec::new(),
            membrane: membrane.into(),
            behaviour: BehaviourStats::default(),
        }
    }

    #[must_use]
    pub fn with_organelle(mut self, organelle: impl Into<String>) -> Self {
        self.organelles.push(organelle.into());
        self
    }

    #[must_use]
    pub fn with_organelles<I, S>(mut self, organelles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.organelles
            .extend(organelles.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_behaviour(mut self, aggression: f64, activity: f64) -> Self {
        self.behaviour = BehaviourStats {
            aggression,
            activity,
        };
        self
    }
}
