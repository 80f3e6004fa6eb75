use serde::{Deserialize, Serialize};

/// Static description of one organelle type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrganelleDefinition {
    /// Registry key, e.g. `"chloroplast"`.
    pub name: String,
    /// Number of hexes the organelle occupies.
    pub hexes: u32,
    /// Process ids this organelle can run.
    #[serde(default)]
    pub processes: Vec<String>,
    /// Thrust contributed to the cell's movement (flagella).
    #[serde(default)]
    pub momentum: f64,
    /// Whether the organelle is a pilus (melee predation).
    #[serde(default)]
    pub pilus: bool,
}

impl OrganelleDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, hexes: u32) -> Self {
        Self {
            name: name.into(),
            hexes,
            processes: Vec::new(),
            momentum: 0.0,
            pilus: false,
        }
    }

    #[must_use]
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.processes.push(process.into());
        self
    }
}

/// Cell membrane type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MembraneType {
    /// Registry key, e.g. `"cellulose"`.
    pub name: String,
    /// Walled cells cannot engulf.
    #[serde(default)]
    pub cell_wall: bool,
    /// Multiplier on the per-hex osmoregulation upkeep.
    pub osmoregulation_factor: f64,
    /// Multiplier on base movement speed.
    pub movement_factor: f64,
}
