//! Loading a circuit from a JSON file on disk.

use std::path::Path;

use anyhow::{Context, Result};
use relaic::types::SolveRequest;
use relaic_core::{Component, Wire};
use serde::{Deserialize, Serialize};

/// The on-disk shape: `{ "components": [...], "wires": [...], "simTime": ... }`,
/// the same body a `simulate`/`measure` request carries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitFile {
    pub components: Vec<Component>,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(rename = "simTime", default)]
    pub sim_time: Option<i64>,
}

impl CircuitFile {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {} as a circuit", path.display()))
    }

    pub fn into_request(self, sim_time_override: Option<i64>) -> SolveRequest {
        SolveRequest {
            components: self.components,
            wires: self.wires,
            sim_time: sim_time_override.or(self.sim_time),
        }
    }
}
