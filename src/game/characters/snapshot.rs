// Save/load layout for a single character

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::state::CharacterState;
use super::stats::StatsRecord;

/// The minimal persisted state of a character: its stats record plus the
/// state it was in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub stats: StatsRecord,
    #[serde(default)]
    pub state: CharacterState,
}

impl CharacterSnapshot {
    pub fn new(stats: StatsRecord, state: CharacterState) -> Self {
        Self { stats, state }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize character snapshot")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse character snapshot")
    }

    /// Write the snapshot to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))
    }

    /// Read a snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
