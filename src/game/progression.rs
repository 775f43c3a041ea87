// Experience thresholds per level

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Progression table errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgressionError {
    #[error("Level {level} is outside the progression table (1..={max})")]
    LevelOutOfRange { level: u32, max: u32 },

    #[error("Progression threshold {index} is not a finite non-negative number: {value}")]
    InvalidThreshold { index: usize, value: f64 },

    #[error("Progression thresholds must be non-decreasing: entry {index} ({value}) < {previous}")]
    Decreasing {
        index: usize,
        value: f64,
        previous: f64,
    },
}

/// Ordered experience thresholds, 1-indexed by level.
///
/// Entry `L` is the cumulative experience needed to finish level `L`, so the
/// cost of level `L` itself is `threshold(L) - threshold(L - 1)`. A character
/// can reach at most level `len() + 1`; that level has no threshold and no
/// further leveling happens there.
///
/// Loaded once and shared read-only between every stats ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ProgressionTable {
    thresholds: Vec<f64>,
}

impl ProgressionTable {
    /// Build a table, rejecting negative, non-finite or decreasing entries
    pub fn new(thresholds: Vec<f64>) -> Result<Self, ProgressionError> {
        let mut previous = 0.0;
        for (index, &value) in thresholds.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ProgressionError::InvalidThreshold { index, value });
            }
            if value < previous {
                return Err(ProgressionError::Decreasing {
                    index,
                    value,
                    previous,
                });
            }
            previous = value;
        }
        Ok(Self { thresholds })
    }

    /// Parse a JSON array of thresholds
    pub fn from_json_str(json: &str) -> Result<Self> {
        let thresholds: Vec<f64> =
            serde_json::from_str(json).context("Failed to parse progression table")?;
        Ok(Self::new(thresholds)?)
    }

    /// Load a JSON array of thresholds from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read progression table {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Cumulative experience needed to finish `level`
    pub fn lookup(&self, level: u32) -> Result<f64, ProgressionError> {
        if level == 0 || level as usize > self.thresholds.len() {
            return Err(ProgressionError::LevelOutOfRange {
                level,
                max: self.thresholds.len() as u32,
            });
        }
        Ok(self.thresholds[level as usize - 1])
    }

    /// Experience a character must earn while at `level` to reach the next one
    pub fn experience_for_level(&self, level: u32) -> Result<f64, ProgressionError> {
        let upper = self.lookup(level)?;
        let lower = if level > 1 { self.lookup(level - 1)? } else { 0.0 };
        Ok(upper - lower)
    }

    /// Highest level a character can hold with this table
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32 + 1
    }

    /// Number of thresholds
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl TryFrom<Vec<f64>> for ProgressionTable {
    type Error = ProgressionError;

    fn try_from(thresholds: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(thresholds)
    }
}

impl From<ProgressionTable> for Vec<f64> {
    fn from(table: ProgressionTable) -> Self {
        table.thresholds
    }
}
