// Simulation configuration - one JSON document covering every tunable

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::characters::movement::MovementConfig;
use super::characters::stats::StatsRecord;
use super::combat::CombatConfig;
use super::progression::{ProgressionError, ProgressionTable};

/// Cumulative experience thresholds used when a config names none
pub const DEFAULT_THRESHOLDS: [f64; 6] = [100.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid progression table: {0}")]
    Progression(#[from] ProgressionError),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// Everything needed to set up a world of characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Stats every spawned character starts with
    pub stats: StatsRecord,
    pub combat: CombatConfig,
    pub movement: MovementConfig,
    /// Cumulative experience thresholds, one per level
    pub progression: Vec<f64>,
    /// World seed; per-character seeds are derived from it
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stats: StatsRecord::default(),
            combat: CombatConfig::default(),
            movement: MovementConfig::default(),
            progression: DEFAULT_THRESHOLDS.to_vec(),
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded simulation config from {}", path.display());
        Ok(config)
    }

    /// Build the shared progression table
    pub fn progression_table(&self) -> Result<ProgressionTable, ConfigError> {
        Ok(ProgressionTable::new(self.progression.clone())?)
    }

    /// Reject tunables that would break timing or range checks
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.progression_table()?;

        let checks = [
            ("combat.attack_range", self.combat.attack_range),
            ("combat.attack_cooldown", self.combat.attack_cooldown),
            ("combat.stun_duration", self.combat.stun_duration),
            ("combat.attack_duration", self.combat.attack_duration),
            ("combat.leash_range", self.combat.leash_range),
            ("movement.walk_speed", self.movement.walk_speed),
            ("movement.run_speed", self.movement.run_speed),
            ("movement.jump_height", self.movement.jump_height),
            ("movement.coyote_time", self.movement.coyote_time),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        let chance = self.combat.stun_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::InvalidValue {
                field: "combat.stun_chance",
                value: chance,
            });
        }
        if !self.movement.gravity.is_finite() || self.movement.gravity > 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "movement.gravity",
                value: self.movement.gravity,
            });
        }
        Ok(())
    }
}
