//! TOML-based engine configuration.
//!
//! Holds the tunable thresholds of the lifecycle engine:
//! - Scheduled-duration bounds enforced at session creation
//! - Abandonment timeout for idle `planned`/`paused` sessions
//! - Over-budget grace multiplier
//! - Sweep period and store write retry budget
//!
//! Configuration is stored at `~/.config/deepwork/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/deepwork/config.toml`. Every field
/// has a default, so a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum scheduled duration accepted at creation (minutes).
    #[serde(default = "default_min_duration_min")]
    pub min_duration_min: u64,
    /// Maximum scheduled duration accepted at creation (minutes).
    #[serde(default = "default_max_duration_min")]
    pub max_duration_min: u64,
    /// A `planned` or `paused` session with no transition for this long is
    /// swept to `abandoned`.
    #[serde(default = "default_abandon_after_min")]
    pub abandon_after_min: u64,
    /// An `active` session whose productive time exceeds
    /// `scheduled_duration * grace_multiplier` is swept to `interrupted`.
    #[serde(default = "default_grace_multiplier")]
    pub grace_multiplier: f64,
    /// Sweeper tick period in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Total store write attempts per transition before surfacing failure.
    #[serde(default = "default_store_write_attempts")]
    pub store_write_attempts: u32,
}

fn default_min_duration_min() -> u64 {
    1
}

fn default_max_duration_min() -> u64 {
    240
}

fn default_abandon_after_min() -> u64 {
    60
}

fn default_grace_multiplier() -> f64 {
    1.5
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_store_write_attempts() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_duration_min: default_min_duration_min(),
            max_duration_min: default_max_duration_min(),
            abandon_after_min: default_abandon_after_min(),
            grace_multiplier: default_grace_multiplier(),
            sweep_interval_secs: default_sweep_interval_secs(),
            store_write_attempts: default_store_write_attempts(),
        }
    }
}

impl EngineConfig {
    /// Path of the configuration file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = super::data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/deepwork"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, falling back to defaults if no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| match e {
            ConfigError::LoadFailed { path, message } => ConfigError::SaveFailed { path, message },
            other => other,
        })?;
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_duration_min == 0 || self.min_duration_min > self.max_duration_min {
            return Err(ConfigError::InvalidValue {
                key: "min_duration_min".into(),
                message: format!(
                    "expected 1..={}, got {}",
                    self.max_duration_min, self.min_duration_min
                ),
            });
        }
        if self.grace_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "grace_multiplier".into(),
                message: format!("must be at least 1.0, got {}", self.grace_multiplier),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval_secs".into(),
                message: "must be positive".into(),
            });
        }
        if self.store_write_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "store_write_attempts".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn abandon_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.abandon_after_min as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_duration_min, 1);
        assert_eq!(config.max_duration_min, 240);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("abandon_after_min = 15").unwrap();
        assert_eq!(config.abandon_after_min, 15);
        assert_eq!(config.grace_multiplier, 1.5);
        assert_eq!(config.sweep_interval_secs, 30);
    }

    #[test]
    fn rejects_zero_minimum_duration() {
        let config = EngineConfig {
            min_duration_min: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_grace_below_one() {
        let config = EngineConfig {
            grace_multiplier: 0.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
