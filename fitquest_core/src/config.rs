//! Configuration file support for FitQuest.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitquest/config.toml`.

use crate::{Error, NutrientGoals, RestTimerConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rest_timer: RestTimerConfig,

    #[serde(default)]
    pub xp: XpConfig,

    #[serde(default)]
    pub goals: GoalsConfig,

    #[serde(default)]
    pub nutrition: NutrientGoals,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Inactivity penalty parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XpConfig {
    /// Days without a workout before penalties start accruing
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,

    #[serde(default = "default_penalty_xp_per_day")]
    pub penalty_xp_per_day: u64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            grace_days: default_grace_days(),
            penalty_xp_per_day: default_penalty_xp_per_day(),
        }
    }
}

/// Goal tracker limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_max_active_goals")]
    pub max_active: usize,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active_goals(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("fitquest")
}

fn default_grace_days() -> u32 {
    2
}

fn default_penalty_xp_per_day() -> u64 {
    50
}

fn default_max_active_goals() -> usize {
    3
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would make the trackers misbehave
    pub fn validate(&self) -> Result<()> {
        if self.rest_timer.default_seconds == 0 {
            return Err(Error::Config(
                "rest_timer.default_seconds must be greater than zero".into(),
            ));
        }
        if self.goals.max_active == 0 {
            return Err(Error::Config(
                "goals.max_active must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("fitquest").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rest_timer.default_seconds, 90);
        assert_eq!(config.xp.grace_days, 2);
        assert_eq!(config.xp.penalty_xp_per_day, 50);
        assert_eq!(config.goals.max_active, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[rest_timer]
default_seconds = 120

[nutrition]
calories = 2400
protein_g = 180
carbs_g = 260
fat_g = 70
water_ml = 3000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rest_timer.default_seconds, 120);
        assert!(config.rest_timer.sound_enabled); // default
        assert_eq!(config.nutrition.calories, 2400);
        assert_eq!(config.goals.max_active, 3); // default
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.xp.grace_days = 4;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.xp.grace_days, 4);
    }

    #[test]
    fn test_zero_rest_seconds_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[rest_timer]\ndefault_seconds = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
