mod defaults;
mod gamification;

#[cfg(test)]
mod tests;

pub use gamification::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::CoachError;
use defaults::*;

/// Top-level Murshid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coach: CoachConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gamification: GamificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coach: CoachConfig::default(),
            storage: StorageConfig::default(),
            gamification: GamificationConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), CoachError> {
        self.gamification.validate()
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Storage config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// The static gamification tables, with the built-in defaults applied for
/// any section the config file omits.
///
/// Timezone policy: timestamps entering the engine are already resolved to
/// wall-clock time by the caller (the binary uses the server's local
/// time), and calendar days — including the streak's "yesterday" — are
/// derived with true calendar-date arithmetic on that wall clock. One
/// consistent clock, documented here rather than implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// Length of the coaching program in days.
    #[serde(default = "default_program_days")]
    pub program_days: u32,
    /// Sessions strictly before this local hour count as early-morning.
    #[serde(default = "default_early_morning_hour")]
    pub early_morning_hour: u32,
    #[serde(default = "default_actions")]
    pub actions: Vec<ActionRule>,
    #[serde(default = "default_multipliers")]
    pub multipliers: MultiplierConfig,
    #[serde(default = "default_levels")]
    pub levels: LevelTable,
    #[serde(default = "default_badges")]
    pub badges: Vec<Badge>,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            program_days: default_program_days(),
            early_morning_hour: default_early_morning_hour(),
            actions: default_actions(),
            multipliers: default_multipliers(),
            levels: default_levels(),
            badges: default_badges(),
        }
    }
}

impl GamificationConfig {
    pub fn validate(&self) -> Result<(), CoachError> {
        if self.program_days == 0 {
            return Err(CoachError::Config("program_days must be at least 1".into()));
        }

        self.levels.validate()?;

        let mut seen_kinds = BTreeSet::new();
        for action in &self.actions {
            if action.phrases.is_empty() {
                return Err(CoachError::Config(format!(
                    "action {:?} has no phrases",
                    action.kind
                )));
            }
            if action.points == 0 {
                return Err(CoachError::Config(format!(
                    "action {:?} awards zero points",
                    action.kind
                )));
            }
            if !seen_kinds.insert(format!("{:?}", action.kind)) {
                return Err(CoachError::Config(format!(
                    "duplicate action kind {:?}",
                    action.kind
                )));
            }
        }

        for rule in &self.multipliers.rules {
            if rule.factor < 1.0 {
                return Err(CoachError::Config(format!(
                    "multiplier '{}' has factor below 1.0",
                    rule.name
                )));
            }
        }

        let mut seen_badges = BTreeSet::new();
        for badge in &self.badges {
            if !seen_badges.insert(badge.id.clone()) {
                return Err(CoachError::Config(format!(
                    "duplicate badge id '{}'",
                    badge.id
                )));
            }
        }

        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to the built-in defaults if the file does not exist. The
/// loaded tables are validated before being handed out.
pub fn load(path: &str) -> Result<Config, CoachError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| CoachError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CoachError::Config(format!("failed to parse config: {}", e)))?;

    config.validate()?;

    Ok(config)
}
