//! Service configuration
//!
//! Loaded from an optional JSON file, then overridden from the environment
//! (`.env` files are honoured by the binaries through `dotenvy`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::{
    DEFAULT_LABEL_TIME_ZONE, RegistryError, SubjectGroup, SubjectRegistry, SummaryFormatter,
};
use thiserror_no_std::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TALLY_CONFIG";
/// Environment override for [`StoreConfig::path`].
pub const STORE_PATH_ENV: &str = "TALLY_STORE_PATH";
/// Environment override for [`Config::label_time_zone`].
pub const TIME_ZONE_ENV: &str = "TALLY_TIME_ZONE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("cannot parse config {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("invalid value `{value}` for {key}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("invalid subject registry: {0}")]
    Registry(RegistryError),
    #[error("unknown time zone `{0}`")]
    InvalidTimeZone(String),
}

impl From<RegistryError> for ConfigError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// JSON document file holding the device collections
    pub path: PathBuf,
    /// Start from an empty store when the file does not exist yet
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tally-store.json"),
            create_if_missing: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub store: StoreConfig,
    /// Concrete subjects, in registry order
    pub subjects: Vec<String>,
    /// Composite aliases
    pub groups: Vec<SubjectGroup>,
    /// IANA zone used for time-range labels
    pub label_time_zone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            subjects: vec![String::from("raz"), String::from("taz")],
            groups: vec![SubjectGroup {
                alias: String::from("all"),
                members: vec![String::from("taz"), String::from("raz")],
            }],
            label_time_zone: String::from(DEFAULT_LABEL_TIME_ZONE.name()),
        }
    }
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Applies overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(STORE_PATH_ENV) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(value) = lookup(TIME_ZONE_ENV) {
            let zone = value.trim();
            if SummaryFormatter::from_zone_name(zone).is_none() {
                return Err(ConfigError::InvalidEnv {
                    key: TIME_ZONE_ENV,
                    value,
                });
            }
            self.label_time_zone = String::from(zone);
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<SubjectRegistry, ConfigError> {
        Ok(SubjectRegistry::new(
            self.subjects.clone(),
            self.groups.clone(),
        )?)
    }

    pub fn formatter(&self) -> Result<SummaryFormatter, ConfigError> {
        SummaryFormatter::from_zone_name(&self.label_time_zone)
            .ok_or_else(|| ConfigError::InvalidTimeZone(self.label_time_zone.clone()))
    }
}
