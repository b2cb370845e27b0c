//! TOML-based application configuration.
//!
//! Stores:
//! - Preferences (auto-start on select, accessible display)
//! - Break suggestion thresholds
//! - Valuation tables (target seconds and unit values)
//!
//! Configuration is stored at `~/.config/studyclock/config.toml`. Session
//! counters are never written here; they reset on every launch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::BreakPolicy;
use crate::valuation::ValuationConfig;

/// Boolean preferences persisted alongside the valuation tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Start timing as soon as a study kind is selected.
    #[serde(default)]
    pub auto_start: bool,
    /// Drop color and bell cues; show explicit sign glyphs instead.
    #[serde(default)]
    pub accessible_display: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyclock/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub break_policy: BreakPolicy,
    #[serde(default)]
    pub valuation: ValuationConfig,
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(serde_json::Value::Number(0.into()));
        }
        if let Ok(n) = trimmed.parse::<u64>() {
            return Ok(serde_json::Value::Number(n.into()));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as number"),
            })
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let parts: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = parts.split_last() else {
            return Err(ConfigError::UnknownKey(key.to_string()));
        };
        if leaf.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        for part in parents {
            current = current
                .get_mut(*part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        // Valuation maps accept new keys; everything else must already exist.
        let open_map = parents.first() == Some(&"valuation") && parents.len() >= 2;
        let obj = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match obj.get(*leaf) {
            Some(serde_json::Value::Bool(_)) => {
                let parsed = value.trim().parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
                serde_json::Value::Bool(parsed)
            }
            Some(serde_json::Value::Number(_)) => Self::parse_number(key, value)?,
            Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })?
            }
            Some(_) => serde_json::Value::String(value.into()),
            None if open_map => Self::parse_number(key, value)?,
            None => return Err(ConfigError::UnknownKey(key.to_string())),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Parse config text. Valuation tables are read leniently; see
    /// [`ValuationConfig::from_toml_lenient`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let root: toml::Value = toml::from_str(content)?;

        let preferences = match root.get("preferences") {
            Some(v) => v.clone().try_into::<Preferences>()?,
            None => Preferences::default(),
        };
        let break_policy = match root.get("break_policy") {
            Some(v) => v.clone().try_into::<BreakPolicy>()?,
            None => BreakPolicy::default(),
        };
        let valuation = match root.get("valuation") {
            Some(v) => ValuationConfig::from_toml_lenient(v),
            None => ValuationConfig::default(),
        };

        Ok(Self {
            preferences,
            break_policy,
            valuation,
        })
    }

    /// Load from `path`, or `None` if the file does not exist.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map(Some).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// Persist to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match Self::read_from(&path)? {
            Some(cfg) => Ok(cfg),
            None => {
                let cfg = Self::default();
                cfg.write_to(&path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.write_to(&Self::path()?)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, e.g. `valuation.target_seconds.CT`.
    /// A blank value on a numeric field stores 0. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
