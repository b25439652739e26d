//! TOML-based application configuration.
//!
//! Stores:
//! - The per-question time limit injected at session bootstrap
//! - Where the grading service lives and how to authenticate to it
//! - Tuning for the sampling probes
//!
//! Configuration is stored at `~/.config/quizguard/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Session bootstrap values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Seconds per question; `0` runs untimed.
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u32,
}

/// Grading service location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_report_path")]
    pub report_path: String,
    #[serde(default = "default_answer_path")]
    pub answer_path: String,
    #[serde(default = "default_next_path")]
    pub next_path: String,
    /// Raw `Cookie` header identifying the attempt to the service.
    #[serde(default)]
    pub session_cookie: Option<String>,
}

/// Probe tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Outer-minus-inner viewport gap (px) above which an inspection
    /// panel is assumed open.
    #[serde(default = "default_viewport_gap")]
    pub viewport_gap_threshold_px: u32,
    #[serde(default = "default_viewport_poll_ms")]
    pub viewport_poll_ms: u64,
}

impl ProbeConfig {
    pub fn viewport_poll_period(&self) -> Duration {
        Duration::from_millis(self.viewport_poll_ms.max(1))
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/quizguard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
}

// Default functions
fn default_time_limit() -> u32 {
    60
}
fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_report_path() -> String {
    "/api/cheat".into()
}
fn default_answer_path() -> String {
    "/api/answer".into()
}
fn default_next_path() -> String {
    "/api/next".into()
}
fn default_viewport_gap() -> u32 {
    160
}
fn default_viewport_poll_ms() -> u64 {
    1000
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: default_time_limit(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            report_path: default_report_path(),
            answer_path: default_answer_path(),
            next_path: default_next_path(),
            session_cookie: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            viewport_gap_threshold_px: default_viewport_gap(),
            viewport_poll_ms: default_viewport_poll_ms(),
        }
    }
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

    fn leaf_mut<'a>(
        root: &'a mut serde_json::Value,
        key: &str,
    ) -> Result<&'a mut serde_json::Value, ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        for part in key.split('.') {
            current = current
                .as_object_mut()
                .and_then(|obj| obj.get_mut(part))
                .ok_or_else(unknown)?;
        }
        Ok(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let leaf = Self::leaf_mut(root, key)?;
        let new_value = match leaf {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };
        *leaf = new_value;
        Ok(())
    }

    /// Apply `edit` to the JSON form of the config and decode it back.
    fn edit_json(
        &mut self,
        key: &str,
        edit: impl FnOnce(&mut serde_json::Value) -> Result<(), ConfigError>,
    ) -> Result<(), ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        };
        let mut json = serde_json::to_value(&*self).map_err(invalid)?;
        edit(&mut json)?;
        *self = serde_json::from_value(json).map_err(invalid)?;
        Ok(())
    }

    /// Location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default (writing it out).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, creating it with defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed (it is
    /// left untouched), or if the default cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key. Unset optional
    /// values read as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether `key` names a field, set or not.
    pub fn has_key(&self, key: &str) -> bool {
        serde_json::to_value(self)
            .ok()
            .is_some_and(|json| Self::get_json_value_by_path(&json, key).is_some())
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.edit_json(key, |json| Self::set_json_value_by_path(json, key, value))
    }

    /// Clear an optional value (e.g. `service.session_cookie`) in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the field is required.
    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        self.edit_json(key, |json| {
            *Self::leaf_mut(json, key)? = serde_json::Value::Null;
            Ok(())
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
