//! TOML-based application configuration.
//!
//! Stores:
//! - Tracker connection settings (URL, user, API version, burnup query)
//! - The last selected board and sprint, and the support board whose work
//!   logs feed the burnup
//! - Availability and burnup budget per board and sprint
//!
//! Configuration is stored at `~/.config/burnupdown/config.toml`. The
//! password is never written here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Local, Offset};

use super::data_dir;
use crate::error::ConfigError;
use crate::model::SprintHours;

/// Which REST API shape the tracker speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V6,
    V7,
}

/// Tracker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Filter for issues whose work logs feed the burnup
    #[serde(default = "default_burnup_issue_query")]
    pub burnup_issue_query: String,
    /// Offset all timestamps are normalized into; local offset when unset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/burnupdown/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub current_board: Option<u64>,
    #[serde(default)]
    pub current_sprint: Option<u64>,
    /// Kanban board holding the support issues
    #[serde(default)]
    pub support_board: Option<u64>,
    /// Board id -> sprint id -> hours. TOML keys are strings.
    #[serde(default)]
    pub hours: BTreeMap<String, BTreeMap<String, SprintHours>>,
}

fn default_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_burnup_issue_query() -> String {
    "issuetype = Support".into()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: String::new(),
            api_version: ApiVersion::default(),
            burnup_issue_query: default_burnup_issue_query(),
            utc_offset_minutes: None,
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                // "none" clears optional fields; non-optional ones reject the
                // null when the config is rebuilt.
                let new_value = if value.eq_ignore_ascii_case("none") {
                    serde_json::Value::Null
                } else {
                    match existing {
                        serde_json::Value::Bool(_) => serde_json::Value::Bool(
                            value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                        ),
                        serde_json::Value::Number(_) => {
                            if let Ok(n) = value.parse::<u64>() {
                                serde_json::Value::Number(n.into())
                            } else if let Ok(n) = value.parse::<i64>() {
                                serde_json::Value::Number(n.into())
                            } else {
                                return Err(invalid(format!("cannot parse '{value}' as number")));
                            }
                        }
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        }
                        // Unset optional fields: numbers stay numbers.
                        serde_json::Value::Null => {
                            if let Ok(n) = value.parse::<i64>() {
                                serde_json::Value::Number(n.into())
                            } else {
                                serde_json::Value::String(value.into())
                            }
                        }
                        serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
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

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key without saving. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Hours for a sprint; `(0, 0)` when never configured.
    pub fn hours(&self, board: u64, sprint: u64) -> SprintHours {
        self.hours
            .get(&board.to_string())
            .and_then(|sprints| sprints.get(&sprint.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn hours_mut(&mut self, board: u64, sprint: u64) -> &mut SprintHours {
        self.hours
            .entry(board.to_string())
            .or_default()
            .entry(sprint.to_string())
            .or_default()
    }

    pub fn set_availability(&mut self, board: u64, sprint: u64, availability: u32) {
        self.hours_mut(board, sprint).availability = availability;
    }

    pub fn set_burnup_budget(&mut self, board: u64, sprint: u64, burnup_budget: u32) {
        self.hours_mut(board, sprint).burnup_budget = burnup_budget;
    }

    /// Offset tracker timestamps are converted into.
    pub fn tracker_offset(&self) -> FixedOffset {
        self.tracker
            .utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}
