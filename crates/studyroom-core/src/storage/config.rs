//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer defaults (mode, countdown length, adjust step)
//! - Voice matching thresholds
//! - Command channel debounce and polling
//! - Analytics export target
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{TimerMode, DEFAULT_COUNTDOWN_SECS};

/// Timer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default)]
    pub default_mode: TimerMode,
    #[serde(default = "default_countdown_minutes")]
    pub countdown_minutes: u64,
    /// Step used by `timer adjust +` / `-` without an explicit amount.
    #[serde(default = "default_adjust_step")]
    pub adjust_step_secs: u64,
}

/// Fuzzy matching thresholds for spoken commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_start_threshold")]
    pub start_threshold: f64,
}

/// External command channel timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_interval_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Where completed-session statistics are exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Base URL of a remote stats store. Local only when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

// Default functions
fn default_countdown_minutes() -> u64 {
    DEFAULT_COUNTDOWN_SECS / 60
}
fn default_adjust_step() -> u64 {
    60
}
fn default_match_threshold() -> f64 {
    0.5
}
fn default_start_threshold() -> f64 {
    0.3
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_user_id() -> String {
    "local".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_mode: TimerMode::default(),
            countdown_minutes: default_countdown_minutes(),
            adjust_step_secs: default_adjust_step(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            start_threshold: default_start_threshold(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_interval_ms(),
            poll_interval_ms: default_interval_ms(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            endpoint: None,
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            // Optional fields serialize as null; treat them as strings.
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there when it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Countdown length in seconds.
    pub fn countdown_secs(&self) -> u64 {
        self.timer.countdown_minutes.saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.countdown_minutes, 10);
        assert_eq!(parsed.voice.match_threshold, 0.5);
        assert_eq!(parsed.analytics.user_id, "local");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[voice]\nstart_threshold = 0.4\n").unwrap();
        assert_eq!(parsed.voice.start_threshold, 0.4);
        assert_eq!(parsed.voice.match_threshold, 0.5);
        assert_eq!(parsed.channel.debounce_ms, 1000);
        assert_eq!(parsed.timer.default_mode, TimerMode::CountUp);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.countdown_minutes").as_deref(), Some("10"));
        assert_eq!(cfg.get("timer.default_mode").as_deref(), Some("countup"));
        assert_eq!(cfg.get("voice.start_threshold").as_deref(), Some("0.3"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_number_and_enum() {
        let mut cfg = Config::default();
        cfg.set("timer.countdown_minutes", "25").unwrap();
        cfg.set("timer.default_mode", "countdown").unwrap();
        cfg.set("voice.match_threshold", "0.6").unwrap();
        assert_eq!(cfg.timer.countdown_minutes, 25);
        assert_eq!(cfg.countdown_secs(), 1500);
        assert_eq!(cfg.timer.default_mode, TimerMode::CountDown);
        assert_eq!(cfg.voice.match_threshold, 0.6);
    }

    #[test]
    fn set_optional_string() {
        let mut cfg = Config::default();
        cfg.set("analytics.endpoint", "http://localhost:9000").unwrap();
        assert_eq!(cfg.analytics.endpoint.as_deref(), Some("http://localhost:9000"));
        cfg.set("analytics.endpoint", "").unwrap();
        assert!(cfg.analytics.endpoint.is_none());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.nonexistent_key", "1").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.countdown_minutes", "ten").is_err());
        assert!(cfg.set("timer.default_mode", "sideways").is_err());
        assert_eq!(cfg.timer.countdown_minutes, 10);
    }

    #[test]
    fn load_from_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.timer.adjust_step_secs, 60);

        std::fs::write(&path, "[timer]\ncountdown_minutes = 3\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().countdown_secs(), 180);

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
