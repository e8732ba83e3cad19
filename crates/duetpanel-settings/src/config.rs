//! Configuration management for DuetPanel
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in the platform config
//! directory.
//!
//! Configuration is organized into logical sections:
//! - Controller settings (address, timeouts, TLS)
//! - Polling settings (loop cadences, retry policy, optional fan control)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config directory
pub const APP_DIR: &str = "duetpanel";

/// Controller connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Controller base URL
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Accept self-signed controller certificates
    pub accept_invalid_certs: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout_ms: 5000,
            accept_invalid_certs: false,
        }
    }
}

impl ControllerSettings {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Polling loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Status reconciliation cadence in milliseconds
    pub status_interval_ms: u64,
    /// Availability probe cadence in milliseconds
    pub availability_interval_ms: u64,
    /// Backoff between command resubmissions in milliseconds
    pub retry_delay_ms: u64,
    /// Give up on a command after this many submissions; unset retries forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dispatch_attempts: Option<u32>,
    /// How long a confirmed heater fault reset suppresses re-prompting
    pub fault_latch_ms: u64,
    /// Run the overshoot fan controller
    pub overshoot_fans_enabled: bool,
    /// Overshoot fan controller cadence in milliseconds
    pub overshoot_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            status_interval_ms: 500,
            availability_interval_ms: 2000,
            retry_delay_ms: 2000,
            max_dispatch_attempts: None,
            fault_latch_ms: 500,
            overshoot_fans_enabled: false,
            overshoot_interval_ms: 1000,
        }
    }
}

impl PollingSettings {
    /// Status reconciliation cadence
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Availability probe cadence
    pub fn availability_interval(&self) -> Duration {
        Duration::from_millis(self.availability_interval_ms)
    }

    /// Command retry backoff
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Fault latch debounce
    pub fn fault_latch(&self) -> Duration {
        Duration::from_millis(self.fault_latch_ms)
    }

    /// Overshoot fan controller cadence
    pub fn overshoot_interval(&self) -> Duration {
        Duration::from_millis(self.overshoot_interval_ms)
    }
}

/// Complete panel configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PanelConfig {
    /// Preference file; defaults to the platform config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,
    /// Controller settings
    pub controller: ControllerSettings,
    /// Polling settings
    pub polling: PollingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

impl PanelConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the config at `path`, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let url = &self.controller.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidSetting {
                key: "controller.base_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let positive = [
            ("controller.timeout_ms", self.controller.timeout_ms),
            ("polling.status_interval_ms", self.polling.status_interval_ms),
            (
                "polling.availability_interval_ms",
                self.polling.availability_interval_ms,
            ),
            (
                "polling.overshoot_interval_ms",
                self.polling.overshoot_interval_ms,
            ),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        if self.polling.max_dispatch_attempts == Some(0) {
            return Err(ConfigError::ValueOutOfRange {
                key: "polling.max_dispatch_attempts".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Preference file to use, falling back to the platform default
    pub fn resolved_preferences_path(&self) -> SettingsResult<PathBuf> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => default_preferences_path(),
        }
    }
}

/// Platform config directory for DuetPanel
pub fn config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })
}

/// Default configuration file location
pub fn default_config_path() -> SettingsResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default preference file location
pub fn default_preferences_path() -> SettingsResult<PathBuf> {
    Ok(config_dir()?.join("preferences.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PanelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.status_interval(), Duration::from_millis(500));
        assert_eq!(config.polling.retry_delay(), Duration::from_millis(2000));
        assert!(!config.polling.overshoot_fans_enabled);
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = PanelConfig::default();
        config.controller.base_url = "192.168.1.50".to_string();
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = PanelConfig::default();
        config.polling.status_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PanelConfig = toml::from_str(
            r#"
            [controller]
            base_url = "https://10.0.0.7"
            accept_invalid_certs = true
            "#,
        )
        .unwrap();
        assert_eq!(config.controller.base_url, "https://10.0.0.7");
        assert_eq!(config.controller.timeout_ms, 5000);
        assert_eq!(config.polling, PollingSettings::default());
    }
}
