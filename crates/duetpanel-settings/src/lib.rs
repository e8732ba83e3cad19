//! DuetPanel Settings Crate
//!
//! Handles panel configuration files, the file-backed preference store,
//! temperature presets, and heating profiles.

pub mod config;
pub mod error;
pub mod preferences;
pub mod profiles;

pub use config::{
    config_dir, default_config_path, default_preferences_path, ControllerSettings, PanelConfig,
    PollingSettings,
};
pub use error::{ConfigError, PersistenceError, SettingsError, SettingsResult};
pub use preferences::{set_toggle, JsonFilePreferences};
pub use profiles::{
    default_heating_profiles, load_heating_profiles, save_heating_profiles, HeaterCategory,
    HeatingProfile, TemperaturePreset, TemperaturePresets,
};
