//! Preference store interface
//!
//! Operator preferences are string key/value pairs owned by the UI side.
//! The control loop only reads them, to build initialization batches and to
//! pick presentation variants.

use crate::error::Result;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// Well-known preference keys
pub mod keys {
    /// Part cooling toggle, `on` or `off`
    pub const PART_COOLING: &str = "partCoolingState";
    /// Bed fixture plate PID toggle, `on` or `off`
    pub const BED_FIXTURE_PLATE: &str = "bedFixturePlateState";
    /// Smart loom tool detection, `on` or `off`
    pub const TOOL_DETECTION: &str = "toolDetectionState";
    /// CNC mill panel enabled, `on` or `off`
    pub const CNC: &str = "cncState";
    /// AiSync slicer panel enabled, `on` or `off`
    pub const AISYNC: &str = "aisyncState";
    /// Product family, `pe320`, `apollo`, or `zeus`
    pub const SYSTEM_FAMILY: &str = "systemFamily";
    /// Per-heater temperature presets, JSON
    pub const TEMPERATURE_SETTINGS: &str = "temperatureSettings";
    /// Heating profile list, JSON
    pub const HEATING_PROFILES: &str = "HeatingProfiles";
}

/// Value stored for an enabled toggle
pub const ON: &str = "on";
/// Value stored for a disabled toggle
pub const OFF: &str = "off";

/// Named key/value settings store
pub trait PreferenceStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Whether a toggle key is `on`. Missing keys read as `off`.
    fn is_on(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some(ON)
    }
}

/// Machine product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SystemFamily {
    /// PE320 (default)
    #[default]
    Pe320,
    /// Apollo
    Apollo,
    /// Zeus
    Zeus,
}

impl SystemFamily {
    /// Read the family from the store, defaulting to PE320
    pub fn from_store(store: &dyn PreferenceStore) -> Self {
        match store.get(keys::SYSTEM_FAMILY).as_deref() {
            Some("apollo") => Self::Apollo,
            Some("zeus") => Self::Zeus,
            _ => Self::Pe320,
        }
    }
}

impl std::fmt::Display for SystemFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pe320 => write!(f, "PE320"),
            Self::Apollo => write!(f, "Apollo"),
            Self::Zeus => write!(f, "Zeus"),
        }
    }
}

/// In-memory preference store
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `pairs`
    pub fn with_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_defaults_to_off() {
        let prefs = MemoryPreferences::new();
        assert!(!prefs.is_on(keys::PART_COOLING));
        prefs.set(keys::PART_COOLING, ON).unwrap();
        assert!(prefs.is_on(keys::PART_COOLING));
    }

    #[test]
    fn test_system_family() {
        let prefs = MemoryPreferences::with_values([(keys::SYSTEM_FAMILY, "zeus")]);
        assert_eq!(SystemFamily::from_store(&prefs), SystemFamily::Zeus);
        assert_eq!(
            SystemFamily::from_store(&MemoryPreferences::new()),
            SystemFamily::Pe320
        );
    }
}
