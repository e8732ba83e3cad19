//! Heating profiles and temperature presets
//!
//! Both are stored in the preference store as JSON. Heating profiles use
//! PascalCase keys and may carry numbers or numeric strings; presets are
//! keyed by heater category and hold strings exactly as the operator typed
//! them.

use crate::error::{PersistenceError, SettingsError, SettingsResult};
use duetpanel_core::preferences::keys;
use duetpanel_core::PreferenceStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Per-material heater temperatures and spindle speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeatingProfile {
    /// Material name
    pub material: String,
    /// Top zone °C
    #[serde(deserialize_with = "number_or_string")]
    pub top: f64,
    /// Middle zone °C
    #[serde(deserialize_with = "number_or_string")]
    pub middle: f64,
    /// Bottom zone °C
    #[serde(deserialize_with = "number_or_string")]
    pub bottom: f64,
    /// Nozzle °C
    #[serde(deserialize_with = "number_or_string")]
    pub nozzle: f64,
    /// Bed °C, applied to every configured bed heater
    #[serde(deserialize_with = "number_or_string")]
    pub bed: f64,
    /// Spindle RPM
    #[serde(deserialize_with = "number_or_string")]
    pub cnc: f64,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl HeatingProfile {
    fn new(material: &str, zones: [f64; 5], cnc: f64) -> Self {
        Self {
            material: material.to_string(),
            top: zones[0],
            middle: zones[1],
            bottom: zones[2],
            nozzle: zones[3],
            bed: zones[4],
            cnc,
        }
    }

    /// Extruder zone temperatures, top to nozzle
    pub fn extruder_temperatures(&self) -> [f64; 4] {
        [self.top, self.middle, self.bottom, self.nozzle]
    }

    /// Spindle speed in whole RPM
    pub fn spindle_rpm(&self) -> u32 {
        self.cnc.max(0.0).round() as u32
    }
}

/// Built-in profiles used until the operator saves their own
pub fn default_heating_profiles() -> Vec<HeatingProfile> {
    vec![
        HeatingProfile::new("Airtech PC-GF", [110.0, 200.0, 250.0, 270.0, 100.0], 10000.0),
        HeatingProfile::new("Airtech PP-GF", [110.0, 200.0, 200.0, 210.0, 90.0], 10000.0),
        HeatingProfile::new("Airtech ABS-CF", [150.0, 190.0, 200.0, 210.0, 100.0], 10000.0),
        HeatingProfile::new("Airtech PETG-GF", [105.0, 140.0, 160.0, 205.0, 50.0], 21000.0),
        HeatingProfile::new("Recycled PP-GF", [105.0, 180.0, 195.0, 205.0, 90.0], 21000.0),
        HeatingProfile::new("Default PLA", [80.0, 140.0, 150.0, 160.0, 40.0], 10000.0),
        HeatingProfile::new("Default PETG", [105.0, 140.0, 160.0, 205.0, 50.0], 10000.0),
        HeatingProfile::new("Default PC", [110.0, 200.0, 250.0, 270.0, 100.0], 10000.0),
        HeatingProfile::new("Default PP", [110.0, 200.0, 200.0, 210.0, 90.0], 10000.0),
        HeatingProfile::new("Default ABS", [150.0, 190.0, 200.0, 210.0, 100.0], 10000.0),
    ]
}

/// Load the saved heating profiles, or the defaults when none are stored
pub fn load_heating_profiles(store: &dyn PreferenceStore) -> SettingsResult<Vec<HeatingProfile>> {
    match store.get(keys::HEATING_PROFILES) {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
            PersistenceError::InvalidPreference {
                key: keys::HEATING_PROFILES.to_string(),
                reason: e.to_string(),
            }
            .into()
        }),
        None => Ok(default_heating_profiles()),
    }
}

/// Save heating profiles
pub fn save_heating_profiles(
    store: &dyn PreferenceStore,
    profiles: &[HeatingProfile],
) -> SettingsResult<()> {
    let json = serde_json::to_string(profiles)?;
    store
        .set(keys::HEATING_PROFILES, &json)
        .map_err(|e| PersistenceError::WriteFailed(e.to_string()).into())
}

/// Heater category a preset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaterCategory {
    /// Top extruder zone
    Top,
    /// Middle extruder zone
    Middle,
    /// Bottom extruder zone
    Bottom,
    /// Nozzle
    Nozzle,
    /// Bed heater 0
    Bed0,
    /// Bed heater 1
    Bed1,
    /// Bed heater 2
    Bed2,
    /// Bed heater 3
    Bed3,
}

impl HeaterCategory {
    /// All categories in heater order
    pub const ALL: [HeaterCategory; 8] = [
        Self::Top,
        Self::Middle,
        Self::Bottom,
        Self::Nozzle,
        Self::Bed0,
        Self::Bed1,
        Self::Bed2,
        Self::Bed3,
    ];

    /// Extruder categories, top to nozzle
    pub const EXTRUDER: [HeaterCategory; 4] = [Self::Top, Self::Middle, Self::Bottom, Self::Nozzle];

    /// Bed categories
    pub const BED: [HeaterCategory; 4] = [Self::Bed0, Self::Bed1, Self::Bed2, Self::Bed3];

    /// Storage key
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
            Self::Nozzle => "nozzle",
            Self::Bed0 => "bed0",
            Self::Bed1 => "bed1",
            Self::Bed2 => "bed2",
            Self::Bed3 => "bed3",
        }
    }

    /// Parse a storage key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_key() == key)
    }

    /// Category of the heater at `index`, counting extruders then beds
    pub fn for_heater(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Operator-entered temperatures for one heater category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperaturePreset {
    /// Value shown in the numpad popup
    #[serde(default = "zero", deserialize_with = "blank_as_zero")]
    pub popup: String,
    /// Active temperature
    #[serde(default = "zero", deserialize_with = "blank_as_zero")]
    pub active: String,
    /// Preheat temperature
    #[serde(default = "zero", deserialize_with = "blank_as_zero")]
    pub preheat: String,
}

fn zero() -> String {
    "0".to_string()
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).unwrap_or_else(zero))
}

impl Default for TemperaturePreset {
    fn default() -> Self {
        Self {
            popup: zero(),
            active: zero(),
            preheat: zero(),
        }
    }
}

impl TemperaturePreset {
    /// Active temperature as a number, `0` when unparseable
    pub fn active_temperature(&self) -> f64 {
        self.active.trim().parse().unwrap_or(0.0)
    }

    /// Preheat temperature as a number, `0` when unparseable
    pub fn preheat_temperature(&self) -> f64 {
        self.preheat.trim().parse().unwrap_or(0.0)
    }
}

/// Temperature presets for every heater category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemperaturePresets {
    presets: BTreeMap<HeaterCategory, TemperaturePreset>,
}

impl Default for TemperaturePresets {
    fn default() -> Self {
        Self {
            presets: HeaterCategory::ALL
                .into_iter()
                .map(|c| (c, TemperaturePreset::default()))
                .collect(),
        }
    }
}

impl TemperaturePresets {
    /// Preset for `category`
    pub fn get(&self, category: HeaterCategory) -> &TemperaturePreset {
        // every category is populated on construction
        &self.presets[&category]
    }

    /// Replace the preset for `category`
    pub fn set(&mut self, category: HeaterCategory, preset: TemperaturePreset) {
        self.presets.insert(category, preset);
    }

    /// Set active and preheat to the same value
    pub fn set_both(&mut self, category: HeaterCategory, temperature: f64) {
        let text = temperature.to_string();
        let entry = self.presets.entry(category).or_default();
        entry.active = text.clone();
        entry.preheat = text;
    }

    /// Apply a heating profile to every preset
    pub fn apply_profile(&mut self, profile: &HeatingProfile) {
        for (category, temperature) in HeaterCategory::EXTRUDER
            .into_iter()
            .zip(profile.extruder_temperatures())
        {
            self.set_both(category, temperature);
        }
        for category in HeaterCategory::BED {
            self.set_both(category, profile.bed);
        }
    }

    /// Load presets; missing categories take `"0"` defaults
    pub fn load(store: &dyn PreferenceStore) -> SettingsResult<Self> {
        let mut presets = Self::default();
        let Some(json) = store.get(keys::TEMPERATURE_SETTINGS) else {
            return Ok(presets);
        };

        let stored: BTreeMap<String, TemperaturePreset> =
            serde_json::from_str(&json).map_err(|e| {
                SettingsError::from(PersistenceError::InvalidPreference {
                    key: keys::TEMPERATURE_SETTINGS.to_string(),
                    reason: e.to_string(),
                })
            })?;
        for (key, preset) in stored {
            match HeaterCategory::from_key(&key) {
                Some(category) => presets.set(category, preset),
                None => tracing::warn!("Ignoring unknown temperature preset '{}'", key),
            }
        }
        Ok(presets)
    }

    /// Save presets
    pub fn save(&self, store: &dyn PreferenceStore) -> SettingsResult<()> {
        let stored: BTreeMap<&str, &TemperaturePreset> = self
            .presets
            .iter()
            .map(|(category, preset)| (category.as_key(), preset))
            .collect();
        let json = serde_json::to_string(&stored)?;
        store
            .set(keys::TEMPERATURE_SETTINGS, &json)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()).into())
    }
}
