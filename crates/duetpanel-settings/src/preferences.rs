//! File-backed operator preferences
//!
//! Preferences live in a flat JSON object of string values. Every write goes
//! straight to disk so the file survives a power cut mid-session.

use crate::error::{PersistenceError, SettingsResult};
use duetpanel_core::preferences::{OFF, ON};
use duetpanel_core::PreferenceStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Preference store persisted as a JSON file
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFilePreferences {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(
            "Opened preferences at {} ({} keys)",
            path.display(),
            values.len()
        );
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> duetpanel_core::Result<()> {
        let mut values = self.values.write();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)
            .map_err(|e| duetpanel_core::Error::other(e.to_string()))?;
        *values = updated;
        Ok(())
    }
}

/// Write an `on`/`off` toggle
pub fn set_toggle(store: &dyn PreferenceStore, key: &str, on: bool) -> SettingsResult<()> {
    store
        .set(key, if on { ON } else { OFF })
        .map_err(|e| PersistenceError::WriteFailed(e.to_string()).into())
}
