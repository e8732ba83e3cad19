//! Data models for the controller object model
//!
//! This module provides:
//! - Heater slots with the `-1` "not configured" sentinel
//! - Heater, spindle, fan, and global flag readings
//! - Tool identity reported by the smart loom
//! - The immutable [`MachineStatus`] snapshot decoded from each poll

pub mod object_model;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use object_model::MachineStatus;

/// Value the controller uses for an unconfigured heater slot.
pub const UNCONFIGURED_SENTINEL: i64 = -1;

/// A slot in a controller heater array
///
/// The controller reports fixed-size arrays where unconfigured entries hold
/// the sentinel `-1`. Anything else is decoded as `T`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Slot<T> {
    /// A configured entry
    Configured(T),
    /// The `-1` sentinel
    Unconfigured,
}

impl<T> Slot<T> {
    /// Get the configured value, if any
    pub fn configured(&self) -> Option<&T> {
        match self {
            Slot::Configured(value) => Some(value),
            Slot::Unconfigured => None,
        }
    }

    /// Check if this slot holds the sentinel
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Slot::Unconfigured)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Slot<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.as_i64() == Some(UNCONFIGURED_SENTINEL) {
            return Ok(Slot::Unconfigured);
        }
        T::deserialize(value)
            .map(Slot::Configured)
            .map_err(serde::de::Error::custom)
    }
}

/// Find configured entries in a heater array
///
/// Excludes exactly the sentinel slots and returns the rest paired with
/// their original index, in order.
pub fn find_heaters<T>(slots: &[Slot<T>]) -> Vec<(usize, &T)> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.configured().map(|value| (index, value)))
        .collect()
}

/// Heater state as reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaterState {
    /// Heater is off
    Off,
    /// Heater holds its standby (preheat) setpoint
    Standby,
    /// Heater holds its active setpoint
    Active,
    /// Heater is running a PID auto-tune
    Tuning,
    /// Heater has a temperature fault
    Fault,
    /// Any other state string, such as `offline` for a heater on a
    /// disconnected expansion board
    #[serde(other)]
    Unknown,
}

impl HeaterState {
    /// Wire representation used by the controller
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Standby => "standby",
            Self::Active => "active",
            Self::Tuning => "tuning",
            Self::Fault => "fault",
            Self::Unknown => "unknown",
        }
    }

    /// Classify a controller state string
    pub fn from_wire(value: &str) -> Self {
        match value {
            "off" => Self::Off,
            "standby" => Self::Standby,
            "active" => Self::Active,
            "tuning" => Self::Tuning,
            "fault" => Self::Fault,
            _ => Self::Unknown,
        }
    }

    /// Label shown on a heater tile. Standby is presented as preheat.
    pub fn display_label(&self) -> String {
        match self {
            Self::Standby => "PREHEAT".to_string(),
            other => other.as_str().to_uppercase(),
        }
    }

    /// Whether the heater is driving towards a setpoint
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Active | Self::Standby | Self::Tuning)
    }
}

impl fmt::Display for HeaterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured heater
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaterReading {
    /// Index in the controller heater array
    pub index: usize,
    /// Measured temperature in °C
    pub current: f64,
    /// Active setpoint in °C
    pub active: f64,
    /// Standby setpoint in °C
    pub standby: f64,
    /// Heater state
    pub state: HeaterState,
    /// State string as reported
    pub state_text: String,
}

impl HeaterReading {
    /// Tile label: `PREHEAT` for standby, otherwise the reported state
    /// uppercased
    pub fn display_label(&self) -> String {
        match self.state {
            HeaterState::Unknown => self.state_text.to_uppercase(),
            state => state.display_label(),
        }
    }
}

/// Spindle 0 reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpindleReading {
    /// Current speed in RPM
    pub current_rpm: f64,
    /// Controller state string (`stopped`, `forward`, `reverse`)
    pub state: String,
}

/// Fan tachometer reading. `-1` means no tach is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FanReading {
    /// Measured fan speed
    pub rpm: i64,
}

/// Tool detected on the smart loom connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ToolState {
    /// PE320 pellet extruder
    Pe320,
    /// CNC mill spindle
    Cnc,
    /// Loom connected, nothing attached
    NoTool,
    /// Smart loom open circuit
    OpenCircuit,
    /// Smart loom short circuit
    ShortCircuit,
    /// Anything else, including a missing value
    Disconnected,
}

impl ToolState {
    /// Classify the controller's `global.toolState` value
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("PE320") => Self::Pe320,
            Some("CNC") => Self::Cnc,
            Some("No Tool") => Self::NoTool,
            Some("Open Circuit") => Self::OpenCircuit,
            Some("Short Circuit") => Self::ShortCircuit,
            _ => Self::Disconnected,
        }
    }

    /// Wire representation, `None` for [`ToolState::Disconnected`]
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            Self::Pe320 => Some("PE320"),
            Self::Cnc => Some("CNC"),
            Self::NoTool => Some("No Tool"),
            Self::OpenCircuit => Some("Open Circuit"),
            Self::ShortCircuit => Some("Short Circuit"),
            Self::Disconnected => None,
        }
    }
}

impl fmt::Display for ToolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pe320 => write!(f, "PE320 Pellet Extruder Connected"),
            Self::Cnc => write!(f, "CNC Mill Connected"),
            Self::NoTool => write!(f, "No Tool Connected"),
            Self::OpenCircuit => write!(f, "Smart Loom Open Circuit"),
            Self::ShortCircuit => write!(f, "Smart Loom Short Circuit"),
            Self::Disconnected => write!(f, "Duet Disconnected"),
        }
    }
}

/// Machine-level flags published by the controller macros
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalFlags {
    /// Emergency stop circuit is open
    pub estop_fault: bool,
    /// Extruder servo drive fault
    pub extruder_fault: bool,
    /// Spindle motor drive fault
    pub cnc_fault: bool,
    /// Classified tool identity
    pub tool_state: ToolState,
    /// Raw tool name as reported (`None` when null or absent)
    pub tool_name: Option<String>,
    /// Left material sensor, rendered as text
    pub material_sensor_left: String,
    /// Right material sensor, rendered as text
    pub material_sensor_right: String,
}

/// Single-board computer information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInfo {
    /// Seconds since the SBC booted
    pub uptime_seconds: f64,
    /// Duet Software Framework version
    pub firmware_version: String,
}

impl SystemInfo {
    /// Uptime formatted as `hh:mm:ss`
    pub fn formatted_uptime(&self) -> String {
        let uptime = self.uptime_seconds.max(0.0);
        let hours = (uptime / 3600.0).floor() as u64;
        let minutes = ((uptime % 3600.0) / 60.0).floor() as u64;
        let seconds = (uptime % 60.0).round() as u64;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_sentinel_decoding() {
        let slots: Vec<Slot<u32>> = serde_json::from_str("[0, -1, 2, -1]").unwrap();
        assert_eq!(
            slots,
            vec![
                Slot::Configured(0),
                Slot::Unconfigured,
                Slot::Configured(2),
                Slot::Unconfigured
            ]
        );
    }

    #[test]
    fn test_find_heaters_keeps_indices() {
        let slots = vec![Slot::Unconfigured, Slot::Configured(7u32), Slot::Configured(9)];
        assert_eq!(find_heaters(&slots), vec![(1, &7), (2, &9)]);
    }

    #[test]
    fn test_heater_display_label() {
        assert_eq!(HeaterState::Standby.display_label(), "PREHEAT");
        assert_eq!(HeaterState::Active.display_label(), "ACTIVE");
        assert_eq!(HeaterState::Fault.display_label(), "FAULT");
    }

    #[test]
    fn test_tool_state_from_wire() {
        assert_eq!(ToolState::from_wire(Some("PE320")), ToolState::Pe320);
        assert_eq!(ToolState::from_wire(Some("No Tool")), ToolState::NoTool);
        assert_eq!(ToolState::from_wire(Some("garbage")), ToolState::Disconnected);
        assert_eq!(ToolState::from_wire(None), ToolState::Disconnected);
    }

    #[test]
    fn test_formatted_uptime() {
        let info = SystemInfo {
            uptime_seconds: 3725.4,
            firmware_version: "3.5.1".into(),
        };
        assert_eq!(info.formatted_uptime(), "01:02:05");
    }
}
