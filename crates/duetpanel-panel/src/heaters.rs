//! Heater grouping, labels, and glow classification

use duetpanel_core::{HeaterReading, HeaterState, MachineStatus};
use serde::Serialize;

/// Number of extruder heaters: top, middle, bottom, nozzle
pub const EXTRUDER_HEATERS: usize = 4;
/// Maximum number of bed heaters
pub const BED_HEATERS: usize = 4;
/// Position of the nozzle within the extruder group
pub const NOZZLE_POSITION: usize = 3;
/// Above this a heater is considered warm to the touch
pub const WARM_THRESHOLD: f64 = 50.0;
/// Readings at or above this come from a disconnected sensor
pub const SENSOR_CEILING: f64 = 2000.0;

/// Configured heaters split into the extruder and bed groups
#[derive(Debug, Clone, PartialEq)]
pub struct HeaterGroups<'a> {
    /// First four configured heaters
    pub extruder: Vec<&'a HeaterReading>,
    /// Following configured heaters, at most four
    pub bed: Vec<&'a HeaterReading>,
}

/// Partition the configured heaters, preserving index order
pub fn partition_heaters(status: &MachineStatus) -> HeaterGroups<'_> {
    let configured = status.configured_heaters();
    let extruder_len = configured.len().min(EXTRUDER_HEATERS);
    let extruder = configured[..extruder_len].to_vec();
    let bed = configured[extruder_len..]
        .iter()
        .take(BED_HEATERS)
        .copied()
        .collect();
    HeaterGroups { extruder, bed }
}

/// Temperature label with the `°C` suffix
///
/// Unplugged thermistors read absolute zero; those display as `0°C`.
pub fn format_temperature(value: f64) -> String {
    if value.round() == -273.0 {
        "0°C".to_string()
    } else {
        format!("{}°C", value)
    }
}

/// Display data for one heater
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaterTile {
    /// Controller heater index
    pub index: usize,
    /// Measured temperature label
    pub current: String,
    /// Active setpoint label
    pub active: String,
    /// Standby setpoint label
    pub standby: String,
    /// Raw state
    pub state: HeaterState,
    /// State label, `PREHEAT` for standby
    pub state_label: String,
    /// Render in red
    pub faulted: bool,
}

impl HeaterTile {
    /// Build the tile for a reading
    pub fn from_reading(reading: &HeaterReading) -> Self {
        Self {
            index: reading.index,
            current: format_temperature(reading.current),
            active: format_temperature(reading.active),
            standby: format_temperature(reading.standby),
            state: reading.state,
            state_label: reading.display_label(),
            faulted: reading.state == HeaterState::Fault,
        }
    }
}

/// Background glow for a heater group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Glow {
    /// Nothing running, nothing warm
    Cold,
    /// Nothing running but at least one zone above 50°C
    Warm,
    /// At least one heater holding a setpoint or tuning
    Running,
}

impl Glow {
    /// Whether the hot-surface warning icon is shown
    pub fn hot_warning(&self) -> bool {
        !matches!(self, Glow::Cold)
    }
}

/// Classify the glow of a heater group
pub fn classify_glow(heaters: &[&HeaterReading]) -> Glow {
    if heaters.iter().any(|h| h.state.is_running()) {
        Glow::Running
    } else if heaters
        .iter()
        .any(|h| h.current > WARM_THRESHOLD && h.current < SENSOR_CEILING)
    {
        Glow::Warm
    } else {
        Glow::Cold
    }
}

/// Display data for a heater group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaterGroupView {
    /// Tiles in heater index order
    pub tiles: Vec<HeaterTile>,
    /// Group glow
    pub glow: Glow,
    /// Hot-surface warning icon
    pub hot_warning: bool,
}

impl HeaterGroupView {
    /// Build the view for a group
    pub fn from_heaters(heaters: &[&HeaterReading]) -> Self {
        let glow = classify_glow(heaters);
        Self {
            tiles: heaters.iter().map(|h| HeaterTile::from_reading(h)).collect(),
            glow,
            hot_warning: glow.hot_warning(),
        }
    }
}

/// Tool-head state label from the extruder heater states
///
/// Fault beats Active beats Standby. When every heater is off the label is
/// `OFF`; anything else (a tuning heater, say) shows the nozzle's own state.
pub fn aggregate_extruder_state(states: &[HeaterState]) -> String {
    let any = |wanted: HeaterState| states.iter().any(|s| *s == wanted);

    if any(HeaterState::Fault) {
        "FAULT".to_string()
    } else if any(HeaterState::Active) {
        "ACTIVE".to_string()
    } else if any(HeaterState::Standby) {
        "STANDBY".to_string()
    } else if states.iter().all(|s| *s == HeaterState::Off) {
        "OFF".to_string()
    } else {
        states
            .get(NOZZLE_POSITION)
            .or(states.last())
            .map(|s| s.as_str().to_uppercase())
            .unwrap_or_else(|| "OFF".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HeaterState::*;

    fn reading(index: usize, current: f64, state: HeaterState) -> HeaterReading {
        HeaterReading {
            index,
            current,
            active: 0.0,
            standby: 0.0,
            state,
            state_text: state.as_str().to_string(),
        }
    }

    #[test]
    fn test_priority_law() {
        assert_eq!(aggregate_extruder_state(&[Fault, Off, Off, Off]), "FAULT");
        assert_eq!(aggregate_extruder_state(&[Off, Off, Off, Active]), "ACTIVE");
        assert_eq!(aggregate_extruder_state(&[Off, Off, Off, Off]), "OFF");
        assert_eq!(aggregate_extruder_state(&[Off, Off, Off, Standby]), "STANDBY");
        assert_eq!(aggregate_extruder_state(&[Active, Fault, Standby, Tuning]), "FAULT");
        assert_eq!(aggregate_extruder_state(&[Tuning, Off, Off, Off]), "OFF");
        assert_eq!(aggregate_extruder_state(&[Off, Off, Off, Tuning]), "TUNING");
    }

    #[test]
    fn test_glow_law() {
        let temps = |t: [f64; 4], state: HeaterState| -> Vec<HeaterReading> {
            t.iter()
                .enumerate()
                .map(|(i, c)| reading(i, *c, state))
                .collect()
        };

        let cold = temps([30.0, 20.0, 10.0, 5.0], Off);
        assert_eq!(classify_glow(&cold.iter().collect::<Vec<_>>()), Glow::Cold);

        let warm = temps([60.0, 20.0, 10.0, 5.0], Off);
        assert_eq!(classify_glow(&warm.iter().collect::<Vec<_>>()), Glow::Warm);

        let mut running = temps([20.0, 20.0, 20.0, 20.0], Off);
        running[2].state = Active;
        assert_eq!(
            classify_glow(&running.iter().collect::<Vec<_>>()),
            Glow::Running
        );
    }

    #[test]
    fn test_disconnected_sensor_is_not_warm() {
        let heaters = [reading(0, 2000.0, Off), reading(1, 50.0, Off)];
        assert_eq!(classify_glow(&heaters.iter().collect::<Vec<_>>()), Glow::Cold);
    }

    #[test]
    fn test_temperature_labels() {
        assert_eq!(format_temperature(25.3), "25.3°C");
        assert_eq!(format_temperature(200.0), "200°C");
        assert_eq!(format_temperature(-273.1), "0°C");
    }

    #[test]
    fn test_tile_labels() {
        let tile = HeaterTile::from_reading(&reading(1, 150.0, Standby));
        assert_eq!(tile.state_label, "PREHEAT");
        assert!(!tile.faulted);
        assert!(HeaterTile::from_reading(&reading(1, 20.0, Fault)).faulted);
    }

    #[test]
    fn test_unrecognized_state_is_shown_verbatim() {
        let mut offline = reading(3, 21.0, Unknown);
        offline.state_text = "offline".to_string();
        assert_eq!(HeaterTile::from_reading(&offline).state_label, "OFFLINE");
        assert_eq!(
            classify_glow(&[&reading(0, 20.0, Off), &offline]),
            Glow::Cold
        );
        assert_eq!(aggregate_extruder_state(&[Off, Off, Off, Unknown]), "UNKNOWN");
        assert_eq!(aggregate_extruder_state(&[Off, Unknown, Off, Active]), "ACTIVE");
    }
}
