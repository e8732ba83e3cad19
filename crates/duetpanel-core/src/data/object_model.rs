//! Controller object model decoding
//!
//! The status endpoint returns the full Duet object model. Only the subset
//! the panel consumes is decoded here; unknown fields are ignored. The wire
//! structs stay private and are converted into an immutable
//! [`MachineStatus`] in one step, so a payload either decodes completely or
//! not at all.

use super::{
    FanReading, GlobalFlags, HeaterReading, HeaterState, Slot, SpindleReading, SystemInfo,
    ToolState,
};
use crate::error::StatusError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawObjectModel {
    heat: Option<RawHeat>,
    spindles: Option<Vec<Option<RawSpindle>>>,
    #[serde(default)]
    fans: Vec<Option<RawFan>>,
    #[serde(default)]
    global: RawGlobal,
    sbc: Option<RawSbc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeat {
    heaters: Option<Vec<Slot<RawHeater>>>,
    #[serde(default)]
    bed_heaters: Vec<Slot<u32>>,
    #[serde(default)]
    chamber_heaters: Vec<Slot<u32>>,
}

#[derive(Debug, Deserialize)]
struct RawHeater {
    current: f64,
    active: f64,
    standby: f64,
    state: String,
}

#[derive(Debug, Deserialize)]
struct RawSpindle {
    current: f64,
    state: String,
}

#[derive(Debug, Deserialize)]
struct RawFan {
    #[serde(default = "no_tach")]
    rpm: i64,
}

fn no_tach() -> i64 {
    -1
}

#[derive(Debug, Default, Deserialize)]
struct RawGlobal {
    #[serde(rename = "EstopFault", default)]
    estop_fault: bool,
    #[serde(rename = "ExtruderFault", default)]
    extruder_fault: bool,
    #[serde(rename = "CNCFault", default)]
    cnc_fault: bool,
    #[serde(rename = "toolState", default)]
    tool_state: Option<String>,
    #[serde(rename = "materialSensorLEFT", default)]
    material_sensor_left: Value,
    #[serde(rename = "materialSensorRIGHT", default)]
    material_sensor_right: Value,
}

#[derive(Debug, Deserialize)]
struct RawSbc {
    uptime: Option<f64>,
    dsf: Option<RawDsf>,
}

#[derive(Debug, Deserialize)]
struct RawDsf {
    version: Option<String>,
}

/// Immutable snapshot of the controller, rebuilt on every successful poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineStatus {
    /// `heat.heaters`, sentinel slots preserved
    pub heaters: Vec<Slot<HeaterReading>>,
    /// `heat.bedHeaters` heater numbers
    pub bed_heaters: Vec<Slot<u32>>,
    /// `heat.chamberHeaters` heater numbers
    pub chamber_heaters: Vec<Slot<u32>>,
    /// Spindle 0
    pub spindle: SpindleReading,
    /// Fan tach readings, `-1` for absent fans
    pub fans: Vec<FanReading>,
    /// Machine-level flags
    pub flags: GlobalFlags,
    /// SBC information
    pub system: SystemInfo,
}

impl MachineStatus {
    /// Decode a status payload
    pub fn from_json(value: Value) -> Result<Self, StatusError> {
        let raw: RawObjectModel =
            serde_json::from_value(value).map_err(|e| StatusError::Malformed {
                reason: e.to_string(),
            })?;

        let heat = raw.heat.ok_or_else(|| missing("heat"))?;
        let heaters = heat
            .heaters
            .ok_or_else(|| missing("heat.heaters"))?
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Slot::Configured(h) => Slot::Configured(HeaterReading {
                    index,
                    current: h.current,
                    active: h.active,
                    standby: h.standby,
                    state: HeaterState::from_wire(&h.state),
                    state_text: h.state,
                }),
                Slot::Unconfigured => Slot::Unconfigured,
            })
            .collect();

        let spindle = raw
            .spindles
            .and_then(|spindles| spindles.into_iter().next().flatten())
            .ok_or_else(|| missing("spindles[0]"))?;

        let sbc = raw.sbc.ok_or_else(|| missing("sbc"))?;
        let uptime_seconds = sbc.uptime.ok_or_else(|| missing("sbc.uptime"))?;
        let firmware_version = sbc
            .dsf
            .and_then(|dsf| dsf.version)
            .ok_or_else(|| missing("sbc.dsf.version"))?;

        let global = raw.global;
        Ok(Self {
            heaters,
            bed_heaters: heat.bed_heaters,
            chamber_heaters: heat.chamber_heaters,
            spindle: SpindleReading {
                current_rpm: spindle.current,
                state: spindle.state,
            },
            fans: raw
                .fans
                .into_iter()
                .map(|fan| FanReading {
                    rpm: fan.map_or(-1, |f| f.rpm),
                })
                .collect(),
            flags: GlobalFlags {
                estop_fault: global.estop_fault,
                extruder_fault: global.extruder_fault,
                cnc_fault: global.cnc_fault,
                tool_state: ToolState::from_wire(global.tool_state.as_deref()),
                tool_name: global.tool_state,
                material_sensor_left: value_text(&global.material_sensor_left),
                material_sensor_right: value_text(&global.material_sensor_right),
            },
            system: SystemInfo {
                uptime_seconds,
                firmware_version,
            },
        })
    }

    /// Configured heaters in index order
    pub fn configured_heaters(&self) -> Vec<&HeaterReading> {
        super::find_heaters(&self.heaters)
            .into_iter()
            .map(|(_, heater)| heater)
            .collect()
    }

    /// Number of configured bed heaters
    pub fn configured_bed_count(&self) -> usize {
        super::find_heaters(&self.bed_heaters).len()
    }
}

fn missing(field: &str) -> StatusError {
    StatusError::MissingField {
        field: field.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
