//! Duet G-code command creator
//!
//! Typed builders for every G-code string the panel sends. Temperatures and
//! fan speeds are formatted without a trailing `.0` so `200.0` renders as
//! `S200`, which is what RepRapFirmware expects from the panel.

use duetpanel_core::HeaterState;
use std::fmt;

/// Macro run when part cooling is switched on
pub const PART_COOLING_ON_MACRO: &str = "Part cooling on.g";
/// Macro run when part cooling is switched off
pub const PART_COOLING_OFF_MACRO: &str = "Part cooling off.g";
/// Macro run when the bed fixture plate PID is switched on
pub const BED_FIXTURE_PLATE_ON_MACRO: &str = "Bed_PID_fixture_plate_on.g";
/// Macro run when the bed fixture plate PID is switched off
pub const BED_FIXTURE_PLATE_OFF_MACRO: &str = "Bed_PID_fixture_plate_off.g";
/// Macro that pushes pellets through the feed
pub const PELLET_BOOST_MACRO: &str = "Pellet boost.g";

/// Fan speeds restored when leaving the settings screen
const FAN_OVERRIDE_RESTORE: &str = "M106 P0 S1 M106 P4 S0.5 M106 P5 S0.5 M106 P6 S0.5";

/// Heater mode as understood by `M568 A`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterMode {
    /// A0
    Off,
    /// A1, hold at the standby (preheat) temperature
    Standby,
    /// A2, hold at the active temperature
    Active,
}

impl HeaterMode {
    /// Numeric mode for the `A` parameter
    pub fn code(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Standby => 1,
            Self::Active => 2,
        }
    }
}

/// Operator-entered temperatures for one heater
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaterSetpoint {
    /// Active temperature
    pub active: f64,
    /// Preheat (standby) temperature
    pub preheat: f64,
}

/// Manually controlled fan groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanGroup {
    /// Heatsink fan
    Heatsink,
    /// Barrel fan
    Barrel,
}

/// Manual fan levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanLevel {
    /// Stopped
    Off,
    /// Half speed; the exact duty cycle depends on the fan group
    Half,
    /// Full speed
    Full,
}

impl FanGroup {
    /// PWM duty cycle for `level`
    pub fn speed(&self, level: FanLevel) -> f64 {
        match (self, level) {
            (_, FanLevel::Off) => 0.0,
            (_, FanLevel::Full) => 1.0,
            (Self::Heatsink, FanLevel::Half) => 0.54,
            (Self::Barrel, FanLevel::Half) => 0.75,
        }
    }
}

/// A single G-code command
#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    /// `M568 P<i> A0`
    HeaterOff { heater: usize },
    /// `M568 P<i> R<t> A1`
    HeaterPreheat { heater: usize, temperature: f64 },
    /// `M568 P<i> S<t> A2`
    HeaterActive { heater: usize, temperature: f64 },
    /// `M568 P<i> R<t>`, standby temperature without a mode change
    SetPreheatTemperature { heater: usize, temperature: f64 },
    /// `M568 P<i> S<a> R<p> A<m>`
    ConfigureHeater {
        heater: usize,
        setpoint: HeaterSetpoint,
        mode: HeaterMode,
    },
    /// `M292 M562 P<i>`, dismiss the fault message and clear the heater fault
    ResetHeaterFault { heater: usize },
    /// `M3 P0 S<rpm>`
    SpindleClockwise { rpm: u32 },
    /// `M5`
    SpindleStop,
    /// `M112`
    EmergencyStop,
    /// `M999`
    ResetMachine,
    /// `M98 P"<file>"`
    RunMacro(String),
    /// `set global.<name> = <value>`
    SetGlobal { name: String, value: bool },
    /// `M106 P<f> S<s>`
    FanSpeed { fan: usize, speed: f64 },
}

impl fmt::Display for PanelCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaterOff { heater } => write!(f, "M568 P{} A0", heater),
            Self::HeaterPreheat {
                heater,
                temperature,
            } => write!(f, "M568 P{} R{} A1", heater, temperature),
            Self::HeaterActive {
                heater,
                temperature,
            } => write!(f, "M568 P{} S{} A2", heater, temperature),
            Self::SetPreheatTemperature {
                heater,
                temperature,
            } => write!(f, "M568 P{} R{}", heater, temperature),
            Self::ConfigureHeater {
                heater,
                setpoint,
                mode,
            } => write!(
                f,
                "M568 P{} S{} R{} A{}",
                heater,
                setpoint.active,
                setpoint.preheat,
                mode.code()
            ),
            Self::ResetHeaterFault { heater } => write!(f, "M292 M562 P{}", heater),
            Self::SpindleClockwise { rpm } => write!(f, "M3 P0 S{}", rpm),
            Self::SpindleStop => write!(f, "M5"),
            Self::EmergencyStop => write!(f, "M112"),
            Self::ResetMachine => write!(f, "M999"),
            Self::RunMacro(file) => write!(f, "M98 P\"{}\"", file),
            Self::SetGlobal { name, value } => write!(f, "set global.{} = {}", name, value),
            Self::FanSpeed { fan, speed } => write!(f, "M106 P{} S{}", fan, speed),
        }
    }
}

impl From<PanelCommand> for String {
    fn from(command: PanelCommand) -> Self {
        command.to_string()
    }
}

/// Join several commands into one submission, space separated
pub fn join_commands(commands: &[PanelCommand]) -> String {
    commands
        .iter()
        .map(PanelCommand::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds panel command sequences
///
/// Bed heaters are addressed after the extruder heaters, so the creator is
/// told how many extruder heaters the machine has.
#[derive(Debug, Clone, Copy)]
pub struct CommandCreator {
    extruder_count: usize,
}

impl Default for CommandCreator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CommandCreator {
    /// Create a creator for a machine with `extruder_count` extruder heaters
    pub fn new(extruder_count: usize) -> Self {
        Self { extruder_count }
    }

    /// Number of extruder heaters preceding the bed heaters
    pub fn extruder_count(&self) -> usize {
        self.extruder_count
    }

    /// Next command when the operator taps a heater's state button
    ///
    /// Off goes to preheat, preheat to active, active back to off. Faulted,
    /// tuning and unrecognized heaters have no toggle; faults are reset
    /// through the prompt.
    pub fn toggle_heater(
        &self,
        heater: usize,
        state: HeaterState,
        setpoint: HeaterSetpoint,
    ) -> Option<PanelCommand> {
        match state {
            HeaterState::Off => Some(PanelCommand::HeaterPreheat {
                heater,
                temperature: setpoint.preheat,
            }),
            HeaterState::Standby => Some(PanelCommand::HeaterActive {
                heater,
                temperature: setpoint.active,
            }),
            HeaterState::Active => Some(PanelCommand::HeaterOff { heater }),
            HeaterState::Fault | HeaterState::Tuning | HeaterState::Unknown => None,
        }
    }

    /// Set every extruder heater to `mode` with its own setpoints
    pub fn configure_extruders(&self, setpoints: &[HeaterSetpoint], mode: HeaterMode) -> String {
        Self::configure_range(0, setpoints, mode)
    }

    /// Set every bed heater to `mode`, indices offset past the extruders
    pub fn configure_beds(&self, setpoints: &[HeaterSetpoint], mode: HeaterMode) -> String {
        Self::configure_range(self.extruder_count, setpoints, mode)
    }

    fn configure_range(first: usize, setpoints: &[HeaterSetpoint], mode: HeaterMode) -> String {
        let commands: Vec<PanelCommand> = setpoints
            .iter()
            .enumerate()
            .map(|(offset, setpoint)| PanelCommand::ConfigureHeater {
                heater: first + offset,
                setpoint: *setpoint,
                mode,
            })
            .collect();
        join_commands(&commands)
    }

    /// Numpad entry for a heater: `active`, `preheat`, or both
    pub fn set_temperature(
        &self,
        heater: usize,
        temperature: f64,
        active: bool,
        preheat: bool,
    ) -> Vec<PanelCommand> {
        let mut commands = Vec::new();
        if active {
            commands.push(PanelCommand::HeaterActive {
                heater,
                temperature,
            });
        }
        if preheat {
            commands.push(PanelCommand::SetPreheatTemperature {
                heater,
                temperature,
            });
        }
        commands
    }

    /// Apply a heating profile: all zones active at the profile temperature
    ///
    /// Returns the extruder submission followed by the bed submission, the
    /// latter only when `bed_count` is non-zero.
    pub fn apply_profile(&self, extruder: [f64; 4], bed: f64, bed_count: usize) -> Vec<String> {
        let extruder_setpoints: Vec<HeaterSetpoint> = extruder
            .iter()
            .map(|&t| HeaterSetpoint {
                active: t,
                preheat: t,
            })
            .collect();
        let mut submissions = vec![Self::configure_range(
            0,
            &extruder_setpoints,
            HeaterMode::Active,
        )];
        if bed_count > 0 {
            let bed_setpoints = vec![
                HeaterSetpoint {
                    active: bed,
                    preheat: bed,
                };
                bed_count
            ];
            submissions.push(self.configure_beds(&bed_setpoints, HeaterMode::Active));
        }
        submissions
    }

    /// Toggle part cooling: global flag first, then the macro
    pub fn part_cooling(&self, on: bool) -> Vec<PanelCommand> {
        Self::flag_with_macro(
            "partCooling",
            on,
            if on {
                PART_COOLING_ON_MACRO
            } else {
                PART_COOLING_OFF_MACRO
            },
        )
    }

    /// Toggle the bed fixture plate PID: global flag first, then the macro
    pub fn bed_fixture_plate(&self, on: bool) -> Vec<PanelCommand> {
        Self::flag_with_macro(
            "bedFixturePlate",
            on,
            if on {
                BED_FIXTURE_PLATE_ON_MACRO
            } else {
                BED_FIXTURE_PLATE_OFF_MACRO
            },
        )
    }

    fn flag_with_macro(name: &str, on: bool, file: &str) -> Vec<PanelCommand> {
        vec![
            PanelCommand::SetGlobal {
                name: name.to_string(),
                value: on,
            },
            PanelCommand::RunMacro(file.to_string()),
        ]
    }

    /// Take manual control of the fans while the settings screen is open
    pub fn enter_fan_override(&self) -> Vec<String> {
        vec![PanelCommand::SetGlobal {
            name: "fanOverride".to_string(),
            value: true,
        }
        .to_string()]
    }

    /// Restore the default fan speeds and hand control back to the firmware
    pub fn exit_fan_override(&self) -> Vec<String> {
        vec![
            FAN_OVERRIDE_RESTORE.to_string(),
            PanelCommand::SetGlobal {
                name: "fanOverride".to_string(),
                value: false,
            }
            .to_string(),
        ]
    }

    /// Manual fan level for a fan group
    pub fn fan_level(&self, fan: usize, group: FanGroup, level: FanLevel) -> PanelCommand {
        PanelCommand::FanSpeed {
            fan,
            speed: group.speed(level),
        }
    }

    /// Push pellets through the feed
    pub fn pellet_boost(&self) -> PanelCommand {
        PanelCommand::RunMacro(PELLET_BOOST_MACRO.to_string())
    }
}
