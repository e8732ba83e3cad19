//! Overshoot fan controller
//!
//! The top, middle and bottom barrel zones each have a cooling fan on the
//! output one above the heater index. When a zone runs hotter than its
//! setpoint the fan speed follows a stepped band table; a zone that is off
//! but still hot keeps its fan at full speed until it cools below 50°C.

use crate::heaters::{EXTRUDER_HEATERS, WARM_THRESHOLD};
use crate::reconciler::SharedStatus;
use async_trait::async_trait;
use duetpanel_communication::{CommandDispatcher, PanelCommand};
use duetpanel_core::{HeaterReading, HeaterState, MachineStatus, PeriodicTask, TaskHandle};
use std::time::Duration;

/// Overshoot thresholds in °C
pub const OVERSHOOT_BANDS: [f64; 6] = [1.0, 4.0, 7.0, 9.0, 12.0, 15.0];
/// Fan speed for each band
pub const BAND_SPEEDS: [f64; 6] = [0.0, 0.78, 0.91, 0.977, 0.9782, 1.0];

/// Fan speed for a positive overshoot
pub fn band_speed(overshoot: f64) -> f64 {
    if overshoot <= OVERSHOOT_BANDS[0] {
        return BAND_SPEEDS[1];
    }
    OVERSHOOT_BANDS
        .windows(2)
        .position(|band| overshoot > band[0] && overshoot <= band[1])
        .map(|j| BAND_SPEEDS[j + 1])
        .unwrap_or(1.0)
}

/// Fan command for one barrel zone
pub fn fan_command(heater: &HeaterReading) -> PanelCommand {
    let fan = heater.index + 1;
    let overshoot = heater.current - heater.active;
    let hot = heater.current > WARM_THRESHOLD;

    let speed = if heater.state == HeaterState::Off {
        if hot {
            1.0
        } else {
            0.0
        }
    } else if overshoot > 0.0 && hot {
        band_speed(overshoot)
    } else {
        0.0
    };

    PanelCommand::FanSpeed { fan, speed }
}

/// Fan commands for the barrel zones of a snapshot, nozzle excluded
pub fn plan_fan_commands(status: &MachineStatus) -> Vec<PanelCommand> {
    status
        .configured_heaters()
        .into_iter()
        .take(EXTRUDER_HEATERS - 1)
        .map(fan_command)
        .collect()
}

/// Periodic task driving the barrel zone fans from the latest snapshot
pub struct OvershootFanController {
    status: SharedStatus,
    dispatcher: CommandDispatcher,
    interval: Duration,
}

impl OvershootFanController {
    /// Create a controller reading snapshots published by the reconciler
    pub fn new(status: SharedStatus, dispatcher: CommandDispatcher, interval: Duration) -> Self {
        Self {
            status,
            dispatcher,
            interval,
        }
    }

    /// Spawn the controller
    pub fn start(self) -> TaskHandle {
        let interval = self.interval;
        TaskHandle::spawn(self, interval)
    }
}

#[async_trait]
impl PeriodicTask for OvershootFanController {
    fn name(&self) -> &'static str {
        "overshoot-fans"
    }

    async fn run_cycle(&mut self) {
        let commands = {
            let status = self.status.read();
            match status.as_ref() {
                Some(status) => plan_fan_commands(status),
                // nothing to do until the first snapshot arrives
                None => return,
            }
        };

        for command in commands {
            let gcode = command.to_string();
            if let Err(e) = self.dispatcher.send(&gcode).await {
                tracing::error!("Failed to set fan speed '{}': {}", gcode, e);
            }
        }
    }
}
