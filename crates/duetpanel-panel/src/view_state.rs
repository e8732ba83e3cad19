//! Derived view state
//!
//! [`derive_view`] is a pure function of the machine snapshot and the
//! operator context. Side effects (prompts, commands) are planned by the
//! reconciler from the same inputs.

use crate::heaters::{aggregate_extruder_state, partition_heaters, HeaterGroupView};
use crate::spindle::SpindleRequest;
use crate::tool_state::{tool_affordance, ToolAffordance, ToolContext};
use duetpanel_core::{find_heaters, HeaterState, MachineStatus, SystemFamily, ToolState};
use serde::Serialize;

/// Banner text for an extruder servo fault
pub const EXTRUDER_FAULT_TEXT: &str = "Extruder Servo Fault";
/// Banner text for a spindle motor fault
pub const CNC_FAULT_TEXT: &str = "Spindle Motor Fault";

/// Operator-side inputs to a derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeriveContext {
    /// Spindle input at the start of the cycle
    pub spindle: SpindleRequest,
    /// `toolDetectionState` preference is `on`
    pub tool_detection_enabled: bool,
    /// Configured product family
    pub system_family: SystemFamily,
}

/// Machine-level fault presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultView {
    /// Blocking e-stop modal
    pub estop_modal: bool,
    /// Flashing fault banner
    pub banner_visible: bool,
    /// Extruder line of the banner
    pub extruder_fault: Option<&'static str>,
    /// Spindle line of the banner
    pub cnc_fault: Option<&'static str>,
    /// Heater indices currently in fault
    pub faulted_heaters: Vec<usize>,
}

/// Spindle presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpindleView {
    /// Running glow and warning icon
    pub running: bool,
    /// Controller spindle state, uppercased
    pub state_label: String,
    /// Measured speed
    pub current_rpm: f64,
    /// Slider speed
    pub requested_rpm: u32,
    /// Slider locked
    pub locked: bool,
}

/// System information panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemView {
    /// Product family
    pub product_family: SystemFamily,
    /// SBC uptime `hh:mm:ss`
    pub uptime: String,
    /// DSF version
    pub firmware_version: String,
    /// Configured bed heaters
    pub bed_count: usize,
    /// Raw tool name, `null` when none is reported
    pub connected_tool: String,
    /// Left material sensor
    pub material_sensor_left: String,
    /// Right material sensor
    pub material_sensor_right: String,
    /// Fan tach readings in fan order
    pub fan_rpms: Vec<i64>,
}

/// Everything the render sink needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedViewState {
    /// Extruder heaters
    pub extruder: HeaterGroupView,
    /// Bed heaters
    pub bed: HeaterGroupView,
    /// Tool-head state label
    pub extruder_state: String,
    /// Detected tool
    pub tool_state: ToolState,
    /// Affordances for the detected tool
    pub tool: ToolAffordance,
    /// Spindle
    pub spindle: SpindleView,
    /// Machine faults
    pub faults: FaultView,
    /// System information
    pub system: SystemView,
}

/// Derive the view for a snapshot
pub fn derive_view(status: &MachineStatus, ctx: &DeriveContext) -> DerivedViewState {
    let groups = partition_heaters(status);
    let extruder_states: Vec<HeaterState> = groups.extruder.iter().map(|h| h.state).collect();
    let flags = &status.flags;

    let tool = tool_affordance(
        flags.tool_state,
        &ToolContext {
            spindle_running: ctx.spindle.running,
            estop_fault: flags.estop_fault,
            cnc_fault: flags.cnc_fault,
            tool_detection_enabled: ctx.tool_detection_enabled,
        },
    );

    let spindle_forced_off = flags.cnc_fault || tool.reset_spindle;
    let spindle = SpindleView {
        running: ctx.spindle.running && !flags.estop_fault && !spindle_forced_off,
        state_label: status.spindle.state.to_uppercase(),
        current_rpm: status.spindle.current_rpm,
        requested_rpm: ctx.spindle.speed_rpm,
        locked: !ctx.spindle.unlocked || spindle_forced_off,
    };

    let faults = FaultView {
        estop_modal: flags.estop_fault,
        banner_visible: flags.extruder_fault || flags.cnc_fault,
        extruder_fault: flags.extruder_fault.then_some(EXTRUDER_FAULT_TEXT),
        cnc_fault: flags.cnc_fault.then_some(CNC_FAULT_TEXT),
        faulted_heaters: find_heaters(&status.heaters)
            .into_iter()
            .filter(|(_, h)| h.state == HeaterState::Fault)
            .map(|(index, _)| index)
            .collect(),
    };

    let system = SystemView {
        product_family: ctx.system_family,
        uptime: status.system.formatted_uptime(),
        firmware_version: status.system.firmware_version.clone(),
        bed_count: status.configured_bed_count(),
        connected_tool: flags.tool_name.clone().unwrap_or_else(|| "null".to_string()),
        material_sensor_left: flags.material_sensor_left.clone(),
        material_sensor_right: flags.material_sensor_right.clone(),
        fan_rpms: status.fans.iter().map(|f| f.rpm).collect(),
    };

    DerivedViewState {
        extruder: HeaterGroupView::from_heaters(&groups.extruder),
        bed: HeaterGroupView::from_heaters(&groups.bed),
        extruder_state: aggregate_extruder_state(&extruder_states),
        tool_state: flags.tool_state,
        tool,
        spindle,
        faults,
        system,
    }
}
