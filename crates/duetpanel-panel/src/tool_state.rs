//! Tool detection affordances
//!
//! Maps the smart-loom tool identity to everything the panel shows or
//! enables for it. The mapping is pure; the reconciler acts on
//! [`ToolAffordance::reset_spindle`] separately.

use duetpanel_core::ToolState;
use serde::Serialize;

/// Colour of the detection label for the connected tool
pub const CONNECTED_COLOR: &str = "#a74e9e";
/// Colour of the detection label for a loom fault
pub const LOOM_FAULT_COLOR: &str = "red";
/// Start button label when the spindle can be started
pub const START_LABEL: &str = "▶ Start Spindle";
/// Start button label otherwise
pub const NOT_READY_LABEL: &str = "Not Ready";

/// Spindle status light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorLight {
    /// Ready to start
    Green,
    /// Running
    Red,
    /// Not ready
    Yellow,
}

/// Detection label beside a tool panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionLabel {
    /// Whether the label is shown (a warning icon replaces it otherwise)
    pub visible: bool,
    /// Label text
    pub text: String,
    /// Text colour; `None` keeps the default
    pub color: Option<&'static str>,
}

impl DetectionLabel {
    fn connected(connected: bool) -> Self {
        if connected {
            Self {
                visible: true,
                text: "\u{00A0}- Connected".to_string(),
                color: Some(CONNECTED_COLOR),
            }
        } else {
            Self {
                visible: true,
                text: "\u{00A0}- Disconnected".to_string(),
                color: None,
            }
        }
    }

    fn loom_fault(reason: &str) -> Self {
        Self {
            visible: false,
            text: format!("\u{00A0}- Smart Loom {}", reason),
            color: Some(LOOM_FAULT_COLOR),
        }
    }

    fn unknown() -> Self {
        Self {
            visible: false,
            text: "\u{00A0}- null".to_string(),
            color: None,
        }
    }
}

/// Whether a tool panel accepts input and how it is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PanelAccess {
    /// Accepts touches
    pub enabled: bool,
    /// Drawn at reduced opacity
    pub dimmed: bool,
}

impl PanelAccess {
    const ACTIVE: Self = Self {
        enabled: true,
        dimmed: false,
    };
    const INACTIVE: Self = Self {
        enabled: false,
        dimmed: true,
    };
}

/// Inputs the affordance depends on besides the tool itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolContext {
    /// Operator has the spindle running
    pub spindle_running: bool,
    /// E-stop circuit open
    pub estop_fault: bool,
    /// Spindle drive fault
    pub cnc_fault: bool,
    /// `toolDetectionState` preference is `on`
    pub tool_detection_enabled: bool,
}

/// Everything the panel shows or enables for a detected tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolAffordance {
    /// PE320 detection label
    pub pe320_label: DetectionLabel,
    /// CNC detection label
    pub cnc_label: DetectionLabel,
    /// Warning icon on the extruder panel
    pub extruder_warning: bool,
    /// Warning icon on the CNC panel
    pub cnc_warning: bool,
    /// Extruder panel access
    pub extruder_panel: PanelAccess,
    /// CNC panel access
    pub cnc_panel: PanelAccess,
    /// Start and unlock buttons accept touches
    pub spindle_controls_enabled: bool,
    /// Start button label
    pub start_label: &'static str,
    /// Spindle status text
    pub indicator_text: &'static str,
    /// Spindle status light
    pub indicator_light: IndicatorLight,
    /// Stop the spindle and lock its controls
    pub reset_spindle: bool,
}

const NOT_READY_TEXT: &str = "Spindle is Not Ready";

/// Map a tool identity to its affordances
pub fn tool_affordance(tool: ToolState, ctx: &ToolContext) -> ToolAffordance {
    match tool {
        ToolState::Pe320 => ToolAffordance {
            pe320_label: DetectionLabel::connected(true),
            cnc_label: DetectionLabel::connected(false),
            extruder_warning: false,
            cnc_warning: false,
            extruder_panel: PanelAccess::ACTIVE,
            cnc_panel: PanelAccess::INACTIVE,
            ..not_ready()
        },
        ToolState::Cnc => {
            let healthy = !ctx.estop_fault && !ctx.cnc_fault;
            let (indicator_text, indicator_light) = match (healthy, ctx.spindle_running) {
                (true, false) => ("Spindle is Ready", IndicatorLight::Green),
                (true, true) => ("Caution: Spindle is Running", IndicatorLight::Red),
                (false, _) => (NOT_READY_TEXT, IndicatorLight::Yellow),
            };
            ToolAffordance {
                pe320_label: DetectionLabel::connected(false),
                cnc_label: DetectionLabel::connected(true),
                extruder_warning: false,
                cnc_warning: false,
                extruder_panel: PanelAccess::INACTIVE,
                cnc_panel: PanelAccess::ACTIVE,
                spindle_controls_enabled: true,
                start_label: START_LABEL,
                indicator_text,
                indicator_light,
                reset_spindle: !healthy,
            }
        }
        ToolState::NoTool => ToolAffordance {
            pe320_label: DetectionLabel::connected(false),
            cnc_label: DetectionLabel::connected(false),
            extruder_warning: false,
            cnc_warning: false,
            ..not_ready()
        },
        ToolState::OpenCircuit | ToolState::ShortCircuit => {
            let reason = if tool == ToolState::OpenCircuit {
                "Open Circuit"
            } else {
                "Short Circuit"
            };
            ToolAffordance {
                pe320_label: DetectionLabel::loom_fault(reason),
                cnc_label: DetectionLabel::loom_fault(reason),
                ..not_ready()
            }
        }
        ToolState::Disconnected => {
            let access = PanelAccess {
                enabled: false,
                dimmed: ctx.tool_detection_enabled,
            };
            ToolAffordance {
                extruder_panel: access,
                cnc_panel: access,
                ..not_ready()
            }
        }
    }
}

/// Both panels locked, spindle not ready, warnings up
fn not_ready() -> ToolAffordance {
    ToolAffordance {
        pe320_label: DetectionLabel::unknown(),
        cnc_label: DetectionLabel::unknown(),
        extruder_warning: true,
        cnc_warning: true,
        extruder_panel: PanelAccess::INACTIVE,
        cnc_panel: PanelAccess::INACTIVE,
        spindle_controls_enabled: false,
        start_label: NOT_READY_LABEL,
        indicator_text: NOT_READY_TEXT,
        indicator_light: IndicatorLight::Yellow,
        reset_spindle: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pe320_locks_spindle() {
        let a = tool_affordance(ToolState::Pe320, &ToolContext::default());
        assert_eq!(a.pe320_label.text, "\u{00A0}- Connected");
        assert_eq!(a.pe320_label.color, Some(CONNECTED_COLOR));
        assert_eq!(a.cnc_label.text, "\u{00A0}- Disconnected");
        assert!(a.extruder_panel.enabled);
        assert!(!a.cnc_panel.enabled && a.cnc_panel.dimmed);
        assert!(!a.spindle_controls_enabled);
        assert_eq!(a.start_label, NOT_READY_LABEL);
        assert!(a.reset_spindle);
        assert!(!a.extruder_warning);
    }

    #[test]
    fn test_cnc_indicator() {
        let ready = tool_affordance(ToolState::Cnc, &ToolContext::default());
        assert_eq!(ready.indicator_light, IndicatorLight::Green);
        assert_eq!(ready.indicator_text, "Spindle is Ready");
        assert_eq!(ready.start_label, START_LABEL);
        assert!(ready.spindle_controls_enabled);
        assert!(!ready.reset_spindle);

        let running = tool_affordance(
            ToolState::Cnc,
            &ToolContext {
                spindle_running: true,
                ..Default::default()
            },
        );
        assert_eq!(running.indicator_light, IndicatorLight::Red);

        let faulted = tool_affordance(
            ToolState::Cnc,
            &ToolContext {
                spindle_running: true,
                cnc_fault: true,
                ..Default::default()
            },
        );
        assert_eq!(faulted.indicator_light, IndicatorLight::Yellow);
        assert!(faulted.reset_spindle);
    }

    #[test]
    fn test_loom_faults() {
        let a = tool_affordance(ToolState::OpenCircuit, &ToolContext::default());
        assert_eq!(a.pe320_label.text, "\u{00A0}- Smart Loom Open Circuit");
        assert_eq!(a.cnc_label.color, Some(LOOM_FAULT_COLOR));
        assert!(!a.pe320_label.visible);
        assert!(a.extruder_warning && a.cnc_warning);

        let b = tool_affordance(ToolState::ShortCircuit, &ToolContext::default());
        assert_eq!(b.cnc_label.text, "\u{00A0}- Smart Loom Short Circuit");
    }

    #[test]
    fn test_disconnected_dims_only_with_detection() {
        let off = tool_affordance(ToolState::Disconnected, &ToolContext::default());
        assert!(!off.extruder_panel.enabled);
        assert!(!off.extruder_panel.dimmed);

        let on = tool_affordance(
            ToolState::Disconnected,
            &ToolContext {
                tool_detection_enabled: true,
                ..Default::default()
            },
        );
        assert!(on.extruder_panel.dimmed && on.cnc_panel.dimmed);
        assert_eq!(on.pe320_label.text, "\u{00A0}- null");
    }
}
