//! # DuetPanel Panel
//!
//! The control loops behind the touch panel: status reconciliation, the
//! derived view handed to the render sink, heater fault latching, spindle
//! command planning, and the optional overshoot fan controller.

pub mod command_queue;
pub mod error;
pub mod fault_latch;
pub mod heaters;
pub mod overshoot;
pub mod reconciler;
pub mod sink;
pub mod spindle;
pub mod tool_state;
pub mod view_state;

pub use command_queue::CommandQueue;
pub use error::{ReconcileError, ReconcileResult};
pub use fault_latch::{HeaterFaultLatch, DEFAULT_FAULT_DEBOUNCE};
pub use heaters::{
    aggregate_extruder_state, classify_glow, format_temperature, partition_heaters, Glow,
    HeaterGroupView, HeaterGroups, HeaterTile,
};
pub use overshoot::{band_speed, fan_command, plan_fan_commands, OvershootFanController};
pub use reconciler::{
    ApplicationState, ReconcilerConfig, ReconcilerDeps, SharedStatus, SharedView,
    StatusReconciler,
};
pub use sink::{heater_fault_message, FixedAnswer, OperatorPrompt, RenderSink};
pub use spindle::{SpindleControls, SpindleGuard, SpindleRequest, DEFAULT_SPINDLE_RPM};
pub use tool_state::{tool_affordance, IndicatorLight, ToolAffordance, ToolContext};
pub use view_state::{
    derive_view, DeriveContext, DerivedViewState, FaultView, SpindleView, SystemView,
};
