//! Duet controller support
//!
//! Command creation and availability tracking for Duet boards driven over
//! the DuetSoftwareFramework HTTP API.

pub mod availability;
pub mod command_creator;

pub use availability::{
    initialization_commands, AvailabilityConfig, AvailabilityPoller, AvailabilityTransition,
    AvailabilityWatch,
};
pub use command_creator::{
    join_commands, CommandCreator, FanGroup, FanLevel, HeaterMode, HeaterSetpoint, PanelCommand,
};
