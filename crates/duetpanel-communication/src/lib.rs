//! # DuetPanel Communication
//!
//! Talks to a Duet-class controller over its HTTP API.
//! Provides the transport abstraction, the retrying G-code dispatcher,
//! typed G-code builders, and the availability poller that sends the
//! initialization batch whenever the controller comes back.

pub mod communication;
pub mod firmware;

pub use communication::{
    dispatcher::{CommandDispatcher, DispatcherConfig},
    http::{HttpTransport, HttpTransportConfig},
    Method, Payload, Request, Transport, CODE_PATH, STATUS_PATH, UNKNOWN_VARIABLE_MARKER,
};

pub use firmware::duet::{
    initialization_commands, join_commands, AvailabilityConfig, AvailabilityPoller,
    AvailabilityTransition, AvailabilityWatch, CommandCreator, FanGroup, FanLevel, HeaterMode,
    HeaterSetpoint, PanelCommand,
};
