//! # DuetPanel Core
//!
//! Core types and utilities for DuetPanel.
//! Provides the controller object model, the error taxonomy shared by the
//! transport and control loops, panel events, cancellable task handles, and
//! the preference store interface.

pub mod core;
pub mod data;
pub mod error;
pub mod preferences;
pub mod types;

pub use crate::core::{EventDispatcher, PanelEvent, PeriodicTask, TaskHandle};

pub use data::{
    find_heaters, FanReading, GlobalFlags, HeaterReading, HeaterState, MachineStatus, Slot,
    SpindleReading, SystemInfo, ToolState, UNCONFIGURED_SENTINEL,
};

pub use error::{DispatchError, Error, Result, StatusError, TransportError, SERVICE_UNAVAILABLE};

pub use preferences::{MemoryPreferences, PreferenceStore, SystemFamily};

pub use types::{thread_safe, thread_safe_rw, ThreadSafe, ThreadSafeRw};
