//! Firmware implementations
//!
//! Supported controllers:
//! - Duet (RepRapFirmware behind DuetSoftwareFramework): HTTP object model
//!   and plain-text G-code endpoint

pub mod duet;
