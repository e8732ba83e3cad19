//! Common type aliases shared across DuetPanel crates.

mod aliases;

pub use aliases::*;
