//! Heater fault prompt latches
//!
//! One latch per heater keeps the operator from being asked twice about the
//! same fault. A confirmed reset latches for a short debounce window so the
//! reset command can land before the heater is checked again; a declined
//! prompt latches until the heater leaves the fault state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default debounce after a confirmed reset
pub const DEFAULT_FAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Acknowledged { until: Instant },
    Suppressed,
}

/// Per-heater fault prompt latches
#[derive(Debug, Clone)]
pub struct HeaterFaultLatch {
    latches: HashMap<usize, Latch>,
    debounce: Duration,
}

impl Default for HeaterFaultLatch {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_DEBOUNCE)
    }
}

impl HeaterFaultLatch {
    /// Create latches with the given reset debounce
    pub fn new(debounce: Duration) -> Self {
        Self {
            latches: HashMap::new(),
            debounce,
        }
    }

    /// Update the latch for `heater` and report whether to prompt now
    pub fn should_prompt(&mut self, heater: usize, faulted: bool, now: Instant) -> bool {
        let expired = match self.latches.get(&heater) {
            Some(Latch::Acknowledged { until }) => now >= *until,
            Some(Latch::Suppressed) => !faulted,
            None => false,
        };
        if expired {
            self.latches.remove(&heater);
        }
        faulted && !self.latches.contains_key(&heater)
    }

    /// Operator confirmed a reset
    pub fn acknowledge(&mut self, heater: usize, now: Instant) {
        self.latches.insert(
            heater,
            Latch::Acknowledged {
                until: now + self.debounce,
            },
        );
    }

    /// Operator declined a reset
    pub fn suppress(&mut self, heater: usize) {
        self.latches.insert(heater, Latch::Suppressed);
    }

    /// Whether `heater` currently holds a latch
    pub fn is_latched(&self, heater: usize) -> bool {
        self.latches.contains_key(&heater)
    }
}
