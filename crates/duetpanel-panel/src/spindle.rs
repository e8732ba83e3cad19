//! Spindle controls and command planning
//!
//! The operator side writes a [`SpindleRequest`] through [`SpindleControls`].
//! Every reconciliation cycle the [`SpindleGuard`] turns the request into at
//! most one command: the run command is resent every cycle while the
//! spindle should turn, the stop command is sent once per stop.

use duetpanel_communication::PanelCommand;
use duetpanel_core::{thread_safe, ThreadSafe};
use serde::Serialize;

/// Speed the slider resets to
pub const DEFAULT_SPINDLE_RPM: u32 = 10000;

/// Operator spindle input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpindleRequest {
    /// Operator has started the spindle
    pub running: bool,
    /// Slider speed
    pub speed_rpm: u32,
    /// Speed slider unlocked
    pub unlocked: bool,
}

impl Default for SpindleRequest {
    fn default() -> Self {
        Self {
            running: false,
            speed_rpm: DEFAULT_SPINDLE_RPM,
            unlocked: false,
        }
    }
}

/// Shared handle to the operator's spindle input
#[derive(Debug, Clone)]
pub struct SpindleControls {
    request: ThreadSafe<SpindleRequest>,
}

impl Default for SpindleControls {
    fn default() -> Self {
        Self {
            request: thread_safe(SpindleRequest::default()),
        }
    }
}

impl SpindleControls {
    /// Create controls in the stopped, locked state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current request
    pub fn snapshot(&self) -> SpindleRequest {
        *self.request.lock()
    }

    /// Start the spindle at the slider speed
    pub fn start(&self) {
        self.request.lock().running = true;
    }

    /// Stop the spindle
    pub fn stop(&self) {
        self.request.lock().running = false;
    }

    /// Move the speed slider. Ignored while the slider is locked.
    pub fn set_speed(&self, rpm: u32) -> bool {
        let mut request = self.request.lock();
        if request.unlocked {
            request.speed_rpm = rpm;
        }
        request.unlocked
    }

    /// Unlock the speed slider
    pub fn unlock(&self) {
        self.request.lock().unlocked = true;
    }

    /// Stop and lock, used when a fault or tool change takes the spindle away
    pub fn lock_and_stop(&self) {
        let mut request = self.request.lock();
        request.running = false;
        request.unlocked = false;
    }
}

/// Edge guard for the stop command
///
/// Starts disarmed-for-stop so the first idle cycle sends one `M5`, which
/// brings a spindle left running by a previous session to rest.
#[derive(Debug, Clone, Default)]
pub struct SpindleGuard {
    stop_sent: bool,
}

impl SpindleGuard {
    /// Create a guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Command for this cycle, if any
    ///
    /// `hold` forces the stop path regardless of the request (e-stop, CNC
    /// fault, or a tool that cannot run the spindle).
    pub fn plan(&mut self, request: &SpindleRequest, hold: bool) -> Option<PanelCommand> {
        if request.running && !hold {
            self.stop_sent = false;
            Some(PanelCommand::SpindleClockwise {
                rpm: request.speed_rpm,
            })
        } else if !self.stop_sent {
            self.stop_sent = true;
            Some(PanelCommand::SpindleStop)
        } else {
            None
        }
    }
}
