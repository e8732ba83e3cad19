//! Presentation collaborators
//!
//! The control loop never draws anything. It hands each derived view to a
//! [`RenderSink`] and asks an [`OperatorPrompt`] before resetting a faulted
//! heater.

use crate::view_state::DerivedViewState;
use async_trait::async_trait;

/// Receives every successfully derived view
pub trait RenderSink: Send + Sync {
    /// Present a complete view. Never called with a partial view.
    fn apply(&self, view: &DerivedViewState);
}

/// Yes/no confirmation from the operator
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Ask `message`; `true` means confirmed
    async fn confirm(&self, message: &str) -> bool;
}

/// Prompt that answers every question the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl OperatorPrompt for FixedAnswer {
    async fn confirm(&self, message: &str) -> bool {
        tracing::info!("{} -> {}", message, if self.0 { "yes" } else { "no" });
        self.0
    }
}

/// Prompt text for a faulted heater
pub fn heater_fault_message(heater: usize) -> String {
    format!(
        "Heater {} has a temperature fault. Reset the fault? If the fault persists, contact your local distributor for support.",
        heater + 1
    )
}
