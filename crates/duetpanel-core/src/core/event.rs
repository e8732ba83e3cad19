//! Event system for the control loop
//!
//! Provides:
//! - Event types for availability, command, and reconciliation changes
//! - Event dispatcher for publishing events to subscribers

use tokio::sync::broadcast;

/// Panel event types
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// Controller reachability changed
    AvailabilityChanged(bool),
    /// The one-shot initialization batch finished
    InitializationSent(usize),
    /// A G-code command was accepted by the controller
    CommandComplete(String),
    /// A heater fault prompt was answered
    HeaterFaultAcknowledged {
        /// Heater index
        heater: usize,
        /// Whether the operator chose to reset
        reset: bool,
    },
    /// A reconciliation cycle produced a new view
    ViewUpdated,
    /// A reconciliation cycle was aborted
    ReconcileFailed(String),
}

impl std::fmt::Display for PanelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelEvent::AvailabilityChanged(true) => write!(f, "Controller available"),
            PanelEvent::AvailabilityChanged(false) => write!(f, "Controller unavailable"),
            PanelEvent::InitializationSent(count) => {
                write!(f, "Initialization batch sent ({} commands)", count)
            }
            PanelEvent::CommandComplete(cmd) => write!(f, "Command complete: {}", cmd),
            PanelEvent::HeaterFaultAcknowledged { heater, reset } => {
                write!(f, "Heater {} fault acknowledged (reset: {})", heater + 1, reset)
            }
            PanelEvent::ViewUpdated => write!(f, "View updated"),
            PanelEvent::ReconcileFailed(reason) => write!(f, "Reconcile failed: {}", reason),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for panel events.
    tx: broadcast::Sender<PanelEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 100)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received it. Publishing with
    /// no subscribers is not an error for the control loop.
    pub fn publish(&self, event: PanelEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
