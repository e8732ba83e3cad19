//! Controller availability polling
//!
//! Probes the status endpoint on a fixed cadence and tracks whether the
//! controller is reachable. Every transition from unavailable to available
//! sends the initialization batch built from the operator preferences, so a
//! rebooted controller gets its global flags and macros back.

use super::command_creator::{CommandCreator, PanelCommand};
use crate::communication::{dispatcher::CommandDispatcher, Transport};
use async_trait::async_trait;
use duetpanel_core::preferences::keys;
use duetpanel_core::{EventDispatcher, PanelEvent, PeriodicTask, PreferenceStore, TaskHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Availability poller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityConfig {
    /// Delay between probes
    pub poll_interval: Duration,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
        }
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityTransition {
    /// Reachability did not change
    Unchanged,
    /// The controller answered after being unreachable
    BecameAvailable,
    /// The controller stopped answering
    BecameUnavailable,
}

/// Read-only view of the current availability
#[derive(Debug, Clone, Default)]
pub struct AvailabilityWatch {
    available: Arc<AtomicBool>,
}

impl AvailabilityWatch {
    /// Whether the last probe succeeded
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Build the initialization batch from the preference store
///
/// Part cooling first, then the bed fixture plate. Each toggle sets its
/// global before running the matching macro; missing keys read as `off`.
pub fn initialization_commands(preferences: &dyn PreferenceStore) -> Vec<PanelCommand> {
    let creator = CommandCreator::default();
    let mut commands = creator.part_cooling(preferences.is_on(keys::PART_COOLING));
    commands.extend(creator.bed_fixture_plate(preferences.is_on(keys::BED_FIXTURE_PLATE)));
    commands
}

/// Background loop tracking controller reachability
pub struct AvailabilityPoller {
    transport: Arc<dyn Transport>,
    dispatcher: CommandDispatcher,
    preferences: Arc<dyn PreferenceStore>,
    events: EventDispatcher,
    config: AvailabilityConfig,
    watch: AvailabilityWatch,
}

impl AvailabilityPoller {
    /// Create a poller. The controller starts out unavailable, so the first
    /// successful probe sends the initialization batch.
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: CommandDispatcher,
        preferences: Arc<dyn PreferenceStore>,
        events: EventDispatcher,
        config: AvailabilityConfig,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            preferences,
            events,
            config,
            watch: AvailabilityWatch::default(),
        }
    }

    /// Handle for reading availability from other tasks
    pub fn watch(&self) -> AvailabilityWatch {
        self.watch.clone()
    }

    /// Whether the last probe succeeded
    pub fn is_available(&self) -> bool {
        self.watch.is_available()
    }

    /// Probe once and act on the transition
    pub async fn poll_once(&mut self) -> AvailabilityTransition {
        match self.transport.fetch_status().await {
            Ok(_) => {
                if self.is_available() {
                    return AvailabilityTransition::Unchanged;
                }
                self.watch.available.store(true, Ordering::SeqCst);
                tracing::info!("Controller is available");
                self.events.publish(PanelEvent::AvailabilityChanged(true));
                self.send_initialization().await;
                AvailabilityTransition::BecameAvailable
            }
            Err(e) => {
                if e.is_service_unavailable() {
                    tracing::debug!("Controller busy (503)");
                } else {
                    tracing::debug!("Controller probe failed: {}", e);
                }
                if !self.is_available() {
                    return AvailabilityTransition::Unchanged;
                }
                self.watch.available.store(false, Ordering::SeqCst);
                tracing::warn!("Controller is unavailable: {}", e);
                self.events.publish(PanelEvent::AvailabilityChanged(false));
                AvailabilityTransition::BecameUnavailable
            }
        }
    }

    async fn send_initialization(&self) {
        let commands = initialization_commands(self.preferences.as_ref());
        for command in &commands {
            tracing::info!("Sending initialization G-code: {}", command);
        }
        match self.dispatcher.send_batch(&commands_as_strings(&commands)).await {
            Ok(_) => {
                tracing::info!("All initialization commands executed successfully");
                self.events
                    .publish(PanelEvent::InitializationSent(commands.len()));
            }
            Err(e) => tracing::error!("Error executing initialization commands: {}", e),
        }
    }

    /// Spawn the poller at its configured cadence
    pub fn start(self) -> TaskHandle {
        let interval = self.config.poll_interval;
        TaskHandle::spawn(self, interval)
    }
}

fn commands_as_strings(commands: &[PanelCommand]) -> Vec<String> {
    commands.iter().map(PanelCommand::to_string).collect()
}

#[async_trait]
impl PeriodicTask for AvailabilityPoller {
    fn name(&self) -> &'static str {
        "availability"
    }

    async fn run_cycle(&mut self) {
        self.poll_once().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duetpanel_core::preferences::ON;
    use duetpanel_core::MemoryPreferences;

    #[test]
    fn test_default_batch_is_all_off() {
        let prefs = MemoryPreferences::new();
        let batch: Vec<String> = commands_as_strings(&initialization_commands(&prefs));
        assert_eq!(
            batch,
            vec![
                "set global.partCooling = false",
                "M98 P\"Part cooling off.g\"",
                "set global.bedFixturePlate = false",
                "M98 P\"Bed_PID_fixture_plate_off.g\"",
            ]
        );
    }

    #[test]
    fn test_batch_follows_preferences() {
        let prefs = MemoryPreferences::with_values([(keys::PART_COOLING, ON)]);
        let batch = commands_as_strings(&initialization_commands(&prefs));
        assert_eq!(batch[0], "set global.partCooling = true");
        assert_eq!(batch[1], "M98 P\"Part cooling on.g\"");
        assert_eq!(batch[2], "set global.bedFixturePlate = false");
    }
}
