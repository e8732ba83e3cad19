//! Status reconciliation loop
//!
//! Each cycle fetches the object model, derives a complete view, hands it to
//! the render sink, and then issues the commands the new state calls for:
//! heater fault resets first, then the spindle command. Commands go to a
//! [`CommandQueue`] and are sent in order in the background, so a busy
//! controller never holds up the next cycle.
//!
//! A cycle that fails to fetch or decode the status is dropped whole; the
//! sink keeps showing the previous view.

use crate::command_queue::CommandQueue;
use crate::error::ReconcileResult;
use crate::fault_latch::HeaterFaultLatch;
use crate::sink::{heater_fault_message, OperatorPrompt, RenderSink};
use crate::spindle::{SpindleControls, SpindleGuard};
use crate::view_state::{derive_view, DeriveContext, DerivedViewState};
use async_trait::async_trait;
use duetpanel_communication::{CommandDispatcher, PanelCommand, Transport};
use duetpanel_core::preferences::keys;
use duetpanel_core::{
    thread_safe_rw, EventDispatcher, MachineStatus, PanelEvent, PeriodicTask, PreferenceStore,
    SystemFamily, TaskHandle, ThreadSafeRw,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latest decoded snapshot, shared with the overshoot fan controller
pub type SharedStatus = ThreadSafeRw<Option<MachineStatus>>;

/// Latest derived view
pub type SharedView = ThreadSafeRw<Option<DerivedViewState>>;

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Delay between cycles
    pub interval: Duration,
    /// Debounce after a confirmed heater fault reset
    pub fault_debounce: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            fault_debounce: Duration::from_millis(500),
        }
    }
}

/// State owned by the reconciler across cycles
#[derive(Debug)]
pub struct ApplicationState {
    /// Heater fault prompt latches
    pub fault_latch: HeaterFaultLatch,
    /// Spindle stop edge guard
    pub spindle_guard: SpindleGuard,
    /// Last view handed to the sink
    pub last_view: SharedView,
}

/// Collaborators the reconciler talks to
pub struct ReconcilerDeps {
    /// Status source
    pub transport: Arc<dyn Transport>,
    /// Command sink
    pub dispatcher: CommandDispatcher,
    /// Operator preferences
    pub preferences: Arc<dyn PreferenceStore>,
    /// Operator spindle input
    pub controls: SpindleControls,
    /// View consumer
    pub sink: Arc<dyn RenderSink>,
    /// Fault reset confirmation
    pub prompt: Arc<dyn OperatorPrompt>,
    /// Event bus
    pub events: EventDispatcher,
}

/// Polls machine status and keeps the panel consistent with it
pub struct StatusReconciler {
    deps: ReconcilerDeps,
    config: ReconcilerConfig,
    state: ApplicationState,
    status: SharedStatus,
    commands: CommandQueue,
}

impl StatusReconciler {
    /// Create a reconciler and its command worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(deps: ReconcilerDeps, config: ReconcilerConfig) -> Self {
        let state = ApplicationState {
            fault_latch: HeaterFaultLatch::new(config.fault_debounce),
            spindle_guard: SpindleGuard::new(),
            last_view: thread_safe_rw(None),
        };
        let commands = CommandQueue::spawn(deps.dispatcher.clone());
        Self {
            deps,
            config,
            state,
            status: thread_safe_rw(None),
            commands,
        }
    }

    /// Handle to the latest decoded snapshot
    pub fn status_handle(&self) -> SharedStatus {
        self.status.clone()
    }

    /// Handle to the latest derived view
    pub fn view_handle(&self) -> SharedView {
        self.state.last_view.clone()
    }

    /// State carried between cycles
    pub fn application_state(&self) -> &ApplicationState {
        &self.state
    }

    /// Background command sender
    pub fn command_queue(&self) -> &CommandQueue {
        &self.commands
    }

    /// Run one full cycle
    pub async fn reconcile_once(&mut self) -> ReconcileResult<()> {
        let payload = self.deps.transport.fetch_status().await?;
        let status = MachineStatus::from_json(payload.into_json()?)?;

        let ctx = DeriveContext {
            spindle: self.deps.controls.snapshot(),
            tool_detection_enabled: self.deps.preferences.is_on(keys::TOOL_DETECTION),
            system_family: SystemFamily::from_store(self.deps.preferences.as_ref()),
        };
        let view = derive_view(&status, &ctx);

        self.deps.sink.apply(&view);
        tracing::debug!(
            "Reconciled status: extruder {}, tool {:?}",
            view.extruder_state,
            view.tool_state
        );

        let spindle_hold =
            status.flags.estop_fault || status.flags.cnc_fault || view.tool.reset_spindle;
        let faulted = view.faults.faulted_heaters.clone();
        let configured: Vec<usize> = status.configured_heaters().iter().map(|h| h.index).collect();

        *self.status.write() = Some(status);
        *self.state.last_view.write() = Some(view);
        self.deps.events.publish(PanelEvent::ViewUpdated);

        let mut batch = self.handle_heater_faults(&configured, &faulted).await;

        if spindle_hold && (ctx.spindle.running || ctx.spindle.unlocked) {
            self.deps.controls.lock_and_stop();
        }
        batch.extend(self.state.spindle_guard.plan(&ctx.spindle, spindle_hold));
        self.commands.submit(batch);

        Ok(())
    }

    /// Prompt for new heater faults; returns the resets to send
    async fn handle_heater_faults(
        &mut self,
        configured: &[usize],
        faulted: &[usize],
    ) -> Vec<PanelCommand> {
        let mut resets = Vec::new();
        for &heater in configured {
            let is_faulted = faulted.contains(&heater);
            if !self
                .state
                .fault_latch
                .should_prompt(heater, is_faulted, Instant::now())
            {
                continue;
            }

            tracing::warn!("Heater {} reports a temperature fault", heater + 1);
            let reset = self
                .deps
                .prompt
                .confirm(&heater_fault_message(heater))
                .await;
            self.deps
                .events
                .publish(PanelEvent::HeaterFaultAcknowledged { heater, reset });

            if reset {
                self.state.fault_latch.acknowledge(heater, Instant::now());
                resets.push(PanelCommand::ResetHeaterFault { heater });
            } else {
                self.state.fault_latch.suppress(heater);
            }
        }
        resets
    }

    /// Spawn the reconciler at its configured cadence
    pub fn start(self) -> TaskHandle {
        let interval = self.config.interval;
        TaskHandle::spawn(self, interval)
    }
}

#[async_trait]
impl PeriodicTask for StatusReconciler {
    fn name(&self) -> &'static str {
        "reconciler"
    }

    async fn run_cycle(&mut self) {
        if let Err(e) = self.reconcile_once().await {
            tracing::error!("Error updating object model: {}", e);
            self.deps
                .events
                .publish(PanelEvent::ReconcileFailed(e.to_string()));
        }
    }
}
