//! # DuetPanel
//!
//! Headless control panel core for Duet-driven pellet extruder and CNC
//! spindle machines.
//!
//! ## Architecture
//!
//! DuetPanel is organized as a workspace with multiple crates:
//!
//! 1. **duetpanel-core** - Object model, errors, events, task handles, preference interface
//! 2. **duetpanel-communication** - HTTP transport, command dispatcher, availability poller
//! 3. **duetpanel-settings** - Config file, preference file, presets and heating profiles
//! 4. **duetpanel-panel** - Status reconciler, derived view, spindle and fan control
//! 5. **duetpanel** - Binary wiring the loops together

use std::sync::Arc;

pub use duetpanel_communication as communication;
pub use duetpanel_panel as panel;
pub use duetpanel_settings as settings;

use duetpanel_communication::{
    AvailabilityConfig, AvailabilityPoller, AvailabilityWatch, CommandDispatcher,
    DispatcherConfig, Transport,
};
use duetpanel_core::{EventDispatcher, PreferenceStore, TaskHandle};
use duetpanel_panel::{
    DerivedViewState, OperatorPrompt, OvershootFanController, ReconcilerConfig, ReconcilerDeps,
    RenderSink, SharedView, SpindleControls, StatusReconciler,
};
use duetpanel_settings::PanelConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Honours `RUST_LOG`, defaulting to `info`. Output is pretty-printed for a
/// terminal, or one JSON object per line when `json` is set.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Render sink that logs each frame
///
/// Used when no display is attached. Only changes are logged at `info`.
#[derive(Default)]
pub struct TracingRenderSink {
    last: parking_lot::Mutex<Option<DerivedViewState>>,
}

impl RenderSink for TracingRenderSink {
    fn apply(&self, view: &DerivedViewState) {
        let mut last = self.last.lock();
        if last.as_ref() == Some(view) {
            tracing::trace!("View unchanged");
            return;
        }
        tracing::info!(
            extruder = %view.extruder_state,
            tool = %view.tool_state,
            spindle = %view.spindle.state_label,
            estop = view.faults.estop_modal,
            uptime = %view.system.uptime,
            "Panel view"
        );
        match serde_json::to_string(view) {
            Ok(body) => tracing::debug!("{}", body),
            Err(e) => tracing::warn!("Failed to serialize view: {}", e),
        }
        *last = Some(view.clone());
    }
}

/// Every running loop of a panel
pub struct PanelRuntime {
    tasks: Vec<TaskHandle>,
    availability: AvailabilityWatch,
    controls: SpindleControls,
    view: SharedView,
    events: EventDispatcher,
}

impl PanelRuntime {
    /// Spawn the availability poller, the status reconciler and, when
    /// enabled, the overshoot fan controller
    pub fn spawn(
        config: &PanelConfig,
        transport: Arc<dyn Transport>,
        preferences: Arc<dyn PreferenceStore>,
        sink: Arc<dyn RenderSink>,
        prompt: Arc<dyn OperatorPrompt>,
    ) -> Self {
        let polling = &config.polling;
        let events = EventDispatcher::default();
        let dispatcher = CommandDispatcher::new(
            transport.clone(),
            DispatcherConfig {
                retry_delay: polling.retry_delay(),
                max_attempts: polling.max_dispatch_attempts,
            },
        )
        .with_events(events.clone());

        let poller = AvailabilityPoller::new(
            transport.clone(),
            dispatcher.clone(),
            preferences.clone(),
            events.clone(),
            AvailabilityConfig {
                poll_interval: polling.availability_interval(),
            },
        );
        let availability = poller.watch();

        let controls = SpindleControls::new();
        let reconciler = StatusReconciler::new(
            ReconcilerDeps {
                transport,
                dispatcher: dispatcher.clone(),
                preferences,
                controls: controls.clone(),
                sink,
                prompt,
                events: events.clone(),
            },
            ReconcilerConfig {
                interval: polling.status_interval(),
                fault_debounce: polling.fault_latch(),
            },
        );
        let view = reconciler.view_handle();
        let status = reconciler.status_handle();

        let mut tasks = vec![poller.start(), reconciler.start()];
        if polling.overshoot_fans_enabled {
            tasks.push(
                OvershootFanController::new(status, dispatcher, polling.overshoot_interval())
                    .start(),
            );
        }
        tracing::info!("Started {} panel tasks", tasks.len());

        Self {
            tasks,
            availability,
            controls,
            view,
            events,
        }
    }

    /// Controller reachability
    pub fn availability(&self) -> &AvailabilityWatch {
        &self.availability
    }

    /// Operator spindle input
    pub fn controls(&self) -> &SpindleControls {
        &self.controls
    }

    /// Latest derived view
    pub fn view(&self) -> Option<DerivedViewState> {
        self.view.read().clone()
    }

    /// Panel event bus
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Names of the running tasks
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(TaskHandle::name).collect()
    }

    /// Stop every loop and wait for them to exit
    pub async fn shutdown(self) {
        for task in self.tasks {
            task.stop().await;
        }
        tracing::info!("Panel stopped");
    }
}
