use async_trait::async_trait;
use duetpanel_communication::{
    CommandDispatcher, DispatcherConfig, Method, Payload, Request, Transport,
};
use duetpanel_core::{EventDispatcher, MemoryPreferences, TransportError};
use duetpanel_panel::{
    DerivedViewState, OperatorPrompt, ReconcilerConfig, ReconcilerDeps, RenderSink,
    SpindleControls, StatusReconciler,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Mock controller: serves the current status document and records posted G-code
pub struct MockController {
    status: Mutex<Result<Value, TransportError>>,
    post_error: Mutex<Option<TransportError>>,
    rejected: AtomicUsize,
    pub posted: Arc<Mutex<Vec<String>>>,
}

impl MockController {
    pub fn new(status: Value) -> Self {
        Self {
            status: Mutex::new(Ok(status)),
            post_error: Mutex::new(None),
            rejected: AtomicUsize::new(0),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_status(&self, status: Value) {
        *self.status.lock() = Ok(status);
    }

    pub fn fail_with(&self, error: TransportError) {
        *self.status.lock() = Err(error);
    }

    #[allow(dead_code)]
    pub fn reject_posts_with(&self, error: TransportError) {
        *self.post_error.lock() = Some(error);
    }

    #[allow(dead_code)]
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn take_posted(&self) -> Vec<String> {
        std::mem::take(&mut *self.posted.lock())
    }
}

#[async_trait]
impl Transport for MockController {
    async fn request(&self, request: Request) -> Result<Payload, TransportError> {
        match request.method {
            Method::Get => self.status.lock().clone().map(Payload::Json),
            Method::Post => {
                if let Some(error) = self.post_error.lock().clone() {
                    self.rejected.fetch_add(1, Ordering::SeqCst);
                    return Err(error);
                }
                self.posted.lock().push(request.body.unwrap_or_default());
                Ok(Payload::Text(String::new()))
            }
        }
    }
}

// Render sink keeping every applied view
#[derive(Default)]
pub struct RecordingSink {
    pub views: Mutex<Vec<DerivedViewState>>,
}

impl RenderSink for RecordingSink {
    fn apply(&self, view: &DerivedViewState) {
        self.views.lock().push(view.clone());
    }
}

// Prompt with a fixed answer that counts how often it was asked
pub struct CountingPrompt {
    answer: bool,
    pub asked: AtomicUsize,
}

impl CountingPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperatorPrompt for CountingPrompt {
    async fn confirm(&self, _message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

pub struct Harness {
    pub controller: Arc<MockController>,
    pub sink: Arc<RecordingSink>,
    pub prompt: Arc<CountingPrompt>,
    pub controls: SpindleControls,
    pub events: EventDispatcher,
    pub reconciler: StatusReconciler,
}

impl Harness {
    // Wait for the command worker to go idle, then take what it posted
    pub async fn posted(&self) -> Vec<String> {
        let queue = self.reconciler.command_queue();
        tokio::time::timeout(Duration::from_secs(2), async {
            while !queue.is_idle() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("command worker went idle");
        self.controller.take_posted()
    }
}

pub fn harness(status: Value, answer: bool) -> Harness {
    let controller = Arc::new(MockController::new(status));
    let sink = Arc::new(RecordingSink::default());
    let prompt = Arc::new(CountingPrompt::answering(answer));
    let controls = SpindleControls::new();
    let events = EventDispatcher::default();

    let dispatcher = CommandDispatcher::new(
        controller.clone(),
        DispatcherConfig {
            retry_delay: Duration::from_millis(1),
            max_attempts: None,
        },
    );
    let reconciler = StatusReconciler::new(
        ReconcilerDeps {
            transport: controller.clone(),
            dispatcher,
            preferences: Arc::new(MemoryPreferences::with_values([(
                "toolDetectionState",
                "on",
            )])),
            controls: controls.clone(),
            sink: sink.clone(),
            prompt: prompt.clone(),
            events: events.clone(),
        },
        ReconcilerConfig {
            interval: Duration::from_millis(10),
            fault_debounce: Duration::from_millis(50),
        },
    );

    Harness {
        controller,
        sink,
        prompt,
        controls,
        events,
        reconciler,
    }
}

pub fn heater(current: f64, active: f64, state: &str) -> Value {
    json!({"current": current, "active": active, "standby": 0.0, "state": state})
}

// Four extruder zones, one bed, CNC attached, no faults
pub fn machine_status() -> Value {
    json!({
        "heat": {
            "heaters": [
                heater(22.0, 0.0, "off"),
                heater(22.0, 0.0, "off"),
                heater(22.0, 0.0, "off"),
                heater(22.0, 0.0, "off"),
                heater(22.0, 0.0, "off")
            ],
            "bedHeaters": [4, -1, -1, -1],
            "chamberHeaters": [-1]
        },
        "spindles": [{"current": 0, "state": "stopped"}],
        "fans": [{"rpm": 0}, {"rpm": 0}],
        "global": {
            "EstopFault": false,
            "ExtruderFault": false,
            "CNCFault": false,
            "toolState": "CNC",
            "materialSensorLEFT": true,
            "materialSensorRIGHT": false
        },
        "sbc": {"uptime": 3725.0, "dsf": {"version": "3.5.1"}}
    })
}
