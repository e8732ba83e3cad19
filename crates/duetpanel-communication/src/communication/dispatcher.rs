//! G-code dispatch with retry on transient failures
//!
//! The controller answers 503 while busy and reports `Error: unknown
//! variable` while a macro is still creating globals. Both are transient: the
//! same command is resubmitted after a fixed backoff. A call only returns
//! once the controller has accepted the command, so a caller awaiting
//! several sends gets them applied in order.

use super::{Payload, Transport, UNKNOWN_VARIABLE_MARKER};
use duetpanel_core::{DispatchError, EventDispatcher, PanelEvent, TransportError};
use std::sync::Arc;
use std::time::Duration;

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Delay before resubmitting after a transient failure
    pub retry_delay: Duration,
    /// Give up after this many submissions. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(2000),
            max_attempts: None,
        }
    }
}

/// Sends G-code to the controller, retrying transient failures
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn Transport>,
    config: DispatcherConfig,
    events: Option<EventDispatcher>,
}

impl CommandDispatcher {
    /// Create a dispatcher over `transport`
    pub fn new(transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
        Self {
            transport,
            config,
            events: None,
        }
    }

    /// Publish [`PanelEvent::CommandComplete`] for every accepted command
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = Some(events);
        self
    }

    /// Dispatcher configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Send one command and wait until the controller accepts it
    ///
    /// Returns the raw response text. With no attempt ceiling configured
    /// this only returns once the controller accepts the command.
    pub async fn send(&self, gcode: &str) -> Result<String, DispatchError> {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            match self.transport.post_code(gcode).await {
                Ok(Payload::Text(text)) if text.contains(UNKNOWN_VARIABLE_MARKER) => {
                    tracing::warn!(
                        "Unknown variable while sending G-code '{}', retrying: {}",
                        gcode,
                        text.trim()
                    );
                }
                Ok(payload) => {
                    let text = payload.into_text();
                    tracing::debug!("Response from sending G-code '{}': {}", gcode, text.trim());
                    if let Some(events) = &self.events {
                        events.publish(PanelEvent::CommandComplete(gcode.to_string()));
                    }
                    return Ok(text);
                }
                Err(e) if e.is_service_unavailable() => {
                    tracing::warn!(
                        "503 Service Unavailable while sending G-code '{}', retrying",
                        gcode
                    );
                }
                Err(TransportError::Network { reason }) => {
                    tracing::warn!(
                        "Network or SSL error while sending G-code '{}': {}",
                        gcode,
                        reason
                    );
                }
                Err(e) => {
                    tracing::error!("Error sending G-code '{}': {}", gcode, e);
                }
            }

            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(DispatchError::RetriesExhausted {
                        gcode: gcode.to_string(),
                        attempts,
                    });
                }
            }
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Send commands one after another, each awaited before the next
    pub async fn send_batch<S: AsRef<str>>(
        &self,
        commands: &[S],
    ) -> Result<Vec<String>, DispatchError> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send(command.as_ref()).await?);
        }
        Ok(responses)
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
