use async_trait::async_trait;
use duetpanel_communication::{Payload, Request, Transport};
use duetpanel_core::TransportError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

// Mock transport replaying scripted responses
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Payload, TransportError>>>,
    fallback: Result<Payload, TransportError>,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedTransport {
    pub fn new(
        responses: Vec<Result<Payload, TransportError>>,
        fallback: Result<Payload, TransportError>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[allow(dead_code)]
    pub fn push(&self, response: Result<Payload, TransportError>) {
        self.responses.lock().push_back(response);
    }

    pub fn bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.body.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, request: Request) -> Result<Payload, TransportError> {
        self.requests.lock().push(request);
        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

#[allow(dead_code)]
pub fn ok_text(text: &str) -> Result<Payload, TransportError> {
    Ok(Payload::Text(text.to_string()))
}

#[allow(dead_code)]
pub fn busy() -> Result<Payload, TransportError> {
    Err(TransportError::Http { status: 503 })
}

#[allow(dead_code)]
pub fn refused() -> Result<Payload, TransportError> {
    Err(TransportError::Network {
        reason: "connection refused".to_string(),
    })
}
