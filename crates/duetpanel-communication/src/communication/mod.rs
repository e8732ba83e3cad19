//! Controller transport abstraction
//!
//! The controller exposes two endpoints: a JSON status endpoint and a
//! plain-text G-code endpoint. [`Transport`] is the seam every higher layer
//! talks through, so the dispatcher and the pollers can be driven by a
//! scripted transport in tests.

pub mod dispatcher;
pub mod http;

use async_trait::async_trait;
use duetpanel_core::{StatusError, TransportError};
use serde_json::Value;

/// Status endpoint path
pub const STATUS_PATH: &str = "/machine/status";

/// Command endpoint path
pub const CODE_PATH: &str = "/machine/code";

/// Response text the controller returns while a global variable is still
/// being created by a macro. Treated as transient.
pub const UNKNOWN_VARIABLE_MARKER: &str = "Error: unknown variable";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// A request against the controller, relative to its base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Path beginning with `/`
    pub path: String,
    /// Plain-text body
    pub body: Option<String>,
}

impl Request {
    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Create a POST request with a `text/plain` body
    pub fn post_text(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body served as `application/json`
    Json(Value),
    /// Any other body
    Text(String),
}

impl Payload {
    /// Borrow the body as text, if it was served as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }

    /// Convert the body to text, serializing JSON bodies
    pub fn into_text(self) -> String {
        match self {
            Payload::Text(text) => text,
            Payload::Json(value) => value.to_string(),
        }
    }

    /// Convert the body to JSON, rejecting text bodies
    pub fn into_json(self) -> Result<Value, StatusError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(text) => Err(StatusError::NotJson {
                snippet: text.chars().take(64).collect(),
            }),
        }
    }
}

/// Request/response channel to the controller
///
/// Implementations never retry; retry policy lives in the callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request
    async fn request(&self, request: Request) -> Result<Payload, TransportError>;

    /// Fetch the full object model
    async fn fetch_status(&self) -> Result<Payload, TransportError> {
        self.request(Request::get(STATUS_PATH)).await
    }

    /// Submit G-code as plain text
    async fn post_code(&self, gcode: &str) -> Result<Payload, TransportError> {
        self.request(Request::post_text(CODE_PATH, gcode)).await
    }
}
