//! Error handling for DuetPanel
//!
//! Provides error types for every layer of the control loop:
//! - Transport errors (HTTP status and network failures)
//! - Status errors (malformed object model payloads)
//! - Dispatch errors (command retry ceiling)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// HTTP status the controller returns while it is busy or rebooting.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Transport error type
///
/// Normalizes everything that can go wrong while talking to the controller
/// over HTTP. The transport never retries; callers decide the policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The controller answered with a non-success status code
    #[error("HTTP error! Status: {status}")]
    Http {
        /// The HTTP status code returned by the controller.
        status: u16,
    },

    /// The connection could not be established (refused, TLS, timeout)
    #[error("Network or SSL error: {reason}")]
    Network {
        /// Description of the underlying failure.
        reason: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response body: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },
}

impl TransportError {
    /// Check if the controller reported HTTP 503 (busy)
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, TransportError::Http { status } if *status == SERVICE_UNAVAILABLE)
    }

    /// Check if this is a connection-level failure
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network { .. })
    }
}

/// Status payload error type
///
/// Raised when the status endpoint returns something that cannot be turned
/// into a [`crate::MachineStatus`]. Aborts one reconciliation cycle only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The payload was text where a JSON object model was expected
    #[error("Expected a JSON object model, got text: {snippet}")]
    NotJson {
        /// The first characters of the text body.
        snippet: String,
    },

    /// The JSON did not match the expected object model shape
    #[error("Malformed status payload: {reason}")]
    Malformed {
        /// The reason the payload was rejected.
        reason: String,
    },

    /// A field the panel relies on was absent
    #[error("Missing field in status payload: {field}")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },
}

/// Command dispatch error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A retry ceiling was configured and every attempt was transient
    #[error("G-code '{gcode}' not accepted after {attempts} attempts")]
    RetriesExhausted {
        /// The command that was being sent.
        gcode: String,
        /// How many submissions were made.
        attempts: u32,
    },
}

/// Main error type for DuetPanel
///
/// A unified error type that can represent any error from the core layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Status payload error
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Dispatch error
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
