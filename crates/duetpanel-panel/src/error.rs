//! Reconciliation errors

use duetpanel_core::{StatusError, TransportError};
use thiserror::Error;

/// Why a reconciliation cycle was aborted
///
/// A failed cycle leaves the previously rendered view untouched; the next
/// cycle starts from scratch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The status request failed
    #[error("Failed to fetch machine status: {0}")]
    Fetch(#[from] TransportError),

    /// The status payload could not be decoded
    #[error(transparent)]
    Status(#[from] StatusError),
}

/// Result type for reconciliation
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
