//! Type aliases for shared state.
//!
//! The control loop keeps almost all state owned by a single task. The few
//! values written from one task and read by another (operator inputs, the
//! last derived view) go through these aliases so the locking strategy is
//! chosen in one place.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-task sharing.
///
/// Uses `parking_lot::Mutex`; guards must never be held across an `.await`.
///
/// # Example
/// ```rust,ignore
/// let state: ThreadSafe<SpindleRequest> = thread_safe(SpindleRequest::default());
/// state.lock().running = true;
/// ```
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe read-write lock for values read far more often than written.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Create a new [`ThreadSafe`] value
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new [`ThreadSafeRw`] value
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
