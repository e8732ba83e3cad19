//! Control loop plumbing: panel events and cancellable periodic tasks

pub mod event;
pub mod task;

pub use event::{EventDispatcher, PanelEvent};
pub use task::{PeriodicTask, TaskHandle};
