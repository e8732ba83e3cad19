//! Cancellable periodic tasks
//!
//! Every polling loop in the panel runs as a [`PeriodicTask`] spawned onto
//! the tokio runtime. The returned [`TaskHandle`] carries an explicit stop
//! signal; stopping drops the in-flight cycle, including any command retry
//! loop it is awaiting.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A unit of work repeated on a fixed cadence
#[async_trait]
pub trait PeriodicTask: Send + 'static {
    /// Name used in log output
    fn name(&self) -> &'static str;

    /// Run one cycle. Errors are handled inside; a cycle never ends the loop.
    async fn run_cycle(&mut self);
}

/// Handle to a running periodic task
pub struct TaskHandle {
    name: &'static str,
    shutdown_signal: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `task`, running one cycle immediately and then every `interval`
    ///
    /// Dropping the handle detaches the task; use [`TaskHandle::stop`] to end it.
    pub fn spawn<T: PeriodicTask>(mut task: T, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let name = task.name();

        let join = tokio::spawn(async move {
            tracing::debug!("{} task started ({:?} cadence)", name, interval);
            loop {
                tokio::select! {
                    Some(()) = shutdown_rx.recv() => break,
                    _ = task.run_cycle() => {}
                }
                tokio::select! {
                    Some(()) = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!("{} task stopped", name);
        });

        Self {
            name,
            shutdown_signal: shutdown_tx,
            join,
        }
    }

    /// Task name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown_signal.try_send(());
        if let Err(e) = self.join.await {
            tracing::warn!("{} task ended abnormally: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl PeriodicTask for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn run_cycle(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Stuck;

    #[async_trait]
    impl PeriodicTask for Stuck {
        fn name(&self) -> &'static str {
            "stuck"
        }

        async fn run_cycle(&mut self) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn test_runs_immediately_and_repeats() {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = TaskHandle::spawn(Counter(count.clone()), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(55)).await;
        handle.stop().await;
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_stop_interrupts_a_stuck_cycle() {
        let handle = TaskHandle::spawn(Stuck, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        handle.stop().await;
    }
}
