//! Background command sender for the reconciler
//!
//! The reconciler plans commands every cycle but never waits for the
//! controller to accept them. Batches go onto a channel drained by one
//! worker task, which sends them in submission order through the
//! dispatcher. While the controller is busy, queued batches are merged and
//! superseded spindle run commands are dropped, so the backlog stays
//! bounded.
//!
//! Dropping the queue aborts the worker, including any retry in flight.

use duetpanel_communication::{CommandDispatcher, PanelCommand};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Ordered, non-blocking command submission
#[derive(Debug)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Vec<PanelCommand>>,
    pending: Arc<AtomicUsize>,
    worker: JoinHandle<()>,
}

impl CommandQueue {
    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn spawn(dispatcher: CommandDispatcher) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(drain(dispatcher, rx, pending.clone()));
        Self {
            tx,
            pending,
            worker,
        }
    }

    /// Queue a batch; returns immediately
    pub fn submit(&self, batch: Vec<PanelCommand>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        self.pending.fetch_add(count, Ordering::SeqCst);
        if self.tx.send(batch).is_err() {
            self.pending.fetch_sub(count, Ordering::SeqCst);
            tracing::warn!("Command worker has stopped; dropping {} commands", count);
        }
    }

    /// Commands queued or in flight
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// No command queued or in flight
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn drain(
    dispatcher: CommandDispatcher,
    mut rx: mpsc::UnboundedReceiver<Vec<PanelCommand>>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(mut batch) = rx.recv().await {
        let mut queued = batch.len();
        while let Ok(more) = rx.try_recv() {
            queued += more.len();
            batch.extend(more);
        }
        let batch = coalesce(batch);
        let dropped = queued - batch.len();
        if dropped > 0 {
            pending.fetch_sub(dropped, Ordering::SeqCst);
            tracing::debug!("Dropped {} superseded spindle commands", dropped);
        }

        for command in batch {
            let gcode = command.to_string();
            if let Err(e) = dispatcher.send(&gcode).await {
                tracing::error!("Failed to send '{}': {}", gcode, e);
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Drop spindle run commands followed by a later spindle command
pub fn coalesce(commands: Vec<PanelCommand>) -> Vec<PanelCommand> {
    let is_spindle = |c: &PanelCommand| {
        matches!(
            c,
            PanelCommand::SpindleClockwise { .. } | PanelCommand::SpindleStop
        )
    };
    let last_spindle = commands.iter().rposition(is_spindle);

    commands
        .into_iter()
        .enumerate()
        .filter(|(i, c)| {
            !matches!(c, PanelCommand::SpindleClockwise { .. }) || Some(*i) == last_spindle
        })
        .map(|(_, c)| c)
        .collect()
}
