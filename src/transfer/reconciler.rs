//! Event Reconciler (desktop)
//!
//! Consumes native transfer events and folds them into the queue:
//! - progress is buffered per id (latest wins) and flushed on a fixed tick,
//!   so a chatty transfer costs one queue mutation per interval
//! - completion and failure apply immediately
//! - host log entries go to the activity log
//!
//! Buffered progress is flushed one last time on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::bridge::{EventReceiver, NativeEvent, ProgressPayload};
use super::queue::TransferQueue;
use crate::activity::ActivityLog;

/// Handle to a running reconciler task
pub struct EventReconciler {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EventReconciler {
    /// Spawn the consumer loop for `events`
    pub fn spawn(
        queue: Arc<TransferQueue>,
        activity: Arc<ActivityLog>,
        events: EventReceiver,
        flush_interval: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(reconcile_loop(
            queue,
            activity,
            events,
            flush_interval,
            stop_rx,
        ));

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stop the loop and wait for the final flush
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for EventReconciler {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn reconcile_loop(
    queue: Arc<TransferQueue>,
    activity: Arc<ActivityLog>,
    mut events: EventReceiver,
    flush_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut pending: HashMap<String, ProgressPayload> = HashMap::new();
    let mut interval = tokio::time::interval(flush_interval);
    // Skip the immediate first tick
    interval.tick().await;

    debug!("Event reconciler started (flush every {:?})", flush_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                flush(&queue, &mut pending);
            }
            event = events.recv() => match event {
                Some(event) => handle_event(&queue, &activity, &mut pending, event),
                None => {
                    debug!("Native event channel closed");
                    break;
                }
            },
            _ = &mut stop_rx => {
                while let Ok(event) = events.try_recv() {
                    handle_event(&queue, &activity, &mut pending, event);
                }
                debug!("Event reconciler stopping");
                break;
            }
        }
    }

    flush(&queue, &mut pending);
}

fn handle_event(
    queue: &TransferQueue,
    activity: &ActivityLog,
    pending: &mut HashMap<String, ProgressPayload>,
    event: NativeEvent,
) {
    match event {
        NativeEvent::Log(entry) => activity.push(entry),
        NativeEvent::TransferProgress(progress) => {
            trace!("Progress {} {}/{:?}", progress.id, progress.transferred, progress.total);
            pending.insert(progress.id.clone(), progress);
        }
        NativeEvent::TransferComplete(done) => {
            if let Some(progress) = pending.remove(&done.id) {
                queue.apply_progress(&done.id, progress.transferred, progress.total);
            }
            queue.mark_done(&done.id);
        }
        NativeEvent::TransferError(failed) => {
            if let Some(progress) = pending.remove(&failed.id) {
                queue.apply_progress(&failed.id, progress.transferred, progress.total);
            }
            if queue.mark_error(&failed.id, failed.message.clone()) {
                activity.error(failed.message);
            }
        }
    }
}

fn flush(queue: &TransferQueue, pending: &mut HashMap<String, ProgressPayload>) {
    if pending.is_empty() {
        return;
    }
    let changed = queue.apply_progress_batch(pending);
    trace!("Flushed {} progress update(s), {} applied", pending.len(), changed);
    pending.clear();
}
