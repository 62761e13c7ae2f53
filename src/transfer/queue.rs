//! Transfer Queue
//!
//! Ordered store of [`TransferItem`]s. The whole item list lives in a
//! `watch` channel: every mutation replaces or edits the list under the
//! channel's lock in one step, observers always see a consistent snapshot,
//! and the admission loop is woken by `changed()`.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;

use super::bridge::ProgressPayload;
use super::types::{TransferItem, TransferStatus};

pub type QueueSnapshot = Vec<TransferItem>;

pub struct TransferQueue {
    items: watch::Sender<QueueSnapshot>,
}

impl TransferQueue {
    pub fn new() -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self { items }
    }

    /// Receiver notified after every mutation
    pub fn subscribe(&self) -> watch::Receiver<QueueSnapshot> {
        self.items.subscribe()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.items.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<TransferItem> {
        self.items.borrow().iter().find(|item| item.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.count(TransferStatus::Active)
    }

    pub fn count(&self, status: TransferStatus) -> usize {
        self.items
            .borrow()
            .iter()
            .filter(|item| item.status == status)
            .count()
    }

    /// Append a batch in enqueue order; returns the new ids
    pub fn push_batch(&self, batch: Vec<TransferItem>) -> Vec<String> {
        let ids: Vec<String> = batch.iter().map(|item| item.id.clone()).collect();
        if batch.is_empty() {
            return ids;
        }
        self.items.send_modify(|items| items.extend(batch));
        debug!("Enqueued {} transfer(s)", ids.len());
        ids
    }

    /// Promote the first queued item to active if fewer than `max_active`
    /// items are active. Check and promotion happen in one mutation.
    pub fn admit_next(&self, max_active: usize) -> Option<TransferItem> {
        let mut admitted = None;
        self.items.send_if_modified(|items| {
            let active = items
                .iter()
                .filter(|item| item.status == TransferStatus::Active)
                .count();
            if active >= max_active {
                return false;
            }
            match items
                .iter_mut()
                .find(|item| item.status == TransferStatus::Queued)
            {
                Some(next) => {
                    next.activate();
                    admitted = Some(next.clone());
                    true
                }
                None => false,
            }
        });
        admitted
    }

    /// Apply `f` to the item with `id`; observers are notified only when
    /// `f` reports a change.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut TransferItem) -> bool) -> bool {
        self.items.send_if_modified(|items| {
            items
                .iter_mut()
                .find(|item| item.id == id)
                .map(f)
                .unwrap_or(false)
        })
    }

    pub fn mark_done(&self, id: &str) -> bool {
        let changed = self.update(id, |item| item.complete());
        if !changed {
            debug!("Ignoring completion for {} (missing or not active)", id);
        }
        changed
    }

    pub fn mark_error(&self, id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let changed = self.update(id, |item| item.fail(message));
        if !changed {
            debug!("Ignoring failure for {} (missing or not active)", id);
        }
        changed
    }

    pub fn apply_progress(&self, id: &str, transferred: u64, total: Option<u64>) -> bool {
        self.update(id, |item| item.apply_progress(transferred, total))
    }

    /// Fold a batch of buffered progress reports in one mutation.
    /// Returns the number of items that changed.
    pub fn apply_progress_batch(&self, updates: &HashMap<String, ProgressPayload>) -> usize {
        if updates.is_empty() {
            return 0;
        }
        let mut changed = 0;
        self.items.send_if_modified(|items| {
            for item in items.iter_mut() {
                if let Some(update) = updates.get(&item.id) {
                    if item.apply_progress(update.transferred, update.total) {
                        changed += 1;
                    }
                }
            }
            changed > 0
        });
        changed
    }

    /// Remove all `done` items
    pub fn clear_completed(&self) -> usize {
        self.remove_where(|item| item.status == TransferStatus::Done)
    }

    /// Remove all `queued` items
    pub fn cancel_queued(&self) -> usize {
        self.remove_where(|item| item.status == TransferStatus::Queued)
    }

    /// Remove everything that is not `active`
    pub fn clear_all(&self) -> usize {
        self.remove_where(|item| item.status != TransferStatus::Active)
    }

    /// Requeue every failed item in place
    pub fn retry_failed(&self) -> usize {
        let mut requeued = 0;
        self.items.send_if_modified(|items| {
            for item in items.iter_mut() {
                if item.reset_for_retry() {
                    requeued += 1;
                }
            }
            requeued > 0
        });
        requeued
    }

    /// Requeue a single failed item in place
    pub fn retry(&self, id: &str) -> bool {
        self.update(id, |item| item.reset_for_retry())
    }

    fn remove_where(&self, predicate: impl Fn(&TransferItem) -> bool) -> usize {
        let mut removed = 0;
        self.items.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            removed = before - items.len();
            removed > 0
        });
        removed
    }
}

impl Default for TransferQueue {
    fn default() -> Self {
        Self::new()
    }
}
