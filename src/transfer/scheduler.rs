//! Transfer Scheduler
//!
//! Owned per application session. Turns pane selections into queued items,
//! runs the admission loop that promotes queued items under the concurrency
//! cap, and exposes the queue management actions.
//!
//! Desktop sessions also own the [`EventReconciler`] that applies native
//! transfer events. Browser sessions finish each transfer in-task.
//!
//! Constructors spawn tasks and must be called inside a tokio runtime.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::bridge::{EventReceiver, NativeBridge};
use super::error::TransferError;
use super::executor::{ExecutionOutcome, NativeExecutor, TransferExecutor, WebExecutor};
use super::expansion::{expand_download, expand_upload};
use super::listing::Listings;
use super::path_utils::{join_local_path, join_remote_path, remote_base, BROWSER_DESTINATION};
use super::queue::{QueueSnapshot, TransferQueue};
use super::reconciler::EventReconciler;
use super::types::{format_bytes, TransferDirection, TransferItem};
use super::web::{DownloadSink, WebApi};
use crate::activity::ActivityLog;
use crate::config::TransferConfig;
use crate::connection::ConnectionProvider;

pub struct TransferScheduler {
    queue: Arc<TransferQueue>,
    connection: Arc<ConnectionProvider>,
    listings: Arc<Listings>,
    activity: Arc<ActivityLog>,
    /// Folder expansion primitives; desktop only
    bridge: Option<Arc<dyn NativeBridge>>,
    reconciler: Option<EventReconciler>,
    config: TransferConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl TransferScheduler {
    /// Desktop session: transfers go through `bridge`, outcomes arrive on `events`
    pub fn desktop(
        connection: Arc<ConnectionProvider>,
        listings: Arc<Listings>,
        activity: Arc<ActivityLog>,
        config: TransferConfig,
        bridge: Arc<dyn NativeBridge>,
        events: EventReceiver,
    ) -> Self {
        let executor = Arc::new(NativeExecutor::new(bridge.clone()));
        let mut scheduler = Self::with_executor(
            connection,
            listings,
            activity,
            config,
            Some(bridge),
            executor,
        );
        scheduler.reconciler = Some(EventReconciler::spawn(
            scheduler.queue.clone(),
            scheduler.activity.clone(),
            events,
            scheduler.config.progress_flush_interval(),
        ));
        scheduler
    }

    /// Browser session: transfers go through the web API
    pub fn browser(
        connection: Arc<ConnectionProvider>,
        listings: Arc<Listings>,
        activity: Arc<ActivityLog>,
        config: TransferConfig,
        api: Arc<dyn WebApi>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let executor = Arc::new(WebExecutor::new(
            api,
            sink,
            connection.clone(),
            config.clone(),
        ));
        Self::with_executor(connection, listings, activity, config, None, executor)
    }

    /// Session with a caller-supplied executor
    pub fn with_executor(
        connection: Arc<ConnectionProvider>,
        listings: Arc<Listings>,
        activity: Arc<ActivityLog>,
        config: TransferConfig,
        bridge: Option<Arc<dyn NativeBridge>>,
        executor: Arc<dyn TransferExecutor>,
    ) -> Self {
        let queue = Arc::new(TransferQueue::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let max_active = connection.context().max_concurrent();

        tokio::spawn(admission_loop(
            queue.clone(),
            executor,
            activity.clone(),
            max_active,
            shutdown_rx,
        ));
        info!(
            "Transfer scheduler started ({:?}, max {} active)",
            connection.context(),
            max_active
        );

        Self {
            queue,
            connection,
            listings,
            activity,
            bridge,
            reconciler: None,
            config,
            shutdown_tx,
        }
    }

    pub fn queue(&self) -> &Arc<TransferQueue> {
        &self.queue
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueSnapshot> {
        self.queue.subscribe()
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    pub fn listings(&self) -> &Arc<Listings> {
        &self.listings
    }

    pub fn connection(&self) -> &Arc<ConnectionProvider> {
        &self.connection
    }

    /// Bridge used for folder expansion, if this session supports it
    fn folder_bridge(&self) -> Option<&Arc<dyn NativeBridge>> {
        self.bridge
            .as_ref()
            .filter(|_| self.connection.context().is_desktop())
    }

    /// Log `error` to the activity log and return it
    fn reject<T>(&self, error: TransferError) -> Result<T, TransferError> {
        self.activity.error(error.to_string());
        Err(error)
    }

    fn ensure_connected(&self) -> Result<(), TransferError> {
        if self.connection.is_connected() {
            Ok(())
        } else {
            self.reject(TransferError::NotConnected)
        }
    }

    /// Queue uploads for the local entries whose paths are in `paths`.
    ///
    /// Folders are expanded recursively (desktop only). Returns the ids of
    /// the new items in queue order.
    pub async fn enqueue_upload_paths(
        &self,
        paths: &[String],
    ) -> Result<Vec<String>, TransferError> {
        self.ensure_connected()?;

        let desktop = self.connection.context().is_desktop();
        let premium = self.connection.tier().is_premium();
        let limit = self.config.free_upload_limit_bytes;
        let local = self.listings.local();
        let remote = self.listings.remote();
        let remote_cwd = remote_base(&remote.cwd);

        let mut batch = Vec::new();
        let mut blocked = 0usize;

        for path in paths {
            let Some(entry) = local.entries.iter().find(|e| &e.path == path) else {
                continue;
            };

            if entry.is_dir {
                let Some(bridge) = self.folder_bridge() else {
                    self.activity.info(format!(
                        "Folder upload \"{}\" is only supported in the desktop app.",
                        entry.name
                    ));
                    continue;
                };
                let remote_root = join_remote_path(remote_cwd, &entry.name);
                match expand_upload(bridge.as_ref(), &entry.path, &remote_root).await {
                    Ok(items) => batch.extend(items),
                    Err(e) => self.activity.error(format!(
                        "Failed to list folder \"{}\": {}",
                        entry.name, e
                    )),
                }
                continue;
            }

            if !desktop && !premium && entry.size.unwrap_or(0) > limit {
                blocked += 1;
                continue;
            }

            batch.push(
                TransferItem::new(
                    TransferDirection::Upload,
                    entry.name.clone(),
                    entry.path.clone(),
                    join_remote_path(remote_cwd, &entry.name),
                    entry.size,
                )
                .with_source(entry.file.clone()),
            );
        }

        if blocked > 0 {
            self.activity.info(format!(
                "Free plan limit: {} file{} over {} were skipped.",
                blocked,
                if blocked == 1 { "" } else { "s" },
                format_bytes(limit)
            ));
        }

        if batch.is_empty() {
            return self.reject(TransferError::EmptySelection(TransferDirection::Upload));
        }
        Ok(self.queue.push_batch(batch))
    }

    /// Queue downloads for the remote entries whose names are in `names`.
    ///
    /// Desktop downloads land in the current local folder; browser downloads
    /// go to the download sink.
    pub async fn enqueue_download_names(
        &self,
        names: &[String],
    ) -> Result<Vec<String>, TransferError> {
        self.ensure_connected()?;

        let desktop = self.connection.context().is_desktop();
        if desktop && !self.listings.has_local_destination() {
            return self.reject(TransferError::NoLocalDestination);
        }
        let local = self.listings.local();
        let remote = self.listings.remote();
        let remote_cwd = remote_base(&remote.cwd);

        let mut batch = Vec::new();

        for name in names {
            let Some(entry) = remote.entries.iter().find(|e| &e.name == name) else {
                continue;
            };
            let remote_path = join_remote_path(remote_cwd, &entry.name);

            if entry.is_dir {
                let Some(bridge) = self.folder_bridge() else {
                    self.activity.info(format!(
                        "Folder download \"{}\" is only supported in the desktop app.",
                        entry.name
                    ));
                    continue;
                };
                let local_root = join_local_path(&local.cwd, &entry.name);
                match expand_download(bridge.as_ref(), &remote_path, &local_root).await {
                    Ok(items) => batch.extend(items),
                    Err(e) => self.activity.error(format!(
                        "Failed to list remote folder \"{}\": {}",
                        entry.name, e
                    )),
                }
                continue;
            }

            let local_path = if desktop {
                join_local_path(&local.cwd, &entry.name)
            } else {
                BROWSER_DESTINATION.to_string()
            };
            batch.push(TransferItem::new(
                TransferDirection::Download,
                entry.name.clone(),
                local_path,
                remote_path,
                entry.size,
            ));
        }

        if batch.is_empty() {
            return self.reject(TransferError::EmptySelection(TransferDirection::Download));
        }
        Ok(self.queue.push_batch(batch))
    }

    /// Remove finished items
    pub fn clear_completed(&self) -> usize {
        let removed = self.queue.clear_completed();
        debug!("Cleared {} completed transfer(s)", removed);
        removed
    }

    /// Remove items still waiting for a slot
    pub fn cancel_queued(&self) -> usize {
        let removed = self.queue.cancel_queued();
        debug!("Cancelled {} queued transfer(s)", removed);
        removed
    }

    /// Requeue every failed item in place
    pub fn retry_failed(&self) -> usize {
        let requeued = self.queue.retry_failed();
        if requeued > 0 {
            self.activity
                .info(format!("Retrying {} failed transfer(s).", requeued));
        }
        requeued
    }

    /// Requeue one failed item in place
    pub fn retry(&self, id: &str) -> bool {
        self.queue.retry(id)
    }

    /// Remove everything except running transfers
    pub fn clear_all(&self) -> usize {
        let removed = self.queue.clear_all();
        debug!("Cleared {} transfer(s)", removed);
        removed
    }

    /// Stop admitting new work and wait for the final progress flush.
    ///
    /// Transfers already running are not interrupted.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(reconciler) = self.reconciler.take() {
            reconciler.shutdown().await;
        }
        info!("Transfer scheduler stopped");
    }
}

impl Drop for TransferScheduler {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn admission_loop(
    queue: Arc<TransferQueue>,
    executor: Arc<dyn TransferExecutor>,
    activity: Arc<ActivityLog>,
    max_active: usize,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut changes = queue.subscribe();

    loop {
        changes.borrow_and_update();
        while let Some(item) = queue.admit_next(max_active) {
            debug!("Admitted {:?} {} ({})", item.direction, item.name, item.id);
            tokio::spawn(run_transfer(
                queue.clone(),
                executor.clone(),
                activity.clone(),
                item,
            ));
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }

    debug!("Admission loop stopped");
}

async fn run_transfer(
    queue: Arc<TransferQueue>,
    executor: Arc<dyn TransferExecutor>,
    activity: Arc<ActivityLog>,
    item: TransferItem,
) {
    match executor.execute(&item).await {
        Ok(ExecutionOutcome::Dispatched) => {}
        Ok(ExecutionOutcome::Finished) => {
            if queue.mark_done(&item.id) {
                let verb = match item.direction {
                    TransferDirection::Upload => "Uploaded",
                    TransferDirection::Download => "Downloaded",
                };
                activity.success(format!("{} {}", verb, item.name));
            }
        }
        Err(e) => {
            let message = e.to_string();
            warn!("Transfer {} ({}) failed: {}", item.name, item.id, e.full_message());
            activity.error(message.clone());
            queue.mark_error(&item.id, message);
        }
    }
}
