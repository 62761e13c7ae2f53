//! Native bridge (desktop)
//!
//! The desktop host owns the FTP connection and exposes a handful of
//! primitives. Transfers are fire-and-forget: `upload_file`/`download_file`
//! return once the transfer is dispatched, and its outcome arrives later as
//! [`NativeEvent`]s correlated by transfer id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::error::TransferError;
use super::types::RecursiveListingEntry;
use crate::activity::LogEntry;

/// Primitives provided by the desktop host
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Dispatch an upload; progress and result arrive as events keyed by `id`
    async fn upload_file(
        &self,
        id: &str,
        local_path: &str,
        remote_path: &str,
    ) -> Result<(), TransferError>;

    /// Dispatch a download; progress and result arrive as events keyed by `id`
    async fn download_file(
        &self,
        id: &str,
        remote_path: &str,
        local_path: &str,
    ) -> Result<(), TransferError>;

    async fn list_local_files_recursive(
        &self,
        root: &str,
    ) -> Result<Vec<RecursiveListingEntry>, TransferError>;

    async fn list_remote_files_recursive(
        &self,
        path: &str,
    ) -> Result<Vec<RecursiveListingEntry>, TransferError>;

    /// Create a remote directory; callers tolerate "already exists" failures
    async fn create_dir(&self, path: &str) -> Result<(), TransferError>;

    /// Create a local directory; callers tolerate "already exists" failures
    async fn create_local_dir(&self, path: &str) -> Result<(), TransferError>;
}

/// `transfer-progress` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub id: String,
    pub transferred: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `transfer-complete` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePayload {
    pub id: String,
}

/// `transfer-error` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub id: String,
    pub message: String,
}

/// Inbound event from the desktop host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum NativeEvent {
    Log(LogEntry),
    TransferProgress(ProgressPayload),
    TransferComplete(CompletePayload),
    TransferError(ErrorPayload),
}

impl NativeEvent {
    pub fn progress(id: impl Into<String>, transferred: u64, total: Option<u64>) -> Self {
        Self::TransferProgress(ProgressPayload {
            id: id.into(),
            transferred,
            total,
        })
    }

    pub fn complete(id: impl Into<String>) -> Self {
        Self::TransferComplete(CompletePayload { id: id.into() })
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransferError(ErrorPayload {
            id: id.into(),
            message: message.into(),
        })
    }
}

pub type EventSender = mpsc::UnboundedSender<NativeEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<NativeEvent>;

/// Channel the host pushes native events into
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
