//! Transfer data types

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Transfer item status
///
/// `Queued -> Active -> Done | Error`, `Error -> Queued` on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Waiting for an admission slot
    Queued,
    /// Admitted and running
    Active,
    /// Completed successfully
    Done,
    /// Failed, see `message`
    Error,
}

/// In-memory upload source (browser context)
#[derive(Clone)]
pub struct BrowserFile {
    pub name: String,
    pub data: Bytes,
}

impl BrowserFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for BrowserFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserFile")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One queued, running or finished file transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferItem {
    /// Correlation key for every progress/completion/error event
    pub id: String,
    pub direction: TransferDirection,
    /// Base name shown in the queue
    pub name: String,
    pub local_path: String,
    pub remote_path: String,
    pub status: TransferStatus,
    pub transferred: u64,
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub source: Option<BrowserFile>,
}

impl TransferItem {
    /// Create a queued item with a fresh id
    pub fn new(
        direction: TransferDirection,
        name: impl Into<String>,
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
        total: Option<u64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            direction,
            name: name.into(),
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            status: TransferStatus::Queued,
            transferred: 0,
            total,
            message: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<BrowserFile>) -> Self {
        self.source = source;
        self
    }

    /// Completion percentage (0-100)
    ///
    /// `Done` always reports 100, even when the total size was never known.
    pub fn percent(&self) -> f64 {
        match (self.status, self.total) {
            (TransferStatus::Done, _) => 100.0,
            (_, Some(0)) | (_, None) => 0.0,
            (_, Some(total)) => (self.transferred.min(total) as f64 / total as f64) * 100.0,
        }
    }

    /// `Queued -> Active`
    pub(crate) fn activate(&mut self) -> bool {
        if self.status != TransferStatus::Queued {
            return false;
        }
        self.status = TransferStatus::Active;
        true
    }

    /// Fold a progress report into an active item.
    ///
    /// `transferred` never decreases and is clamped to a known `total`.
    pub(crate) fn apply_progress(&mut self, transferred: u64, total: Option<u64>) -> bool {
        if self.status != TransferStatus::Active {
            return false;
        }
        let next_total = total.or(self.total);
        let mut next = transferred.max(self.transferred);
        if let Some(total) = next_total {
            next = next.min(total);
        }
        if next == self.transferred && next_total == self.total {
            return false;
        }
        self.transferred = next;
        self.total = next_total;
        true
    }

    /// `Active -> Done`
    pub(crate) fn complete(&mut self) -> bool {
        if self.status != TransferStatus::Active {
            return false;
        }
        self.status = TransferStatus::Done;
        self.transferred = self.total.unwrap_or(self.transferred);
        self.message = None;
        true
    }

    /// `Active -> Error`, keeping the last known byte count
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status != TransferStatus::Active {
            return false;
        }
        self.status = TransferStatus::Error;
        self.message = Some(message.into());
        true
    }

    /// `Error -> Queued`
    pub(crate) fn reset_for_retry(&mut self) -> bool {
        if self.status != TransferStatus::Error {
            return false;
        }
        self.status = TransferStatus::Queued;
        self.transferred = 0;
        self.message = None;
        true
    }
}

/// One entry of a recursive directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveListingEntry {
    /// Slash-separated path relative to the listing root
    pub relative_path: String,
    pub is_dir: bool,
    /// `None` for directories
    pub size: Option<u64>,
}

impl RecursiveListingEntry {
    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.relative_path)
    }
}

/// Human-readable byte size (`25 MB`, `1.5 KB`)
pub fn format_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if value == 0 {
        return "0 B".to_string();
    }

    let mut exponent = 0usize;
    let mut scale = 1u64;
    while exponent < UNITS.len() - 1 && value / scale >= 1024 {
        scale *= 1024;
        exponent += 1;
    }

    let num = value as f64 / scale as f64;
    if num < 10.0 && exponent > 0 {
        format!("{:.1} {}", num, UNITS[exponent])
    } else {
        format!("{:.0} {}", num, UNITS[exponent])
    }
}
