//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::activity::DEFAULT_ACTIVITY_CAPACITY;

/// Free-tier upload size limit: 25 MB
pub const FREE_UPLOAD_LIMIT_BYTES: u64 = 25 * 1024 * 1024;

/// Progress flush interval for native transfer events
pub const DEFAULT_PROGRESS_FLUSH_MS: u64 = 500;

/// Transfer layer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    /// Base URL of the web transfer API (no trailing slash)
    #[serde(default)]
    pub api_base: String,

    /// Largest file a free-tier browser session may upload
    #[serde(default = "default_free_upload_limit")]
    pub free_upload_limit_bytes: u64,

    /// How often buffered progress is folded into the queue
    #[serde(default = "default_progress_flush_ms")]
    pub progress_flush_interval_ms: u64,

    /// Number of activity log entries retained
    #[serde(default = "default_activity_capacity")]
    pub activity_log_capacity: usize,

    /// Premium upload bandwidth cap in KB/s (0 = unlimited)
    #[serde(default)]
    pub upload_limit_kbps: u32,

    /// Premium download bandwidth cap in KB/s (0 = unlimited)
    #[serde(default)]
    pub download_limit_kbps: u32,

    /// Timeout for a single HTTP transfer request
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_free_upload_limit() -> u64 {
    FREE_UPLOAD_LIMIT_BYTES
}

fn default_progress_flush_ms() -> u64 {
    DEFAULT_PROGRESS_FLUSH_MS
}

fn default_activity_capacity() -> usize {
    DEFAULT_ACTIVITY_CAPACITY
}

fn default_http_timeout() -> u64 {
    600
}

impl TransferConfig {
    pub fn progress_flush_interval(&self) -> Duration {
        Duration::from_millis(self.progress_flush_interval_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// API base with any trailing slashes removed
    pub fn normalized_api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            free_upload_limit_bytes: default_free_upload_limit(),
            progress_flush_interval_ms: default_progress_flush_ms(),
            activity_log_capacity: default_activity_capacity(),
            upload_limit_kbps: 0,
            download_limit_kbps: 0,
            http_timeout_secs: default_http_timeout(),
        }
    }
}
