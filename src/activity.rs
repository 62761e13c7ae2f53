//! Activity Log
//!
//! User-visible log of transfer events. Entries are kept newest-first in a
//! bounded buffer and mirrored to `tracing` so they also land in the
//! process log.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::TransferConfig;

/// Default number of entries retained
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 200;

/// Log level as shown in the activity panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

/// Single activity log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Milliseconds since Unix epoch
    pub timestamp: i64,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Bounded, newest-first activity log
pub struct ActivityLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Log sized by `config.activity_log_capacity`
    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.activity_log_capacity)
    }

    /// Record an entry, evicting the oldest one when full
    pub fn push(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Error => error!(target: "activity", "{}", entry.message),
            LogLevel::Warn => warn!(target: "activity", "{}", entry.message),
            LogLevel::Info | LogLevel::Success => info!(target: "activity", "{}", entry.message),
        }

        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogEntry::now(LogLevel::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(LogEntry::now(LogLevel::Success, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogEntry::now(LogLevel::Error, message));
    }

    /// Snapshot of all entries, newest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}
