//! Directory listing snapshots
//!
//! The panes publish what they currently show; enqueue operations resolve
//! selections against these snapshots, which may be stale.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::path_utils::is_local_destination;
use super::types::BrowserFile;

/// Local pane entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEntry {
    pub name: String,
    /// Full local path; the selection key for uploads
    pub path: String,
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
    /// In-memory content picked in a browser session
    #[serde(skip)]
    pub file: Option<BrowserFile>,
}

impl LocalEntry {
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: false,
            size: Some(size),
            file: None,
        }
    }

    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: true,
            size: None,
            file: None,
        }
    }

    /// Browser-picked file backed by in-memory bytes
    pub fn in_memory(file: BrowserFile) -> Self {
        Self {
            name: file.name.clone(),
            path: file.name.clone(),
            is_dir: false,
            size: Some(file.len()),
            file: Some(file),
        }
    }
}

/// Remote pane entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Selection key for downloads
    pub name: String,
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
        }
    }
}

/// Working directory plus its entries
#[derive(Debug, Clone)]
pub struct DirectorySnapshot<E> {
    pub cwd: String,
    pub entries: Vec<E>,
}

// Manual impl: a derive would require `E: Default`
impl<E> Default for DirectorySnapshot<E> {
    fn default() -> Self {
        Self {
            cwd: String::new(),
            entries: Vec::new(),
        }
    }
}

/// Latest local and remote listings
#[derive(Default)]
pub struct Listings {
    local: RwLock<DirectorySnapshot<LocalEntry>>,
    remote: RwLock<DirectorySnapshot<RemoteEntry>>,
}

impl Listings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local(&self, cwd: impl Into<String>, entries: Vec<LocalEntry>) {
        *self.local.write() = DirectorySnapshot {
            cwd: cwd.into(),
            entries,
        };
    }

    pub fn set_remote(&self, cwd: impl Into<String>, entries: Vec<RemoteEntry>) {
        *self.remote.write() = DirectorySnapshot {
            cwd: cwd.into(),
            entries,
        };
    }

    pub fn local(&self) -> DirectorySnapshot<LocalEntry> {
        self.local.read().clone()
    }

    pub fn remote(&self) -> DirectorySnapshot<RemoteEntry> {
        self.remote.read().clone()
    }

    /// Whether the local pane points at a real folder
    pub fn has_local_destination(&self) -> bool {
        is_local_destination(&self.local.read().cwd)
    }
}
