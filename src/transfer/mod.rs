//! Transfer Module
//!
//! Queue, scheduling and execution of file transfers between the local and
//! remote panes. Desktop sessions drive a native bridge and reconcile its
//! events; browser sessions go through the web API.

pub mod bridge;
pub mod error;
pub mod executor;
pub mod expansion;
pub mod fallback;
pub mod listing;
pub mod local_fs;
pub mod path_utils;
pub mod queue;
pub mod reconciler;
pub mod scheduler;
pub mod types;
pub mod web;

pub use bridge::{event_channel, EventReceiver, EventSender, NativeBridge, NativeEvent};
pub use error::TransferError;
pub use executor::{ExecutionOutcome, NativeExecutor, TransferExecutor, WebExecutor};
pub use fallback::{should_fallback_to_sftp, with_sftp_fallback};
pub use listing::{DirectorySnapshot, Listings, LocalEntry, RemoteEntry};
pub use queue::{QueueSnapshot, TransferQueue};
pub use reconciler::EventReconciler;
pub use scheduler::TransferScheduler;
pub use types::{
    format_bytes, BrowserFile, RecursiveListingEntry, TransferDirection, TransferItem,
    TransferStatus,
};
pub use web::{DownloadSink, HttpWebApi, MemoryDownloadSink, WebApi};
