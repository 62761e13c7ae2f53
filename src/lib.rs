//! FtpDeck - transfer orchestration core
//!
//! Owns the transfer queue of the dual-pane FTP/SFTP file manager: enqueueing,
//! recursive folder expansion, bounded concurrent execution over the native
//! bridge (desktop) or the HTTP API (browser), FTP to SFTP fallback, and
//! reconciliation of native progress/completion events.

pub mod activity;
pub mod config;
pub mod connection;
pub mod transfer;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use activity::{ActivityLog, LogEntry, LogLevel};
pub use config::TransferConfig;
pub use connection::{ConnectionConfig, ConnectionProvider, ExecutionContext, Protocol, Tier};
pub use transfer::{
    EventReconciler, TransferDirection, TransferError, TransferItem, TransferQueue,
    TransferScheduler, TransferStatus,
};

/// Initialize logging
///
/// Honors `RUST_LOG`; falls back to `info`. Safe to call once per process.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
