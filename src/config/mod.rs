//! Configuration Module
//!
//! Transfer settings: API base, quota, flush interval, bandwidth caps.
//! Hosts deserialize [`TransferConfig`] from whatever source they own;
//! missing fields take their defaults.

pub mod types;

pub use types::{TransferConfig, DEFAULT_PROGRESS_FLUSH_MS, FREE_UPLOAD_LIMIT_BYTES};
