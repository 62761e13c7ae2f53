//! Transfer error types

use thiserror::Error;

use super::types::{format_bytes, TransferDirection};

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Connect to a server first.")]
    NotConnected,

    #[error("Pick a local folder first.")]
    NoLocalDestination,

    #[error("{}", empty_selection_message(.0))]
    EmptySelection(TransferDirection),

    #[error("Free plan upload limit is {}.", quota_label(.limit))]
    QuotaExceeded { limit: u64 },

    #[error("Missing local file for upload.")]
    MissingSource,

    #[error("Listing failed: {0}")]
    Listing(String),

    #[error("{0}")]
    Native(String),

    /// Non-2xx response from the web API; `message` is the response body
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn empty_selection_message(direction: &TransferDirection) -> &'static str {
    match direction {
        TransferDirection::Upload => "Select local files to upload.",
        TransferDirection::Download => "Select remote files to download.",
    }
}

fn quota_label(limit: &u64) -> String {
    format_bytes(*limit)
}

impl TransferError {
    /// Display text including every `source()` in the chain.
    ///
    /// Transport errors often carry the OS-level reason (`ETIMEDOUT`,
    /// `os error 10060`) only in their sources.
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = err.source();
        }
        message
    }
}

// Serializable for IPC hosts
impl serde::Serialize for TransferError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            TransferError::EmptySelection(TransferDirection::Upload).to_string(),
            "Select local files to upload."
        );
        assert_eq!(
            TransferError::EmptySelection(TransferDirection::Download).to_string(),
            "Select remote files to download."
        );
        assert_eq!(
            TransferError::QuotaExceeded {
                limit: 25 * 1024 * 1024
            }
            .to_string(),
            "Free plan upload limit is 25 MB."
        );
    }

    #[test]
    fn test_full_message_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "connect ETIMEDOUT 10.0.0.1:21");
        let err = TransferError::Io(io);
        assert!(err.full_message().contains("ETIMEDOUT"));
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&TransferError::NotConnected).unwrap();
        assert_eq!(json, "\"Connect to a server first.\"");
    }
}
