//! FTP to SFTP fallback
//!
//! Some networks block plain FTP (passive data ports, port 21 itself). When a
//! transfer fails with one of the known network signatures and the session is
//! FTP, the same transfer is retried exactly once over SFTP on port 22.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::error::TransferError;
use crate::connection::ConnectionConfig;

// DNS failure, WSAETIMEDOUT, connect failure, rejected PASV reply, 425, socket timeout
static FALLBACK_SIGNATURES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)ENOTFOUND|10060|Failed to establish connection|Invalid response: \[227\]|425|ETIMEDOUT",
    )
    .expect("fallback signature pattern is valid")
});

/// Check whether a failure message warrants an SFTP retry
pub fn should_fallback_to_sftp(message: &str) -> bool {
    FALLBACK_SIGNATURES.is_match(message)
}

/// Run `transfer` with `config`; on a fallback-eligible failure over FTP,
/// run it once more with the SFTP variant of `config`.
///
/// The second attempt's result is returned as-is.
pub async fn with_sftp_fallback<T, F, Fut>(
    config: &ConnectionConfig,
    label: &str,
    transfer: F,
) -> Result<T, TransferError>
where
    F: Fn(ConnectionConfig) -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let error = match transfer(config.clone()).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let message = error.full_message();
    if !should_fallback_to_sftp(&message) {
        return Err(error);
    }
    let Some(fallback) = config.sftp_fallback() else {
        return Err(error);
    };

    info!(
        "Transfer {} failed over {} ({}), retrying over SFTP port {}",
        label, config.protocol, message, fallback.sftp_port
    );

    let result = transfer(fallback).await;
    if let Err(ref e) = result {
        warn!("SFTP fallback for {} failed: {}", label, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Protocol;
    use std::sync::{Arc, Mutex};

    fn ftp_config() -> ConnectionConfig {
        ConnectionConfig {
            host: "ftp.example.com".into(),
            username: "demo".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_signatures() {
        assert!(should_fallback_to_sftp("getaddrinfo ENOTFOUND ftp.example.com"));
        assert!(should_fallback_to_sftp("connect etimedout 10.0.0.1:21"));
        assert!(should_fallback_to_sftp("os error 10060"));
        assert!(should_fallback_to_sftp("Failed to establish connection"));
        assert!(should_fallback_to_sftp("Invalid response: [227] Entering Passive Mode"));
        assert!(should_fallback_to_sftp("425 Can't open data connection"));

        assert!(!should_fallback_to_sftp("550 Permission denied"));
        assert!(!should_fallback_to_sftp("530 Login incorrect"));
    }

    #[tokio::test]
    async fn test_fallback_retries_once_over_sftp() {
        let attempts: Arc<Mutex<Vec<(Protocol, u16)>>> = Arc::new(Mutex::new(Vec::new()));

        let result = with_sftp_fallback(&ftp_config(), "a.txt", |cfg| {
            let attempts = attempts.clone();
            async move {
                attempts.lock().unwrap().push((cfg.protocol, cfg.sftp_port));
                match cfg.protocol {
                    Protocol::Ftp => Err(TransferError::Native("connect ETIMEDOUT".into())),
                    Protocol::Sftp => Ok(42u64),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            *attempts.lock().unwrap(),
            vec![(Protocol::Ftp, 22), (Protocol::Sftp, 22)]
        );
    }

    #[tokio::test]
    async fn test_second_failure_surfaces() {
        let calls = Arc::new(Mutex::new(0usize));

        let result: Result<(), _> = with_sftp_fallback(&ftp_config(), "a.txt", |_cfg| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(TransferError::Native("ETIMEDOUT".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(TransferError::Native(_))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_non_matching_error_not_retried() {
        let calls = Arc::new(Mutex::new(0usize));

        let result: Result<(), _> = with_sftp_fallback(&ftp_config(), "a.txt", |_cfg| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(TransferError::Native("550 Permission denied".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sftp_session_not_retried() {
        let calls = Arc::new(Mutex::new(0usize));
        let config = ConnectionConfig {
            protocol: Protocol::Sftp,
            ..ftp_config()
        };

        let result: Result<(), _> = with_sftp_fallback(&config, "a.txt", |_cfg| {
            let calls = calls.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Err(TransferError::Native("ETIMEDOUT".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
