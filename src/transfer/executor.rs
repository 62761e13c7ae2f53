//! Transfer Executor
//!
//! Runs one admitted item. The desktop executor only dispatches to the
//! native bridge; the outcome arrives later through the event reconciler.
//! The web executor performs the whole HTTP transfer, with FTP to SFTP
//! fallback, and finishes before returning.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::bridge::NativeBridge;
use super::error::TransferError;
use super::fallback::with_sftp_fallback;
use super::types::{TransferDirection, TransferItem};
use super::web::{DownloadRequest, DownloadSink, UploadRequest, WebApi};
use crate::config::TransferConfig;
use crate::connection::{ConnectionProvider, Tier};

/// How an execution ended from the scheduler's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Handed off; completion or failure arrives as a native event
    Dispatched,
    /// Transfer finished; the item can be marked done
    Finished,
}

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn execute(&self, item: &TransferItem) -> Result<ExecutionOutcome, TransferError>;
}

/// Desktop executor: fire-and-forget calls on the native bridge
pub struct NativeExecutor {
    bridge: Arc<dyn NativeBridge>,
}

impl NativeExecutor {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl TransferExecutor for NativeExecutor {
    async fn execute(&self, item: &TransferItem) -> Result<ExecutionOutcome, TransferError> {
        match item.direction {
            TransferDirection::Upload => {
                self.bridge
                    .upload_file(&item.id, &item.local_path, &item.remote_path)
                    .await?
            }
            TransferDirection::Download => {
                self.bridge
                    .download_file(&item.id, &item.remote_path, &item.local_path)
                    .await?
            }
        }
        debug!("Dispatched {:?} {} ({})", item.direction, item.name, item.id);
        Ok(ExecutionOutcome::Dispatched)
    }
}

/// Browser executor: one HTTP request per item
pub struct WebExecutor {
    api: Arc<dyn WebApi>,
    sink: Arc<dyn DownloadSink>,
    connection: Arc<ConnectionProvider>,
    config: TransferConfig,
}

impl WebExecutor {
    pub fn new(
        api: Arc<dyn WebApi>,
        sink: Arc<dyn DownloadSink>,
        connection: Arc<ConnectionProvider>,
        config: TransferConfig,
    ) -> Self {
        Self {
            api,
            sink,
            connection,
            config,
        }
    }

    fn upload_limit(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Premium if self.config.upload_limit_kbps > 0 => {
                Some(self.config.upload_limit_kbps)
            }
            _ => None,
        }
    }

    fn download_limit(&self, tier: Tier) -> u32 {
        if tier.is_premium() {
            self.config.download_limit_kbps
        } else {
            0
        }
    }

    async fn upload(&self, item: &TransferItem) -> Result<(), TransferError> {
        let source = item.source.as_ref().ok_or(TransferError::MissingSource)?;
        let tier = self.connection.tier();
        let limit = self.config.free_upload_limit_bytes;
        if !tier.is_premium() && source.len() > limit {
            return Err(TransferError::QuotaExceeded { limit });
        }

        let upload_limit_kbps = self.upload_limit(tier);
        let connection = self.connection.snapshot();
        with_sftp_fallback(&connection, &item.name, |connection| {
            let api = self.api.clone();
            let request = UploadRequest {
                connection,
                remote_path: item.remote_path.clone(),
                tier,
                upload_limit_kbps,
                file: source.clone(),
                file_name: item.name.clone(),
            };
            async move { api.upload(request).await }
        })
        .await
    }

    async fn download(&self, item: &TransferItem) -> Result<(), TransferError> {
        let tier = self.connection.tier();
        let download_limit_kbps = self.download_limit(tier);
        let connection = self.connection.snapshot();

        let data = with_sftp_fallback(&connection, &item.name, |connection| {
            let api = self.api.clone();
            let request = DownloadRequest::new(
                &connection,
                item.remote_path.clone(),
                item.name.clone(),
                tier,
                download_limit_kbps,
            );
            async move { api.download(request).await }
        })
        .await?;

        debug!("Downloaded {} ({} bytes)", item.name, data.len());
        self.sink.save(item, data).await
    }
}

#[async_trait]
impl TransferExecutor for WebExecutor {
    async fn execute(&self, item: &TransferItem) -> Result<ExecutionOutcome, TransferError> {
        match item.direction {
            TransferDirection::Upload => self.upload(item).await?,
            TransferDirection::Download => self.download(item).await?,
        }
        Ok(ExecutionOutcome::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, ExecutionContext, Protocol};
    use crate::transfer::types::BrowserFile;
    use crate::transfer::web::MemoryDownloadSink;
    use bytes::Bytes;
    use parking_lot::Mutex;

    /// Records every request; FTP attempts fail with `ftp_error` when set
    #[derive(Default)]
    struct MockApi {
        ftp_error: Option<String>,
        uploads: Mutex<Vec<UploadRequest>>,
        downloads: Mutex<Vec<DownloadRequest>>,
    }

    #[async_trait]
    impl WebApi for MockApi {
        async fn upload(&self, request: UploadRequest) -> Result<(), TransferError> {
            let protocol = request.connection.protocol;
            self.uploads.lock().push(request);
            match (&self.ftp_error, protocol) {
                (Some(message), Protocol::Ftp) => Err(TransferError::Http {
                    status: 500,
                    message: message.clone(),
                }),
                _ => Ok(()),
            }
        }

        async fn download(&self, request: DownloadRequest) -> Result<Bytes, TransferError> {
            let protocol = request.protocol;
            self.downloads.lock().push(request);
            match (&self.ftp_error, protocol) {
                (Some(message), Protocol::Ftp) => Err(TransferError::Http {
                    status: 500,
                    message: message.clone(),
                }),
                _ => Ok(Bytes::from_static(b"payload")),
            }
        }
    }

    fn provider(tier: Tier) -> Arc<ConnectionProvider> {
        let provider = ConnectionProvider::new(ExecutionContext::Browser);
        provider.set_config(ConnectionConfig {
            host: "ftp.example.com".into(),
            username: "demo".into(),
            password: "pw".into(),
            ..Default::default()
        });
        provider.set_connected(true);
        provider.set_tier(tier);
        Arc::new(provider)
    }

    fn upload_item(size: usize) -> TransferItem {
        let file = BrowserFile::new("a.bin", vec![7u8; size]);
        TransferItem::new(
            TransferDirection::Upload,
            "a.bin",
            "a.bin",
            "/up/a.bin",
            Some(size as u64),
        )
        .with_source(Some(file))
    }

    fn executor(
        api: Arc<MockApi>,
        sink: Arc<MemoryDownloadSink>,
        tier: Tier,
        config: TransferConfig,
    ) -> WebExecutor {
        WebExecutor::new(api, sink, provider(tier), config)
    }

    #[tokio::test]
    async fn test_upload_falls_back_to_sftp() {
        let api = Arc::new(MockApi {
            ftp_error: Some("connect ETIMEDOUT 10.0.0.5:21".into()),
            ..Default::default()
        });
        let exec = executor(
            api.clone(),
            Arc::new(MemoryDownloadSink::new()),
            Tier::Free,
            TransferConfig::default(),
        );

        let outcome = exec.execute(&upload_item(16)).await.unwrap();
        assert_eq!(outcome, ExecutionOutcome::Finished);

        let uploads = api.uploads.lock();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].connection.protocol, Protocol::Ftp);
        assert_eq!(uploads[1].connection.protocol, Protocol::Sftp);
        assert_eq!(uploads[1].connection.sftp_port, 22);
    }

    #[tokio::test]
    async fn test_upload_requires_source() {
        let api = Arc::new(MockApi::default());
        let exec = executor(
            api.clone(),
            Arc::new(MemoryDownloadSink::new()),
            Tier::Free,
            TransferConfig::default(),
        );
        let item = upload_item(4).with_source(None);

        let err = exec.execute(&item).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing local file for upload.");
        assert!(api.uploads.lock().is_empty());
    }

    #[tokio::test]
    async fn test_free_tier_quota_checked_before_request() {
        let api = Arc::new(MockApi::default());
        let config = TransferConfig {
            free_upload_limit_bytes: 8,
            ..Default::default()
        };
        let exec = executor(
            api.clone(),
            Arc::new(MemoryDownloadSink::new()),
            Tier::Free,
            config.clone(),
        );

        let err = exec.execute(&upload_item(9)).await.unwrap_err();
        assert!(matches!(err, TransferError::QuotaExceeded { limit: 8 }));
        assert!(api.uploads.lock().is_empty());

        // Premium skips the quota and sends its bandwidth cap
        let config = TransferConfig {
            upload_limit_kbps: 512,
            ..config
        };
        let exec = executor(
            api.clone(),
            Arc::new(MemoryDownloadSink::new()),
            Tier::Premium,
            config,
        );
        exec.execute(&upload_item(9)).await.unwrap();
        assert_eq!(api.uploads.lock()[0].upload_limit_kbps, Some(512));
    }

    #[tokio::test]
    async fn test_download_saves_to_sink() {
        let api = Arc::new(MockApi::default());
        let sink = Arc::new(MemoryDownloadSink::new());
        let config = TransferConfig {
            download_limit_kbps: 300,
            ..Default::default()
        };
        let exec = executor(api.clone(), sink.clone(), Tier::Free, config);
        let item = TransferItem::new(
            TransferDirection::Download,
            "report.pdf",
            "browser",
            "/docs/report.pdf",
            Some(7),
        );

        exec.execute(&item).await.unwrap();

        let (name, data) = sink.get(&item.id).unwrap();
        assert_eq!(name, "report.pdf");
        assert_eq!(data, Bytes::from_static(b"payload"));

        let downloads = api.downloads.lock();
        assert_eq!(downloads[0].remote_path, "/docs/report.pdf");
        // Free tier never sends a bandwidth cap
        assert_eq!(downloads[0].download_limit_kbps, 0);
    }

    #[tokio::test]
    async fn test_download_non_network_error_not_retried() {
        let api = Arc::new(MockApi {
            ftp_error: Some("550 No such file".into()),
            ..Default::default()
        });
        let sink = Arc::new(MemoryDownloadSink::new());
        let exec = executor(api.clone(), sink.clone(), Tier::Free, TransferConfig::default());
        let item = TransferItem::new(
            TransferDirection::Download,
            "gone.txt",
            "browser",
            "/gone.txt",
            None,
        );

        let err = exec.execute(&item).await.unwrap_err();
        assert_eq!(err.to_string(), "550 No such file");
        assert_eq!(api.downloads.lock().len(), 1);
        assert!(sink.is_empty());
    }
}
