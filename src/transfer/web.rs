//! Web transfer API (browser context)
//!
//! Transfers go through the HTTP backend, one request per file:
//! - `POST {api_base}/api/ftp/upload`: multipart form with the connection
//!   fields and the file part
//! - `POST {api_base}/api/ftp/download`: JSON body, binary response
//!
//! A non-2xx response carries the error text in its body.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use reqwest::multipart;
use serde::Serialize;
use tracing::debug;

use super::error::TransferError;
use super::types::{BrowserFile, TransferItem};
use crate::config::TransferConfig;
use crate::connection::{ConnectionConfig, Protocol, Tier};

/// Upload request for one file
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub connection: ConnectionConfig,
    pub remote_path: String,
    pub tier: Tier,
    /// Sent only when set (premium bandwidth cap)
    pub upload_limit_kbps: Option<u32>,
    pub file: BrowserFile,
    /// File name for the multipart part
    pub file_name: String,
}

impl UploadRequest {
    /// Form fields in wire order, excluding the file part
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("host", self.connection.host.clone()),
            ("port", self.connection.port.to_string()),
            ("username", self.connection.username.clone()),
            ("password", self.connection.password.clone()),
            ("remotePath", self.remote_path.clone()),
            ("protocol", self.connection.protocol.to_string()),
            ("sftpPort", self.connection.sftp_port.to_string()),
            ("tier", self.tier.as_str().to_string()),
        ];
        if let Some(kbps) = self.upload_limit_kbps {
            fields.push(("uploadLimitKbps", kbps.to_string()));
        }
        fields
    }
}

/// JSON body of a download request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub remote_path: String,
    pub filename: String,
    pub tier: Tier,
    pub download_limit_kbps: u32,
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sftp_port: Option<u16>,
}

impl DownloadRequest {
    pub fn new(
        connection: &ConnectionConfig,
        remote_path: impl Into<String>,
        filename: impl Into<String>,
        tier: Tier,
        download_limit_kbps: u32,
    ) -> Self {
        Self {
            host: connection.host.clone(),
            port: connection.port,
            username: connection.username.clone(),
            password: connection.password.clone(),
            remote_path: remote_path.into(),
            filename: filename.into(),
            tier,
            download_limit_kbps,
            protocol: connection.protocol,
            sftp_port: match connection.protocol {
                Protocol::Sftp => Some(connection.sftp_port),
                Protocol::Ftp => None,
            },
        }
    }
}

/// HTTP surface of the web backend
#[async_trait]
pub trait WebApi: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<(), TransferError>;

    async fn download(&self, request: DownloadRequest) -> Result<Bytes, TransferError>;
}

/// `reqwest`-backed [`WebApi`]
pub struct HttpWebApi {
    client: reqwest::Client,
    api_base: String,
}

impl HttpWebApi {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Client for `config.api_base` with `config.http_timeout()`
    pub fn from_config(config: &TransferConfig) -> Result<Self, TransferError> {
        Self::new(config.normalized_api_base(), config.http_timeout())
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/ftp/{}", self.api_base, name)
    }
}

/// Turn a non-2xx response into [`TransferError::Http`] carrying its body text
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, TransferError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = if text.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text
    };

    Err(TransferError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl WebApi for HttpWebApi {
    async fn upload(&self, request: UploadRequest) -> Result<(), TransferError> {
        let mut form = multipart::Form::new();
        for (name, value) in request.fields() {
            form = form.text(name, value);
        }

        let part = multipart::Part::stream_with_length(
            reqwest::Body::from(request.file.data.clone()),
            request.file.len(),
        )
        .file_name(request.file_name.clone())
        .mime_str("application/octet-stream")?;
        form = form.part("file", part);

        debug!(
            "POST upload {} ({} bytes) via {}",
            request.remote_path,
            request.file.len(),
            request.connection.protocol
        );

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn download(&self, request: DownloadRequest) -> Result<Bytes, TransferError> {
        debug!(
            "POST download {} via {}",
            request.remote_path, request.protocol
        );

        let response = self
            .client
            .post(self.endpoint("download"))
            .json(&request)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.bytes().await?)
    }
}

/// Receives downloaded bodies in the browser context
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, item: &TransferItem, data: Bytes) -> Result<(), TransferError>;
}

/// Keeps downloaded bodies in memory, keyed by transfer id
#[derive(Default)]
pub struct MemoryDownloadSink {
    files: DashMap<String, (String, Bytes)>,
}

impl MemoryDownloadSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// File name and body of a finished download
    pub fn get(&self, id: &str) -> Option<(String, Bytes)> {
        self.files.get(id).map(|entry| entry.value().clone())
    }

    /// Remove and return a finished download
    pub fn take(&self, id: &str) -> Option<(String, Bytes)> {
        self.files.remove(id).map(|(_, file)| file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl DownloadSink for MemoryDownloadSink {
    async fn save(&self, item: &TransferItem, data: Bytes) -> Result<(), TransferError> {
        self.files
            .insert(item.id.clone(), (item.name.clone(), data));
        Ok(())
    }
}
