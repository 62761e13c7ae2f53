//! Connection Configuration
//!
//! Holds the current endpoint, credentials and protocol selection and hands
//! out read-only snapshots to transfer operations.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Port used when a transfer falls back to SFTP
pub const SFTP_FALLBACK_PORT: u16 = 22;

/// Wire protocol for the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ftp,
    Sftp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ftp => "ftp",
            Protocol::Sftp => "sftp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where transfers physically run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Native bridge; every transfer shares one connection
    Desktop,
    /// HTTP API; each transfer opens its own request
    Browser,
}

impl ExecutionContext {
    /// Maximum number of simultaneously active transfers
    pub fn max_concurrent(&self) -> usize {
        match self {
            ExecutionContext::Desktop => 1,
            ExecutionContext::Browser => 3,
        }
    }

    pub fn is_desktop(&self) -> bool {
        matches!(self, ExecutionContext::Desktop)
    }
}

/// Account tier, decided outside this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Tier::Premium)
    }
}

/// Remote endpoint configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Remote host address
    pub host: String,

    /// FTP port (default: 21)
    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub protocol: Protocol,

    /// Port used when `protocol` is SFTP (default: 22)
    #[serde(default = "default_sftp_port")]
    pub sftp_port: u16,
}

fn default_port() -> u16 {
    21
}

fn default_sftp_port() -> u16 {
    SFTP_FALLBACK_PORT
}

impl ConnectionConfig {
    /// Same endpoint over SFTP on the fixed fallback port.
    ///
    /// Returns `None` when the configuration is already SFTP.
    pub fn sftp_fallback(&self) -> Option<Self> {
        if self.protocol == Protocol::Sftp {
            return None;
        }
        Some(Self {
            protocol: Protocol::Sftp,
            sftp_port: SFTP_FALLBACK_PORT,
            ..self.clone()
        })
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            protocol: Protocol::Ftp,
            sftp_port: default_sftp_port(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .field("sftp_port", &self.sftp_port)
            .finish()
    }
}

/// Shared connection state for one application session
pub struct ConnectionProvider {
    config: RwLock<ConnectionConfig>,
    connected: AtomicBool,
    context: ExecutionContext,
    tier: RwLock<Tier>,
}

impl ConnectionProvider {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            config: RwLock::new(ConnectionConfig::default()),
            connected: AtomicBool::new(false),
            context,
            tier: RwLock::new(Tier::Free),
        }
    }

    /// Read-only copy of the current configuration
    pub fn snapshot(&self) -> ConnectionConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: ConnectionConfig) {
        info!(
            "Connection target set to {}://{}:{}",
            config.protocol, config.host, config.port
        );
        *self.config.write() = config;
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn tier(&self) -> Tier {
        *self.tier.read()
    }

    pub fn set_tier(&self, tier: Tier) {
        *self.tier.write() = tier;
    }
}
