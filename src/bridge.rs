//! Readiness gate for the host bridge
//!
//! The host may not be up when the panel starts. `BridgeGate::acquire` polls a
//! `Connector` until it produces a handle, then memoizes it. Callers that
//! arrive while a wait is in flight join that wait instead of starting their
//! own.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::host::{HostApi, HostClient};

/// Default readiness poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("host bridge did not become ready within {0:?}")]
    Timeout(Duration),
}

/// One readiness attempt. Returns a handle once the host is reachable.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn try_connect(&self) -> Option<Arc<dyn HostApi>>;
}

/// Checks the host socket: the file must exist, accept a connection and
/// answer `ping`.
pub struct SocketConnector {
    path: PathBuf,
}

impl SocketConnector {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Connector for SocketConnector {
    async fn try_connect(&self) -> Option<Arc<dyn HostApi>> {
        if !self.path.exists() {
            return None;
        }
        let client = match HostClient::connect(&self.path).await {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "host socket not accepting yet"
                );
                return None;
            }
        };
        match client.ping().await {
            Ok(()) => Some(Arc::new(client)),
            Err(e) => {
                tracing::debug!(error = %e, "host did not answer ping");
                None
            }
        }
    }
}

/// Connector for a host that lives in this process and is always ready
pub struct ReadyConnector {
    host: Arc<dyn HostApi>,
}

impl ReadyConnector {
    pub fn new(host: Arc<dyn HostApi>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Connector for ReadyConnector {
    async fn try_connect(&self) -> Option<Arc<dyn HostApi>> {
        Some(Arc::clone(&self.host))
    }
}

pub struct BridgeGate {
    connector: Box<dyn Connector>,
    poll_interval: Duration,
    timeout: Option<Duration>,
    host: OnceCell<Arc<dyn HostApi>>,
}

impl BridgeGate {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            host: OnceCell::new(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Bound the wait. Without a timeout `acquire` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.host.initialized()
    }

    /// Wait for the host and return a shared handle to it.
    ///
    /// Cheap once resolved. After a timeout nothing is cached, so the next call
    /// starts a new wait.
    pub async fn acquire(&self) -> Result<Arc<dyn HostApi>, BridgeError> {
        self.host
            .get_or_try_init(|| async {
                match self.timeout {
                    Some(limit) => tokio::time::timeout(limit, self.poll())
                        .await
                        .map_err(|_| BridgeError::Timeout(limit)),
                    None => Ok(self.poll().await),
                }
            })
            .await
            .map(Arc::clone)
    }

    async fn poll(&self) -> Arc<dyn HostApi> {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            if let Some(host) = self.connector.try_connect().await {
                tracing::info!(attempts, "host bridge ready");
                return host;
            }
            if attempts == 1 {
                tracing::info!("waiting for host bridge");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
