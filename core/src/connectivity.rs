//! Connectivity checks used before a retry.
//!
//! The verdict fails open: an unknown reachability signal, or a probe that
//! errors out, counts as connected so a flaky signal never blocks requests.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Snapshot of the platform network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub is_connected: bool,
    /// `None` when the platform cannot tell.
    pub is_internet_reachable: Option<bool>,
}

impl NetworkState {
    pub const ONLINE: NetworkState = NetworkState {
        is_connected: true,
        is_internet_reachable: Some(true),
    };
    pub const OFFLINE: NetworkState = NetworkState {
        is_connected: false,
        is_internet_reachable: Some(false),
    };

    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable.unwrap_or(true)
    }
}

/// Source of network state.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn probe(&self) -> Result<NetworkState, std::io::Error>;
}

/// Derives network state from a TCP connect to the API host.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host and port a URL points at.
    pub fn for_url(url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(url).map_err(|e| ApiError::Config(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ApiError::Config(format!("{url}: no host")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ApiError::Config(format!("{url}: no port")))?;
        Ok(Self::new(format!("{host}:{port}"), timeout))
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn probe(&self) -> Result<NetworkState, std::io::Error> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Err(_) => Ok(NetworkState {
                is_connected: true,
                is_internet_reachable: None,
            }),
            Ok(Ok(_)) => Ok(NetworkState::ONLINE),
            // Something answered, so the network itself is up.
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset) => {
                Ok(NetworkState::ONLINE)
            }
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "probe connect failed");
                Ok(NetworkState::OFFLINE)
            }
        }
    }
}

/// A probe that always reports a fixed state.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub NetworkState);

#[async_trait]
impl NetworkProbe for StaticProbe {
    async fn probe(&self) -> Result<NetworkState, std::io::Error> {
        Ok(self.0)
    }
}

#[derive(Clone)]
pub struct ConnectivityChecker {
    probe: Arc<dyn NetworkProbe>,
}

impl std::fmt::Debug for ConnectivityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityChecker").finish_non_exhaustive()
    }
}

impl ConnectivityChecker {
    pub fn new(probe: Arc<dyn NetworkProbe>) -> Self {
        Self { probe }
    }

    pub fn always_online() -> Self {
        Self::new(Arc::new(StaticProbe(NetworkState::ONLINE)))
    }

    pub async fn is_connected(&self) -> bool {
        match self.probe.probe().await {
            Ok(state) => state.is_online(),
            Err(e) => {
                warn!(error = %e, "connectivity check failed, assuming connected");
                true
            }
        }
    }

    /// Poll every `interval` on `runtime` and publish the verdict whenever
    /// it changes. Polling stops once every receiver is dropped. Callable
    /// from outside the runtime; inside one, pass `Handle::current()`.
    pub fn subscribe(&self, runtime: &Handle, interval: Duration) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(true);
        let checker = self.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {
                        let online = checker.is_connected().await;
                        tx.send_if_modified(|current| {
                            if *current == online {
                                false
                            } else {
                                *current = online;
                                true
                            }
                        });
                    }
                }
            }
        });
        rx
    }
}
