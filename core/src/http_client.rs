//! Request lifecycle shared by every service.
//!
//! # Design
//! `HttpClient::send` runs the interceptor chain in a fixed order:
//!
//! 1. attach `Authorization: Bearer <token>` when a session is stored (a
//!    failed read is logged and the request goes out unauthenticated),
//! 2. execute through the `Transport` and log the outcome,
//! 3. retry at most once when no response arrived or the status is 5xx,
//!    after `retry_delay` and a connectivity check,
//! 4. on 401/403, clear the session if configured to.
//!
//! A response of any status is returned as `Ok`; status interpretation is
//! left to `TrafficClient::parse_*`. Timeouts and 4xx are never retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connectivity::{ConnectivityChecker, TcpProbe};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionStore;
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::types::{token_prefix, Session};

/// Timeout used when probing the API host before a retry.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

type Outcome = Result<HttpResponse, TransportError>;

pub struct HttpClient {
    transport: Arc<dyn Transport>,
    sessions: Arc<dyn SessionStore>,
    connectivity: Option<ConnectivityChecker>,
    retry_delay: Duration,
    timeout: Duration,
    logout_on_auth_expired: bool,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .field("logout_on_auth_expired", &self.logout_on_auth_expired)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            transport,
            sessions,
            connectivity: None,
            retry_delay: crate::config::DEFAULT_RETRY_DELAY,
            timeout: crate::config::DEFAULT_TIMEOUT,
            logout_on_auth_expired: false,
        }
    }

    /// Client with a reqwest transport and a TCP connectivity probe aimed at
    /// the configured API host.
    pub fn from_config(config: &ClientConfig, sessions: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let transport =
            ReqwestTransport::new(config.timeout).map_err(|e| ApiError::Config(e.to_string()))?;
        let mut client = Self::new(Arc::new(transport), sessions)
            .with_retry_delay(config.retry_delay)
            .with_timeout(config.timeout)
            .with_logout_on_auth_expired(config.logout_on_auth_expired);
        if config.check_connectivity {
            let probe = TcpProbe::for_url(&config.base_url, PROBE_TIMEOUT)?;
            client = client.with_connectivity(ConnectivityChecker::new(Arc::new(probe)));
        }
        Ok(client)
    }

    pub fn with_connectivity(mut self, checker: ConnectivityChecker) -> Self {
        self.connectivity = Some(checker);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Timeout reported in `ApiError::Timeout`. The transport enforces it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logout_on_auth_expired(mut self, enabled: bool) -> Self {
        self.logout_on_auth_expired = enabled;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Stored session, if any.
    pub async fn session(&self) -> Result<Option<Session>, ApiError> {
        self.sessions.load().await
    }

    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.authorize(&mut request).await;

        let first = self.attempt(&request).await;
        let outcome = if should_retry(&first) {
            tokio::time::sleep(self.retry_delay).await;
            if let Some(checker) = &self.connectivity {
                if !checker.is_connected().await {
                    warn!(url = %request.url, "not retrying, device is offline");
                    return Err(ApiError::NoInternet);
                }
            }
            info!(method = %request.method, url = %request.url, "retrying request");
            self.attempt(&request).await
        } else {
            first
        };

        self.finish(outcome).await
    }

    async fn authorize(&self, request: &mut HttpRequest) {
        match self.sessions.load().await {
            Ok(Some(session)) => {
                debug!(token = %token_prefix(&session.token), "attaching bearer token");
                request.set_header("authorization", format!("Bearer {}", session.token));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read session, sending unauthenticated"),
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Outcome {
        debug!(method = %request.method, url = %request.url, "sending request");
        let outcome = self.transport.execute(request).await;
        match &outcome {
            Ok(resp) if resp.is_success() => debug!(url = %request.url, status = resp.status, "response"),
            Ok(resp) => warn!(url = %request.url, status = resp.status, body = %resp.body, "error response"),
            Err(e) => warn!(url = %request.url, error = %e, "request failed"),
        }
        outcome
    }

    async fn finish(&self, outcome: Outcome) -> Result<HttpResponse, ApiError> {
        match outcome {
            Ok(resp) => {
                if self.logout_on_auth_expired && matches!(resp.status, 401 | 403) {
                    info!(status = resp.status, "session rejected by server, logging out");
                    if let Err(e) = self.sessions.clear().await {
                        warn!(error = %e, "could not clear rejected session");
                    }
                }
                Ok(resp)
            }
            Err(TransportError::Timeout) => Err(ApiError::Timeout(self.timeout)),
            Err(TransportError::NoResponse(reason)) => Err(ApiError::Network(reason)),
            Err(TransportError::InvalidRequest(reason)) => Err(ApiError::Config(reason)),
        }
    }
}

/// Retry only when nothing came back or the server failed. A timeout is not
/// a lost response; it already consumed the whole budget.
fn should_retry(outcome: &Outcome) -> bool {
    match outcome {
        Ok(resp) => resp.status >= 500,
        Err(TransportError::NoResponse(_)) => true,
        Err(TransportError::Timeout | TransportError::InvalidRequest(_)) => false,
    }
}
