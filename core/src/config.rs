//! Client configuration.
//!
//! The base URL is resolved once when the config is built. Emulator builds
//! reach the host machine through `10.0.2.2` on Android and `localhost`
//! everywhere else; an explicit URL overrides both.

use std::env;
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_PORT: u16 = 5002;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2);

/// Runtime platform the client is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    Android,
    Ios,
    #[default]
    Other,
}

impl Platform {
    /// Host that reaches the development machine from this platform.
    pub fn loopback_host(self) -> &'static str {
        match self {
            Platform::Android => "10.0.2.2",
            Platform::Ios | Platform::Other => "localhost",
        }
    }

    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Other
        }
    }
}

/// API root for a platform, e.g. `http://10.0.2.2:5002/api`.
pub fn resolve_base_url(platform: Platform, port: u16) -> String {
    format!("http://{}:{port}/api", platform.loopback_host())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash. Portal prefixes (`/police`,
    /// `/admin`) are appended by the route builder.
    pub base_url: String,
    pub timeout: Duration,
    /// Wait before the single retry of a failed request.
    pub retry_delay: Duration,
    /// Wait before falling back to the public fine-issue endpoint.
    pub fallback_delay: Duration,
    /// How long an account listing is served from cache.
    pub cache_ttl: Duration,
    /// Clear the stored session when the server answers 401 or 403.
    pub logout_on_auth_expired: bool,
    /// Probe connectivity before retrying.
    pub check_connectivity: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl ClientConfig {
    pub fn for_platform(platform: Platform) -> Self {
        Self::with_base_url(&resolve_base_url(platform, DEFAULT_PORT))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            cache_ttl: DEFAULT_CACHE_TTL,
            logout_on_auth_expired: false,
            check_connectivity: true,
        }
    }

    /// Settings for the web admin console: same endpoints, but an expired
    /// session is dropped as soon as the server rejects it.
    pub fn admin_console(base_url: &str) -> Self {
        Self {
            logout_on_auth_expired: true,
            ..Self::with_base_url(base_url)
        }
    }

    /// Defaults overridden by `TRAFFIC_API_URL`, `TRAFFIC_API_TIMEOUT_MS`,
    /// `TRAFFIC_RETRY_DELAY_MS`, `TRAFFIC_FALLBACK_DELAY_MS` and
    /// `TRAFFIC_CACHE_TTL_MS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = match lookup("TRAFFIC_API_URL") {
            Some(url) if !url.trim().is_empty() => {
                url::Url::parse(url.trim())
                    .map_err(|e| ApiError::Config(format!("TRAFFIC_API_URL: {e}")))?;
                Self::with_base_url(url.trim())
            }
            _ => Self::default(),
        };
        if let Some(d) = millis(&lookup, "TRAFFIC_API_TIMEOUT_MS")? {
            config.timeout = d;
        }
        if let Some(d) = millis(&lookup, "TRAFFIC_RETRY_DELAY_MS")? {
            config.retry_delay = d;
        }
        if let Some(d) = millis(&lookup, "TRAFFIC_FALLBACK_DELAY_MS")? {
            config.fallback_delay = d;
        }
        if let Some(d) = millis(&lookup, "TRAFFIC_CACHE_TTL_MS")? {
            config.cache_ttl = d;
        }
        Ok(config)
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>, ApiError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ApiError::Config(format!("{key}={raw:?}: {e}"))),
    }
}
