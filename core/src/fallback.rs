//! Primary/fallback endpoint chaining.
//!
//! Several operations try a direct endpoint first and fall back to a public
//! one. The chain is
//! `Idle -> TryingPrimary -> {Succeeded | TryingFallback} -> {Succeeded | Failed}`.
//! The primary's failure, including a response that fails validation, is
//! logged and dropped; only the fallback's outcome reaches the caller. Each
//! attempt gets its own network-level retry inside `HttpClient`.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Which endpoint produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Fallback,
}

/// A validated value and the tier that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub tier: Tier,
}

/// Await `primary` and validate its response. On any failure await
/// `fallback` exactly once and validate that instead.
///
/// Both attempts are plain futures. `fallback` is not polled, so it sends
/// nothing, unless the primary fails.
pub async fn attempt_with_fallback<T, P, F, V>(
    operation: &str,
    primary: P,
    fallback: F,
    validate: V,
) -> Result<Served<T>, ApiError>
where
    P: Future<Output = Result<HttpResponse, ApiError>>,
    F: Future<Output = Result<HttpResponse, ApiError>>,
    V: Fn(HttpResponse) -> Result<T, ApiError>,
{
    debug!(operation, "trying primary endpoint");
    match primary.await.and_then(&validate) {
        Ok(value) => {
            debug!(operation, "primary endpoint succeeded");
            return Ok(Served {
                value,
                tier: Tier::Primary,
            });
        }
        Err(e) => warn!(operation, error = %e, "primary endpoint failed, falling back"),
    }

    match fallback.await.and_then(&validate) {
        Ok(value) => {
            debug!(operation, "fallback endpoint succeeded");
            Ok(Served {
                value,
                tier: Tier::Fallback,
            })
        }
        Err(e) => {
            warn!(operation, error = %e, "fallback endpoint failed");
            Err(e)
        }
    }
}
