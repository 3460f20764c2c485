//! Error types for the traffic API client.
//!
//! # Design
//! Transport failures (`Network`, `Timeout`, `NoInternet`) and status-code
//! failures (`Server`, `Client`, `NotFound`, `AuthExpired`) are kept apart
//! from payload failures (`MissingToken`, `Shape`, `Rejected`) so the retry
//! layer and the UI can branch on them. `NotFound` keeps a dedicated variant
//! because a 404 on a licence lookup means "no such driver", not a broken
//! request.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the client, its services and its parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was sent but no response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// A retry was due but the device reported no connectivity.
    #[error("no internet connection")]
    NoInternet,

    /// The server answered with a 5xx status.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    /// The server returned 404.
    #[error("not found: {body}")]
    NotFound { body: String },

    /// The server answered with a 4xx status other than 401, 403 and 404.
    #[error("request rejected with {status}: {body}")]
    Client { status: u16, body: String },

    /// The server answered 401 or 403.
    #[error("session expired or not authorized ({status})")]
    AuthExpired { status: u16 },

    /// An auth call succeeded at the HTTP level but carried no token.
    #[error("authentication succeeded but no token was received")]
    MissingToken,

    /// The response is missing a required field.
    #[error("invalid response: missing {0}")]
    Shape(String),

    /// The server answered `success: false`.
    #[error("server reported failure: {message}")]
    Rejected { message: String },

    /// Local validation failed before any request was made.
    #[error("missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The session store could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse grouping used to pick the message shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Validation,
    Server,
    Session,
}

impl ErrorCategory {
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCategory::Connection => {
                "Unable to reach the server. Please check your connection and try again."
            }
            ErrorCategory::Validation => "Some details are missing or invalid. Please review them.",
            ErrorCategory::Server => "The server could not complete the request. Please try again later.",
            ErrorCategory::Session => "Your session has expired. Please log in again.",
        }
    }
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::NoInternet => {
                ErrorCategory::Connection
            }
            ApiError::Client { .. }
            | ApiError::NotFound { .. }
            | ApiError::Rejected { .. }
            | ApiError::Validation { .. }
            | ApiError::Serialization(_) => ErrorCategory::Validation,
            ApiError::AuthExpired { .. } | ApiError::MissingToken => ErrorCategory::Session,
            ApiError::Server { .. }
            | ApiError::Shape(_)
            | ApiError::Deserialization(_)
            | ApiError::Storage(_)
            | ApiError::Config(_) => ErrorCategory::Server,
        }
    }

    /// Single human-readable message for display.
    pub fn user_message(&self) -> &'static str {
        self.category().user_message()
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. }
            | ApiError::Client { status, .. }
            | ApiError::AuthExpired { status } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Map a non-2xx response to its error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::AuthExpired { status },
            404 => ApiError::NotFound { body },
            400..=499 => ApiError::Client { status, body },
            _ => ApiError::Server { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(ApiError::from_status(401, String::new()), ApiError::AuthExpired { status: 401 }));
        assert!(matches!(ApiError::from_status(403, String::new()), ApiError::AuthExpired { status: 403 }));
        assert!(matches!(ApiError::from_status(404, String::new()), ApiError::NotFound { .. }));
        assert!(matches!(ApiError::from_status(422, String::new()), ApiError::Client { status: 422, .. }));
        assert!(matches!(ApiError::from_status(503, String::new()), ApiError::Server { status: 503, .. }));
    }

    #[test]
    fn categories_pick_distinct_messages() {
        assert_eq!(ApiError::NoInternet.category(), ErrorCategory::Connection);
        assert_eq!(
            ApiError::Validation { missing: vec!["amount"] }.category(),
            ErrorCategory::Validation
        );
        assert_eq!(ApiError::MissingToken.category(), ErrorCategory::Session);
        assert_eq!(
            ApiError::Server { status: 500, body: String::new() }.category(),
            ErrorCategory::Server
        );
        assert_ne!(
            ErrorCategory::Connection.user_message(),
            ErrorCategory::Session.user_message()
        );
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = ApiError::Validation { missing: vec!["amount", "location"] };
        assert_eq!(err.to_string(), "missing required fields: amount, location");
    }

    #[test]
    fn status_is_exposed() {
        assert_eq!(ApiError::from_status(404, String::new()).status(), Some(404));
        assert_eq!(ApiError::Network("reset".into()).status(), None);
    }
}
