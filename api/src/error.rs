//! Error types for the marketplace API client

use serde::Deserialize;
use thiserror::Error;

/// Result alias for API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the marketplace API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The addressed record does not exist
    #[error("Not found: {resource}")]
    NotFound {
        /// Human readable description of what was looked up
        resource: String,
    },

    /// Missing or rejected credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Machine readable error code, when the server supplies one
        code: Option<String>,
        /// Error message from API
        message: String,
    },

    /// The request could not be built (bad base URL, invalid path segment)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Structured error code supplied by the server, if any
    ///
    /// Callers branch on this instead of matching message text.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the error means "no such record"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Message suitable for an inline error or toast
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }

    /// Build an error from a non-success status and its raw body
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let (code, message) = match parsed {
            Some(body) => (body.code, body.message.or(body.error)),
            None => (None, None),
        };

        Self::Api {
            status,
            code,
            message: message.unwrap_or_else(|| body.trim().to_string()),
        }
    }
}

/// Error payload returned by the server for non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_body_yields_code() {
        let error = ApiError::from_response(
            409,
            r#"{"code":"SLOT_TAKEN","message":"That slot is no longer available"}"#,
        );

        assert_eq!(error.code(), Some("SLOT_TAKEN"));
        assert_eq!(error.user_message(), "That slot is no longer available");
    }

    #[test]
    fn test_plain_text_body_is_kept_as_message() {
        let error = ApiError::from_response(500, "  upstream exploded \n");

        assert_eq!(error.code(), None);
        assert_eq!(error.user_message(), "upstream exploded");
    }

    #[test]
    fn test_error_field_is_used_when_message_missing() {
        let error = ApiError::from_response(400, r#"{"error":"bad date"}"#);
        assert_eq!(error.user_message(), "bad date");
    }

    #[test]
    fn test_not_found_predicate() {
        let error = ApiError::NotFound {
            resource: "user alice@example.com".to_string(),
        };
        assert!(error.is_not_found());
        assert!(!ApiError::Unauthorized.is_not_found());
    }
}
