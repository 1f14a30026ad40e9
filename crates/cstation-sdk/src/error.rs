//! Error types for the Container Station client.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type using [`SdkError`].
pub type Result<T> = std::result::Result<T, SdkError>;

/// Everything a client operation can fail with.
#[derive(Error, Debug)]
pub enum SdkError {
    /// A parameter was rejected before any request was sent.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// The request never produced a usable response envelope.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body was neither the expected shape nor an error object.
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The appliance reported a failure inside a 200 response.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// True when the operation was abandoned through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SdkError::Transport(TransportError::Cancelled))
    }

    /// The code of an embedded API error, if this is one.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            SdkError::Api(err) => err.code,
            _ => None,
        }
    }

    /// The HTTP status of a rejected response envelope.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Failures below the JSON layer: connecting, sending, cancellation, and
/// any status other than 200.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    /// Container Station answers 200 for every outcome, so any other status
    /// is a fault of the appliance or something in front of it.
    #[error("unexpected HTTP status {status} from {method} {path}")]
    Status {
        status: StatusCode,
        method: Method,
        path: String,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(err)
        }
    }
}

/// Error object embedded in an otherwise successful response:
/// `{"error": {"code": 401, "message": "..."}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Container Station error ({}): {}",
            self.code.unwrap_or_default(),
            self.message.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError {
            code: Some(401),
            message: Some("bad credentials".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Container Station error (401): bad credentials"
        );

        let sdk: SdkError = err.into();
        assert_eq!(sdk.api_code(), Some(401));
        assert!(!sdk.is_cancelled());
    }

    #[test]
    fn test_status_error() {
        let err = SdkError::from(TransportError::Status {
            status: StatusCode::NOT_FOUND,
            method: Method::GET,
            path: "/containerstation/api/v1/system".to_string(),
        });
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("/containerstation/api/v1/system"));
    }

    #[test]
    fn test_cancelled() {
        let err = SdkError::from(TransportError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.api_code(), None);
        assert_eq!(err.status(), None);
    }
}
