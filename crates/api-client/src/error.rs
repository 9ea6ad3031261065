//! API error types.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error type for API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server responded with a non-success status
    #[error("{message}")]
    Api {
        /// HTTP status of the failed response
        status: StatusCode,
        /// Server-provided error message, or a generic fallback
        message: String,
    },

    /// A refresh was needed but no refresh token is stored
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The refresh endpoint rejected the refresh token
    #[error("Token refresh rejected: {0}")]
    RefreshRejected(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] credential_store::StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns true if this error means the stored credentials are unusable
    /// and the user has to sign in again.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ApiError::NoRefreshToken | ApiError::RefreshRejected(_) => true,
            ApiError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }

    /// The server-provided message for this failure, when one exists.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message, .. } => Some(message),
            ApiError::RefreshRejected(message) => Some(message),
            _ => None,
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Extract the `{"error": "..."}` message the server attaches to failures.
pub(crate) fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error)
}
