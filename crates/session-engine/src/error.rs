//! Session error types.

use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// API call failed
    #[error("API error: {0}")]
    Api(#[from] api_client::ApiError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] credential_store::StorageError),

    /// Invalid transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidTransition(String),
}

impl SessionError {
    /// Returns true if the stored credentials are unusable and the user has
    /// to sign in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_auth_failure())
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
