//! Observable session state.

use api_client::User;
use serde::{Deserialize, Serialize};

/// Snapshot of the session as observed by the UI layer.
///
/// Invariant: `is_authenticated` implies `user` is present. The error
/// message is replaced wholesale on every transition, never accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current user, when authenticated.
    pub user: Option<User>,
    /// Whether a confirmed session exists.
    pub is_authenticated: bool,
    /// Whether a public action is in flight.
    pub is_loading: bool,
    /// User-facing message for the most recent failure, if any.
    pub error: Option<String>,
}

impl SessionState {
    /// State while an action is in flight. Also the boot state, pending the
    /// first auth check.
    pub(crate) fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    /// State after identity is confirmed.
    pub(crate) fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    /// State with no identity and nothing to report.
    pub(crate) fn unauthenticated() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: None,
        }
    }

    /// Unauthenticated with a user-facing failure message attached.
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: Some(message.into()),
        }
    }

    /// Check the authenticated-implies-user invariant.
    pub fn is_consistent(&self) -> bool {
        !self.is_authenticated || self.user.is_some()
    }
}
