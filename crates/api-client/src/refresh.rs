//! Single-flight access token refresh.

use crate::error::{error_message, ApiError, ApiResult};
use credential_store::CredentialManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token refresh request body.
#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

/// Token refresh response. The server sends the full auth payload; only the
/// rotated access token is consumed.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Coordinates refresh attempts so a burst of requests hitting an expired
/// token produces at most one refresh call.
///
/// The flight guard serializes callers. Whoever acquires it first performs
/// the refresh; everyone queued behind it then finds the stored access token
/// rotated away from the one they failed with and reuses it without another
/// network call. Using a refresh token twice risks the server rejecting the
/// second use, so the duplicate call is the thing this guards against.
pub(crate) struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialManager>,
    flight: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<CredentialManager>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            store,
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// `stale_token` is the access token the caller just saw rejected. Any
    /// refresh failure clears the whole stored session; that is the signal
    /// that forces the user back to sign-in.
    pub(crate) async fn refresh(&self, stale_token: Option<&str>) -> ApiResult<String> {
        let _flight = self.flight.lock().await;

        // A caller queued behind an earlier refresh sees the rotated token here.
        if let Some(current) = self.store.credentials().ok().flatten() {
            if stale_token != Some(current.access_token.as_str()) {
                debug!("access token already rotated by a concurrent refresh");
                return Ok(current.access_token);
            }
        }

        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("authorization failed with no refresh token stored, clearing session");
                self.store.clear_session();
                return Err(ApiError::NoRefreshToken);
            }
            Err(e) => {
                warn!(error = %e, "could not read refresh token, clearing session");
                self.store.clear_session();
                return Err(ApiError::Storage(e));
            }
        };

        let url = format!("{}/auth/refresh", self.base_url);
        debug!("refreshing access token");

        let response = match self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "token refresh request failed, clearing session");
                self.store.clear_session();
                return Err(ApiError::Http(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "token refresh rejected, clearing session");
            self.store.clear_session();
            let message = error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(ApiError::RefreshRejected(message));
        }

        let data: RefreshResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "token refresh response unreadable, clearing session");
                self.store.clear_session();
                return Err(ApiError::Http(e));
            }
        };

        if let Err(e) = self.store.set_access_token(&data.access_token) {
            // A token that cannot be persisted cannot be trusted on the next request.
            warn!(error = %e, "could not persist refreshed token, clearing session");
            self.store.clear_session();
            return Err(ApiError::Storage(e));
        }

        info!("access token refreshed");
        Ok(data.access_token)
    }
}
