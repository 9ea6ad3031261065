//! HTTP transport with bearer attachment and 401-driven retry.

use crate::auth::AuthApi;
use crate::catalog::CatalogApi;
use crate::error::{error_message, ApiError, ApiResult};
use crate::progress::ProgressApi;
use crate::refresh::RefreshCoordinator;
use credential_store::CredentialManager;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// API client for the bugdrill backend.
///
/// Owns the single configured HTTP client every call goes through. Outgoing
/// requests carry the stored access token as a bearer credential when one
/// exists; a 401 response hands off to the refresh coordinator and the
/// request is resent once with the rotated token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialManager>,
    refresher: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Base address including the version prefix, e.g.
    ///   `http://localhost:8080/api/v1`
    /// * `timeout` - Per-request timeout
    /// * `store` - Credential storage shared with the session layer
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<CredentialManager>,
    ) -> ApiResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let refresher = RefreshCoordinator::new(http.clone(), base_url.clone(), store.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                store,
                refresher,
            }),
        })
    }

    /// Identity endpoints (login, signup, me, logout).
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Pattern and snippet endpoints.
    pub fn catalog(&self) -> CatalogApi<'_> {
        CatalogApi::new(self)
    }

    /// Progress endpoints.
    pub fn progress(&self) -> ProgressApi<'_> {
        ProgressApi::new(self)
    }

    /// Issue a GET request and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(Method::GET, path, &[], None).await?;
        Ok(response.json().await?)
    }

    /// Issue a GET request with query parameters and decode the JSON response.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let response = self.execute(Method::GET, path, query, None).await?;
        Ok(response.json().await?)
    }

    /// Issue a POST request with a JSON body and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, &[], Some(&body)).await?;
        Ok(response.json().await?)
    }

    /// Issue a bodyless POST request, discarding the response body.
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        self.execute(Method::POST, path, &[], None).await?;
        Ok(())
    }

    /// Send one request through the authenticator.
    ///
    /// Whether to retry is a function of the response status and the
    /// `retried` flag alone, and the flag lives on this call's stack, so
    /// concurrently in-flight requests are judged independently. No request
    /// is ever resent more than once for an authorization failure.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> ApiResult<reqwest::Response> {
        let inner = &self.inner;
        let url = format!("{}{}", inner.base_url, path);

        // Attach the stored credential when one exists; login, signup, and
        // refresh go out unauthenticated. A storage fault counts as having
        // no credential.
        let mut token = match inner.store.credentials() {
            Ok(credentials) => credentials.map(|c| c.access_token),
            Err(e) => {
                warn!(error = %e, "credential read failed, sending request unauthenticated");
                None
            }
        };

        let mut retried = false;
        loop {
            let mut request = inner.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = token.as_deref() {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                token = Some(inner.refresher.refresh(token.as_deref()).await?);
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, path, "request failed");
                let message = error_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
                return Err(ApiError::Api { status, message });
            }

            return Ok(response);
        }
    }
}
