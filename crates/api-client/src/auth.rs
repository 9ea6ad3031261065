//! Identity endpoints.

use crate::error::ApiResult;
use crate::types::{AuthResponse, User};
use crate::ApiClient;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

/// Identity endpoint group.
///
/// Login and signup go out unauthenticated; `me` and `logout` carry the
/// stored bearer token. Refreshing is not exposed here; it belongs to the
/// transport's refresh coordinator.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Authenticate with email and password.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.client
            .post("/auth/login", &LoginRequest { email, password })
            .await
    }

    /// Register a new account.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ApiResult<AuthResponse> {
        self.client
            .post(
                "/auth/signup",
                &SignupRequest {
                    email,
                    password,
                    display_name,
                },
            )
            .await
    }

    /// Fetch the live profile of the current user.
    pub async fn me(&self) -> ApiResult<User> {
        self.client.get("/auth/me").await
    }

    /// Invalidate the server-side session.
    pub async fn logout(&self) -> ApiResult<()> {
        self.client.post_empty("/auth/logout").await
    }
}
