//! HTTP API client for the bugdrill backend.
//!
//! This crate provides:
//! - A single configured transport every call goes through
//! - Bearer credential attachment from the shared credential store
//! - Transparent token refresh on authorization failures, with a
//!   retry-once guarantee per request and at most one refresh call in
//!   flight per expiry event
//! - Typed endpoint groups for identity, the snippet catalog, and progress

mod auth;
mod catalog;
mod client;
mod error;
mod progress;
mod refresh;
mod types;

pub use auth::AuthApi;
pub use catalog::CatalogApi;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use progress::ProgressApi;
pub use types::{
    AuthResponse, Difficulty, ExecuteCodeResponse, HintResponse, PatternCategory, PatternProgress,
    Snippet, TestCase, TestResult, User, UserProgress,
};
