//! Wire types matching the backend API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user record.
///
/// Owned by the identity service; treated as an immutable value once fetched
/// and replaced wholesale on update, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User UUID
    pub id: String,
    /// Account email
    pub email: String,
    /// Display name shown in the app
    pub display_name: String,
    /// Role (user, admin)
    pub role: String,
    /// Whether the account is still in its trial period
    pub is_trial: bool,
    /// Snippets remaining in the trial
    pub trial_snippets_remaining: i32,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last login time, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Response from the login and signup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Snippet difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Medium,
    Hard,
}

impl Difficulty {
    /// Wire representation, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// A bug pattern category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub order_index: i32,
}

/// A single test case a submission is graded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: serde_json::Value,
    pub expected: serde_json::Value,
}

/// A buggy code snippet to fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    pub pattern_id: i64,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub buggy_code: String,
    pub bug_type: String,
    pub bug_explanation: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    pub hint_1: String,
    pub hint_2: String,
    pub hint_3: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of running a submission against one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case: i32,
    pub input: serde_json::Value,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
    pub passed: bool,
    pub execution_time_ms: i64,
}

/// Result of executing or submitting code for a snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteCodeResponse {
    pub execution_id: String,
    pub status: String,
    pub is_correct: bool,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    pub total_time_ms: i64,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

/// A hint for a snippet at a given tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintResponse {
    pub hint: String,
    pub tier: String,
}

/// Per-pattern progress row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternProgress {
    pub pattern_id: i64,
    pub pattern_name: String,
    pub attempted: i64,
    pub solved: i64,
}

/// Overall user progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub total_snippets_attempted: i64,
    pub total_snippets_solved: i64,
    #[serde(default)]
    pub patterns: Vec<PatternProgress>,
}
