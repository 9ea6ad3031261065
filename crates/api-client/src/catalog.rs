//! Pattern and snippet endpoints.

use crate::error::ApiResult;
use crate::types::{Difficulty, ExecuteCodeResponse, HintResponse, PatternCategory, Snippet};
use crate::ApiClient;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CodeRequest<'a> {
    code: &'a str,
    language: &'a str,
}

/// Pattern and snippet endpoint group. All calls require authentication.
pub struct CatalogApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CatalogApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List all pattern categories.
    pub async fn patterns(&self) -> ApiResult<Vec<PatternCategory>> {
        self.client.get("/patterns").await
    }

    /// List snippets for a pattern, optionally filtered by difficulty.
    pub async fn snippets_by_pattern(
        &self,
        pattern_id: i64,
        difficulty: Option<Difficulty>,
    ) -> ApiResult<Vec<Snippet>> {
        let path = format!("/patterns/{pattern_id}/snippets");
        match difficulty {
            Some(difficulty) => {
                self.client
                    .get_with_query(&path, &[("difficulty", difficulty.as_str())])
                    .await
            }
            None => self.client.get(&path).await,
        }
    }

    /// Fetch a single snippet.
    pub async fn snippet(&self, snippet_id: &str) -> ApiResult<Snippet> {
        self.client.get(&format!("/snippets/{snippet_id}")).await
    }

    /// Run code against a snippet's test cases without recording an attempt.
    pub async fn execute(
        &self,
        snippet_id: &str,
        code: &str,
        language: &str,
    ) -> ApiResult<ExecuteCodeResponse> {
        self.client
            .post(
                &format!("/snippets/{snippet_id}/execute"),
                &CodeRequest { code, language },
            )
            .await
    }

    /// Submit a solution; the attempt is executed and recorded remotely.
    pub async fn submit(
        &self,
        snippet_id: &str,
        code: &str,
        language: &str,
    ) -> ApiResult<ExecuteCodeResponse> {
        self.client
            .post(
                &format!("/snippets/{snippet_id}/submit"),
                &CodeRequest { code, language },
            )
            .await
    }

    /// Fetch a hint for a snippet. Valid tiers are 1 through 3.
    pub async fn hint(&self, snippet_id: &str, tier: u8) -> ApiResult<HintResponse> {
        self.client
            .post(
                &format!("/snippets/{snippet_id}/hints/{tier}"),
                &serde_json::json!({}),
            )
            .await
    }
}
