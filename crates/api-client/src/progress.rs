//! Progress endpoints.

use crate::error::ApiResult;
use crate::types::UserProgress;
use crate::ApiClient;

/// Progress endpoint group.
pub struct ProgressApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProgressApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the current user's overall progress.
    pub async fn user_progress(&self) -> ApiResult<UserProgress> {
        self.client.get("/users/progress").await
    }
}
