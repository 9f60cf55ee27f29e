use crate::domain::models::repository::RepoPage;
use async_trait::async_trait;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GitHubApiError {
    #[error("failed to send request to {url}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("{url} responded with HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: BoxError,
    },
}

#[async_trait]
pub trait GitHubApi {
    /// Fetches one page (1-based) of the repositories owned by `org`.
    async fn list_organization_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<RepoPage, GitHubApiError>;

    /// Asks the service to fork the repository behind `forks_url` into the
    /// authenticated account.
    async fn create_fork(&self, forks_url: &str) -> Result<(), GitHubApiError>;
}
