use crate::domain::external_apis::github::{GitHubApi, GitHubApiError};
use crate::domain::models::repository::RepoPage;
use async_stream::try_stream;
use futures_util::Stream;
use std::sync::Arc;
use std::time::Duration;

/// Number of repositories requested per listing call.
pub const REPOSITORIES_PER_PAGE: u8 = 10;

/// Pause between two requests, both between listing pages and between fork launches.
pub const REQUEST_DELAY: Duration = Duration::from_millis(500);

pub struct ListOrganizationRepositoriesInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    delay: Duration,
}

impl<G: GitHubApi + Send + Sync + 'static> ListOrganizationRepositoriesInteractor<G> {
    pub fn new(github_api: Arc<G>, delay: Duration) -> Self {
        Self { github_api, delay }
    }

    /// Walks every page of `org`'s listing, one request at a time.
    ///
    /// The stream yields each page as soon as it arrives and ends after the
    /// last one; the first error ends it too.
    pub fn execute(
        &self,
        org: &str,
    ) -> impl Stream<Item = Result<RepoPage, GitHubApiError>> + Send + use<G> {
        let github_api = self.github_api.clone();
        let delay = self.delay;
        let org = org.to_string();

        try_stream! {
            let mut page = 1;
            loop {
                tracing::debug!("Fetching page {} of {}", page, org);
                let result = github_api
                    .list_organization_repositories(&org, page, REPOSITORIES_PER_PAGE)
                    .await?;
                let next_page = result.next_page;
                yield result;

                match next_page {
                    Some(next) => {
                        page = next;
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    None => break,
                }
            }
        }
    }
}
