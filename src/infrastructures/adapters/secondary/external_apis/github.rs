use crate::domain::external_apis::github::{GitHubApi, GitHubApiError};
use crate::domain::models::repository::{RepoDescriptor, RepoPage};
use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "gitorgfork-rust-app";

#[derive(Deserialize, Debug, Clone)]
struct GitHubRepositoryResponse {
    name: String,
    html_url: String,
    // Missing on some disabled repositories; treated as not forkable.
    #[serde(default)]
    forks_url: String,
    owner: GitHubOwnerResponse,
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubOwnerResponse {
    login: String,
}

impl From<GitHubRepositoryResponse> for RepoDescriptor {
    fn from(repo: GitHubRepositoryResponse) -> Self {
        Self {
            name: repo.name,
            owner_login: repo.owner.login,
            html_url: repo.html_url,
            forks_url: repo.forks_url,
        }
    }
}

pub struct GitHubApiAdapter {
    client: Client,
    base_url: Url,
    github_token: String,
}

impl GitHubApiAdapter {
    /// Builds an adapter whose requests all share one client and its per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Fails when `base_url` is not an absolute URL or the underlying HTTP
    /// client cannot be initialized.
    pub fn new(base_url: &str, github_token: String, timeout: Duration) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid API base URL {base_url}");
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self {
            client,
            base_url,
            github_token,
        })
    }

    /// `{base}/orgs/{org}/repos?per_page=..&page=..`, with `org` escaped as a single path segment.
    fn organization_repositories_url(&self, org: &str, page: u32, per_page: u8) -> Url {
        let mut url = self.base_url.clone();
        // Always a base URL, checked in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["orgs", org, "repos"]);
        }
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.github_token))
            .header("Accept", "application/vnd.github+json")
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, GitHubApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| GitHubApiError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        Err(GitHubApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(
        name = "GitHubApiAdapter::list_organization_repositories",
        skip(self)
    )]
    async fn list_organization_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<RepoPage, GitHubApiError> {
        let url = self.organization_repositories_url(org, page, per_page);
        let response = self.send(url.as_str(), self.client.get(url.clone())).await?;

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_from_link);

        let body = response
            .text()
            .await
            .map_err(|e| GitHubApiError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        let items: Vec<GitHubRepositoryResponse> =
            serde_json::from_str(&body).map_err(|e| GitHubApiError::Decode {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        tracing::debug!(
            "Fetched {} repositories from page {} (next: {:?})",
            items.len(),
            page,
            next_page
        );

        Ok(RepoPage {
            repositories: items.into_iter().map(RepoDescriptor::from).collect(),
            next_page,
        })
    }

    #[tracing::instrument(name = "GitHubApiAdapter::create_fork", skip(self))]
    async fn create_fork(&self, forks_url: &str) -> Result<(), GitHubApiError> {
        let response = self.send(forks_url, self.client.post(forks_url)).await?;
        tracing::debug!("Fork requested, service answered {}", response.status());
        Ok(())
    }
}

/// Extracts the page number of the `rel="next"` entry of a `Link` header.
fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
            .filter(|page| *page > 0)
    })
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GitHubErrorResponse>(body)
        .ok()
        .map(|e| e.message)
}
