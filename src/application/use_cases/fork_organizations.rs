use crate::application::use_cases::dispatch_forks::{DispatchOutcome, ForkDispatcher};
use crate::application::use_cases::list_organization_repositories::{
    ListOrganizationRepositoriesInteractor, REQUEST_DELAY,
};
use crate::domain::external_apis::github::{GitHubApi, GitHubApiError};
use crate::domain::models::repository::RepoDescriptor;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fork requests allowed in flight at once for a single organization.
pub const DEFAULT_MAX_CONCURRENT_FORKS: usize = 8;

/// Receives progress as organizations are listed and forked.
pub trait ForkProgress {
    fn organization_started(&mut self, org: &str);
    fn listing_started(&mut self);
    fn page_fetched(&mut self, repositories: usize);
    fn listing_finished(&mut self, total: usize);
    fn forking_started(&mut self);
    fn fork_dispatched(&mut self, fork_url: &str, source_url: &str);
    fn dispatch_finished(&mut self);
    fn fork_completed(&mut self);
    fn organization_finished(&mut self, outcome: DispatchOutcome);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkSettings {
    pub delay: Duration,
    pub max_concurrent_forks: usize,
}

impl Default for ForkSettings {
    fn default() -> Self {
        Self {
            delay: REQUEST_DELAY,
            max_concurrent_forks: DEFAULT_MAX_CONCURRENT_FORKS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForkOrganizationsUseCaseInput {
    pub organizations: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrganizationReport {
    pub organization: String,
    pub repositories: usize,
    pub dispatched: usize,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ForkOrganizationsUseCaseOutput {
    pub reports: Vec<OrganizationReport>,
}

#[derive(Debug, Error)]
pub enum ForkOrganizationsError {
    #[error("failed to list repositories of organization {organization}")]
    Listing {
        organization: String,
        #[source]
        source: GitHubApiError,
    },
}

pub struct ForkOrganizationsInteractor<G: GitHubApi + Send + Sync + 'static> {
    lister: ListOrganizationRepositoriesInteractor<G>,
    dispatcher: ForkDispatcher<G>,
}

impl<G: GitHubApi + Send + Sync + 'static> ForkOrganizationsInteractor<G> {
    pub fn new(github_api: Arc<G>, username: String, settings: ForkSettings) -> Self {
        Self {
            lister: ListOrganizationRepositoriesInteractor::new(github_api.clone(), settings.delay),
            dispatcher: ForkDispatcher::new(
                github_api,
                username,
                settings.delay,
                settings.max_concurrent_forks,
            ),
        }
    }

    /// Lists then forks each organization in turn.
    ///
    /// # Errors
    ///
    /// Stops at the first organization whose listing fails; later organizations
    /// are left untouched. Individual fork failures are never returned.
    pub async fn execute<P: ForkProgress + ?Sized>(
        &self,
        input: ForkOrganizationsUseCaseInput,
        progress: &mut P,
    ) -> Result<ForkOrganizationsUseCaseOutput, ForkOrganizationsError> {
        let mut output = ForkOrganizationsUseCaseOutput::default();

        for organization in input.organizations {
            let report = self.fork_organization(&organization, progress).await?;
            tracing::info!(
                "{}: {} repositories listed, {} forks dispatched",
                report.organization,
                report.repositories,
                report.dispatched
            );
            output.reports.push(report);
        }

        Ok(output)
    }

    #[tracing::instrument(
        name = "ForkOrganizationsInteractor::fork_organization",
        skip(self, progress)
    )]
    async fn fork_organization<P: ForkProgress + ?Sized>(
        &self,
        organization: &str,
        progress: &mut P,
    ) -> Result<OrganizationReport, ForkOrganizationsError> {
        progress.organization_started(organization);

        let repositories = self.list_all(organization, progress).await?;

        progress.forking_started();
        let outcome = self.dispatcher.execute(&repositories, progress).await;
        progress.organization_finished(outcome);

        let dispatched = match outcome {
            DispatchOutcome::UpToDate => 0,
            DispatchOutcome::Completed { dispatched } => dispatched,
        };

        Ok(OrganizationReport {
            organization: organization.to_string(),
            repositories: repositories.len(),
            dispatched,
        })
    }

    async fn list_all<P: ForkProgress + ?Sized>(
        &self,
        organization: &str,
        progress: &mut P,
    ) -> Result<Vec<RepoDescriptor>, ForkOrganizationsError> {
        progress.listing_started();

        let pages = self.lister.execute(organization);
        tokio::pin!(pages);

        let mut repositories = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|source| ForkOrganizationsError::Listing {
                organization: organization.to_string(),
                source,
            })?;
            progress.page_fetched(page.repositories.len());
            repositories.extend(page.repositories);
        }

        progress.listing_finished(repositories.len());
        tracing::debug!("Listed {} repositories", repositories.len());

        Ok(repositories)
    }
}
