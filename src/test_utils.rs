#![cfg(test)]

use crate::application::use_cases::dispatch_forks::DispatchOutcome;
use crate::application::use_cases::fork_organizations::ForkProgress;
use crate::domain::external_apis::github::{GitHubApi, GitHubApiError};
use crate::domain::models::repository::{RepoDescriptor, RepoPage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub fn make_repo(owner: &str, name: &str) -> RepoDescriptor {
    RepoDescriptor {
        name: name.to_string(),
        owner_login: owner.to_string(),
        html_url: format!("https://github.com/{owner}/{name}"),
        forks_url: format!("https://api.github.com/repos/{owner}/{name}/forks"),
    }
}

pub fn make_repos(owner: &str, count: usize) -> Vec<RepoDescriptor> {
    (0..count)
        .map(|i| make_repo(owner, &format!("repo-{i}")))
        .collect()
}

/// In-memory stand-in for the GitHub API that records every call it receives.
#[derive(Default)]
pub struct FakeGitHubApi {
    orgs: HashMap<String, Vec<RepoDescriptor>>,
    failing_orgs: HashSet<String>,
    failing_forks: HashSet<String>,
    fork_latency: Duration,
    requested_pages: Mutex<Vec<(String, u32)>>,
    fork_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeGitHubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, org: &str, repos: Vec<RepoDescriptor>) -> Self {
        self.orgs.insert(org.to_string(), repos);
        self
    }

    pub fn with_failing_org(mut self, org: &str) -> Self {
        self.failing_orgs.insert(org.to_string());
        self
    }

    pub fn with_failing_fork(mut self, forks_url: &str) -> Self {
        self.failing_forks.insert(forks_url.to_string());
        self
    }

    pub fn with_fork_latency(mut self, latency: Duration) -> Self {
        self.fork_latency = latency;
        self
    }

    pub fn requested_pages(&self, org: &str) -> Vec<u32> {
        lock(&self.requested_pages)
            .iter()
            .filter(|(name, _)| name == org)
            .map(|(_, page)| *page)
            .collect()
    }

    pub fn requested_orgs(&self) -> Vec<String> {
        let mut orgs: Vec<String> = Vec::new();
        for (name, _) in lock(&self.requested_pages).iter() {
            if !orgs.contains(name) {
                orgs.push(name.clone());
            }
        }
        orgs
    }

    pub fn fork_calls(&self) -> Vec<String> {
        lock(&self.fork_calls).clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitHubApi for FakeGitHubApi {
    async fn list_organization_repositories(
        &self,
        org: &str,
        page: u32,
        per_page: u8,
    ) -> Result<RepoPage, GitHubApiError> {
        lock(&self.requested_pages).push((org.to_string(), page));

        let url = format!("https://api.github.com/orgs/{org}/repos?page={page}");
        if self.failing_orgs.contains(org) {
            return Err(GitHubApiError::Status {
                url,
                status: 404,
                message: "Not Found".to_string(),
            });
        }

        let repos = self.orgs.get(org).ok_or_else(|| GitHubApiError::Status {
            url,
            status: 404,
            message: "Not Found".to_string(),
        })?;

        let per_page = usize::from(per_page);
        let start = (page as usize - 1) * per_page;
        let end = (start + per_page).min(repos.len());
        let repositories = repos.get(start..end).unwrap_or_default().to_vec();
        let next_page = (end < repos.len()).then_some(page + 1);

        Ok(RepoPage {
            repositories,
            next_page,
        })
    }

    async fn create_fork(&self, forks_url: &str) -> Result<(), GitHubApiError> {
        lock(&self.fork_calls).push(forks_url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.fork_latency.is_zero() {
            tokio::time::sleep(self.fork_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_forks.contains(forks_url) {
            return Err(GitHubApiError::Transport {
                url: forks_url.to_string(),
                source: "connection reset by peer".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    OrganizationStarted(String),
    ListingStarted,
    PageFetched(usize),
    ListingFinished(usize),
    ForkingStarted,
    ForkDispatched { fork_url: String, source_url: String },
    DispatchFinished,
    ForkCompleted,
    OrganizationFinished(DispatchOutcome),
}

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<ProgressEvent>,
}

impl RecordingProgress {
    pub fn pages(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::PageFetched(_)))
            .count()
    }

    pub fn completions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == ProgressEvent::ForkCompleted)
            .count()
    }

    pub fn dispatched_pairs(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ForkDispatched {
                    fork_url,
                    source_url,
                } => Some((fork_url.clone(), source_url.clone())),
                _ => None,
            })
            .collect()
    }
}

impl ForkProgress for RecordingProgress {
    fn organization_started(&mut self, org: &str) {
        self.events
            .push(ProgressEvent::OrganizationStarted(org.to_string()));
    }

    fn listing_started(&mut self) {
        self.events.push(ProgressEvent::ListingStarted);
    }

    fn page_fetched(&mut self, repositories: usize) {
        self.events.push(ProgressEvent::PageFetched(repositories));
    }

    fn listing_finished(&mut self, total: usize) {
        self.events.push(ProgressEvent::ListingFinished(total));
    }

    fn forking_started(&mut self) {
        self.events.push(ProgressEvent::ForkingStarted);
    }

    fn fork_dispatched(&mut self, fork_url: &str, source_url: &str) {
        self.events.push(ProgressEvent::ForkDispatched {
            fork_url: fork_url.to_string(),
            source_url: source_url.to_string(),
        });
    }

    fn dispatch_finished(&mut self) {
        self.events.push(ProgressEvent::DispatchFinished);
    }

    fn fork_completed(&mut self) {
        self.events.push(ProgressEvent::ForkCompleted);
    }

    fn organization_finished(&mut self, outcome: DispatchOutcome) {
        self.events.push(ProgressEvent::OrganizationFinished(outcome));
    }
}
