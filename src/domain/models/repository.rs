/// Path suffix of a repository's fork endpoint. Repositories whose `forks_url`
/// does not end with it cannot be forked through the API.
pub const FORKS_PATH_SUFFIX: &str = "/forks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDescriptor {
    pub name: String,
    pub owner_login: String,
    pub html_url: String,
    pub forks_url: String,
}

impl RepoDescriptor {
    pub fn is_forkable(&self) -> bool {
        self.forks_url.ends_with(FORKS_PATH_SUFFIX)
    }

    /// Canonical URL the fork will live at once created under `username`.
    ///
    /// Only the first occurrence of the owner login is replaced, so a
    /// repository named after its owner keeps its name.
    pub fn fork_html_url(&self, username: &str) -> String {
        self.html_url.replacen(&self.owner_login, username, 1)
    }
}

/// One page of an organization listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoPage {
    pub repositories: Vec<RepoDescriptor>,
    /// `None` once the service reports no further page.
    pub next_page: Option<u32>,
}
