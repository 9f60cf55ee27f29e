pub mod dispatch_forks;
pub mod fork_organizations;
pub mod list_organization_repositories;
