use crate::application::use_cases::fork_organizations::{
    DEFAULT_MAX_CONCURRENT_FORKS, ForkOrganizationsUseCaseInput, ForkSettings,
};
use crate::infrastructures::adapters::primary::console::ColorMode;
use crate::infrastructures::adapters::secondary::external_apis::github::DEFAULT_API_URL;
use clap::Parser;
use clap::builder::TypedValueParser;
use std::time::Duration;

const AFTER_HELP: &str = "\
Environment:
  GITHUB_USERNAME               account the forks are created under
  GITORGFORK_GITHUB_API_TOKEN   API token used to authenticate";

#[derive(Parser, Debug)]
#[command(
    name = "gitorgfork",
    version,
    about = "Fork every repository of one or more GitHub organizations into your account",
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Organizations whose repositories should be forked
    #[arg(required = true, value_name = "ORG")]
    pub organizations: Vec<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITORGFORK_GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Pause between listing pages and between fork launches, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,

    /// Fork requests allowed in flight at once
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CONCURRENT_FORKS,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub max_concurrent_forks: usize,

    /// Timeout of every API request, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// When to color the transcript
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

impl Cli {
    pub fn settings(&self) -> ForkSettings {
        ForkSettings {
            delay: Duration::from_millis(self.delay_ms),
            max_concurrent_forks: self.max_concurrent_forks,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn input(&self) -> ForkOrganizationsUseCaseInput {
        ForkOrganizationsUseCaseInput {
            organizations: self.organizations.clone(),
        }
    }
}
