use anyhow::Context;
use clap::Parser;
use gitorgfork::application::use_cases::fork_organizations::ForkOrganizationsInteractor;
use gitorgfork::config::Credentials;
use gitorgfork::infrastructures::adapters::primary::cli::Cli;
use gitorgfork::infrastructures::adapters::primary::console::ConsoleTranscript;
use gitorgfork::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use gitorgfork::telemetry;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{info, info_span};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = telemetry::init()?;

    let result = run(cli).await;
    telemetry.shutdown();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let initialize_span = info_span!("initialize");
    let credentials = {
        let _enter = initialize_span.enter();
        info!("Application starting");
        // Checked before any request goes out.
        Credentials::from_env()?
    };

    let github_api_adapter = Arc::new(
        GitHubApiAdapter::new(&cli.api_url, credentials.token, cli.timeout())
            .context("Failed to set up the GitHub API client")?,
    );
    let use_case =
        ForkOrganizationsInteractor::new(github_api_adapter, credentials.username, cli.settings());

    let stdout = std::io::stdout();
    let color = cli
        .color
        .enabled(std::env::var_os("NO_COLOR").is_some(), stdout.is_terminal());
    let mut transcript = ConsoleTranscript::new(stdout.lock(), color);

    let output = use_case.execute(cli.input(), &mut transcript).await?;

    let dispatched: usize = output.reports.iter().map(|r| r.dispatched).sum();
    info!(
        "Done: {} organizations, {} forks dispatched",
        output.reports.len(),
        dispatched
    );

    Ok(())
}
