use crate::application::use_cases::fork_organizations::ForkProgress;
use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::repository::RepoDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

/// Token posted once by a fork worker when it finishes, whatever the outcome.
///
/// The token is sent on drop so a worker that errors out or panics still
/// releases the barrier.
#[derive(Debug)]
pub struct CompletionSignal {
    done: mpsc::UnboundedSender<()>,
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        // Only fails once the barrier is gone, when nobody is waiting anymore.
        let _ = self.done.send(());
    }
}

/// Counts dispatched workers and waits for exactly that many completion signals.
#[derive(Debug)]
pub struct CompletionBarrier {
    done_tx: mpsc::UnboundedSender<()>,
    done_rx: mpsc::UnboundedReceiver<()>,
    dispatched: usize,
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionBarrier {
    pub fn new() -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            done_tx,
            done_rx,
            dispatched: 0,
        }
    }

    pub fn register(&mut self) -> CompletionSignal {
        self.dispatched += 1;
        CompletionSignal {
            done: self.done_tx.clone(),
        }
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Drains one signal per registered worker, calling `on_arrival` after each.
    /// Returns the number of signals received.
    pub async fn wait<F: FnMut()>(self, mut on_arrival: F) -> usize {
        let Self {
            done_tx,
            mut done_rx,
            dispatched,
        } = self;
        drop(done_tx);

        let mut arrived = 0;
        while arrived < dispatched {
            if done_rx.recv().await.is_none() {
                tracing::warn!(
                    "Completion channel closed after {} of {} signals",
                    arrived,
                    dispatched
                );
                break;
            }
            arrived += 1;
            on_arrival();
        }
        arrived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No repository qualified; nothing was sent and nothing was awaited.
    UpToDate,
    Completed { dispatched: usize },
}

pub struct ForkDispatcher<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    username: String,
    delay: Duration,
    limiter: Arc<Semaphore>,
}

impl<G: GitHubApi + Send + Sync + 'static> ForkDispatcher<G> {
    pub fn new(
        github_api: Arc<G>,
        username: String,
        delay: Duration,
        max_concurrent_forks: usize,
    ) -> Self {
        Self {
            github_api,
            username,
            delay,
            limiter: Arc::new(Semaphore::new(max_concurrent_forks.max(1))),
        }
    }

    /// Launches one fork worker per forkable repository, `delay` apart, and
    /// returns once every one of them has finished.
    #[tracing::instrument(
        name = "ForkDispatcher::execute",
        skip_all,
        fields(repositories = repositories.len())
    )]
    pub async fn execute<P: ForkProgress + ?Sized>(
        &self,
        repositories: &[RepoDescriptor],
        progress: &mut P,
    ) -> DispatchOutcome {
        let mut barrier = CompletionBarrier::new();

        for repo in repositories.iter().filter(|repo| repo.is_forkable()) {
            if barrier.dispatched() > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            progress.fork_dispatched(&repo.fork_html_url(&self.username), &repo.html_url);
            self.spawn_worker(repo.clone(), barrier.register());
        }
        progress.dispatch_finished();

        let dispatched = barrier.dispatched();
        if dispatched == 0 {
            tracing::info!("No forkable repositories");
            return DispatchOutcome::UpToDate;
        }

        tracing::info!("Waiting for {} fork requests", dispatched);
        let arrived = barrier.wait(|| progress.fork_completed()).await;
        tracing::debug!("{} of {} fork workers finished", arrived, dispatched);

        DispatchOutcome::Completed { dispatched }
    }

    fn spawn_worker(&self, repo: RepoDescriptor, signal: CompletionSignal) {
        let github_api = self.github_api.clone();
        let limiter = self.limiter.clone();

        tokio::spawn(async move {
            let _signal = signal;
            // Held until the request finishes; dropped before the signal. The
            // semaphore is never closed, so acquiring only fails if it were.
            let _permit = limiter.acquire_owned().await.ok();

            match github_api.create_fork(&repo.forks_url).await {
                Ok(()) => tracing::info!("Fork requested for {}", repo.html_url),
                Err(e) => tracing::error!(
                    "Failed to fork {}: {:#}",
                    repo.html_url,
                    anyhow::Error::from(e)
                ),
            }
        });
    }
}
