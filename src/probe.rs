//! The polling probe: wait for a server-side collection to grow past a
//! known baseline and return its newest entry.

use std::future::Future;
use std::time::Duration;

use crate::client::DesignClient;
use crate::error::Result;
use crate::poll::{poll_until, FixedInterval, PollOutcome, PollStrategy};
use crate::types::Artifact;

/// Default time to wait for a new item.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Wait until `fetch` returns more than `baseline` items, then return the
/// first one (the service lists newest first).
///
/// If several items land between two polls, only the newest is returned.
pub async fn wait_for_new_item<T, E, F, Fut, P, K>(
    fetch: F,
    baseline: usize,
    strategy: &mut P,
    timeout: Duration,
    on_tick: K,
) -> std::result::Result<PollOutcome<T>, E>
where
    T: Clone,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Vec<T>, E>>,
    P: PollStrategy + ?Sized,
    K: FnMut(Duration),
{
    poll_until(
        fetch,
        |items: &Vec<T>| {
            if items.len() > baseline {
                items.first().cloned()
            } else {
                None
            }
        },
        strategy,
        timeout,
        on_tick,
    )
    .await
}

/// Watches a session's artifact list for new entries.
///
/// # Example
/// ```no_run
/// use tailor_probe::{ArtifactProbe, DesignClient};
/// use std::time::Duration;
///
/// # async fn example() -> tailor_probe::Result<()> {
/// let client = DesignClient::new("http://localhost:3000");
/// let mut probe = ArtifactProbe::new(&client);
/// let baseline = client.artifacts("session-id").await?.len();
/// let found = probe
///     .wait_for_new_artifact("session-id", baseline, Duration::from_secs(90), |_| {})
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ArtifactProbe<'a> {
    client: &'a DesignClient,
    strategy: Box<dyn PollStrategy + Send + 'a>,
}

impl<'a> ArtifactProbe<'a> {
    /// Probe with the stock fixed 2 s interval.
    pub fn new(client: &'a DesignClient) -> Self {
        Self {
            client,
            strategy: Box::new(FixedInterval::default()),
        }
    }

    /// Replace the polling strategy.
    pub fn with_strategy(mut self, strategy: impl PollStrategy + Send + 'a) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Poll the artifact list until it holds more than `baseline` entries.
    ///
    /// Returns `PollOutcome::TimedOut` if nothing new shows up in time. Any
    /// HTTP failure aborts the wait with an error.
    pub async fn wait_for_new_artifact<K>(
        &mut self,
        session_id: &str,
        baseline: usize,
        timeout: Duration,
        on_tick: K,
    ) -> Result<PollOutcome<Artifact>>
    where
        K: FnMut(Duration),
    {
        let client = self.client;
        let outcome = wait_for_new_item(
            || client.artifacts(session_id),
            baseline,
            self.strategy.as_mut(),
            timeout,
            on_tick,
        )
        .await?;

        match &outcome {
            PollOutcome::Ready(artifact) => {
                tracing::debug!(session_id, artifact_id = %artifact.id, "new artifact");
            }
            PollOutcome::TimedOut => {
                tracing::debug!(session_id, baseline, ?timeout, "no new artifact before deadline");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_returns_newest_after_growth() {
        let polls = Cell::new(0u32);
        let out: std::result::Result<_, ()> = wait_for_new_item(
            || {
                polls.set(polls.get() + 1);
                let items = if polls.get() >= 3 {
                    vec!["new", "old"]
                } else {
                    vec!["old"]
                };
                async move { Ok(items) }
            },
            1,
            &mut FixedInterval::default(),
            Duration::from_secs(120),
            |_| {},
        )
        .await;
        assert_eq!(out, Ok(PollOutcome::Ready("new")));
        assert_eq!(polls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_returns_only_newest() {
        let polls = Cell::new(0u32);
        let out: std::result::Result<_, ()> = wait_for_new_item(
            || {
                polls.set(polls.get() + 1);
                let items = if polls.get() >= 2 {
                    vec![3, 2, 1]
                } else {
                    vec![1]
                };
                async move { Ok(items) }
            },
            1,
            &mut FixedInterval::default(),
            Duration::from_secs(120),
            |_| {},
        )
        .await;
        assert_eq!(out, Ok(PollOutcome::Ready(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_grows_times_out() {
        let start = Instant::now();
        let out: std::result::Result<PollOutcome<u8>, ()> = wait_for_new_item(
            || async { Ok(vec![1u8, 2]) },
            2,
            &mut FixedInterval::default(),
            DEFAULT_TIMEOUT,
            |_| {},
        )
        .await;
        assert!(out.unwrap().is_timed_out());
        let elapsed = start.elapsed();
        assert!(elapsed >= DEFAULT_TIMEOUT);
        assert!(elapsed < DEFAULT_TIMEOUT + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_timeout_returns_ready() {
        let out: std::result::Result<_, ()> = wait_for_new_item(
            || async { Ok(vec!["a"]) },
            0,
            &mut FixedInterval::default(),
            Duration::from_secs(u64::MAX),
            |_| {},
        )
        .await;
        assert_eq!(out, Ok(PollOutcome::Ready("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_baseline_with_existing_items_is_immediate() {
        let out: std::result::Result<_, ()> = wait_for_new_item(
            || async { Ok(vec!["a"]) },
            0,
            &mut FixedInterval::default(),
            Duration::from_secs(1),
            |_| {},
        )
        .await;
        assert_eq!(out.unwrap().into_option(), Some("a"));
    }
}
