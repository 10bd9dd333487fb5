//! Deadline-bounded polling over periodically re-fetched state.
//!
//! [`poll_until`] re-runs a fetch, hands each snapshot to a predicate, and
//! stops at the first match or once the deadline passes. The delay between
//! fetches comes from a [`PollStrategy`], so callers can swap a fixed
//! interval for backoff without touching the loop.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Result of waiting on a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate matched and produced a value.
    Ready(T),
    /// The deadline passed before the predicate matched.
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            PollOutcome::Ready(v) => Some(v),
            PollOutcome::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut)
    }
}

/// Decides how long to sleep between polls.
pub trait PollStrategy {
    /// Delay before the next fetch.
    fn next_delay(&mut self) -> Duration;

    /// Called once at the start of every wait.
    fn reset(&mut self) {}
}

/// The same delay every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval(pub Duration);

impl Default for FixedInterval {
    fn default() -> Self {
        Self(Duration::from_secs(2))
    }
}

impl PollStrategy for FixedInterval {
    fn next_delay(&mut self) -> Duration {
        self.0
    }
}

/// Exponential backoff, multiplied by `factor` each poll and capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    factor: u32,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, factor: u32, max: Duration) -> Self {
        Self {
            initial,
            factor: factor.max(1),
            max,
            current: initial,
        }
    }
}

impl PollStrategy for Backoff {
    fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = self.current.saturating_mul(self.factor).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Fetch state until `check` returns `Some`, or `timeout` elapses.
///
/// The first fetch happens immediately. After a non-matching fetch the
/// deadline is checked, then the loop sleeps for the strategy's delay
/// (clamped to the time left) and calls `on_tick` with the elapsed time.
/// A fetch error ends the wait at once; no further fetches are issued.
pub async fn poll_until<S, T, E, F, Fut, C, P, K>(
    mut fetch: F,
    mut check: C,
    strategy: &mut P,
    timeout: Duration,
    mut on_tick: K,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    C: FnMut(&S) -> Option<T>,
    P: PollStrategy + ?Sized,
    K: FnMut(Duration),
{
    strategy.reset();
    let start = Instant::now();
    // A timeout too large to represent as an instant never expires.
    let deadline = start.checked_add(timeout);

    loop {
        let state = fetch().await?;
        if let Some(found) = check(&state) {
            return Ok(PollOutcome::Ready(found));
        }

        let mut delay = strategy.next_delay();
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Ok(PollOutcome::TimedOut);
            }
            delay = delay.min(deadline - now);
        }
        tokio::time::sleep(delay).await;
        on_tick(start.elapsed());
    }
}
