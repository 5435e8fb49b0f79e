//! Retries read-modify-write cycles which lost an optimistic-concurrency race.
//!
//! Writes to a resource carry the `resourceVersion` they were computed from. If another writer
//! updated the resource in the meantime, the API server rejects the write with `409 Conflict` and
//! the whole cycle (re-read, recompute, write) has to run again.

use std::{future::Future, time::Duration};

use backoff::{ExponentialBackoff, backoff::Backoff as _};

/// Errors which can tell whether they were caused by a concurrent modification.
pub trait IsConflict {
    fn is_conflict(&self) -> bool;
}

impl IsConflict for kube::Error {
    fn is_conflict(&self) -> bool {
        matches!(self, kube::Error::Api(response) if response.code == 409)
    }
}

/// Exponential backoff between attempts of [`retry_on_conflict`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryBackoff {
    /// Maximum number of attempts, including the first one.
    pub steps: u32,

    /// Delay before the second attempt.
    pub initial: Duration,

    /// Every following delay is the previous one multiplied by this factor.
    pub factor: u32,

    /// Upper bound of a single delay.
    pub max: Duration,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            steps: 4,
            initial: Duration::from_millis(10),
            factor: 5,
            max: Duration::from_secs(1),
        }
    }
}

impl RetryBackoff {
    /// Builds the jitter-free exponential schedule described by `self`.
    ///
    /// The schedule itself never runs out. The number of attempts is bounded by [`Self::steps`].
    pub fn exponential(&self) -> ExponentialBackoff {
        let initial_interval = self.initial.min(self.max);

        let mut backoff = ExponentialBackoff {
            current_interval: initial_interval,
            initial_interval,
            randomization_factor: 0.0,
            multiplier: f64::from(self.factor),
            max_interval: self.max,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        backoff
    }

    /// Returns the delays between consecutive attempts. There is one delay less than attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let mut backoff = self.exponential();

        std::iter::from_fn(move || backoff.next_backoff())
            .take(self.steps.saturating_sub(1) as usize)
    }
}

/// Runs `op` until it succeeds, fails with an error which is not a conflict, or the attempts of
/// `backoff` are exhausted. In the last case the error of the final attempt is returned.
///
/// `op` must perform the whole read-modify-write cycle, re-reading the resource on every attempt.
pub async fn retry_on_conflict<T, E, F, Fut>(backoff: RetryBackoff, mut op: F) -> Result<T, E>
where
    E: IsConflict + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff_strategy = backoff.exponential();
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err) if err.is_conflict() => {
                let delay = if attempt < backoff.steps {
                    backoff_strategy.next_backoff()
                } else {
                    None
                };

                let Some(delay) = delay else {
                    tracing::warn!(attempt, error = %err, "giving up after conflicting writes");
                    return Err(err);
                };

                tracing::debug!(attempt, ?delay, error = %err, "write conflicted, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
