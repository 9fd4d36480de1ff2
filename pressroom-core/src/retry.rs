//! Bounded retry with exponential backoff around a fallible async operation.
//!
//! A [`Retryer`] is built fresh for every call from a [`RetryPolicy`], a
//! retryability predicate and the operation itself. The wait between attempts
//! is the only place it suspends, and that wait observes a
//! [`CancellationToken`]: cancelling aborts the run with [`RetryError::Cancelled`]
//! without waiting for the backoff to elapse.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How many times to retry, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` means the operation runs exactly once.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (counted from 0): `initial * 2^attempt`, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(30);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("cancelled while waiting to retry")]
    Cancelled,
    #[error("{0}")]
    Failed(E),
}

impl<E> RetryError<E> {
    /// The last error of the operation, if the run was not cancelled.
    pub fn into_failure(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Failed(e) => Some(e),
        }
    }
}

pub struct Retryer<F, P> {
    policy: RetryPolicy,
    is_retryable: P,
    attempt: F,
}

impl<F, P> Retryer<F, P> {
    pub fn new(policy: RetryPolicy, is_retryable: P, attempt: F) -> Self {
        Self {
            policy,
            is_retryable,
            attempt,
        }
    }

    /// Runs the operation until it succeeds, fails with a non-retryable error,
    /// exhausts the policy, or `cancel` fires during a backoff wait.
    pub async fn run<T, E, Fut>(mut self, cancel: &CancellationToken) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt: u32 = 0;
        loop {
            let err = match (self.attempt)().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !(self.is_retryable)(&err) || attempt >= self.policy.max_retries {
                return Err(RetryError::Failed(err));
            }

            let backoff = self.policy.backoff_for(attempt);
            warn!(
                error = %err,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "[RETRY] Retryable failure, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt, "[RETRY] Cancelled during backoff");
                    return Err(RetryError::Cancelled);
                }
                _ = tokio::time::sleep(backoff) => {}
            }
            attempt += 1;
        }
    }
}
