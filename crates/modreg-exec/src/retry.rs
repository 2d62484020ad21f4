//! Retry with linear backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;

/// How often and how patiently a failing call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Wait before retry `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    pub fn backoff(&self) -> LinearBackoff {
        LinearBackoff {
            attempt: 0,
            attempts: self.attempts,
            base_delay: self.base_delay,
        }
    }
}

/// `attempt * base_delay` between attempts, giving up after `attempts`.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    attempt: u32,
    attempts: u32,
    base_delay: Duration,
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.attempts {
            None
        } else {
            Some(self.base_delay * self.attempt)
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy is
/// exhausted. Failed attempts are logged under `label`.
///
/// The operation reports retryable failures as `backoff::Error::transient`
/// and final ones as `backoff::Error::permanent`.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, label: &str, operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, backoff::Error<E>>>,
{
    let notify = |err: E, wait: Duration| {
        tracing::warn!("{}: attempt failed: {}; retrying in {:?}", label, err, wait);
    };
    backoff::future::retry_notify(policy.backoff(), operation, notify).await
}
