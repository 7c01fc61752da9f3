//! Bounded retry with a caller-supplied error classifier.

use std::future::Future;
use std::time::Duration;

/// How often and how fast to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Duration::from_millis(500))
    }
}

/// A value together with the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// The error of the last attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    pub error: E,
    pub attempts: u32,
    /// Whether the classifier considered the last error retryable.
    pub retryable: bool,
}

/// Runs `op` until it succeeds, the classifier rejects the error, or the
/// policy runs out of attempts.
///
/// `op` receives the 1-based attempt number so callers can redo
/// preparation work (funding, input refresh) on later attempts.
pub async fn retry_with<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    is_retryable: C,
    mut op: F,
) -> Result<Retried<T>, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                });
            }
            Err(error) => {
                let retryable = is_retryable(&error);
                if !retryable || !policy.should_retry(attempt) {
                    return Err(Exhausted {
                        error,
                        attempts: attempt,
                        retryable,
                    });
                }
                tracing::debug!(attempt, max_attempts = policy.max_attempts, "retrying");
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
