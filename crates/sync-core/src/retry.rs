//! Bounded retries for idempotent remote calls.
//!
//! Every object-storage and database call made during an invocation goes
//! through [`retry_with_backoff`], which caps each attempt with a timeout
//! and retries transient failures with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts per call (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);
/// Default per-attempt timeout
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Backoff stops doubling after this many retries (16x the base delay)
const MAX_BACKOFF_SHIFT: u32 = 4;

/// Errors that can tell whether retrying the same call may succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for anyhow::Error {
    fn is_transient(&self) -> bool {
        false
    }
}

/// How many times to try a call and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub operation_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn once(operation_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            operation_timeout,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_delay * (1u32 << shift)
    }
}

/// Run `call` until it succeeds, fails permanently, or runs out of attempts.
///
/// Each attempt is bounded by `policy.operation_timeout`; an attempt that
/// times out is turned into an error with `on_timeout` and treated like any
/// other error of that kind. Only errors reporting
/// [`Retryable::is_transient`] are retried.
pub async fn retry_with_backoff<T, E, F, Fut, G>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
    on_timeout: G,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
    G: Fn(Duration) -> E,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(policy.operation_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(policy.operation_timeout)),
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{operation} succeeded after {attempt} attempts");
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() || attempt >= max_attempts => return Err(e),
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    "{operation} failed (attempt {attempt}/{max_attempts}): {e}. Retrying in {delay:?}..."
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
