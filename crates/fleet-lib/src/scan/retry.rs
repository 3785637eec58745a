//! Bounded retries with exponential backoff

use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included (default: 3)
    pub max_attempts: u32,
    /// Delay before the second attempt (default: 200ms)
    pub initial_backoff: Duration,
    /// Upper bound on any single delay (default: 5s)
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based), doubling each time
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        std::cmp::min(self.initial_backoff * 2u32.pow(exponent), self.max_backoff)
    }
}

/// Last error after every attempt failed
#[derive(Debug)]
pub struct RetriesExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or `policy.max_attempts` is reached
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, RetriesExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                return Err(RetriesExhausted {
                    attempts: attempt,
                    last_error: e,
                })
            }
            Err(e) => {
                let delay = policy.backoff_after(attempt);
                debug!(
                    operation = %operation,
                    attempt = attempt,
                    next_backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
