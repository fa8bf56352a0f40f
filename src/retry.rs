//! Bounded retry for transient transport failures
//!
//! Idempotent requests are reattempted on timeouts and the fixed set of
//! transient HTTP statuses (408, 429, 500, 502, 503, 504). Non-retryable
//! failures propagate immediately and the last failure is surfaced
//! unchanged once the attempt budget is exhausted.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ApiConfig;
use crate::Result;

/// Retry attempt budget and backoff schedule
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a policy with the given retry budget and base delay
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Build the policy from the API configuration
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay_ms)
    }

    /// A policy that never retries, for non-idempotent requests
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Maximum number of retries after the initial attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry attempt (1-based).
    ///
    /// The delay doubles per attempt and is capped at four times the base
    /// delay, so the default schedule is 1s, 2s, 4s.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(2);
        let multiplier = 1_u64 << shift;
        Duration::from_millis(self.base_delay_ms.saturating_mul(multiplier))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Run an operation under the retry policy.
///
/// The operation is re-invoked for each attempt; retries happen only when
/// the failure is retryable per [`crate::Error::is_retryable`]. After the
/// budget is exhausted the last failure is returned unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries() => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "request failed ({}), retry {}/{} in {:?}",
                    err,
                    attempt,
                    policy.max_retries(),
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
