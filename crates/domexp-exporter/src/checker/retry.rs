//! Retry with exponential backoff for per-domain lookups.

use std::future::Future;
use std::time::Duration;

use domexp_core::error::{ExpiryError, Result};

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: usize,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Delay multiplier applied after each further failure.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }

    /// Delay after failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt.min(20)).unwrap_or(20);
        self.initial_delay
            .saturating_mul(self.multiplier.saturating_pow(exp))
    }

    /// Run `operation` until it succeeds or attempts are exhausted, returning
    /// the last outcome. `on_failure(attempt, err)` sees every failure
    /// (1-indexed attempt). No delay follows the final attempt.
    pub async fn execute<F, Fut, T, L>(&self, mut operation: F, mut on_failure: L) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        L: FnMut(usize, &ExpiryError),
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    on_failure(attempt + 1, &e);
                    if attempt + 1 >= self.max_attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
