//! Retry manager for connection establishment
//!
//! A fixed budget of attempts separated by a fixed delay. Only errors that
//! report themselves as retryable are tried again.

use crate::error::RetryableError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Fixed-delay retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryManager {
    attempts: u32,
    delay: Duration,
}

impl RetryManager {
    /// Create a policy of `attempts` tries in total, `delay` apart
    ///
    /// At least one attempt is always made.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Total number of attempts
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay between consecutive attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Execute an async operation with retry logic
    ///
    /// The operation runs at most `attempts` times while it returns a
    /// retryable error. Non-retryable errors return immediately.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let mut attempt = 0u32;

        let err = loop {
            let err = match operation().await {
                Ok(result) => return Ok(result),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            attempt += 1;
            if attempt >= self.attempts {
                break err;
            }

            warn!(
                attempt,
                total_attempts = self.attempts,
                delay_ms = self.delay.as_millis() as u64,
                error = %err,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(self.delay).await;
        };

        error!(attempts = attempt, error = %err, "Giving up after final attempt");
        Err(err)
    }
}
