//! Bounded retry with exponential backoff
//!
//! Every provider call goes through a `RetryPolicy`. `RetryPolicy::none()` is
//! the single-attempt baseline; the default makes three attempts with 1s, 2s
//! backoff between them.

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default number of attempts (first call included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry policy for model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, first call included (minimum 1)
    pub max_attempts: u32,

    /// Wait before the second attempt; doubles after each failure
    pub initial_backoff: Duration,

    /// Upper bound for a single wait
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// One attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// `max_attempts` attempts with 1s, 2s, 4s... backoff capped at 30s
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Override the initial backoff (tests use zero)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Wait after the `attempt`-th failure (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Longest time `run` can take when every attempt lasts `per_attempt`
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let attempts = self.max_attempts.max(1);
        let backoff = (1..attempts).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.backoff_for(attempt))
        });
        per_attempt.saturating_mul(attempts).saturating_add(backoff)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Result<T, LlmError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Model call failed, retrying: {}",
                        e
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::exponential(max_attempts).with_initial_backoff(Duration::ZERO)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::exponential(10);
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(9), Duration::from_secs(30));
    }

    #[test]
    fn test_worst_case_covers_attempts_and_backoff() {
        let per_attempt = Duration::from_secs(120);
        assert_eq!(RetryPolicy::none().worst_case(per_attempt), per_attempt);
        assert_eq!(
            RetryPolicy::exponential(3).worst_case(per_attempt),
            Duration::from_secs(3 * 120 + 1 + 2)
        );
    }

    #[test]
    fn test_none_makes_single_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::none().run(|_| {
            calls.set(calls.get() + 1);
            Err(LlmError::Communication("down".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_transient_failure_recovers() {
        let calls = Cell::new(0);
        let result = fast(3).run(|attempt| {
            calls.set(calls.get() + 1);
            if attempt < 3 {
                Err(LlmError::RateLimitExceeded)
            } else {
                Ok("answer")
            }
        });

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_permanent_failure_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast(5).run(|_| {
            calls.set(calls.get() + 1);
            Err(LlmError::Authentication("bad key".to_string()))
        });

        assert!(matches!(result, Err(LlmError::Authentication(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_attempts_exhausted_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), _> = fast(2).run(|_| {
            calls.set(calls.get() + 1);
            Err(LlmError::Timeout)
        });

        assert!(matches!(result, Err(LlmError::Timeout)));
        assert_eq!(calls.get(), 2);
    }
}
