//! Retry policy.

use std::time::Duration;

use crate::Error;

/// How many times a failed attempt is repeated.
///
/// Every failure of an executed attempt is retried (timeouts, rejected
/// status codes, transport errors). Breaker rejections, decoding errors and
/// invalid requests are not: repeating them cannot change the outcome.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rebound::resilience::RetryPolicy;
///
/// let policy = RetryPolicy::new(2).with_backoff(Duration::from_millis(100));
/// assert_eq!(policy.max_attempts(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Option<Duration>,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: None,
        }
    }

    /// Retry up to `max_retries` times after the first attempt.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: None,
        }
    }

    /// Wait this long before each retry.
    #[must_use]
    pub const fn with_backoff(mut self, delay: Duration) -> Self {
        self.backoff = Some(delay);
        self
    }

    /// Configured number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts, first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before each retry.
    #[must_use]
    pub const fn backoff(&self) -> Option<Duration> {
        self.backoff
    }

    /// A fresh budget for one top-level call.
    #[must_use]
    pub const fn budget(&self) -> RetryBudget {
        RetryBudget {
            remaining: self.max_retries,
        }
    }

    /// Returns `true` if the error of an attempt may be retried.
    #[must_use]
    pub const fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }
}

/// Remaining retries of one top-level call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    /// Retries left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one retry, returns `false` once the budget is exhausted.
    pub fn try_consume(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(remaining) => {
                self.remaining = remaining;
                true
            }
            None => false,
        }
    }
}
