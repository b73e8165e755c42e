//! Resilience pipeline: circuit breaker, retry and fallback in a fixed order.
//!
//! ```text
//! fallback( decode( retry( breaker( attempt ) ) ) )
//! ```
//!
//! - the breaker gates every attempt, retries included;
//! - the retry loop only sees per-attempt errors;
//! - decoding runs once, on the body of the successful attempt;
//! - the fallback only sees the terminal error.

use std::future::Future;

use tracing::{debug, info, warn};

use super::{CircuitBreaker, Fallback, RetryPolicy};
use crate::Result;

/// Explicit composition of the resilience policies around one logical call.
///
/// # Example
///
/// ```
/// use rebound::resilience::{CircuitBreaker, Pipeline, RetryPolicy};
///
/// # async fn demo() -> rebound::Result<()> {
/// let pipeline = Pipeline::new()
///     .with_retry(RetryPolicy::new(2))
///     .with_breaker(CircuitBreaker::default());
///
/// let value: u32 = pipeline
///     .run(|_attempt| async { Ok("42".to_string()) }, |raw| Ok(raw.parse().unwrap_or_default()), None)
///     .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    breaker: Option<CircuitBreaker>,
    retry: RetryPolicy,
}

impl Pipeline {
    /// A pipeline without breaker and without retry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate attempts with this breaker.
    #[must_use]
    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Gate attempts with this breaker, if any.
    #[must_use]
    pub fn with_optional_breaker(mut self, breaker: Option<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Use this retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The breaker gating attempts.
    #[must_use]
    pub const fn breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// The retry policy.
    #[must_use]
    pub const fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Run attempts under the breaker and the retry policy.
    ///
    /// `attempt` receives the 1-based attempt number. Returns the value of the
    /// first successful attempt, or the error that ended the loop.
    pub async fn attempts<T, A, Fut>(&self, mut attempt: A) -> Result<T>
    where
        A: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut budget = self.retry.budget();
        let mut number = 0_u32;

        loop {
            number = number.saturating_add(1);

            let permit = match &self.breaker {
                Some(breaker) => Some(breaker.try_acquire().inspect_err(|_| {
                    debug!(attempt = number, "attempt rejected by open circuit");
                })?),
                None => None,
            };

            let error = match attempt(number).await {
                Ok(value) => {
                    if let Some(permit) = permit {
                        permit.record_success();
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let retryable = RetryPolicy::should_retry(&error);
            if let Some(permit) = permit {
                if retryable {
                    permit.record_failure();
                } else {
                    drop(permit);
                }
            }

            if !retryable || !budget.try_consume() {
                return Err(error);
            }

            debug!(
                attempt = number,
                remaining = budget.remaining(),
                error = %error,
                "attempt failed, retrying"
            );
            if let Some(delay) = self.retry.backoff() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Run one logical call: attempts, then decoding, then fallback.
    ///
    /// The fallback, when given, is invoked at most once with the terminal
    /// error; its result is final.
    pub async fn run<T, V, A, Fut, D>(
        &self,
        attempt: A,
        decode: D,
        fallback: Option<&Fallback<V>>,
    ) -> Result<V>
    where
        A: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        D: FnOnce(T) -> Result<V>,
        V: Send + 'static,
    {
        let error = match self.attempts(attempt).await.and_then(decode) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match fallback {
            Some(fallback) => {
                info!(error = %error, "invoking fallback");
                fallback.invoke(error).await.inspect_err(|err| {
                    warn!(error = %err, "fallback failed");
                })
            }
            None => Err(error),
        }
    }
}
