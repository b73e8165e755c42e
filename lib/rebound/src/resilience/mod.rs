//! Resilience policies wrapped around each call.
//!
//! [`Pipeline`] composes them in a fixed order: the [`CircuitBreaker`] gates
//! every attempt, the [`RetryPolicy`] repeats failed attempts, and the
//! [`Fallback`] turns the terminal error into a substitute value.

mod circuit_breaker;
mod fallback;
mod pipeline;
mod retry;

pub use circuit_breaker::{BreakerPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::Fallback;
pub use pipeline::Pipeline;
pub use retry::{RetryBudget, RetryPolicy};
