//! Circuit breaker shared by every call that goes through it.
//!
//! The breaker tracks the health of a downstream, not of a single call: all
//! clones of a [`CircuitBreaker`] share one state, and every
//! read-check-transition step happens under a single lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::{Error, Result};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally.
    Closed,
    /// Circuit is open, requests are rejected immediately.
    Open,
    /// Cool-down elapsed, a single trial request decides the next state.
    HalfOpen,
}

/// Configuration for the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Duration the circuit stays open before letting a trial request through.
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(5),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new circuit breaker configuration.
    #[must_use]
    pub const fn new(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            failure_threshold,
            open_duration,
        }
    }

    /// Set the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the open duration.
    #[must_use]
    pub const fn with_open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    /// A threshold of zero behaves like one.
    const fn effective_threshold(&self) -> u32 {
        if self.failure_threshold == 0 {
            1
        } else {
            self.failure_threshold
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { trial_in_flight: bool },
}

#[derive(Debug)]
struct BreakerState {
    phase: Phase,
    failures: u32,
    last_transition: Instant,
}

impl BreakerState {
    fn transition(&mut self, phase: Phase, now: Instant) {
        self.phase = phase;
        self.last_transition = now;
    }
}

#[derive(Debug)]
struct Shared {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

/// Circuit breaker guarding a downstream.
///
/// Cloning is cheap and every clone observes the same state.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rebound::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
///
/// let breaker = CircuitBreaker::new(
///     CircuitBreakerConfig::default()
///         .with_failure_threshold(3)
///         .with_open_duration(Duration::from_secs(10)),
/// );
/// assert_eq!(breaker.state(), CircuitState::Closed);
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(BreakerState {
                    phase: Phase::Closed,
                    failures: 0,
                    last_transition: Instant::now(),
                }),
            }),
        }
    }

    /// Breaker configuration.
    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.shared.config
    }

    /// Current state, as last recorded.
    ///
    /// An open circuit whose cool-down elapsed stays [`CircuitState::Open`]
    /// until the next call asks for a permit.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        match self.lock().phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Consecutive failures recorded while closed.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// Instant of the last state transition.
    #[must_use]
    pub fn last_transition(&self) -> Instant {
        self.lock().last_transition
    }

    /// Returns `true` if both handles share the same state.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Ask for permission to run one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`] while the circuit is open, or while a
    /// half-open trial is already in flight.
    pub fn try_acquire(&self) -> Result<BreakerPermit> {
        let mut state = self.lock();
        let now = Instant::now();

        let trial = match state.phase {
            Phase::Closed => false,
            Phase::Open { since } if now.duration_since(since) >= self.shared.config.open_duration => {
                info!("circuit breaker half-open, allowing a trial request");
                state.transition(
                    Phase::HalfOpen {
                        trial_in_flight: true,
                    },
                    now,
                );
                true
            }
            Phase::HalfOpen {
                trial_in_flight: false,
            } => {
                state.phase = Phase::HalfOpen {
                    trial_in_flight: true,
                };
                true
            }
            Phase::Open { .. }
            | Phase::HalfOpen {
                trial_in_flight: true,
            } => return Err(Error::CircuitOpen),
        };

        Ok(BreakerPermit {
            breaker: self.clone(),
            trial,
            settled: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn on_success(&self, trial: bool) {
        let mut state = self.lock();
        match state.phase {
            Phase::Closed => state.failures = 0,
            Phase::HalfOpen { .. } if trial => {
                info!("circuit breaker closed after successful trial");
                state.failures = 0;
                state.transition(Phase::Closed, Instant::now());
            }
            // Late outcome of a call admitted before the circuit opened.
            Phase::HalfOpen { .. } | Phase::Open { .. } => {}
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut state = self.lock();
        let now = Instant::now();
        match state.phase {
            Phase::Closed => {
                state.failures += 1;
                if state.failures >= self.shared.config.effective_threshold() {
                    warn!(
                        failures = state.failures,
                        open_ms = u64::try_from(self.shared.config.open_duration.as_millis())
                            .unwrap_or(u64::MAX),
                        "circuit breaker opened"
                    );
                    state.transition(Phase::Open { since: now }, now);
                }
            }
            Phase::HalfOpen { .. } if trial => {
                warn!("circuit breaker trial failed, reopening");
                state.transition(Phase::Open { since: now }, now);
            }
            Phase::HalfOpen { .. } | Phase::Open { .. } => {}
        }
    }

    fn on_abandon(&self, trial: bool) {
        if !trial {
            return;
        }
        let mut state = self.lock();
        if let Phase::HalfOpen { .. } = state.phase {
            state.phase = Phase::HalfOpen {
                trial_in_flight: false,
            };
        }
    }
}

/// Permission to run one attempt, obtained from [`CircuitBreaker::try_acquire`].
///
/// Report the outcome with [`record_success`](Self::record_success) or
/// [`record_failure`](Self::record_failure). Dropping the permit without an
/// outcome (e.g. the call was cancelled) frees a half-open trial slot without
/// changing the state.
#[derive(Debug)]
#[must_use = "the outcome of the attempt must be recorded"]
pub struct BreakerPermit {
    breaker: CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl BreakerPermit {
    /// Returns `true` if this permit holds the half-open trial slot.
    #[must_use]
    pub const fn is_trial(&self) -> bool {
        self.trial
    }

    /// The attempt succeeded.
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    /// The attempt failed.
    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandon(self.trial);
        }
    }
}
