//! Settings of [`HyperTransport`](crate::HyperTransport).
//!
//! These apply to every exchange of the transport, below the resilience
//! pipeline. A call made through [`RestClient`](crate::RestClient) has two
//! deadlines:
//!
//! - the call's own [`timeout`](crate::CallBuilder::timeout), raced against
//!   each attempt by the executor and reported as [`Error::Timeout`];
//! - [`ClientConfig::timeout`], which bounds every exchange of an attempt
//!   (each redirect hop included) when the call sets no timeout.
//!
//! A per-call timeout replaces the configured one for that call; the two
//! never add up.
//!
//! [`Error::Timeout`]: crate::Error::Timeout

use std::time::Duration;

use crate::middleware::DEFAULT_MAX_REDIRECTS;

/// Default `User-Agent` sent by [`HyperTransport`](crate::HyperTransport).
pub const DEFAULT_USER_AGENT: &str = concat!("rebound/", env!("CARGO_PKG_VERSION"));

/// Transport settings.
///
/// ```
/// use std::time::Duration;
///
/// use rebound::{ClientConfig, RestClient};
///
/// let client = RestClient::with_config(
///     ClientConfig::builder()
///         .timeout(Duration::from_secs(5))
///         .max_redirects(0)
///         .build(),
/// );
/// assert_eq!(client.transport().config().max_redirects, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline of one exchange when the call has no timeout of its own.
    pub timeout: Duration,
    /// Deadline to open a connection, TLS handshake excluded.
    pub connect_timeout: Duration,
    /// Idle pooled connections kept per host between calls.
    pub pool_idle_per_host: usize,
    /// How long an idle pooled connection survives.
    pub pool_idle_timeout: Duration,
    /// Let hyper resend a request the pool handed to a connection that was
    /// closing. This happens below the retry policy and is not counted as an
    /// attempt.
    pub retry_on_connection_failure: bool,
    /// Redirect hops followed per exchange; `0` hands `3xx` answers to status
    /// validation.
    pub max_redirects: usize,
    /// `User-Agent` added to requests that do not set one.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            retry_on_connection_failure: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl ClientConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Returns `true` if `3xx` answers are followed.
    #[must_use]
    pub const fn follows_redirects(&self) -> bool {
        self.max_redirects > 0
    }
}

/// Builder for [`ClientConfig`]; unset fields keep their default.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    retry_on_connection_failure: Option<bool>,
    max_redirects: Option<usize>,
    user_agent: Option<Option<String>>,
}

impl ClientConfigBuilder {
    /// See [`ClientConfig::timeout`].
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// See [`ClientConfig::connect_timeout`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// See [`ClientConfig::pool_idle_per_host`].
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// See [`ClientConfig::pool_idle_timeout`].
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// See [`ClientConfig::retry_on_connection_failure`].
    #[must_use]
    pub const fn retry_on_connection_failure(mut self, retry: bool) -> Self {
        self.retry_on_connection_failure = Some(retry);
        self
    }

    /// Follow at most `max` redirect hops; `0` disables following.
    #[must_use]
    pub const fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Replace the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(Some(user_agent.into()));
        self
    }

    /// Send no `User-Agent` unless the call sets one.
    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = Some(None);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            retry_on_connection_failure: self
                .retry_on_connection_failure
                .unwrap_or(defaults.retry_on_connection_failure),
            max_redirects: self.max_redirects.unwrap_or(defaults.max_redirects),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

impl From<ClientConfig> for ClientConfigBuilder {
    fn from(config: ClientConfig) -> Self {
        Self {
            timeout: Some(config.timeout),
            connect_timeout: Some(config.connect_timeout),
            pool_idle_per_host: Some(config.pool_idle_per_host),
            pool_idle_timeout: Some(config.pool_idle_timeout),
            retry_on_connection_failure: Some(config.retry_on_connection_failure),
            max_redirects: Some(config.max_redirects),
            user_agent: Some(config.user_agent),
        }
    }
}
