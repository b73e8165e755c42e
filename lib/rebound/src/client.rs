//! Entry point: a transport, an optional shared breaker and client-wide hooks.

use std::fmt;
use std::sync::Arc;

use crate::call::CallBuilder;
use crate::interceptor::{Interceptors, PayloadInterceptor, ResponseInterceptor};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::{ClientConfig, HyperTransport, Transport};

/// Fluent HTTP client.
///
/// Cloning is cheap: clones share the transport, the connection pool and the
/// circuit breaker.
///
/// # Example
///
/// ```no_run
/// use rebound::RestClient;
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// struct Repo {
///     name: String,
///     stargazers_count: u32,
/// }
///
/// # async fn demo() -> rebound::Result<()> {
/// let client = RestClient::hyper().with_circuit_breaker(Default::default());
///
/// let repo: Repo = client
///     .target("https://api.github.com")
///     .path("repos")
///     .path("rust-lang")
///     .path("rust")
///     .get()
///     .retry(2)
///     .get_entity()
///     .await?;
/// println!("{} has {} stars", repo.name, repo.stargazers_count);
/// # Ok(())
/// # }
/// ```
pub struct RestClient<T = HyperTransport> {
    transport: Arc<T>,
    breaker: Option<CircuitBreaker>,
    interceptors: Interceptors,
}

impl<T> Clone for RestClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            breaker: self.breaker.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RestClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("transport", &self.transport)
            .field("breaker", &self.breaker.as_ref().map(CircuitBreaker::state))
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

impl RestClient<HyperTransport> {
    /// Client over a default [`HyperTransport`].
    #[must_use]
    pub fn hyper() -> Self {
        Self::new(HyperTransport::new())
    }

    /// Client over a [`HyperTransport`] with this configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(HyperTransport::with_config(config))
    }
}

impl Default for RestClient<HyperTransport> {
    fn default() -> Self {
        Self::hyper()
    }
}

impl<T: Transport> RestClient<T> {
    /// Client over the given transport.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Client over a transport shared with other owners.
    #[must_use]
    pub fn from_shared(transport: Arc<T>) -> Self {
        Self {
            transport,
            breaker: None,
            interceptors: Interceptors::default(),
        }
    }

    /// Guard every call with a new breaker.
    #[must_use]
    pub fn with_circuit_breaker(self, config: CircuitBreakerConfig) -> Self {
        self.with_shared_breaker(CircuitBreaker::new(config))
    }

    /// Guard every call with an existing breaker, possibly shared with other clients.
    #[must_use]
    pub fn with_shared_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Observe the payload of every call.
    #[must_use]
    pub fn with_payload_interceptor(mut self, interceptor: impl PayloadInterceptor + 'static) -> Self {
        self.interceptors.push_payload(Arc::new(interceptor));
        self
    }

    /// Observe the response of every call.
    #[must_use]
    pub fn with_response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// Log the payload of every call.
    #[must_use]
    pub fn with_payload_logging(mut self) -> Self {
        self.interceptors.set_log_payload(true);
        self
    }

    /// Log the response of every call.
    #[must_use]
    pub fn with_response_logging(mut self) -> Self {
        self.interceptors.set_log_response(true);
        self
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The client-wide breaker, if any.
    #[must_use]
    pub const fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// Start describing a call to `base_url`.
    #[must_use]
    pub fn target(&self, base_url: impl Into<String>) -> CallBuilder<T> {
        CallBuilder::new(
            Arc::clone(&self.transport),
            self.breaker.clone(),
            self.interceptors.clone(),
            base_url.into(),
        )
    }
}
