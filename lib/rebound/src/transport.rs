//! [`Transport`] implementation over the hyper-util client.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;
use crate::middleware::{
    BasicAuthLayer, ConcurrencyLimitLayer, FollowRedirectLayer, LoggingLayer,
};
use crate::{Error, Request, Response, Result, Transport};

/// Type-erased transport service that layers are composed over.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future returned by [`HyperTransport`] as a tower service.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// `BoxedService` is `Send` but not `Sync`; the lock is only held to clone it.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(request))
    }
}

/// The innermost service: one exchange over the pooled hyper client.
#[derive(Clone)]
struct RawTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawTransport {
    fn new(config: ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .retry_canceled_requests(config.retry_on_connection_failure)
            .build(https_connector(&config));

        Self { inner, config }
    }

    fn to_hyper_request(&self, request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        let has_user_agent = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if let Some(user_agent) = self.config.user_agent.as_deref().filter(|_| !has_user_agent) {
            builder = builder.header(http::header::USER_AGENT, user_agent);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|err| Error::invalid_request(err.to_string()))
    }

    fn response_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect()
    }

    async fn exchange(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let url = request.url().to_string();
        let deadline = request.timeout().unwrap_or(self.config.timeout);
        let hyper_request = self.to_hyper_request(request)?;

        let fetch = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(|err| Error::transport(&url, describe(&err)))?;

            let status = response.status().as_u16();
            let headers = Self::response_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|err| Error::transport(&url, err.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, headers, body))
        };

        tokio::time::timeout(deadline, fetch)
            .await
            .map_err(|_| Error::timeout(&url))?
    }
}

fn describe(err: &hyper_util::client::legacy::Error) -> String {
    use std::error::Error as _;

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// The exchange itself, following redirects when enabled.
fn base_service(config: &ClientConfig) -> BoxedService {
    let raw = RawTransport::new(config.clone());
    if config.follows_redirects() {
        BoxCloneService::new(FollowRedirectLayer::new(config.max_redirects).layer(raw))
    } else {
        BoxCloneService::new(raw)
    }
}

impl Service<Request<Bytes>> for RawTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.exchange(request).await })
    }
}

/// Pooled HTTP/1.1 and HTTP/2 transport with rustls and tower middleware.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rebound::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .with_concurrency_limit(16)
///     .build();
/// assert_eq!(transport.config().timeout, Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: ClientConfig,
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Transport with default configuration and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Transport with the given configuration and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::from_service(base_service(&config), config)
    }

    fn from_service(service: BoxedService, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Configure a transport with middleware.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// The transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        self.service.call(request)
    }
}

impl Service<Request<Bytes>> for HyperTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // readiness of the layered service is awaited per call
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Builder for [`HyperTransport`].
///
/// Layers wrap the exchange in the order they are added: the first one is
/// the outermost.
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: ClientConfigBuilder,
    layers: Vec<LayerFn>,
}

impl fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config.into();
        self
    }

    /// Deadline of an exchange without a per-call timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Deadline to establish a connection.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Maximum idle connections kept per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// How long an idle connection is kept.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Replace the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a tower layer around the exchange.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Alias of [`layer`](Self::layer).
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layer(layer)
    }

    /// Log each exchange at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log each exchange at debug level, headers included.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Send basic credentials with every request.
    #[must_use]
    pub fn with_basic_auth(self, username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        self.layer(BasicAuthLayer::new(username, password))
    }

    /// Follow up to `max` redirect hops (the default is
    /// [`DEFAULT_MAX_REDIRECTS`](crate::middleware::DEFAULT_MAX_REDIRECTS)).
    #[must_use]
    pub fn with_follow_redirects(mut self, max: usize) -> Self {
        self.config = self.config.max_redirects(max);
        self
    }

    /// Hand `3xx` answers to status validation instead of following them.
    #[must_use]
    pub fn without_follow_redirects(self) -> Self {
        self.with_follow_redirects(0)
    }

    /// Cap the number of exchanges in flight.
    #[must_use]
    pub fn with_concurrency_limit(self, max: usize) -> Self {
        self.layer(ConcurrencyLimitLayer::new(max))
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let mut service = base_service(&config);

        // innermost first, so the first added layer ends up outermost
        for layer in self.layers.into_iter().rev() {
            service = layer(service);
        }

        HyperTransport::from_service(service, config)
    }
}
