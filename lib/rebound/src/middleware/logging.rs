//! Exchange logging with `tracing`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::time::Instant;
use tower::{Layer, Service};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{Error, Request, Response, Result};

/// Verbosity of [`LoggingLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Headers and body sizes at debug level.
    Debug,
    /// One line per exchange at info level.
    #[default]
    Info,
}

/// Layer logging each exchange inside an `http_request` span.
///
/// Non-2xx responses are logged as warnings, but still returned as responses:
/// classification happens later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Info-level logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug-level logging.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service logging exchanges, see [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>,
    S::Future: Send + 'static,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;
        let span = info_span!("http_request", %method, %url);

        match level {
            LogLevel::Debug => debug!(
                parent: &span,
                headers = ?request.headers(),
                body_len = request.body().map_or(0, Bytes::len),
                timeout = ?request.timeout(),
                "sending request"
            ),
            LogLevel::Info => info!(parent: &span, "sending request"),
        }

        let exchange = self.inner.call(request);
        Box::pin(
            async move {
                let start = Instant::now();
                let result = exchange.await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "exchange completed");
                    }
                    Ok(response) => {
                        warn!(status = response.status(), elapsed_ms, "exchange returned an error status");
                    }
                    Err(err) if err.is_timeout() => {
                        warn!(elapsed_ms, "exchange timed out");
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "exchange failed");
                    }
                }
                if level == LogLevel::Debug
                    && let Ok(response) = &result
                {
                    debug!(headers = ?response.headers(), body_len = response.body().len(), "response details");
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use tower::{ServiceExt, service_fn};

    use super::*;
    use crate::Method;

    fn request() -> Request<Bytes> {
        Request::builder(Method::Get, "http://h/ping".parse().unwrap()).build()
    }

    #[test]
    fn logging_layer_levels() {
        assert_eq!(LoggingLayer::new().level(), LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level(), LogLevel::Debug);
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let service = LoggingLayer::debug()
            .layer(service_fn(|_: Request<Bytes>| async { Ok::<_, Error>(Response::with_body(503, "down")) }));

        let response = service.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(response.body().as_ref(), b"down");
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let service = LoggingLayer::new().layer(service_fn(|request: Request<Bytes>| async move {
            Err::<Response<Bytes>, _>(Error::timeout(request.url().as_str()))
        }));

        let err = service.oneshot(request()).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
