//! Single-attempt execution of a [`RequestSpec`].

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::interceptor::Interceptors;
use crate::{Error, RequestSpec, Result, Transport};

/// Runs one attempt: one exchange, then status classification.
///
/// The executor never retries; the [`Pipeline`](crate::resilience::Pipeline)
/// calls it once per attempt.
#[derive(Debug)]
pub struct RequestExecutor<T> {
    transport: Arc<T>,
    interceptors: Interceptors,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<T: Transport> RequestExecutor<T> {
    /// Executor over a shared transport.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            interceptors: Interceptors::default(),
        }
    }

    /// Attach payload and response hooks.
    #[must_use]
    pub fn with_interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Perform one exchange and return the body of an accepted response.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] when the deadline elapses or the status maps to a timeout;
    /// - [`Error::Transport`] when the exchange fails;
    /// - [`Error::Http`] when the status is rejected, with the response body attached.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Bytes> {
        let url = spec.url().as_str();
        let request = spec.to_request();

        if let Some(payload) = request.body() {
            self.interceptors.on_payload(url, payload);
        }

        debug!(method = %spec.method(), %url, "executing attempt");
        let exchange = self.transport.send(request);
        let response = match spec.timeout() {
            Some(deadline) => tokio::time::timeout(deadline, exchange)
                .await
                .map_err(|_| Error::timeout(url))??,
            None => exchange.await?,
        };

        let status = response.status();
        let body = response.into_body();
        self.interceptors.on_response(url, status, &body);

        spec.status()
            .classify(status, url)
            .map_err(|err| err.with_body(body.clone()))?;

        Ok(body)
    }
}
