//! Observation hooks on outgoing payloads and incoming responses.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

/// Sees the body of each attempt that sends one.
pub trait PayloadInterceptor: Send + Sync {
    /// Called once per attempt, before the exchange.
    fn intercept(&self, payload: &Bytes);
}

impl<F> PayloadInterceptor for F
where
    F: Fn(&Bytes) + Send + Sync,
{
    fn intercept(&self, payload: &Bytes) {
        self(payload);
    }
}

/// Sees the status and body of each response, before classification.
pub trait ResponseInterceptor: Send + Sync {
    /// Called once per attempt that received a response.
    fn intercept(&self, status: u16, body: &Bytes);
}

impl<F> ResponseInterceptor for F
where
    F: Fn(u16, &Bytes) + Send + Sync,
{
    fn intercept(&self, status: u16, body: &Bytes) {
        self(status, body);
    }
}

/// Interceptors and logging switches attached to a call.
#[derive(Clone, Default)]
pub struct Interceptors {
    payload: Vec<Arc<dyn PayloadInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
    log_payload: bool,
    log_response: bool,
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("payload_count", &self.payload.len())
            .field("response_count", &self.response.len())
            .field("log_payload", &self.log_payload)
            .field("log_response", &self.log_response)
            .finish()
    }
}

impl Interceptors {
    /// Add a payload interceptor.
    pub fn push_payload(&mut self, interceptor: Arc<dyn PayloadInterceptor>) {
        self.payload.push(interceptor);
    }

    /// Add a response interceptor.
    pub fn push_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    /// Append every interceptor and switch of `other`.
    pub fn extend(&mut self, other: &Self) {
        self.payload.extend(other.payload.iter().cloned());
        self.response.extend(other.response.iter().cloned());
        self.log_payload |= other.log_payload;
        self.log_response |= other.log_response;
    }

    /// Log outgoing payloads.
    pub fn set_log_payload(&mut self, enabled: bool) {
        self.log_payload = enabled;
    }

    /// Log incoming responses.
    pub fn set_log_response(&mut self, enabled: bool) {
        self.log_response = enabled;
    }

    /// Whether payloads are logged.
    #[must_use]
    pub const fn logs_payload(&self) -> bool {
        self.log_payload
    }

    /// Whether responses are logged.
    #[must_use]
    pub const fn logs_response(&self) -> bool {
        self.log_response
    }

    pub(crate) fn on_payload(&self, url: &str, payload: &Bytes) {
        if self.log_payload {
            info!(%url, payload = %String::from_utf8_lossy(payload), "request payload");
        }
        for interceptor in &self.payload {
            interceptor.intercept(payload);
        }
    }

    pub(crate) fn on_response(&self, url: &str, status: u16, body: &Bytes) {
        if self.log_response {
            info!(%url, status, body = %String::from_utf8_lossy(body), "response received");
        }
        for interceptor in &self.response {
            interceptor.intercept(status, body);
        }
    }
}
