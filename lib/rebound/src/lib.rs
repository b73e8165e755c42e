//! Fluent HTTP client with status validation, retries, fallbacks and
//! circuit breaking.
//!
//! Each call is described with a [`CallBuilder`], then run through a fixed
//! resilience pipeline: the [`CircuitBreaker`](resilience::CircuitBreaker)
//! gates every attempt, the [`RetryPolicy`](resilience::RetryPolicy) repeats
//! failed attempts, and an optional [`Fallback`](resilience::Fallback) turns
//! the terminal error into a value. Each attempt performs one exchange over a
//! [`Transport`] and validates the response status with a
//! [`StatusClassifier`].
//!
//! # Example
//!
//! ```no_run
//! use rebound::prelude::*;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Uuid {
//!     uuid: String,
//! }
//!
//! # async fn demo() -> rebound::Result<()> {
//! let client = RestClient::hyper().with_circuit_breaker(CircuitBreakerConfig::default());
//!
//! let uuid: Uuid = client
//!     .target("https://httpbin.org")
//!     .path("uuid")
//!     .timeout_ms(2_000)
//!     .get()
//!     .retry(2)
//!     .fallback(|_err| async { Ok(Uuid::default()) })
//!     .get_entity()
//!     .await?;
//! # let _ = uuid;
//! # Ok(())
//! # }
//! ```

mod call;
mod client;
mod config;
mod connector;
mod executor;
mod interceptor;
pub mod middleware;
pub mod prelude;
mod request_spec;
pub mod resilience;
mod transport;

pub use call::{CallBuilder, FallbackCall, HttpCall};
pub use client::RestClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use executor::RequestExecutor;
pub use interceptor::{Interceptors, PayloadInterceptor, ResponseInterceptor};
pub use request_spec::RequestSpec;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

pub use rebound_core::{
    ContentType, Error, ErrorKind, Method, Request, RequestBuilder, Response, Result,
    StatusCategory, StatusClassifier, StatusRule, StatusTable, Transport, append_query,
    decode_json, decode_json_opt, decode_text, format_query, from_json, to_form, to_json,
    to_query_string,
};
