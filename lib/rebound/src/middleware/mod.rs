//! Tower layers applied around each exchange of a
//! [`HyperTransport`](crate::HyperTransport).
//!
//! Layers only see the transport level: one request, one response, whatever
//! its status. Status validation, retries and circuit breaking happen above
//! the transport, once per attempt, in the [`resilience`](crate::resilience)
//! pipeline.
//!
//! - [`LoggingLayer`]: logs each exchange with `tracing`
//! - [`BasicAuthLayer`]: adds `Authorization: Basic <base64(user:pass)>`
//! - [`FollowRedirectLayer`]: follows `3xx` answers, on by default
//! - [`ConcurrencyLimitLayer`]: caps exchanges in flight (from `tower`)
//!
//! # Example
//!
//! ```
//! use rebound::HyperTransport;
//! use rebound::middleware::{BasicAuthLayer, LoggingLayer};
//!
//! let transport = HyperTransport::builder()
//!     .layer(LoggingLayer::debug())
//!     .layer(BasicAuthLayer::new("svc", "s3cret"))
//!     .build();
//! # let _ = transport;
//! ```

mod basic_auth;
mod follow_redirect;
mod logging;

pub use basic_auth::{BasicAuth, BasicAuthLayer, basic_credentials};
pub use follow_redirect::{DEFAULT_MAX_REDIRECTS, FollowRedirect, FollowRedirectLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
