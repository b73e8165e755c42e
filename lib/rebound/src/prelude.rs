//! Common imports.
//!
//! ```
//! use rebound::prelude::*;
//! ```

pub use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, Fallback, RetryPolicy};
pub use crate::{
    ClientConfig, ContentType, Error, ErrorKind, HyperTransport, Method, RestClient, Result,
    StatusCategory, Transport,
};
pub use serde::{Deserialize, Serialize};
