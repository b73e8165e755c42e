//! Error types for rebound.
//!
//! Every stage of a call returns a [`Result`]; nothing is logged and
//! swallowed. The [`ErrorKind`] discriminant groups the variants the way the
//! resilience pipeline reasons about them.

use bytes::Bytes;
use derive_more::{Display, Error, From};

use crate::StatusCategory;

/// Main error type for rebound operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The exchange did not complete in time.
    ///
    /// Raised both for a client-side deadline and for a server reporting a
    /// timeout (`408`, `504`); `status` tells them apart when needed.
    #[display("Timeout during the request to URL {url}")]
    #[from(skip)]
    Timeout {
        /// Request URL.
        url: String,
        /// Status code when the timeout was reported by the server.
        status: Option<u16>,
    },

    /// The server answered with a status code that was not accepted.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Classification of the status code.
        category: StatusCategory,
        /// Request URL.
        url: String,
        /// Error message.
        message: String,
        /// Response body, if available.
        body: Option<Bytes>,
    },

    /// Network, connection or TLS failure.
    #[display("An error occurred during the request to URL {url}: {message}")]
    #[from(skip)]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The response body could not be decoded into the target shape.
    #[display("decode error at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// Path to the offending field (e.g. `user.address.city`).
        path: String,
        /// Error message.
        message: String,
    },

    /// The circuit breaker rejected the call without reaching the transport.
    #[display("circuit breaker is open")]
    #[from(skip)]
    CircuitOpen,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Client or server reported timeout.
    #[display("timeout")]
    Timeout,
    /// Rejected HTTP status code.
    #[display("http")]
    Http,
    /// Transport-level failure.
    #[display("transport")]
    Transport,
    /// Body decoding failure.
    #[display("decode")]
    Decode,
    /// Circuit breaker open.
    #[display("circuit-open")]
    CircuitOpen,
    /// The request could not be built.
    #[display("request")]
    Request,
}

impl Error {
    /// Create a client-side timeout error.
    #[must_use]
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout {
            url: url.into(),
            status: None,
        }
    }

    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(
        status: u16,
        category: StatusCategory,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Http {
            status,
            category,
            url: url.into(),
            message: message.into(),
            body: None,
        }
    }

    /// Attach the response body to an HTTP error. Other variants are returned as is.
    #[must_use]
    pub fn with_body(self, body: Bytes) -> Self {
        match self {
            Self::Http {
                status,
                category,
                url,
                message,
                ..
            } => Self::Http {
                status,
                category,
                url,
                message,
                body: Some(body),
            },
            other => other,
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error with path context.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// The coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { .. } => ErrorKind::Http,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::CircuitOpen => ErrorKind::CircuitOpen,
            Self::InvalidRequest(_)
            | Self::InvalidUrl(_)
            | Self::JsonSerialization(_)
            | Self::FormSerialization(_)
            | Self::QuerySerialization(_) => ErrorKind::Request,
        }
    }

    /// Returns `true` if another attempt of the same request may succeed.
    ///
    /// Only failures of an executed attempt qualify: decoding, breaker
    /// rejections and request-building errors are deterministic.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::Http | ErrorKind::Transport
        )
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` if the circuit breaker rejected the call.
    #[must_use]
    pub const fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }

    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Timeout { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the status category if this is an HTTP error.
    #[must_use]
    pub const fn category(&self) -> Option<StatusCategory> {
        match self {
            Self::Http { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// Returns the request URL carried by the error, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url, .. } | Self::Http { url, .. } | Self::Transport { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == Some(StatusCategory::NotFound)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError {
    ///     code: String,
    /// }
    ///
    /// if let Err(err) = call.get_response().await {
    ///     if let Some(Ok(api_error)) = err.decode_body::<ApiError>() {
    ///         eprintln!("API error: {}", api_error.code);
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}
