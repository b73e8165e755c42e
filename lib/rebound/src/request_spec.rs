//! Immutable description of one call.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::{ContentType, Error, Method, Request, Result, StatusClassifier};

/// Everything needed to perform each attempt of a call.
///
/// Built once by the call builder, then shared read-only between attempts.
///
/// # Example
///
/// ```
/// use rebound::{ContentType, Method, RequestSpec};
///
/// let spec = RequestSpec::new(Method::Post, "https://api.example.com/users".parse().unwrap())
///     .with_content_type(ContentType::Json)
///     .with_body(r#"{"name":"Alice"}"#);
///
/// let request = spec.to_request();
/// assert_eq!(request.header("Accept"), Some("application/json"));
/// assert_eq!(request.header("Content-Type"), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    content_type: ContentType,
    body: Option<Bytes>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
    status: StatusClassifier,
}

impl RequestSpec {
    /// A bodiless JSON request with the default status table.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            content_type: ContentType::default(),
            body: None,
            headers: HashMap::new(),
            timeout: None,
            status: StatusClassifier::default(),
        }
    }

    /// Change the method.
    #[must_use]
    pub const fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the content type of the body, mirrored in `Accept`.
    #[must_use]
    pub const fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a header, replacing any previous value whose name differs only in
    /// case.
    ///
    /// `Accept` always mirrors the content type. An explicit `Content-Type`
    /// wins over the content type when a body is sent.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers
            .keys()
            .any(|existing| existing.eq_ignore_ascii_case(name))
    }

    /// Deadline for each attempt.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the status classifier.
    #[must_use]
    pub fn with_status(mut self, status: StatusClassifier) -> Self {
        self.status = status;
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target URL, query included.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Content type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Body as configured, whatever the method.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Configured headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Per-attempt deadline.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Status classifier.
    #[must_use]
    pub const fn status(&self) -> &StatusClassifier {
        &self.status
    }

    /// The body actually sent: only POST, PUT and PATCH carry one.
    #[must_use]
    pub fn outgoing_body(&self) -> Option<&Bytes> {
        self.body.as_ref().filter(|_| self.method.sends_body())
    }

    /// Reject a spec that cannot be executed.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidRequest`] for a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::invalid_request("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Build the transport request for one attempt.
    #[must_use]
    pub fn to_request(&self) -> Request<Bytes> {
        let mut builder = Request::builder(self.method, self.url.clone())
            .headers(self.headers.clone())
            .header("Accept", self.content_type.as_str());

        if let Some(body) = self.outgoing_body() {
            if !self.has_header("content-type") {
                builder = builder.header("Content-Type", self.content_type.as_str());
            }
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }
}
