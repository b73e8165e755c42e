//! Basic authentication.

use std::sync::Arc;
use std::task::{Context, Poll};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use tower::{Layer, Service};

use crate::Request;

/// `Authorization` header value for `username:password`.
///
/// ```
/// assert_eq!(rebound::middleware::basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
/// ```
#[must_use]
pub fn basic_credentials(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Layer adding basic credentials to requests that carry no `Authorization`.
#[derive(Debug, Clone)]
pub struct BasicAuthLayer {
    header: Arc<str>,
}

impl BasicAuthLayer {
    /// Credentials sent with every request.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        Self {
            header: Arc::from(basic_credentials(username.as_ref(), password.as_ref())),
        }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuth {
            inner,
            header: Arc::clone(&self.header),
        }
    }
}

/// Service adding basic credentials, see [`BasicAuthLayer`].
#[derive(Debug, Clone)]
pub struct BasicAuth<S> {
    inner: S,
    header: Arc<str>,
}

impl<S> Service<Request<Bytes>> for BasicAuth<S>
where
    S: Service<Request<Bytes>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        let headers = request.headers_mut();
        // credentials set on the call win
        if !headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("authorization"))
        {
            headers.insert("Authorization".to_string(), self.header.to_string());
        }
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use tower::ServiceExt;
    use tower::service_fn;

    use super::*;
    use crate::{Method, Response, Result};

    async fn echo_authorization(request: Request<Bytes>) -> Result<Response<Bytes>> {
        let value = request.header("Authorization").unwrap_or_default().to_string();
        Ok(Response::with_body(200, value))
    }

    fn request() -> Request<Bytes> {
        Request::builder(Method::Get, "http://h/".parse().unwrap()).build()
    }

    #[test]
    fn encodes_credentials() {
        assert_eq!(basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
        assert_eq!(basic_credentials("", ""), "Basic Og==");
    }

    #[tokio::test]
    async fn adds_header() {
        let service = BasicAuthLayer::new("user", "pass").layer(service_fn(echo_authorization));
        let response = service.oneshot(request()).await.unwrap();
        assert_eq!(response.body().as_ref(), b"Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn keeps_call_credentials() {
        let service = BasicAuthLayer::new("user", "pass").layer(service_fn(echo_authorization));
        let mut request = request();
        request
            .headers_mut()
            .insert("Authorization".to_string(), "Bearer t".to_string());

        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.body().as_ref(), b"Bearer t");
    }
}
