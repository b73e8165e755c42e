//! Follows `3xx` answers carrying a `Location` header.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service, ServiceExt};
use tracing::debug;
use url::Url;

use crate::{Error, Method, Request, Response, Result};

/// Redirect hops followed by default.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Layer following redirects, up to a maximum number of hops.
///
/// `301`, `302` and `303` continue as a `GET` without body; `307` and `308`
/// repeat the method and body. A redirect without `Location` is returned
/// unchanged, and status validation decides what to do with it.
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl Default for FollowRedirectLayer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDIRECTS)
    }
}

impl FollowRedirectLayer {
    /// Follow at most `max_redirects` hops.
    #[must_use]
    pub const fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }

    /// Maximum number of hops.
    #[must_use]
    pub const fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Service produced by [`FollowRedirectLayer`].
#[derive(Debug, Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    max_redirects: usize,
}

const fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

const fn keeps_method(status: u16) -> bool {
    matches!(status, 307 | 308)
}

fn same_origin(from: &Url, to: &Url) -> bool {
    from.origin() == to.origin()
}

/// The request for the next hop, or `None` when the response is final.
fn next_hop(
    request: &Request<Bytes>,
    response: &Response<Bytes>,
) -> Result<Option<Request<Bytes>>> {
    if !is_redirect(response.status()) {
        return Ok(None);
    }
    let Some(location) = response.header("location") else {
        return Ok(None);
    };
    let target = request.url().join(location)?;

    let (method, body) = if keeps_method(response.status()) {
        (request.method(), request.body().cloned())
    } else {
        (Method::Get, None)
    };

    let crosses_origin = !same_origin(request.url(), &target);
    let headers = request
        .headers()
        .iter()
        .filter(|(name, _)| !(crosses_origin && name.eq_ignore_ascii_case("authorization")))
        .filter(|(name, _)| body.is_some() || !name.eq_ignore_ascii_case("content-type"))
        .map(|(name, value)| (name.clone(), value.clone()));

    let mut builder = Request::builder(method, target).headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    if let Some(timeout) = request.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(Some(builder.build()))
}

impl<S> Service<Request<Bytes>> for FollowRedirect<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let first = self.inner.call(request.clone());
        let inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut current = request;
            let mut response = first.await?;
            let mut hops = 0;

            while let Some(next) = next_hop(&current, &response)? {
                if hops == max_redirects {
                    return Err(Error::transport(
                        current.url().as_str(),
                        format!("stopped after {max_redirects} redirects"),
                    ));
                }
                hops += 1;
                debug!(
                    status = response.status(),
                    from = %current.url(),
                    to = %next.url(),
                    "following redirect"
                );

                current = next;
                response = inner.clone().oneshot(current.clone()).await?;
            }

            Ok(response)
        })
    }
}
