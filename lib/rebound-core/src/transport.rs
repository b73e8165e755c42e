//! The transport boundary.
//!
//! A [`Transport`] performs exactly one HTTP exchange. It knows nothing about
//! status validation, retries or circuit breaking; those are layered on top
//! by the `rebound` crate. Implement it to plug another HTTP stack, or to
//! script responses in tests.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Performs one HTTP exchange.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use rebound_core::{Request, Response, Result, Transport};
///
/// /// Always answers `204 No Content`.
/// struct NoContent;
///
/// impl Transport for NoContent {
///     async fn send(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
///         Ok(Response::empty(204))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Send the request and return the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Timeout`](crate::Error::Timeout) when the request
    /// deadline elapses, and with [`Error::Transport`](crate::Error::Transport)
    /// for network, connection or TLS failures. Non-2xx responses are not
    /// errors at this level.
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).send(request)
    }
}
