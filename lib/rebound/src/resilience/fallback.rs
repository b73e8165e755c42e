//! Fallback action invoked on the terminal error.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Error, Result};

type FallbackFuture<V> = Pin<Box<dyn Future<Output = Result<V>> + Send + 'static>>;

/// Substitute value produced from the terminal error of a call.
///
/// The action may itself be asynchronous. An `Ok` replaces the error; an
/// `Err` becomes the caller-visible error as is.
///
/// # Example
///
/// ```
/// use rebound::resilience::Fallback;
///
/// let cached = Fallback::new(|err: rebound::Error| async move {
///     if err.is_timeout() {
///         Ok("cached".to_string())
///     } else {
///         Err(err)
///     }
/// });
/// # let _ = cached;
/// ```
pub struct Fallback<V> {
    action: Arc<dyn Fn(Error) -> FallbackFuture<V> + Send + Sync>,
}

impl<V> Clone for Fallback<V> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
        }
    }
}

impl<V> fmt::Debug for Fallback<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback").finish_non_exhaustive()
    }
}

impl<V: Send + 'static> Fallback<V> {
    /// Fallback computed from the terminal error.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self {
            action: Arc::new(move |error: Error| -> FallbackFuture<V> { Box::pin(action(error)) }),
        }
    }

    /// Fallback returning a fixed value whatever the error.
    pub fn value(value: V) -> Self
    where
        V: Clone + Sync,
    {
        Self::new(move |_| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// Run the action.
    pub async fn invoke(&self, error: Error) -> Result<V> {
        (self.action)(error).await
    }
}
