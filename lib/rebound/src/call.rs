//! Fluent description of a call, then its execution through the pipeline.
//!
//! ```text
//! RestClient::target ─► CallBuilder ─get/post/..─► HttpCall ─► get_response / get_entity
//!                                                     │
//!                                                     └─fallback─► FallbackCall ─► get_response / get_entity
//! ```
//!
//! Builder mistakes (bad URL, unserializable entity, zero timeout) are kept
//! until the terminal call and returned from it before any attempt.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::executor::RequestExecutor;
use crate::interceptor::{Interceptors, PayloadInterceptor, ResponseInterceptor};
use crate::middleware::basic_credentials;
use crate::resilience::{CircuitBreaker, Fallback, Pipeline, RetryPolicy};
use crate::{
    ContentType, Error, Method, RequestSpec, Result, StatusClassifier, StatusTable, Transport,
    append_query, decode_json, decode_json_opt, decode_text, format_query, to_form, to_json,
};

/// Describes the request part of a call: URL, headers, body, timeout.
///
/// Every method is a pure transformation; nothing is sent until a terminal
/// operation of the [`HttpCall`] returned by [`get`](Self::get),
/// [`post`](Self::post) and friends is awaited.
pub struct CallBuilder<T> {
    transport: Arc<T>,
    breaker: Option<CircuitBreaker>,
    interceptors: Interceptors,
    url: String,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
    content_type: ContentType,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    error: Option<Error>,
}

impl<T> fmt::Debug for CallBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBuilder")
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("timeout", &self.timeout)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> CallBuilder<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        breaker: Option<CircuitBreaker>,
        interceptors: Interceptors,
        base_url: String,
    ) -> Self {
        Self {
            transport,
            breaker,
            interceptors,
            url: base_url,
            query: Vec::new(),
            headers: HashMap::new(),
            content_type: ContentType::Json,
            body: None,
            timeout: None,
            error: None,
        }
    }

    fn fail(mut self, error: Error) -> Self {
        // the first mistake is the one reported
        self.error.get_or_insert(error);
        self
    }

    /// Append raw text to the URL.
    #[must_use]
    pub fn url(mut self, url: impl AsRef<str>) -> Self {
        self.url.push_str(url.as_ref());
        self
    }

    /// Append `/segment` to the URL.
    ///
    /// ```
    /// # use rebound::RestClient;
    /// let call = RestClient::hyper().target("http://localhost:8080").path("users").path(42);
    /// # let _ = call;
    /// ```
    #[must_use]
    pub fn path(mut self, segment: impl fmt::Display) -> Self {
        self.url.push('/');
        self.url.push_str(&segment.to_string());
        self
    }

    /// Add a query parameter, in insertion order.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add the fields of a serializable value as query parameters.
    #[must_use]
    pub fn query_params<Q: Serialize>(mut self, params: &Q) -> Self {
        match crate::to_query_string(params) {
            Ok(encoded) => {
                self.query.extend(
                    url::form_urlencoded::parse(encoded.as_bytes())
                        .map(|(name, value)| (name.into_owned(), value.into_owned())),
                );
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Set a header, replacing a previous value whose name differs only in
    /// case.
    ///
    /// `Accept` is always set from the content type. A `Content-Type` header
    /// set here is sent as is instead of the content type.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.to_string());
        self
    }

    /// Send `Authorization: Basic base64(username:password)`.
    #[must_use]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        self.header("Authorization", basic_credentials(username, password))
    }

    /// Use `application/json` for the body and `Accept` (default).
    #[must_use]
    pub fn json(mut self) -> Self {
        self.content_type = ContentType::Json;
        self
    }

    /// Use `application/x-www-form-urlencoded` for the body and `Accept`.
    #[must_use]
    pub fn form_url_encoded(mut self) -> Self {
        self.content_type = ContentType::FormUrlEncoded;
        self
    }

    /// Use this content type for the body and `Accept`.
    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Send this text as the body.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.body = Some(payload.into());
        self
    }

    /// Append an encoded `name=value` pair to the body.
    #[must_use]
    pub fn form_param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let pair = format_query([(name, value.to_string())]);
        let mut body = BytesMut::from(self.body.take().unwrap_or_default().as_ref());
        if !body.is_empty() {
            body.extend_from_slice(b"&");
        }
        body.extend_from_slice(pair.as_bytes());
        self.body = Some(body.freeze());
        self
    }

    /// Send a value serialized as JSON.
    #[must_use]
    pub fn entity<E: Serialize>(mut self, entity: &E) -> Self {
        match to_json(entity) {
            Ok(body) => {
                self.body = Some(body);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Send a value serialized as a form, switching to the form content type.
    #[must_use]
    pub fn form<E: Serialize>(mut self, form: &E) -> Self {
        match to_form(form) {
            Ok(body) => {
                self.body = Some(body);
                self.content_type = ContentType::FormUrlEncoded;
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Deadline of each attempt. Must be greater than zero.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Deadline of each attempt, in milliseconds. Must be greater than zero.
    #[must_use]
    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Log the payload of each attempt.
    #[must_use]
    pub fn log_payload(mut self) -> Self {
        self.interceptors.set_log_payload(true);
        self
    }

    /// Observe the payload of each attempt.
    #[must_use]
    pub fn payload_interceptor(mut self, interceptor: impl PayloadInterceptor + 'static) -> Self {
        self.interceptors.push_payload(Arc::new(interceptor));
        self
    }

    /// Observe the response of each attempt.
    #[must_use]
    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// `GET` the resource.
    #[must_use]
    pub fn get(self) -> HttpCall<T> {
        self.method(Method::Get)
    }

    /// `POST` the body.
    #[must_use]
    pub fn post(self) -> HttpCall<T> {
        self.method(Method::Post)
    }

    /// `PUT` the body.
    #[must_use]
    pub fn put(self) -> HttpCall<T> {
        self.method(Method::Put)
    }

    /// `PATCH` with the body.
    #[must_use]
    pub fn patch(self) -> HttpCall<T> {
        self.method(Method::Patch)
    }

    /// `DELETE` the resource.
    #[must_use]
    pub fn delete(self) -> HttpCall<T> {
        self.method(Method::Delete)
    }

    /// Select the method and move on to the resilience settings.
    #[must_use]
    pub fn method(mut self, method: Method) -> HttpCall<T> {
        let spec = match self.error.take() {
            Some(error) => Err(error),
            None => self.to_spec(method),
        };
        HttpCall {
            transport: self.transport,
            breaker: self.breaker,
            interceptors: self.interceptors,
            spec,
            status: StatusClassifier::default(),
            retry: RetryPolicy::none(),
        }
    }

    fn to_spec(&self, method: Method) -> Result<RequestSpec> {
        let query = format_query(self.query.iter().map(|(name, value)| (name, value)));
        let url = append_query(&self.url, &query);
        let url = Url::parse(&url)?;

        let mut spec = RequestSpec::new(method, url).with_content_type(self.content_type);
        for (name, value) in &self.headers {
            spec = spec.with_header(name, value);
        }
        if let Some(body) = &self.body {
            spec = spec.with_body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }
        Ok(spec)
    }
}

/// A call with its method chosen: resilience and status settings, then a
/// terminal operation.
pub struct HttpCall<T> {
    transport: Arc<T>,
    breaker: Option<CircuitBreaker>,
    interceptors: Interceptors,
    spec: Result<RequestSpec>,
    status: StatusClassifier,
    retry: RetryPolicy,
}

impl<T> fmt::Debug for HttpCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCall")
            .field("spec", &self.spec)
            .field("status", &self.status)
            .field("retry", &self.retry)
            .field("breaker", &self.breaker.as_ref().map(CircuitBreaker::state))
            .finish_non_exhaustive()
    }
}

impl<T: Transport> HttpCall<T> {
    /// Retry failed attempts up to `max_retries` times.
    #[must_use]
    pub fn retry(mut self, max_retries: u32) -> Self {
        self.retry = RetryPolicy::new(max_retries);
        self
    }

    /// Use this retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Guard this call with this breaker instead of the client's.
    #[must_use]
    pub fn circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Do not guard this call with the client's breaker.
    #[must_use]
    pub fn without_circuit_breaker(mut self) -> Self {
        self.breaker = None;
        self
    }

    /// Accept these status codes in addition to 2xx.
    #[must_use]
    pub fn accept_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status = self.status.accept(codes);
        self
    }

    /// Accept every status code.
    #[must_use]
    pub fn accept_any_status_code(mut self) -> Self {
        self.status = self.status.accept_any();
        self
    }

    /// Replace the table mapping rejected codes to errors.
    #[must_use]
    pub fn status_table(mut self, table: StatusTable) -> Self {
        self.status = self.status.with_table(table);
        self
    }

    /// Log status and body of each attempt.
    #[must_use]
    pub fn log_response(mut self) -> Self {
        self.interceptors.set_log_response(true);
        self
    }

    /// Substitute the terminal error with a value computed by `action`.
    ///
    /// ```no_run
    /// # use rebound::RestClient;
    /// # async fn demo() -> rebound::Result<()> {
    /// let body = RestClient::hyper()
    ///     .target("http://localhost:8080/status")
    ///     .get()
    ///     .retry(2)
    ///     .fallback(|_err| async { Ok("unknown".to_string()) })
    ///     .get_response()
    ///     .await?;
    /// # let _ = body;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn fallback<V, F, Fut>(self, action: F) -> FallbackCall<T, V>
    where
        V: Send + 'static,
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.with_fallback(Fallback::new(action))
    }

    /// Substitute the terminal error with a prepared [`Fallback`].
    #[must_use]
    pub fn with_fallback<V>(self, fallback: Fallback<V>) -> FallbackCall<T, V> {
        FallbackCall {
            call: self,
            fallback,
        }
    }

    /// Perform the call and return the body as text.
    ///
    /// # Errors
    ///
    /// The terminal error of the call, see [`Error`].
    pub async fn get_response(self) -> Result<String> {
        self.run(decode_text, None).await
    }

    /// Perform the call and decode the JSON body. An empty body yields `E::default()`.
    ///
    /// # Errors
    ///
    /// The terminal error of the call, see [`Error`].
    pub async fn get_entity<E>(self) -> Result<E>
    where
        E: DeserializeOwned + Default + Send + 'static,
    {
        self.run(|body| decode_json(&body), None).await
    }

    /// Perform the call and decode the JSON body. An empty body yields `None`.
    ///
    /// # Errors
    ///
    /// The terminal error of the call, see [`Error`].
    pub async fn get_optional_entity<E>(self) -> Result<Option<E>>
    where
        E: DeserializeOwned + Send + 'static,
    {
        self.run(|body| decode_json_opt(&body), None).await
    }

    async fn run<V, D>(self, decode: D, fallback: Option<&Fallback<V>>) -> Result<V>
    where
        V: Send + 'static,
        D: FnOnce(Bytes) -> Result<V>,
    {
        let spec = self.spec?.with_status(self.status);
        spec.validate()?;

        let executor = RequestExecutor::new(self.transport).with_interceptors(self.interceptors);
        let pipeline = Pipeline::new()
            .with_optional_breaker(self.breaker)
            .with_retry(self.retry);

        pipeline
            .run(|_attempt| executor.execute(&spec), decode, fallback)
            .await
    }
}

/// A call with a fallback producing values of type `V`.
pub struct FallbackCall<T, V> {
    call: HttpCall<T>,
    fallback: Fallback<V>,
}

impl<T, V> fmt::Debug for FallbackCall<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackCall")
            .field("call", &self.call)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl<T: Transport> FallbackCall<T, String> {
    /// Perform the call and return the body as text, or the fallback text.
    ///
    /// # Errors
    ///
    /// Builder errors, or the error returned by the fallback.
    pub async fn get_response(self) -> Result<String> {
        self.call.run(decode_text, Some(&self.fallback)).await
    }
}

impl<T: Transport, E> FallbackCall<T, E>
where
    E: DeserializeOwned + Default + Send + 'static,
{
    /// Perform the call and decode the JSON body, or return the fallback value.
    ///
    /// # Errors
    ///
    /// Builder errors, or the error returned by the fallback.
    pub async fn get_entity(self) -> Result<E> {
        self.call
            .run(|body| decode_json(&body), Some(&self.fallback))
            .await
    }
}

impl<T: Transport, E> FallbackCall<T, Option<E>>
where
    E: DeserializeOwned + Send + 'static,
{
    /// Perform the call and decode the JSON body if any, or return the fallback value.
    ///
    /// # Errors
    ///
    /// Builder errors, or the error returned by the fallback.
    pub async fn get_optional_entity(self) -> Result<Option<E>> {
        self.call
            .run(|body| decode_json_opt(&body), Some(&self.fallback))
            .await
    }
}
