//! End-to-end calls through `RestClient` and `HyperTransport`, against wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use assert2::{check, let_assert};
use rebound::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};
use rebound::{Error, ErrorKind, HyperTransport, RestClient, StatusCategory};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string, header, method, path, query_param},
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UuidModel {
    uuid: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

async fn mock(server: &MockServer, http_method: &str, route: &str, response: ResponseTemplate) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn get_entity() {
    let server = MockServer::start().await;
    let expected = UuidModel {
        uuid: "ac1f4d7a-6a5c-4bb1-9d4f-0c3ae5f4e8a2".to_string(),
    };
    mock(&server, "GET", "/uuid", ResponseTemplate::new(200).set_body_json(&expected)).await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("uuid")
        .get()
        .get_entity::<UuidModel>()
        .await;

    let_assert!(Ok(model) = result);
    check!(model == expected);
}

#[tokio::test]
async fn post_entity_sends_json() {
    let server = MockServer::start().await;
    let input = User {
        id: 0,
        name: "Bob".to_string(),
    };
    let output = User {
        id: 42,
        name: "Bob".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(201).set_body_json(&output))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("users")
        .entity(&input)
        .post()
        .get_entity::<User>()
        .await;

    let_assert!(Ok(user) = result);
    check!(user == output);
}

#[tokio::test]
async fn put_form_params() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/profile"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("name=Ada+Lovelace&lang=en"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("profile")
        .form_url_encoded()
        .form_param("name", "Ada Lovelace")
        .form_param("lang", "en")
        .put()
        .get_response()
        .await;

    let_assert!(Ok(body) = result);
    check!(body.is_empty());
}

#[tokio::test]
async fn delete_with_empty_body_decodes_to_default() {
    let server = MockServer::start().await;
    mock(&server, "DELETE", "/users/7", ResponseTemplate::new(204)).await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("users")
        .path(7)
        .delete()
        .get_entity::<User>()
        .await;

    let_assert!(Ok(user) = result);
    check!(user == User::default());
}

#[tokio::test]
async fn query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("api", "v2"))
        .and(query_param("q", "rust lang"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(format!("{}/search?api=v2", server.uri()))
        .query("q", "rust lang")
        .query("page", 3)
        .get()
        .get_response()
        .await;

    let_assert!(Ok(body) = result);
    check!(body == "found");
}

#[tokio::test]
async fn basic_auth_and_custom_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .and(header("X-Request-Id", "abc-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("private")
        .basic_auth("user", "pass")
        .header("X-Request-Id", "abc-123")
        .get()
        .get_response()
        .await;

    check!(result.is_ok());
}

/// Header values the server received for `name`, for every request.
async fn received_header(server: &MockServer, name: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .flat_map(|request| {
            request
                .headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn caller_accept_header_is_replaced() {
    let server = MockServer::start().await;
    mock(&server, "GET", "/report", ResponseTemplate::new(200)).await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("report")
        .header("accept", "text/plain")
        .get()
        .get_response()
        .await;

    check!(result.is_ok());
    check!(received_header(&server, "accept").await == ["application/json"]);
}

#[tokio::test]
async fn explicit_content_type_is_sent() {
    let server = MockServer::start().await;
    mock(&server, "POST", "/articles", ResponseTemplate::new(201)).await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("articles")
        .header("Content-Type", "application/vnd.api+json")
        .payload(r#"{"data":{}}"#)
        .post()
        .get_response()
        .await;

    check!(result.is_ok());
    check!(received_header(&server, "content-type").await == ["application/vnd.api+json"]);
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    mock(
        &server,
        "GET",
        "/old",
        ResponseTemplate::new(302).insert_header("Location", "/new"),
    )
    .await;
    mock(&server, "GET", "/new", ResponseTemplate::new(200).set_body_string("moved")).await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("old")
        .get()
        .get_response()
        .await;

    let_assert!(Ok(body) = result);
    check!(body == "moved");
}

#[tokio::test]
async fn redirects_left_to_status_validation_when_disabled() {
    let server = MockServer::start().await;
    mock(
        &server,
        "GET",
        "/old",
        ResponseTemplate::new(302).insert_header("Location", "/new"),
    )
    .await;

    let client = RestClient::new(HyperTransport::builder().without_follow_redirects().build());
    let result = client.target(server.uri()).path("old").get().get_response().await;

    let_assert!(Err(Error::Http { status: 302, category, .. }) = result);
    check!(category == StatusCategory::Unexpected);
}

#[tokio::test]
async fn status_codes_are_classified() {
    let server = MockServer::start().await;
    for (status, route) in [
        (400, "/400"),
        (404, "/404"),
        (408, "/408"),
        (418, "/418"),
        (500, "/500"),
        (502, "/502"),
        (503, "/503"),
        (504, "/504"),
    ] {
        mock(&server, "GET", route, ResponseTemplate::new(status)).await;
    }
    let client = RestClient::hyper();
    let call = |code: u16| client.target(server.uri()).path(code).get().get_response();

    let_assert!(Err(err) = call(400).await);
    check!(err.category() == Some(StatusCategory::BadRequest));
    check!(err.to_string() == "HTTP error 400: Invalid request.");

    let_assert!(Err(err) = call(404).await);
    check!(err.is_not_found());
    check!(err.to_string() == format!("HTTP error 404: URL {}/404 not found.", server.uri()));

    for code in [408, 504] {
        let_assert!(Err(Error::Timeout { status, url }) = call(code).await);
        check!(status == Some(code));
        check!(url == format!("{}/{code}", server.uri()));
    }

    let_assert!(Err(err) = call(418).await);
    check!(err.category() == Some(StatusCategory::Unexpected));
    check!(err.status() == Some(418));

    let_assert!(Err(err) = call(500).await);
    check!(err.category() == Some(StatusCategory::InternalError));
    let_assert!(Err(err) = call(502).await);
    check!(err.category() == Some(StatusCategory::BadGateway));
    let_assert!(Err(err) = call(503).await);
    check!(err.category() == Some(StatusCategory::Unavailable));
}

#[tokio::test]
async fn accepted_status_codes() {
    let server = MockServer::start().await;
    mock(
        &server,
        "GET",
        "/missing",
        ResponseTemplate::new(404).set_body_string("nothing here"),
    )
    .await;
    mock(&server, "GET", "/broken", ResponseTemplate::new(500).set_body_string("boom")).await;

    let client = RestClient::hyper();

    let_assert!(
        Ok(body) = client
            .target(server.uri())
            .path("missing")
            .get()
            .accept_status_codes([404])
            .get_response()
            .await
    );
    check!(body == "nothing here");

    let_assert!(
        Ok(body) = client
            .target(server.uri())
            .path("broken")
            .get()
            .accept_any_status_code()
            .get_response()
            .await
    );
    check!(body == "boom");
}

#[tokio::test]
async fn http_error_keeps_response_body() {
    #[derive(Debug, Deserialize)]
    struct Problem {
        detail: String,
    }

    let server = MockServer::start().await;
    mock(
        &server,
        "GET",
        "/invalid",
        ResponseTemplate::new(400).set_body_json(serde_json::json!({"detail": "missing field"})),
    )
    .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("invalid")
        .get()
        .get_response()
        .await;

    let_assert!(Err(err) = result);
    let_assert!(Some(Ok(problem)) = err.decode_body::<Problem>());
    check!(problem.detail == "missing field");
}

#[tokio::test]
async fn timeout_during_the_request() {
    let server = MockServer::start().await;
    mock(
        &server,
        "GET",
        "/slow",
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
    )
    .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("slow")
        .timeout_ms(100)
        .get()
        .get_response()
        .await;

    let_assert!(Err(err) = result);
    check!(err.kind() == ErrorKind::Timeout);
    check!(err.status() == None);
    check!(err.to_string() == format!("Timeout during the request to URL {}/slow", server.uri()));
}

#[tokio::test]
async fn retry_then_fallback_on_gateway_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(504))
        .expect(3)
        .mount(&server)
        .await;

    let fallbacks = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fallbacks);

    let result = RestClient::hyper()
        .target(server.uri())
        .path("flaky")
        .get()
        .retry(2)
        .fallback(move |err: Error| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                check!(err.is_timeout());
                Ok("sentinel".to_string())
            }
        })
        .get_response()
        .await;

    let_assert!(Ok(body) = result);
    check!(body == "sentinel");
    check!(fallbacks.load(Ordering::SeqCst) == 1);
}

#[tokio::test]
async fn retry_recovers_from_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eventually"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eventually"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ready"))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("eventually")
        .get()
        .retry_policy(RetryPolicy::new(3).with_backoff(Duration::from_millis(10)))
        .get_response()
        .await;

    let_assert!(Ok(body) = result);
    check!(body == "ready");
}

#[tokio::test]
async fn decode_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"one"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = RestClient::hyper()
        .target(server.uri())
        .path("users")
        .path(1)
        .get()
        .retry(3)
        .get_entity::<User>()
        .await;

    let_assert!(Err(Error::Decode { path, .. }) = result);
    check!(path == "id");
}

#[tokio::test]
async fn open_circuit_stops_calling_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::default()
            .with_failure_threshold(2)
            .with_open_duration(Duration::from_secs(60)),
    );
    let client = RestClient::hyper().with_shared_breaker(breaker.clone());

    // trips after the second attempt, the third is never sent
    let result = client
        .target(server.uri())
        .path("down")
        .get()
        .retry(5)
        .get_response()
        .await;
    let_assert!(Err(Error::CircuitOpen) = result);
    check!(breaker.state() == CircuitState::Open);

    let result = client
        .target(server.uri())
        .path("down")
        .get()
        .fallback(|err: Error| async move {
            check!(err.is_circuit_open());
            Ok("degraded".to_string())
        })
        .get_response()
        .await;
    let_assert!(Ok(body) = result);
    check!(body == "degraded");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // bind then release a port so nothing listens on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = RestClient::hyper()
        .target(&uri)
        .path("gone")
        .timeout_ms(2_000)
        .get()
        .retry(1)
        .get_response()
        .await;

    let_assert!(Err(err) = result);
    check!(err.is_transport());
    check!(err.url() == Some(format!("{uri}/gone").as_str()));
}

#[tokio::test]
async fn interceptors_observe_each_attempt() {
    let server = MockServer::start().await;
    mock(&server, "POST", "/events", ResponseTemplate::new(500)).await;

    let payloads = Arc::new(AtomicU32::new(0));
    let responses = Arc::new(AtomicU32::new(0));
    let (payload_count, response_count) = (Arc::clone(&payloads), Arc::clone(&responses));

    let result = RestClient::hyper()
        .with_response_logging()
        .target(server.uri())
        .path("events")
        .payload(r#"{"kind":"ping"}"#)
        .log_payload()
        .payload_interceptor(move |_: &bytes::Bytes| {
            payload_count.fetch_add(1, Ordering::SeqCst);
        })
        .response_interceptor(move |status: u16, _: &bytes::Bytes| {
            assert_eq!(status, 500);
            response_count.fetch_add(1, Ordering::SeqCst);
        })
        .post()
        .retry(1)
        .get_response()
        .await;

    check!(result.is_err());
    check!(payloads.load(Ordering::SeqCst) == 2);
    check!(responses.load(Ordering::SeqCst) == 2);
}
