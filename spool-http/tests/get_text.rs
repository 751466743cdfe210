mod common;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use spool_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&server.uri())
        .expect("base url")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn returns_body_and_sends_default_headers() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@alice"))
        .and(header("user-agent", "spool-test-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("spool-test-agent"));
    let client = client_for(&server).with_default_headers(headers);

    let page = client
        .get_text("@alice", RequestOpts::default())
        .await
        .expect("page body");
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "<html>ok</html>");
}

#[tokio::test]
async fn not_found_is_not_retried() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .with_retries(3)
        .get_text("@ghost", RequestOpts::default())
        .await
        .expect_err("404 should fail");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn server_errors_are_retried() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .with_retries(1)
        .get_text("@flaky", RequestOpts::default())
        .await
        .expect("second attempt succeeds");
    assert_eq!(page.body, "recovered");
}

#[tokio::test]
async fn other_success_statuses_are_reported() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@quiet"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .get_text("@quiet", RequestOpts::default())
        .await
        .expect("2xx is not an error");
    assert_eq!(page.status, StatusCode::NO_CONTENT);
    assert!(page.body.is_empty());
}

#[tokio::test]
async fn exhausted_retries_surface_the_status() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"message":"boom"}"#))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_text("@anyone", RequestOpts { retries: Some(0), ..Default::default() })
        .await
        .expect_err("500 should fail");
    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    common::init_test_tracing();
    let client = HttpClient::new("http://127.0.0.1:1")
        .expect("base url")
        .with_retries(0)
        .with_timeout(Duration::from_secs(2));
    let err = client
        .get_text("@nobody", RequestOpts::default())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, HttpError::Network(_)));
}
