//! Fetch Contract Tests
//!
//! Verify status mapping, JSON decoding, deadline cutoffs and retries
//! against a local mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use verity_core::ErrorKind;
use verity_net::{
    create_client, send_json, send_text, send_text_retrying, FetchError, HttpConfig, RetryPolicy,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client() -> reqwest::Client {
    create_client(&HttpConfig {
        proxy: None,
        ..HttpConfig::default()
    })
    .unwrap()
}

fn deadline_in(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

#[tokio::test]
async fn test_json_body_is_decoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "moon landing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 3})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = client()
        .get(format!("{}/search", mock_server.uri()))
        .query(&[("q", "moon landing")]);
    let body: serde_json::Value = send_json(request, deadline_in(2000)).await.unwrap();

    assert_eq!(body["hits"], 3);
}

#[tokio::test]
async fn test_non_2xx_maps_to_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = send_text(client().get(mock_server.uri()), deadline_in(2000))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status(503)));
    assert_eq!(err.kind(), ErrorKind::ProviderHttpError { status: 503 });
}

#[tokio::test]
async fn test_malformed_json_maps_to_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;

    let err = send_json::<serde_json::Value>(client().get(mock_server.uri()), deadline_in(2000))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderParseError);
}

#[tokio::test]
async fn test_deadline_is_a_hard_cutoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let started = std::time::Instant::now();
    let err = send_text(client().get(mock_server.uri()), deadline_in(200))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(2));
}

struct FailOnce {
    calls: Arc<AtomicUsize>,
}

impl Respond for FailOnce {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            ResponseTemplate::new(429)
        } else {
            ResponseTemplate::new(200).set_body_string("ok")
        }
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));

    Mock::given(method("GET"))
        .respond_with(FailOnce {
            calls: calls.clone(),
        })
        .mount(&mock_server)
        .await;

    let client = client();
    let uri = mock_server.uri();
    let policy = RetryPolicy {
        max_retries: 2,
        backoff: Duration::from_millis(10),
    };
    let body = send_text_retrying(|| client.get(&uri), deadline_in(2000), policy)
        .await
        .unwrap();

    assert_eq!(body, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_skipped_when_backoff_exceeds_deadline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client();
    let uri = mock_server.uri();
    let policy = RetryPolicy {
        max_retries: 3,
        backoff: Duration::from_secs(10),
    };
    let err = send_text_retrying(|| client.get(&uri), deadline_in(1000), policy)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status(502)));
}
