//! Integration tests for `ReservationFetcher::fetch`.
//!
//! HTTP sources run against a local `wiremock` server; file sources use a
//! `tempfile` directory. Back-off is shrunk to milliseconds so retry paths
//! run quickly on the real clock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use resdesk_client::{DataSource, FetchError, ReservationFetcher, RetryPolicy};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

fn fetcher_for(source: DataSource, max_attempts: u32) -> ReservationFetcher {
    ReservationFetcher::new(
        source,
        fast_policy(max_attempts),
        Duration::from_secs(5),
        "resdesk-test/0.1",
    )
    .expect("failed to build test fetcher")
}

fn http_fetcher(server: &MockServer, max_attempts: u32) -> ReservationFetcher {
    let url = format!("{}/data/processed_output.json", server.uri());
    fetcher_for(DataSource::parse(&url).unwrap(), max_attempts)
}

fn dataset() -> serde_json::Value {
    json!({
        "metadata": {
            "processed_at": "2025-01-09T08:15:30",
            "input_file": "sample_reservations.json"
        },
        "reservations": [
            {
                "client_name": "Emily Chen",
                "date": "2025-01-10",
                "number_of_guests": 4,
                "food_ordered": [{ "item": "Risotto", "quantity": 2, "price": 18.5 }],
                "special_requests": ["Birthday cake"],
                "preferences": [],
                "is_vip": true,
                "time": "19:30"
            },
            {
                "client_name": "Marcus Webb",
                "date": "whenever",
                "number_of_guests": "6"
            }
        ]
    })
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_over_http_normalizes_every_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/processed_output.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dataset()))
        .expect(1)
        .mount(&server)
        .await;

    let data = http_fetcher(&server, 3).fetch().await.expect("fetch should succeed");

    assert_eq!(data.metadata.input_file, "sample_reservations.json");
    assert_eq!(data.reservations.len(), 2);
    let emily = &data.reservations[0];
    assert_eq!(emily.client_name, "Emily Chen");
    assert_eq!(emily.date.format("%Y-%m-%d %H:%M").to_string(), "2025-01-10 19:30");
    assert!(emily.is_vip);
    // Unparseable date falls back but keeps its place and name.
    assert_eq!(data.reservations[1].client_name, "Marcus Webb");
    assert_eq!(data.reservations[1].number_of_guests, 0);
}

#[tokio::test]
async fn fetch_from_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("processed_output.json");
    std::fs::write(&file, dataset().to_string()).unwrap();

    let fetcher = fetcher_for(DataSource::File(file), 1);
    let data = fetcher.fetch().await.expect("fetch should succeed");
    assert_eq!(data.reservations.len(), 2);
}

// ---------------------------------------------------------------------------
// Retries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recovers_after_transient_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dataset()))
        .expect(1)
        .mount(&server)
        .await;

    let data = http_fetcher(&server, 3).fetch().await.expect("third attempt should succeed");
    assert_eq!(data.reservations.len(), 2);
}

#[tokio::test]
async fn gives_up_after_max_attempts_with_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = http_fetcher(&server, 3).fetch().await.unwrap_err();
    assert!(
        matches!(err, FetchError::UnexpectedStatus { status: 500, .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn schema_error_is_retried_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "metadata": {} })))
        .expect(3)
        .mount(&server)
        .await;

    let err = http_fetcher(&server, 3).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidFormat(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn schema_error_fails_fast_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reservations": "none" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = http_fetcher(&server, 3)
        .with_retry_schema_errors(false)
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidFormat(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn non_json_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let err = http_fetcher(&server, 2).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Deserialize { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = fetcher_for(DataSource::File(dir.path().join("absent.json")), 2);
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Io { .. }), "unexpected error: {err}");
}
