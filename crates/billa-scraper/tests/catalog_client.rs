//! Integration tests for `CatalogClient` paging.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers full pagination, empty and
//! result-less pages, retry recovery, and the partial result returned when
//! a page exhausts its attempts.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use billa_scraper::client::FetchSettings;
use billa_scraper::{CatalogClient, ScraperError};

/// No delays, so tests run instantly.
fn test_client(max_attempts: u32) -> CatalogClient {
    CatalogClient::new(FetchSettings {
        timeout: Duration::from_secs(5),
        inter_page_delay: Duration::ZERO,
        max_attempts,
        retry_delay: Duration::ZERO,
    })
    .expect("failed to build test CatalogClient")
}

fn base_url(server: &MockServer) -> String {
    format!(
        "{}/api/products?sortBy=relevance&page=0&pageSize=100",
        server.uri()
    )
}

/// A page of `count` products with skus `{prefix}-0`, `{prefix}-1`, ...
fn page_json(total: u64, prefix: &str, count: usize) -> serde_json::Value {
    let results: Vec<serde_json::Value> = (0..count)
        .map(|i| json!({"sku": format!("{prefix}-{i}"), "price": {"regular": {"value": 100}}}))
        .collect();
    json!({"total": total, "results": results})
}

async fn mount_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// fetch_total
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_total_reads_total_from_first_page() {
    let server = MockServer::start().await;
    mount_page(&server, "0", page_json(250, "p0", 1)).await;

    let total = test_client(1)
        .fetch_total(&base_url(&server))
        .await
        .expect("expected Ok");
    assert_eq!(total, 250);
}

#[tokio::test]
async fn fetch_total_defaults_to_zero_without_total_key() {
    let server = MockServer::start().await;
    mount_page(&server, "0", json!({"results": []})).await;

    let total = test_client(1).fetch_total(&base_url(&server)).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn fetch_total_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_client(5).fetch_total(&base_url(&server)).await;
    match result {
        Err(ScraperError::UnexpectedStatus { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
    // The initial request is never retried.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// fetch_all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_all_walks_three_pages_for_250_records() {
    let server = MockServer::start().await;
    mount_page(&server, "0", page_json(250, "p0", 100)).await;
    mount_page(&server, "1", page_json(250, "p1", 100)).await;
    mount_page(&server, "2", page_json(250, "p2", 50)).await;

    let state = test_client(1)
        .fetch_all(&base_url(&server), 250, 0, 100)
        .await
        .expect("expected Ok");

    assert_eq!(state.records.len(), 250);
    assert!(!state.truncated);
    assert_eq!(state.cursor.records_scraped, 250);
    assert_eq!(state.cursor.next_page, 3);
    assert_eq!(state.records[0]["sku"], json!("p0-0"));
    assert_eq!(state.records[100]["sku"], json!("p1-0"));
    assert_eq!(state.records[249]["sku"], json!("p2-49"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn fetch_all_keeps_other_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("sortBy", "relevance"))
        .and(query_param("pageSize", "100"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_json(3, "p0", 3)))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_client(1)
        .fetch_all(&base_url(&server), 3, 0, 100)
        .await
        .unwrap();
    assert_eq!(state.records.len(), 3);
}

#[tokio::test]
async fn fetch_all_requests_configured_page_size() {
    let server = MockServer::start().await;
    for (page, count) in [("0", 200), ("1", 50)] {
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("page", page))
            .and(query_param("pageSize", "200"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(&page_json(250, &format!("p{page}"), count)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    // The start url still says pageSize=100.
    let state = test_client(1)
        .fetch_all(&base_url(&server), 250, 0, 200)
        .await
        .unwrap();

    assert!(!state.truncated);
    assert_eq!(state.records.len(), 250);
    assert_eq!(state.records[200]["sku"], json!("p1-0"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn fetch_all_resumes_from_records_scraped_offset() {
    let server = MockServer::start().await;
    mount_page(&server, "2", page_json(250, "p2", 50)).await;

    let state = test_client(1)
        .fetch_all(&base_url(&server), 250, 200, 100)
        .await
        .unwrap();

    assert_eq!(state.records.len(), 50);
    assert_eq!(state.cursor.records_scraped, 250);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_all_terminates_when_pages_lack_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"total": 250})))
        .mount(&server)
        .await;

    let state = test_client(1)
        .fetch_all(&base_url(&server), 250, 0, 100)
        .await
        .expect("expected Ok");

    assert!(state.records.is_empty());
    assert!(!state.truncated);
    assert_eq!(state.cursor.records_scraped, 0);
    assert_eq!(state.cursor.next_page, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn fetch_all_makes_no_request_for_empty_catalog() {
    let server = MockServer::start().await;

    let state = test_client(1)
        .fetch_all(&base_url(&server), 0, 0, 100)
        .await
        .unwrap();

    assert!(state.records.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn fetch_all_returns_partial_result_when_page_exhausts_attempts() {
    let server = MockServer::start().await;
    mount_page(&server, "0", page_json(250, "p0", 100)).await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_json(250, "p2", 50)))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_client(3)
        .fetch_all(&base_url(&server), 250, 0, 100)
        .await
        .expect("exhausted retries must not be an error");

    assert!(state.truncated);
    assert_eq!(state.records.len(), 100);
    assert!(state
        .records
        .iter()
        .all(|r| r["sku"].as_str().unwrap().starts_with("p0-")));
    assert_eq!(state.cursor.next_page, 1);
}

#[tokio::test]
async fn fetch_all_retries_same_page_then_continues() {
    let server = MockServer::start().await;
    // First request for page 0 fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "0", page_json(150, "p0", 100)).await;
    mount_page(&server, "1", page_json(150, "p1", 50)).await;

    let state = test_client(5)
        .fetch_all(&base_url(&server), 150, 0, 100)
        .await
        .unwrap();

    assert!(!state.truncated);
    assert_eq!(state.records.len(), 150);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn fetch_all_retries_malformed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "0", page_json(10, "p0", 10)).await;

    let state = test_client(3)
        .fetch_all(&base_url(&server), 10, 0, 100)
        .await
        .unwrap();

    assert_eq!(state.records.len(), 10);
    assert!(!state.truncated);
}

#[tokio::test]
async fn fetch_all_rejects_invalid_base_url() {
    let result = test_client(3).fetch_all("not a url", 10, 0, 100).await;
    assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
}

#[tokio::test]
async fn requests_carry_a_browser_user_agent() {
    let server = MockServer::start().await;
    mount_page(&server, "0", page_json(1, "p0", 1)).await;

    test_client(1)
        .fetch_all(&base_url(&server), 1, 0, 100)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(agent.starts_with("Mozilla/5.0"), "got: {agent}");
}
