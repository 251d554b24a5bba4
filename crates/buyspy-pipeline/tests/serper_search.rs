//! Integration tests for `SerperSearchClient` against a local `wiremock`
//! server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use buyspy_pipeline::{formulate_query, SearchCapability, SearchError, SerperSearchClient};

fn test_client(base_url: &str) -> SerperSearchClient {
    SerperSearchClient::new("test-key", base_url, 5, "buyspy-test/0.1")
        .expect("failed to build test SerperSearchClient")
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_posts_query_with_country_and_returns_organic_links() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "test-key"))
        .and(body_partial_json(json!({
            "q": "Philips TAH9505 hinta suomi osta",
            "gl": "fi",
            "num": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [
                {"link": "https://www.verkkokauppa.com/fi/product/123", "title": "Philips TAH9505", "snippet": "129,90 €"},
                {"title": "no link"},
                {"link": "https://hinta.fi/2162671/philips-tah9505", "title": "Hinta.fi"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = formulate_query("Philips TAH9505", "FI").unwrap();
    let hits = test_client(&server.uri())
        .search(&query, 10)
        .await
        .expect("search should succeed");

    assert_eq!(hits.len(), 2, "entries without a link are dropped");
    assert_eq!(hits[0].url, "https://www.verkkokauppa.com/fi/product/123");
    assert_eq!(hits[0].snippet, "129,90 €");
    assert_eq!(hits[1].snippet, "");
}

#[tokio::test]
async fn search_without_organic_block_returns_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"searchParameters": {}})))
        .mount(&server)
        .await;

    let query = formulate_query("Sony WF-C510", "US").unwrap();
    let hits = test_client(&server.uri()).search(&query, 10).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn search_truncates_to_max_results() {
    let server = MockServer::start().await;
    let organic: Vec<_> = (0..8)
        .map(|i| json!({"link": format!("https://shop{i}.example/p")}))
        .collect();

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic": organic})))
        .mount(&server)
        .await;

    let query = formulate_query("Sony WF-C510", "DE").unwrap();
    let hits = test_client(&server.uri()).search(&query, 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].url, "https://shop2.example/p");
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_maps_429_to_rate_limited_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let query = formulate_query("Sony WF-C510", "FI").unwrap();
    let err = test_client(&server.uri())
        .search(&query, 10)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SearchError::RateLimited { retry_after_secs: 7 }),
        "expected RateLimited(7), got: {err:?}"
    );
}

#[tokio::test]
async fn search_maps_server_error_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let query = formulate_query("Sony WF-C510", "FI").unwrap();
    let err = test_client(&server.uri())
        .search(&query, 10)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SearchError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus(503), got: {err:?}"
    );
}

#[tokio::test]
async fn search_maps_malformed_body_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let query = formulate_query("Sony WF-C510", "FI").unwrap();
    let err = test_client(&server.uri())
        .search(&query, 10)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SearchError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
}
