//! Integration tests for `HtmlPageAnalyzer` against a local `wiremock`
//! server.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use buyspy_core::{Availability, Country};
use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use buyspy_pipeline::{ExtractionError, HtmlPageAnalyzer, PageAnalysis, PageAnalyzer};

const PRODUCT: &str = "Philips TAH9505";

fn analyzer(aggregators: &[&str]) -> HtmlPageAnalyzer {
    HtmlPageAnalyzer::new(
        1,
        "buyspy-test/0.1",
        aggregators.iter().map(ToString::to_string).collect::<HashSet<_>>(),
    )
    .expect("failed to build test HtmlPageAnalyzer")
}

fn fi() -> Country {
    Country::parse("FI").unwrap()
}

fn html(body: &str) -> ResponseTemplate {
    let page = format!("<html><head><title>{PRODUCT} kuulokkeet</title></head><body>{body}</body></html>");
    ResponseTemplate::new(200).set_body_raw(page, "text/html; charset=utf-8")
}

const OFFER_JSON_LD: &str = r#"<script type="application/ld+json">
{"@context":"https://schema.org","@type":"Product","name":"Philips TAH9505",
 "offers":{"@type":"Offer","price":"129.90","priceCurrency":"EUR",
 "availability":"https://schema.org/InStock","seller":{"@type":"Organization","name":"Verkkokauppa.com"}}}
</script>"#;

// ---------------------------------------------------------------------------
// Direct store pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_reads_json_ld_offer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fi/product/123"))
        .respond_with(html(OFFER_JSON_LD))
        .mount(&server)
        .await;

    let url = format!("{}/fi/product/123", server.uri());
    let analysis = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap();

    let PageAnalysis::Offer(offer) = analysis else {
        panic!("expected direct offer, got: {analysis:?}");
    };
    assert_eq!(offer.price, Decimal::from_str("129.90").unwrap());
    assert_eq!(offer.currency, "EUR");
    assert_eq!(offer.availability, Availability::InStock);
    assert_eq!(offer.store_name.as_deref(), Some("Verkkokauppa.com"));
    assert_eq!(offer.final_url, url);
}

#[tokio::test]
async fn analyze_follows_redirects_and_reports_landing_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/go/42"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/store/tah9505"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store/tah9505"))
        .respond_with(html("<p>Hinta 119,00 €</p><p>Varastossa</p>"))
        .mount(&server)
        .await;

    let url = format!("{}/go/42", server.uri());
    let analysis = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap();

    let PageAnalysis::Offer(offer) = analysis else {
        panic!("expected direct offer, got: {analysis:?}");
    };
    assert_eq!(offer.final_url, format!("{}/store/tah9505", server.uri()));
    assert_eq!(offer.price, Decimal::from_str("119.00").unwrap());
    assert_eq!(offer.availability, Availability::InStock);
}

#[tokio::test]
async fn analyze_rejects_page_for_other_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><title>Sony WH-1000XM5</title><p>299,00 €</p></html>",
                "text/html",
            ),
        )
        .mount(&server)
        .await;

    let url = format!("{}/p", server.uri());
    let err = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap_err();
    assert!(
        matches!(err, ExtractionError::NotCommerce { .. }),
        "expected NotCommerce, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Comparison pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_flags_listed_aggregator_and_resolves_cheapest_link() {
    let server = MockServer::start().await;
    let listing = r#"<script type="application/ld+json">
{"@type":"Product","name":"Philips TAH9505","offers":[
  {"@type":"Offer","price":"125.00","url":"/go/2","seller":{"name":"Power"}},
  {"@type":"Offer","price":"119.00","url":"/go/1","seller":{"name":"Gigantti"}}]}
</script>"#;
    Mock::given(method("GET"))
        .and(path("/2162671/philips-tah9505"))
        .respond_with(html(listing))
        .mount(&server)
        .await;

    let url = format!("{}/2162671/philips-tah9505", server.uri());
    let analysis = analyzer(&["127.0.0.1"])
        .analyze(&url, &fi(), PRODUCT)
        .await
        .unwrap();

    let PageAnalysis::Aggregator(resolution) = analysis else {
        panic!("expected aggregator, got: {analysis:?}");
    };
    assert_eq!(resolution.resolved_url, format!("{}/go/1", server.uri()));
    assert_eq!(resolution.store_hint.as_deref(), Some("Gigantti"));
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

async fn status_error(status: u16) -> ExtractionError {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    let url = format!("{}/p", server.uri());
    analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap_err()
}

#[tokio::test]
async fn analyze_maps_not_found_to_not_commerce() {
    let err = status_error(404).await;
    assert!(
        matches!(err, ExtractionError::NotCommerce { .. }),
        "expected NotCommerce, got: {err:?}"
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn analyze_maps_server_errors_and_429_to_network() {
    for status in [429, 500, 503] {
        let err = status_error(status).await;
        assert!(
            matches!(err, ExtractionError::Network { .. }),
            "expected Network for {status}, got: {err:?}"
        );
        assert!(err.is_transient());
    }
}

#[tokio::test]
async fn analyze_rejects_non_html_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 1})))
        .mount(&server)
        .await;

    let url = format!("{}/feed.json", server.uri());
    let err = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap_err();
    assert!(
        matches!(err, ExtractionError::NotCommerce { .. }),
        "expected NotCommerce, got: {err:?}"
    );
}

#[tokio::test]
async fn analyze_rejects_oversized_body() {
    let server = MockServer::start().await;
    let padding = "<p>filler</p>".repeat(200);
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(html(&format!("{OFFER_JSON_LD}{padding}")))
        .mount(&server)
        .await;

    let url = format!("{}/huge", server.uri());
    let err = analyzer(&[])
        .with_max_body_bytes(1024)
        .analyze(&url, &fi(), PRODUCT)
        .await
        .unwrap_err();
    assert!(
        matches!(err, ExtractionError::NotCommerce { ref reason, .. } if reason.contains("larger than 1024")),
        "expected NotCommerce, got: {err:?}"
    );

    let analysis = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap();
    assert!(matches!(analysis, PageAnalysis::Offer(_)));
}

#[tokio::test]
async fn analyze_decodes_single_byte_pages() {
    let server = MockServer::start().await;
    let mut page =
        format!("<html><head><title>{PRODUCT}</title></head><body><p>Hinta 129,90 ").into_bytes();
    page.extend_from_slice(b"\x80</p><p>Varastossa</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(page, "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/latin", server.uri());
    let analysis = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap();

    let PageAnalysis::Offer(offer) = analysis else {
        panic!("expected direct offer, got: {analysis:?}");
    };
    assert_eq!(offer.price, Decimal::from_str("129.90").unwrap());
    assert_eq!(offer.currency, "EUR");
}

#[tokio::test]
async fn analyze_maps_slow_response_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(OFFER_JSON_LD).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let url = format!("{}/slow", server.uri());
    let err = analyzer(&[]).analyze(&url, &fi(), PRODUCT).await.unwrap_err();
    assert!(
        matches!(err, ExtractionError::Timeout { timeout_ms: 1000, .. }),
        "expected Timeout, got: {err:?}"
    );
}
