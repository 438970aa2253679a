use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use market_scraper::api::{self, AppState};
use market_scraper::{Aggregator, FetchError, PageFetcher, ScraperConfig, SearchTerm};

enum Page {
    Html(String),
    Status(u16),
}

struct StubFetcher {
    pages: HashMap<&'static str, Page>,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, term: &SearchTerm) -> Result<String, FetchError> {
        match self.pages.get(term.as_str()) {
            Some(Page::Html(html)) => Ok(html.clone()),
            Some(Page::Status(status)) => Err(FetchError::Status {
                status: *status,
                url: format!("https://www.amazon.com/s?k={}", term),
            }),
            None => Ok("<html><body></body></html>".to_string()),
        }
    }
}

fn results_page(cards: &[(&str, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(asin, title)| {
            format!(
                r#"<div data-component-type="s-search-result" data-asin="{asin}">
                    <h2><a href="/dp/{asin}"><span>{title}</span></a></h2>
                    <span class="a-icon-alt">4.5 out of 5 stars</span>
                    <span aria-label="1,234 ratings">1,234</span>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", body)
}

fn captcha_page() -> String {
    r#"<html><body><form action="/errors/validateCaptcha"></form></body></html>"#.to_string()
}

fn app(pages: Vec<(&'static str, Page)>) -> Router {
    let config = ScraperConfig::new("https://www.amazon.com", "headphones", "laptop").unwrap();
    let fetcher = Arc::new(StubFetcher {
        pages: pages.into_iter().collect(),
    });
    let state = Arc::new(AppState {
        aggregator: Aggregator::new(&config, fetcher),
    });
    api::router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = get(app(vec![]), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn single_keyword_search() {
    let app = app(vec![(
        "laptop",
        Page::Html(results_page(&[("L1", "Laptop 14"), ("L2", "Laptop 15"), ("L3", "Laptop 16")])),
    )]);
    let (status, body) = get(app, "/api/scrape?keyword=laptop").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keyword"], "laptop");
    assert_eq!(body["count"], 3);
    assert_eq!(body["products"][0]["title"], "Laptop 14");
    assert_eq!(body["products"][0]["rating"], 4.5);
    assert_eq!(body["products"][0]["reviews"], 1234);
    assert_eq!(body["products"][0]["url"], "https://www.amazon.com/dp/L1");
    assert_eq!(body["products"][0]["image"], Value::Null);
    assert_eq!(body["products"][2]["title"], "Laptop 16");
}

#[tokio::test]
async fn aggregate_search_without_keyword() {
    let app = app(vec![
        ("headphones", Page::Html(results_page(&[("A1", "A"), ("B1", "B")]))),
        ("laptop", Page::Html(results_page(&[("B1", "B"), ("C1", "C")]))),
    ]);
    let (status, body) = get(app, "/api/scrape").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keyword"], "");
    assert_eq!(body["count"], 3);
    let titles: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn blocked_maps_to_503() {
    let app = app(vec![("headphones", Page::Html(captcha_page()))]);
    let (status, body) = get(app, "/api/scrape").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Captcha detected by the marketplace. Try again later.");
    assert!(body.get("details").is_none());
    assert!(body.get("products").is_none());
}

#[tokio::test]
async fn transport_failure_maps_to_502() {
    let app = app(vec![("laptop", Page::Status(500))]);
    let (status, body) = get(app, "/api/scrape?keyword=laptop").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to fetch data from the marketplace");
    assert!(body["details"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, body) = get(app(vec![]), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let response = app(vec![])
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
