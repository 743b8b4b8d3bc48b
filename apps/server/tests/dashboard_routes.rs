use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aksmarket_core::universe::UniverseEntry;
use aksmarket_core::{
    BatchDelay, BatchOptions, Error, Fundamentals, HistoricalComparison, MarketDataServiceTrait,
    Result, RowSource, StockRow, SymbolUniverse, VolumeStats,
};
use aksmarket_market_data::{MarketDataError, QuoteRecord, Sleeper};
use aksmarket_server::{api::app_router, dashboard::Dashboard, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use tower::ServiceExt;

/// Rows keyed by price; `FAIL` never produces one.
#[derive(Default)]
struct FakeService {
    clears: AtomicUsize,
}

fn price_of(symbol: &str) -> f64 {
    match symbol {
        "TCS" => 3500.0,
        "INFY" => 1500.0,
        "WIPRO" => 450.0,
        _ => 100.0,
    }
}

#[async_trait]
impl RowSource for FakeService {
    async fn fetch_row(&self, symbol: &str, days: u32) -> Result<StockRow> {
        self.row(symbol, days).await
    }
}

#[async_trait]
impl MarketDataServiceTrait for FakeService {
    async fn quote(&self, _symbol: &str) -> Result<QuoteRecord> {
        Ok(QuoteRecord::default())
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        if symbol == "FAIL" {
            return Err(Error::MarketData(MarketDataError::SymbolNotFound(
                symbol.to_string(),
            )));
        }
        Ok(Fundamentals {
            last_price: Some(price_of(symbol)),
            sector: "IT".to_string(),
            ..Fundamentals::default()
        })
    }

    async fn volume_stats(&self, _symbol: &str) -> Result<VolumeStats> {
        Ok(VolumeStats::default())
    }

    async fn historical_comparison(
        &self,
        _symbol: &str,
        _days: u32,
    ) -> Result<HistoricalComparison> {
        Ok(HistoricalComparison::default())
    }

    async fn row(&self, symbol: &str, days: u32) -> Result<StockRow> {
        let fundamentals = self.fundamentals(symbol).await?;
        let history = self.historical_comparison(symbol, days).await?;
        Ok(StockRow::compose(
            symbol,
            fundamentals,
            VolumeStats::default(),
            history,
        ))
    }

    fn clear_caches(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

fn build_test_router(service: Arc<FakeService>) -> axum::Router {
    let universe = SymbolUniverse::from_entries(
        [
            ("TCS", "IT"),
            ("INFY", "IT"),
            ("WIPRO", "IT"),
            ("FAIL", "IT"),
            ("ONGC", "Energy"),
        ]
        .map(|(symbol, industry)| UniverseEntry {
            symbol: symbol.to_string(),
            industry: industry.to_string(),
        }),
    );
    let batch = BatchOptions {
        delay: BatchDelay::Fixed(Duration::ZERO),
        ..BatchOptions::default()
    };
    let refresh_interval = Duration::from_secs(300);
    let dashboard = Dashboard::new(universe, service, batch, Arc::new(NoSleep), refresh_interval);
    app_router(AppState::new(dashboard, refresh_interval).unwrap())
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = build_test_router(Arc::new(FakeService::default()));
    assert_eq!(get(&app, "/healthz").await, (StatusCode::OK, "ok".to_string()));
}

#[tokio::test]
async fn page_without_industry_prompts() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Please select an industry"));
    assert!(html.contains("<option value=\"Energy\">Energy</option>"));
}

#[tokio::test]
async fn page_renders_sorted_rows() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, html) = get(&app, "/?industry=IT&days=abc&sort=CURRENT&dir=asc").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("| 3 stocks | 10D comparison |"));

    let wipro = html.find(">WIPRO<").unwrap();
    let infy = html.find(">INFY<").unwrap();
    let tcs = html.find(">TCS<").unwrap();
    assert!(wipro < infy && infy < tcs);
    assert!(!html.contains(">FAIL<"));
}

#[tokio::test]
async fn stocks_api_reports_dropped_symbols() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, body) = get(&app, "/api/stocks?industry=IT&days=5&sort=CURRENT&dir=desc").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["days"], 5);
    assert_eq!(json["trigger"], "initialLoad");
    let symbols: Vec<&str> = json["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, vec!["TCS", "INFY", "WIPRO"]);
    assert_eq!(json["dropped"][0]["symbol"], "FAIL");
}

#[tokio::test]
async fn stocks_api_unknown_industry_is_not_found() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, body) = get(&app, "/api/stocks?industry=Shipping").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 404);
}

#[tokio::test]
async fn stocks_api_unknown_sort_is_bad_request() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, body) = get(&app, "/api/stocks?industry=IT&sort=BOGUS").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
    assert!(json["message"].as_str().unwrap().contains("BOGUS"));
}

#[tokio::test]
async fn page_unknown_direction_is_bad_request() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (status, body) = get(&app, "/?industry=IT&dir=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn reselecting_industry_refetches() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (_, first) = get(&app, "/api/stocks?industry=IT").await;
    get(&app, "/api/stocks?industry=Energy").await;
    let (_, again) = get(&app, "/api/stocks?industry=IT").await;

    let first: serde_json::Value = serde_json::from_str(&first).unwrap();
    let again: serde_json::Value = serde_json::from_str(&again).unwrap();
    assert_eq!(first["trigger"], "initialLoad");
    assert_eq!(again["trigger"], "initialLoad");
    assert!(again["updatedAt"].as_str().unwrap() >= first["updatedAt"].as_str().unwrap());
}

#[tokio::test]
async fn industries_api_lists_labels() {
    let app = build_test_router(Arc::new(FakeService::default()));
    let (_, body) = get(&app, "/api/industries").await;
    let industries: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(industries, vec!["Energy", "IT"]);
}

#[tokio::test]
async fn manual_refresh_clears_caches_and_redirects() {
    let service = Arc::new(FakeService::default());
    let app = build_test_router(service.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/refresh")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("industry=IT&days=30"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/?industry=IT&days=30"
    );
    assert_eq!(service.clears.load(Ordering::SeqCst), 1);

    let (_, html) = get(&app, "/?industry=IT&days=30").await;
    assert!(html.contains("30D comparison"));
}
