//! Integration tests for the HTTP routes.
//!
//! Drives the router over an in-memory SQLite repository and a fixture source.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use refdata_hex::{RateService, SyncService, inbound::HttpServer};
use refdata_repo::sqlite::SqliteRepo;
use refdata_types::{
    Currency, ExchangeRateFilter, Frequency, ReferenceSource, SourceError, SourceExchangeRate,
};
use tower::ServiceExt;

/// Source serving one business week of EUR/USD rates.
struct FixtureSource {
    offline: bool,
}

#[async_trait]
impl ReferenceSource for FixtureSource {
    async fn fetch_currencies(&self, _base: &str) -> Result<Vec<Currency>, SourceError> {
        if self.offline {
            return Err(SourceError::Transport("connection refused".into()));
        }
        Ok(vec![
            Currency::new("EUR", "Euro"),
            Currency::new("USD", "US dollar"),
            Currency::new("JPY", "Japanese yen"),
        ])
    }

    async fn fetch_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<SourceExchangeRate>, SourceError> {
        if self.offline {
            return Err(SourceError::Transport("connection refused".into()));
        }
        let week = [(2, 1.1061), (3, 1.1037), (4, 1.1030), (5, 1.1050), (6, 1.1100)];
        Ok(week
            .into_iter()
            .map(|(d, rate)| SourceExchangeRate {
                from_currency: filter.base.clone(),
                to_currency: "USD".into(),
                frequency: Frequency::Daily,
                day: NaiveDate::from_ymd_opt(2024, 9, d).unwrap(),
                rate,
            })
            .filter(|r| r.day >= filter.start && r.day <= filter.end)
            .collect())
    }
}

async fn create_app(offline: bool) -> axum::Router {
    let repo = Arc::new(SqliteRepo::new("sqlite::memory:").await.unwrap());
    let sync = SyncService::new(repo.clone(), FixtureSource { offline });
    let rates = RateService::new(repo);
    HttpServer::new(sync, rates).router()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn seeded_app() -> axum::Router {
    let app = create_app(false).await;
    let (status, _) = send(&app, post("/api/sync/currencies", r#"{"base":"EUR"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        post(
            "/api/sync/rates",
            r#"{"base":"EUR","frequency":"D","start":"2024-09-02","end":"2024-09-06"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app
}

#[tokio::test]
async fn test_health() {
    let app = create_app(false).await;

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_sync_currencies_then_list() {
    let app = create_app(false).await;

    let (status, summary) = send(&app, post("/api/sync/currencies", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["entity"], "currencies");
    assert_eq!(summary["inserted"], 3);

    let (status, again) = send(&app, post("/api/sync/currencies", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["inserted"], 0);
    assert_eq!(again["unchanged"], 3);

    let (status, list) = send(&app, get("/api/currencies")).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["EUR", "JPY", "USD"]);
}

#[tokio::test]
async fn test_sync_rates_before_currencies_is_unprocessable() {
    let app = create_app(false).await;

    let (status, json) = send(
        &app,
        post(
            "/api/sync/rates",
            r#"{"start":"2024-09-02","end":"2024-09-06"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], 422);
}

#[tokio::test]
async fn test_latest_rate_carries_over_weekend() {
    let app = seeded_app().await;

    let (status, json) = send(&app, get("/api/rates/latest?from=EUR&to=USD&day=2024-09-08")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rate"], 1.11);
    assert_eq!(json["day"], "2024-09-08");
}

#[tokio::test]
async fn test_latest_rate_too_stale() {
    let app = seeded_app().await;

    let (status, json) = send(&app, get("/api/rates/latest?from=EUR&to=USD&day=2024-09-20")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("2024-09-06"));
}

#[tokio::test]
async fn test_latest_rate_not_found() {
    let app = seeded_app().await;

    let (status, _) = send(&app, get("/api/rates/latest?from=EUR&to=JPY&day=2024-09-04")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_latest_rate_missing_day_is_bad_request() {
    let app = seeded_app().await;

    let (status, _) = send(&app, get("/api/rates/latest?from=EUR&to=USD")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_range() {
    let app = seeded_app().await;

    let (status, json) = send(
        &app,
        get("/api/rates/range?from=EUR&to=USD&start=2024-09-05&end=2024-09-09"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rates = json["rates"].as_object().unwrap();
    assert_eq!(rates.len(), 5);
    assert_eq!(rates["2024-09-05"], 1.105);
    assert_eq!(rates["2024-09-07"], 1.11);
    assert_eq!(rates["2024-09-09"], 1.11);
}

#[tokio::test]
async fn test_rate_range_reversed_is_bad_request() {
    let app = seeded_app().await;

    let (status, json) = send(
        &app,
        get("/api/rates/range?from=EUR&to=USD&start=2024-09-06&end=2024-09-02"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_source_failure_is_bad_gateway() {
    let app = create_app(true).await;

    let (status, json) = send(&app, post("/api/sync/currencies", "{}")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], 502);
}
