//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use refdata_types::{
    AppError, ExchangeRateFilter, LatestRateQuery, LatestRateResponse, RateRangeQuery,
    RateRangeResponse, ReferenceRepository, ReferenceSource, SyncCurrenciesRequest,
    SyncRatesRequest,
};

use crate::{RateService, SyncService};

/// Application state shared across handlers.
pub struct AppState<R: ReferenceRepository, S: ReferenceSource> {
    pub sync: SyncService<R, S>,
    pub rates: RateService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", message);
        }

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// List stored currencies.
#[tracing::instrument(skip(state))]
pub async fn list_currencies<R: ReferenceRepository, S: ReferenceSource + 'static>(
    State(state): State<Arc<AppState<R, S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let currencies = state.rates.list_currencies().await?;
    Ok(Json(currencies))
}

/// Rate in force on one day.
#[tracing::instrument(skip(state), fields(from = %q.from, to = %q.to, day = %q.day))]
pub async fn latest_rate<R: ReferenceRepository, S: ReferenceSource + 'static>(
    State(state): State<Arc<AppState<R, S>>>,
    Query(q): Query<LatestRateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rate = state.rates.latest_daily(&q.from, &q.to, q.day).await?;
    Ok(Json(LatestRateResponse {
        from: q.from,
        to: q.to,
        day: q.day,
        rate,
    }))
}

/// One rate per day over an inclusive range.
#[tracing::instrument(skip(state), fields(from = %q.from, to = %q.to, start = %q.start, end = %q.end))]
pub async fn rate_range<R: ReferenceRepository, S: ReferenceSource + 'static>(
    State(state): State<Arc<AppState<R, S>>>,
    Query(q): Query<RateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rates = state
        .rates
        .daily_range(&q.from, &q.to, q.start, q.end)
        .await?;
    Ok(Json(RateRangeResponse {
        from: q.from,
        to: q.to,
        start: q.start,
        end: q.end,
        rates,
    }))
}

/// Reconcile stored currencies with the source.
#[tracing::instrument(skip(state), fields(base = %req.base))]
pub async fn sync_currencies<R: ReferenceRepository, S: ReferenceSource + 'static>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<SyncCurrenciesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .sync
        .sync_currencies(&req.base)
        .await
        .map_err(AppError::from)?;
    Ok(Json(summary))
}

/// Reconcile stored exchange rates with the source over a date range.
#[tracing::instrument(skip(state), fields(base = %req.base, frequency = %req.frequency))]
pub async fn sync_rates<R: ReferenceRepository, S: ReferenceSource + 'static>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<SyncRatesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ExchangeRateFilter::from(req);
    let summary = state
        .sync
        .sync_exchange_rates(&filter)
        .await
        .map_err(AppError::from)?;
    Ok(Json(summary))
}
