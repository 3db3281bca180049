// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// Read-only surface for the dashboard front end.  Every call performs a fresh
// fetch against the provider.
//
//   GET /api/v1/health
//   GET /api/v1/instruments?symbol=BTC
//   GET /api/v1/series/{metric}?exchange=&pair=&interval=&limit=
//   GET /api/v1/dashboard?coin=&exchange=&pair=&interval=&limit=
//
// Provider failures map to 502 with the upstream status in the body.
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::coinglass::instruments;
use crate::coinglass::{ApiError, Metric};
use crate::dashboard::{fetch_dashboard, DashboardRequest};
use crate::types::{InstrumentRef, Interval};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/instruments", get(instruments_for))
        .route("/api/v1/series/:metric", get(series))
        .route("/api/v1/dashboard", get(dashboard))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

type HandlerError = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: String) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        warn!(error = %self, "upstream request failed");
        let body = serde_json::json!({
            "error": self.to_string(),
            "upstream_status": self.status(),
        });
        (status, Json(body)).into_response()
    }
}

fn parse_interval(raw: Option<&str>, default: Interval) -> Result<Interval, HandlerError> {
    match raw {
        None => Ok(default),
        Some(s) => s.parse().map_err(bad_request),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Instruments
// =============================================================================

#[derive(Deserialize)]
struct InstrumentsQuery {
    symbol: String,
}

/// Selector-ready grouping: each exchange with the pairs listed on it.
#[derive(Serialize)]
struct ExchangePairs {
    exchange: String,
    pairs: Vec<String>,
}

#[derive(Serialize)]
struct InstrumentsResponse {
    symbol: String,
    exchanges: Vec<ExchangePairs>,
    instruments: Vec<InstrumentRef>,
}

async fn instruments_for(
    State(state): State<Arc<AppState>>,
    Query(q): Query<InstrumentsQuery>,
) -> Result<Json<InstrumentsResponse>, ApiError> {
    let found = state.client.resolve_instruments(&q.symbol).await?;
    let exchanges = instruments::exchanges(&found)
        .into_iter()
        .map(|exchange| ExchangePairs {
            exchange: exchange.to_string(),
            pairs: instruments::pairs_on(&found, exchange)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();
    Ok(Json(InstrumentsResponse {
        symbol: q.symbol.trim().to_uppercase(),
        exchanges,
        instruments: found,
    }))
}

// =============================================================================
// Single series
// =============================================================================

#[derive(Deserialize)]
struct SeriesQuery {
    exchange: String,
    pair: String,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

async fn series(
    State(state): State<Arc<AppState>>,
    Path(metric): Path<String>,
    Query(q): Query<SeriesQuery>,
) -> Result<Response, HandlerError> {
    let metric: Metric = metric.parse().map_err(|e: String| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e })),
        )
    })?;
    let interval = parse_interval(q.interval.as_deref(), state.default_interval)?;
    let limit = q.limit.unwrap_or(state.default_limit);

    let result = state
        .client
        .fetch_metric(metric, &q.exchange, &q.pair, interval, limit)
        .await;

    Ok(match result {
        Ok(record) => Json(record).into_response(),
        Err(e) => e.into_response(),
    })
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Deserialize)]
struct DashboardQuery {
    coin: String,
    exchange: String,
    pair: String,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Response, HandlerError> {
    let req = DashboardRequest {
        coin: q.coin,
        instrument: InstrumentRef::new(q.exchange, q.pair),
        interval: parse_interval(q.interval.as_deref(), state.default_interval)?,
        limit: q.limit.unwrap_or(state.default_limit),
    };

    Ok(match fetch_dashboard(&state.client, &req).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    })
}
