//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use tracing::warn;

use crate::engine::{ScheduleIndex, TransitFeed};
use crate::poller::BoardSnapshot;

use super::dto::*;
use super::state::AppState;

/// Default number of stop search results.
const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Upper bound on stop search results.
const MAX_SEARCH_LIMIT: usize = 50;

/// Create the application router.
pub fn create_router<F: TransitFeed + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/arrivals", get(arrivals::<F>))
        .route("/stops", get(search_stops::<F>))
        .route("/stops/:stop_id", get(stop_details::<F>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The latest board for the polled stop.
async fn arrivals<F: TransitFeed>(State(state): State<AppState<F>>) -> Json<BoardSnapshot> {
    let snapshot = state.board.read().await.clone();
    Json(snapshot)
}

/// Search stops by name in the cached schedule.
async fn search_stops<F: TransitFeed>(
    State(state): State<AppState<F>>,
    Query(req): Query<StopSearchRequest>,
) -> Result<Json<StopSearchResponse>, AppError> {
    let limit = req
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    let query = req.search.unwrap_or_default();

    let index = cached_index(&state).await?;
    let stops = index
        .search_stops(&query, limit)
        .into_iter()
        .cloned()
        .map(StopResult::from)
        .collect();

    Ok(Json(StopSearchResponse { stops }))
}

/// A stop and the routes serving it.
async fn stop_details<F: TransitFeed>(
    State(state): State<AppState<F>>,
    Path(stop_id): Path<String>,
) -> Result<Json<StopDetailResponse>, AppError> {
    let index = cached_index(&state).await?;
    let stop = index
        .stop(&stop_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown stop: {stop_id}"),
        })?;

    let routes = index
        .routes_serving(&stop_id)
        .into_iter()
        .cloned()
        .map(RouteResult::from)
        .collect();

    Ok(Json(StopDetailResponse {
        stop: stop.into(),
        routes,
    }))
}

/// The schedule as last loaded by the poller.
///
/// Handlers never refresh it themselves.
async fn cached_index<F: TransitFeed>(
    state: &AppState<F>,
) -> Result<Arc<ScheduleIndex>, AppError> {
    state
        .engine
        .index()
        .await
        .ok_or_else(|| AppError::Unavailable {
            message: "Schedule not loaded yet".to_string(),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Unavailable { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
