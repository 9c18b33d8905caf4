//! Cache-only HTTP surface.
//!
//! Read routes never call upstream; they serve whatever the daemon last
//! wrote, substituting zero-valued placeholders for resorts that have
//! never refreshed. The one write route spawns a region refresh in the
//! background and acknowledges immediately.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use slog::{info, Logger};
use snowline_core::{Region, ResortTable};
use snowline_forecast::{read_all, read_one, refresh_region, ForecastCache, ForecastSource};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub resorts: Arc<ResortTable>,
    pub cache: Arc<dyn ForecastCache>,
    pub source: Arc<dyn ForecastSource>,
    pub logger: Logger,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forecasts", get(all_forecasts))
        .route("/forecast/{resort_id}", get(one_forecast))
        .route("/refresh/{region}", post(trigger_refresh))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn all_forecasts(State(state): State<AppState>) -> impl IntoResponse {
    let all = read_all(&state.resorts, state.cache.as_ref(), &state.logger).await;
    Json(all)
}

async fn one_forecast(
    State(state): State<AppState>,
    Path(resort_id): Path<String>,
) -> impl IntoResponse {
    match state.resorts.get(&resort_id) {
        Some(resort) => {
            let record = read_one(resort, state.cache.as_ref(), &state.logger).await;
            Json(record).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown resort: {}", resort_id) })),
        )
            .into_response(),
    }
}

/// Kick off a region refresh without holding the request open. The
/// daemon's schedule is the normal trigger; this route exists for
/// manual nudges after config changes or upstream outages.
async fn trigger_refresh(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> impl IntoResponse {
    let region: Region = match region.parse() {
        Ok(region) => region,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    info!(state.logger, "manual refresh requested for {}", region);
    tokio::spawn(async move {
        refresh_region(
            region,
            &state.resorts,
            state.source.as_ref(),
            state.cache.as_ref(),
            &state.logger,
        )
        .await;
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "region": region.to_string(), "status": "refresh started" })),
    )
        .into_response()
}
