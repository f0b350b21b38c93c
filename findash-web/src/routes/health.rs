//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use findash_core::MarketSummary;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub data: MarketSummary,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        data: state.data.summary(),
    })
}
