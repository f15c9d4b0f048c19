use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use bgstreams_core::cache::CacheStats;
use bgstreams_core::{SanitizedConfig, SourceKind};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Sources that can be reached with the current configuration.
    pub sources: Vec<SourceKind>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sources: state.aggregator().available(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub caches: Vec<CacheStats>,
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        caches: state.caches().stats(),
    })
}
