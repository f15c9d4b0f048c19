use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{addon, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Operational API
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/cache/stats", get(handlers::cache_stats))
        .with_state(state.clone());

    // Addon protocol, with and without a user config segment
    let addon_routes = Router::new()
        .route("/manifest.json", get(addon::manifest))
        .route("/stream/{content_type}/{id}", get(addon::stream))
        .route("/{config}/manifest.json", get(addon::manifest_with_config))
        .route(
            "/{config}/stream/{content_type}/{id}",
            get(addon::stream_with_config),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(addon_routes)
        .layer(TraceLayer::new_for_http())
        // The media player fetches cross-origin
        .layer(CorsLayer::permissive())
}
