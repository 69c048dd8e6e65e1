use axum::{middleware as axum_mw, routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::history::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        // ── Stats API ───────────────────────────────────────────
        .route("/api/stats", get(stream::get_stats))
        .route("/api/history", get(stream::get_history))
        .route("/api/stats/stream", get(stream::stats_stream))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve the dashboard page ────────────────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
