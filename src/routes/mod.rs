//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket wizard sessions at `/ws`
/// - subject / section / level documents under `/api/v1/subjects/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/catalog", get(http::http_get_catalog))
        .route("/api/v1/stages/validate", post(http::http_validate_stage))
        .route(
            "/api/v1/subjects",
            get(http::http_list_subjects).post(http::http_create_subject),
        )
        .route(
            "/api/v1/subjects/:subject",
            get(http::http_get_subject)
                .patch(http::http_update_subject)
                .delete(http::http_delete_subject),
        )
        .route("/api/v1/subjects/:subject/overview", get(http::http_overview))
        .route(
            "/api/v1/subjects/:subject/sections",
            get(http::http_list_sections).post(http::http_create_section),
        )
        .route(
            "/api/v1/subjects/:subject/sections/:section",
            get(http::http_get_section)
                .patch(http::http_update_section)
                .delete(http::http_delete_section),
        )
        .route(
            "/api/v1/subjects/:subject/sections/:section/next-level-index",
            get(http::http_next_level_index),
        )
        .route(
            "/api/v1/subjects/:subject/sections/:section/levels",
            get(http::http_list_levels).post(http::http_create_level),
        )
        .route(
            "/api/v1/subjects/:subject/sections/:section/levels/:level",
            get(http::http_get_level)
                .put(http::http_update_level)
                .delete(http::http_delete_level),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
