//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/feed` -- `WebSocket` feed event stream
/// - `GET /api/feed` -- full feed snapshot
/// - `GET /api/messages` / `POST /api/messages` -- chat history / send
/// - `GET /api/members` -- member list
/// - `POST /api/members/{id}/warn` -- warn a member
/// - `GET /api/actions` -- action log
/// - `GET /api/stats` -- group stats
/// - `GET /api/agent` -- agent status
/// - `POST /api/agent/pause` / `POST /api/agent/resume` -- agent control
///
/// CORS is configured to allow any origin for development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/feed", get(ws::ws_feed))
        // REST API
        .route("/api/feed", get(handlers::get_feed))
        .route(
            "/api/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route("/api/members", get(handlers::list_members))
        .route("/api/members/{id}/warn", post(handlers::warn_member))
        .route("/api/actions", get(handlers::list_actions))
        .route("/api/stats", get(handlers::get_stats))
        // Agent control
        .route("/api/agent", get(handlers::get_agent))
        .route("/api/agent/pause", post(handlers::pause_agent))
        .route("/api/agent/resume", post(handlers::resume_agent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
