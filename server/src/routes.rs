use axum::{extract::State, routing::get, Json, Router};

use crate::chat::page;
use crate::state::AppState;
use crate::ws::handler as ws_handler;
use crate::ws::registry::Identity;

/// GET /api/members — Current roster, ordered by member id.
async fn list_members(State(state): State<AppState>) -> Json<Vec<Identity>> {
    let members = state
        .relay
        .registry()
        .snapshot_members()
        .into_iter()
        .map(|m| m.identity)
        .collect();
    Json(members)
}

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::chat_page))
        .route("/ws", get(ws_handler::ws_upgrade))
        .route("/api/members", get(list_members))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
