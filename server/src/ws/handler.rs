use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. Connections are anonymous until they send
/// `chat_new_join`; each upgraded socket gets its own actor.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    tracing::debug!("WebSocket upgrade requested");
    ws.on_upgrade(move |socket| actor::run_connection(socket, state))
}
