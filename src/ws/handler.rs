//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The `x-user-id` header is required; the feed only ever carries that
/// user's events.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    tracing::debug!(%user_id, "ws connection opened");
    ws.on_upgrade(move |socket| run_connection(socket, user_id, event_rx))
}
