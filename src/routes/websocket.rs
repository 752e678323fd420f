use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{services::websocket_service, state::SharedState};

/// Query parameters accepted by the live-feed endpoint.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Club whose timer feed the subscriber wants to watch.
    pub club: Uuid,
}

/// Upgrade the HTTP connection into a live timer feed for one club.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(query): Query<FeedQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let shared_state = state.clone();
    ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(shared_state.clone(), socket, query.club)
    })
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
