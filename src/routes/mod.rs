use axum::Router;

use crate::state::SharedState;

pub mod health;
pub mod timers;
pub mod websocket;

/// Compose all route trees, wiring in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(websocket::router())
        .merge(timers::router())
        .with_state(state)
}
