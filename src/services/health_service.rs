use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the engine currently has a healthy storage backend.
///
/// A missing store, a failed ping, and the supervisor's degraded flag all
/// surface as `degraded`; the endpoint itself never fails.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.timer_store().await else {
        warn!("healthcheck while no storage backend is installed");
        return HealthResponse::degraded();
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "healthcheck storage ping failed");
        return HealthResponse::degraded();
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
