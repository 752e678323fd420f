//! Fan-out of full-set timer snapshots to per-club live feeds.

use axum::extract::ws::Message;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{timer::TimerResponse, ws::ClubFeedEvent},
    error::ServiceError,
    state::SharedState,
};

/// Build the `timer-updated` snapshot message for a club.
pub async fn snapshot_message(
    state: &SharedState,
    club: Uuid,
) -> Result<Message, ServiceError> {
    let store = state.require_timer_store().await?;
    let timers = store.timers_by_club(club).await?;
    let event = ClubFeedEvent::timer_updated(timers.iter().map(TimerResponse::from).collect());

    let payload = serde_json::to_string(&event)
        .map_err(|err| ServiceError::Internal(format!("failed to serialize club feed: {err}")))?;
    Ok(Message::Text(payload.into()))
}

/// Push a fresh snapshot to every subscriber of the club.
///
/// Best effort: while degraded the push is skipped silently, other failures
/// are logged and swallowed so callers never fail a command over a feed
/// hiccup.
pub async fn notify_club_changed(state: &SharedState, club: Uuid) {
    if state.hub().subscribed_clubs().contains(&club) {
        match snapshot_message(state, club).await {
            Ok(message) => state.hub().push_to_club(club, &message),
            Err(ServiceError::Degraded) => {}
            Err(err) => {
                warn!(club = %club, error = %err, "failed to broadcast club snapshot");
            }
        }
    }
}
