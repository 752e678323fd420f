use serde::Serialize;

use crate::dto::timer::TimerResponse;

/// Full-set snapshot pushed to every live-feed subscriber of a club.
#[derive(Debug, Serialize)]
pub struct ClubFeedEvent {
    /// Event discriminator, always `timer-updated`.
    pub event: &'static str,
    /// Every timer of the club, in creation order.
    pub timers: Vec<TimerResponse>,
}

impl ClubFeedEvent {
    /// Build the `timer-updated` snapshot event.
    pub fn timer_updated(timers: Vec<TimerResponse>) -> Self {
        Self {
            event: "timer-updated",
            timers,
        }
    }
}
