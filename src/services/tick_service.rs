//! Periodic scheduler advancing every running session by one minute-unit.
//!
//! One tick moves exactly one minute of billed time; the tick period controls
//! how fast billed time runs against the wall clock.

use std::collections::HashSet;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::TimerEntity,
    error::ServiceError,
    services::{broadcast_service, history_service, timer_service},
    state::SharedState,
};

/// What a single tick did to a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One minute-unit of time and price was accrued.
    Accrued,
    /// The countdown was already exhausted; the session expired.
    Expired,
}

/// Advance a ticking timer by one minute-unit.
///
/// Infinite sessions accumulate elapsed minutes, countdowns burn remaining
/// ones; both accrue `price / 60` per unit. A countdown that is already at
/// zero expires instead of accruing.
pub fn advance(timer: &mut TimerEntity) -> TickOutcome {
    let per_minute = timer.price.unwrap_or(0.0) / 60.0;

    if timer.is_infinite {
        timer.remaining_minutes = Some(timer.remaining_minutes.unwrap_or(0) + 1);
        timer.accrued_price += per_minute;
        return TickOutcome::Accrued;
    }

    match timer.remaining_minutes.unwrap_or(0) {
        0 => {
            timer.expired = true;
            TickOutcome::Expired
        }
        remaining => {
            timer.remaining_minutes = Some(remaining - 1);
            timer.accrued_price += per_minute;
            TickOutcome::Accrued
        }
    }
}

/// Run the tick loop until the process exits.
pub async fn run(state: SharedState) {
    let mut interval = tokio::time::interval(state.config().tick_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        tick_once(&state).await;
    }
}

/// One full tick batch: advance every running session, record expiries, prune
/// affected clubs, and refresh every subscribed live feed.
pub async fn tick_once(state: &SharedState) {
    // Degraded mode: billed time simply does not run.
    let Some(store) = state.timer_store().await else {
        return;
    };

    let candidates = match store.ticking_timers().await {
        Ok(timers) => timers,
        Err(err) => {
            warn!(error = %err, "tick failed to list running timers");
            return;
        }
    };

    let mut expired_clubs: HashSet<Uuid> = HashSet::new();

    for candidate in candidates {
        match tick_timer(state, candidate.id).await {
            Ok(Some(TickOutcome::Expired)) => {
                expired_clubs.insert(candidate.club);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(timer = %candidate.id, error = %err, "tick step failed for timer");
            }
        }
    }

    for club in expired_clubs {
        if let Err(err) =
            history_service::prune(&store, club, state.config().history_keep()).await
        {
            warn!(club = %club, error = %err, "history prune failed");
        }
    }

    // Safety-net refresh: every subscribed feed gets a fresh snapshot each
    // tick, whether or not one of its timers changed.
    for club in state.hub().subscribed_clubs() {
        broadcast_service::notify_club_changed(state, club).await;
    }
}

/// Advance one timer under its command lock, reloading it first so a command
/// that slipped in since the batch was listed is never overwritten.
async fn tick_timer(
    state: &SharedState,
    id: Uuid,
) -> Result<Option<TickOutcome>, ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let Some(mut timer) = store.find_timer(id).await? else {
        return Ok(None);
    };
    if !timer.is_ticking() {
        return Ok(None);
    }

    let outcome = advance(&mut timer);
    let now = std::time::SystemTime::now();
    timer.updated_at = now;

    if outcome == TickOutcome::Expired {
        timer.end = timer.end.or(Some(now));
        store.save_timer(timer.clone()).await?;

        // The expired state is persisted; a failed history write must not
        // keep the timer from being cleared.
        let entry = history_service::history_entry_for(&timer, now);
        if let Err(err) = history_service::record(&store, entry).await {
            warn!(timer = %timer.id, error = %err, "failed to record expired session");
        }

        info!(timer = %timer.id, club = %timer.club, "session expired");
        timer_service::schedule_clear(state, id);
    } else {
        store.save_timer(timer.clone()).await?;
    }

    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::{
            models::ClubEntity,
            timer_store::{TimerStore, memory::MemoryTimerStore},
        },
        state::AppState,
    };

    fn running_countdown(club: Uuid, minutes: u32, price: f64) -> TimerEntity {
        let mut timer = TimerEntity::idle("Station 1".into(), club, Uuid::new_v4());
        timer.remaining_minutes = Some(minutes);
        timer.defined_minutes = Some(minutes);
        timer.price = Some(price);
        timer.is_active = true;
        timer.start = Some(std::time::SystemTime::now());
        timer
    }

    #[test]
    fn sixty_ticks_accrue_the_hourly_price() {
        let mut timer = running_countdown(Uuid::new_v4(), 60, 600.0);

        for _ in 0..60 {
            assert_eq!(advance(&mut timer), TickOutcome::Accrued);
        }

        assert_eq!(timer.remaining_minutes, Some(0));
        assert!((timer.accrued_price - 600.0).abs() < 1e-6);
    }

    #[test]
    fn exhausted_countdown_expires_without_accruing() {
        let mut timer = running_countdown(Uuid::new_v4(), 0, 600.0);

        assert_eq!(advance(&mut timer), TickOutcome::Expired);
        assert!(timer.expired);
        assert_eq!(timer.accrued_price, 0.0);
    }

    #[test]
    fn infinite_session_accumulates_elapsed_minutes() {
        let mut timer = running_countdown(Uuid::new_v4(), 0, 120.0);
        timer.is_infinite = true;
        timer.remaining_minutes = Some(0);

        for _ in 0..90 {
            assert_eq!(advance(&mut timer), TickOutcome::Accrued);
        }

        assert_eq!(timer.remaining_minutes, Some(90));
        assert!((timer.accrued_price - 180.0).abs() < 1e-6);
    }

    async fn state_with_store() -> (crate::state::SharedState, MemoryTimerStore, Uuid) {
        let club = ClubEntity {
            id: Uuid::new_v4(),
            name: "Arena".into(),
            author: Uuid::new_v4(),
            timers: Vec::new(),
            timer_histories: Vec::new(),
        };
        let club_id = club.id;

        let store = MemoryTimerStore::new();
        store.add_club(club);

        let state = AppState::new(AppConfig::default());
        state.install_timer_store(Arc::new(store.clone())).await;
        (state, store, club_id)
    }

    #[tokio::test]
    async fn batch_burns_one_minute_per_running_timer() {
        let (state, store, club) = state_with_store().await;
        let timer = running_countdown(club, 60, 600.0);
        let id = timer.id;
        store.insert_timer(timer).await.unwrap();

        tick_once(&state).await;

        let after = store.find_timer(id).await.unwrap().unwrap();
        assert_eq!(after.remaining_minutes, Some(59));
        assert!((after.accrued_price - 10.0).abs() < 1e-6);
        assert!(!after.expired);
    }

    #[tokio::test]
    async fn batch_expires_exhausted_timers_and_records_history() {
        let (state, store, club) = state_with_store().await;
        let timer = running_countdown(club, 0, 600.0);
        let id = timer.id;
        store.insert_timer(timer).await.unwrap();

        tick_once(&state).await;

        let after = store.find_timer(id).await.unwrap().unwrap();
        assert!(after.expired);
        assert!(!after.manually_stopped);
        assert_eq!(store.history_len(), 1);

        // A second batch must not record the session twice.
        tick_once(&state).await;
        assert_eq!(store.history_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_timer_still_clears_when_history_recording_fails() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryTimerStore::new();
        state.install_timer_store(Arc::new(store.clone())).await;

        // A timer pointing at a club the store does not know makes every
        // history write fail.
        let timer = running_countdown(Uuid::new_v4(), 0, 600.0);
        let id = timer.id;
        store.insert_timer(timer).await.unwrap();

        tick_once(&state).await;

        let after = store.find_timer(id).await.unwrap().unwrap();
        assert!(after.expired);
        assert_eq!(store.history_len(), 0);

        // The scheduled clear still brings the timer back to idle.
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

        let cleared = store.find_timer(id).await.unwrap().unwrap();
        assert!(!cleared.expired);
        assert!(cleared.remaining_minutes.is_none());
    }

    #[tokio::test]
    async fn batch_skips_paused_timers() {
        let (state, store, club) = state_with_store().await;
        let mut timer = running_countdown(club, 30, 600.0);
        timer.paused = true;
        let id = timer.id;
        store.insert_timer(timer).await.unwrap();

        tick_once(&state).await;

        let after = store.find_timer(id).await.unwrap().unwrap();
        assert_eq!(after.remaining_minutes, Some(30));
        assert_eq!(after.accrued_price, 0.0);
    }
}
