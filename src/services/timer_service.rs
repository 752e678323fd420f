//! Command handlers for the rental session lifecycle.
//!
//! Every mutation of one timer runs under that timer's async mutex so HTTP
//! commands and the background tick never interleave on the same document.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::TimerEntity,
    dto::timer::{CreateTimerRequest, RenameTimerRequest, UpdateTimerRequest},
    error::ServiceError,
    services::{
        access::{Actor, check_access},
        broadcast_service, history_service,
    },
    state::{
        SharedState,
        clock::{end_of_interval, parse_hhmm},
        state_machine::{TimerCommand, TimerPhase, compute_transition},
    },
};

/// Create an idle timer attached to a club.
pub async fn create_timer(
    state: &SharedState,
    request: CreateTimerRequest,
) -> Result<TimerEntity, ServiceError> {
    let store = state.require_timer_store().await?;

    if store.find_club(request.club).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "club `{}` not found",
            request.club
        )));
    }

    if store
        .find_timer_by_title(request.author, request.title.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "a timer titled `{}` already exists for this author",
            request.title
        )));
    }

    let timer = TimerEntity::idle(request.title, request.club, request.author);
    store.insert_timer(timer.clone()).await?;

    if !store.attach_timer(timer.club, timer.id).await? {
        return Err(ServiceError::Internal(format!(
            "club `{}` disappeared while attaching timer `{}`",
            timer.club, timer.id
        )));
    }

    info!(timer = %timer.id, club = %timer.club, "timer created");
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(timer)
}

/// Reconfigure a timer's billing mode, duration, and price.
///
/// On an active countdown a new duration at least as long as the current
/// remaining time extends the running session by the added minutes; any
/// other change resets the timer to an unstarted configuration. Switching a
/// running session to infinite mode is rejected.
pub async fn reconfigure_timer(
    state: &SharedState,
    id: Uuid,
    request: UpdateTimerRequest,
    actor: Actor,
) -> Result<TimerEntity, ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let mut timer = load_timer(state, id).await?;
    check_access(actor, &timer)?;
    compute_transition(TimerPhase::of(&timer), TimerCommand::Configure)?;

    if request.is_infinite {
        if timer.is_active {
            return Err(ServiceError::Conflict(
                "cannot switch a running session to infinite mode".into(),
            ));
        }

        timer.is_infinite = true;
        timer.remaining_minutes = Some(0);
        timer.defined_minutes = None;
        timer.start = None;
        timer.end = None;
        timer.paused_at = None;
        timer.accrued_price = 0.0;
        timer.price = request.price;
        timer.is_active = false;
        timer.paused = false;
    } else {
        let minutes = request
            .remaining_time
            .as_deref()
            .and_then(parse_hhmm)
            .ok_or_else(|| {
                ServiceError::InvalidInput(
                    "countdown configuration requires a `HH:MM` remaining_time".into(),
                )
            })?;

        let extends_running_session = timer.is_active
            && !timer.is_infinite
            && timer
                .remaining_minutes
                .is_some_and(|remaining| minutes >= remaining);

        if extends_running_session {
            let previously_defined = timer.defined_minutes.unwrap_or(0);
            let delta = minutes.saturating_sub(previously_defined);
            let remaining = timer.remaining_minutes.unwrap_or(0) + delta;

            timer.remaining_minutes = Some(remaining);
            timer.defined_minutes = Some(minutes);
            if let Some(price) = request.price {
                timer.price = Some(price);
            }
            if !timer.paused {
                timer.end = Some(end_of_interval(SystemTime::now(), remaining));
            }
        } else {
            timer.is_infinite = false;
            timer.remaining_minutes = Some(minutes);
            timer.defined_minutes = Some(minutes);
            timer.start = None;
            timer.end = None;
            timer.paused_at = None;
            timer.accrued_price = 0.0;
            timer.price = request.price;
            timer.is_active = false;
            timer.paused = false;
        }
    }

    timer.updated_at = SystemTime::now();
    store.save_timer(timer.clone()).await?;
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(timer)
}

/// Start a configured idle timer.
pub async fn start_timer(
    state: &SharedState,
    id: Uuid,
    actor: Actor,
) -> Result<TimerEntity, ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let mut timer = load_timer(state, id).await?;
    check_access(actor, &timer)?;
    compute_transition(TimerPhase::of(&timer), TimerCommand::Start)?;

    let remaining = timer.remaining_minutes.ok_or_else(|| {
        ServiceError::Conflict("timer has no configured duration to run".into())
    })?;

    state.cancel_pending_clear(id);

    let now = SystemTime::now();
    timer.is_active = true;
    timer.paused = false;
    timer.expired = false;
    timer.manually_stopped = false;
    timer.start = Some(now);
    timer.paused_at = None;
    timer.end = if timer.is_infinite {
        None
    } else {
        Some(end_of_interval(now, remaining))
    };
    timer.updated_at = now;

    store.save_timer(timer.clone()).await?;
    state.record_start_snapshot(timer.clone());

    info!(timer = %timer.id, club = %timer.club, "session started");
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(timer)
}

/// Toggle pause on a running session, returning the updated timer and
/// whether it is now paused.
pub async fn toggle_pause(
    state: &SharedState,
    id: Uuid,
    actor: Actor,
) -> Result<(TimerEntity, bool), ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let mut timer = load_timer(state, id).await?;
    check_access(actor, &timer)?;

    let now = SystemTime::now();
    let pausing = match TimerPhase::of(&timer) {
        TimerPhase::Active => {
            compute_transition(TimerPhase::Active, TimerCommand::Pause)?;
            timer.paused = true;
            timer.paused_at = Some(now);
            timer.end = None;
            true
        }
        phase => {
            // Anything not plainly active resolves through Resume so the
            // state machine produces the Conflict for idle/finished timers.
            compute_transition(phase, TimerCommand::Resume)?;
            timer.paused = false;
            timer.paused_at = None;
            timer.end = match (timer.is_infinite, timer.remaining_minutes) {
                (false, Some(remaining)) => Some(end_of_interval(now, remaining)),
                _ => None,
            };
            false
        }
    };

    timer.updated_at = now;
    store.save_timer(timer.clone()).await?;
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok((timer, pausing))
}

/// Manually stop a running session, recording it to history.
pub async fn stop_timer(
    state: &SharedState,
    id: Uuid,
    actor: Actor,
) -> Result<TimerEntity, ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let mut timer = load_timer(state, id).await?;
    check_access(actor, &timer)?;
    compute_transition(TimerPhase::of(&timer), TimerCommand::Stop)?;

    let now = SystemTime::now();
    timer.expired = true;
    timer.manually_stopped = true;
    timer.paused = false;
    timer.paused_at = None;
    // Infinite sessions never carry a scheduled end; the history entry falls
    // back to the stop instant instead.
    timer.end = if timer.is_infinite { None } else { Some(now) };
    timer.updated_at = now;

    store.save_timer(timer.clone()).await?;

    // Once the stopped state is persisted the clear must still run; a failed
    // history write loses the record, not the timer.
    let entry = history_service::history_entry_for(&timer, now);
    match history_service::record(&store, entry).await {
        Ok(_) => {
            if let Err(err) =
                history_service::prune(&store, timer.club, state.config().history_keep()).await
            {
                warn!(club = %timer.club, error = %err, "history prune failed after stop");
            }
        }
        Err(err) => {
            warn!(timer = %timer.id, error = %err, "failed to record stopped session");
        }
    }

    info!(timer = %timer.id, club = %timer.club, "session stopped manually");
    broadcast_service::notify_club_changed(state, timer.club).await;
    schedule_clear(state, id);
    Ok(timer)
}

/// Rename a timer's station label.
pub async fn rename_timer(
    state: &SharedState,
    id: Uuid,
    request: RenameTimerRequest,
    actor: Actor,
) -> Result<TimerEntity, ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let mut timer = load_timer(state, id).await?;
    check_access(actor, &timer)?;

    if let Some(existing) = store
        .find_timer_by_title(timer.author, request.title.clone())
        .await?
        && existing.id != timer.id
    {
        return Err(ServiceError::Conflict(format!(
            "a timer titled `{}` already exists for this author",
            request.title
        )));
    }

    timer.title = request.title;
    timer.updated_at = SystemTime::now();
    store.save_timer(timer.clone()).await?;
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(timer)
}

/// Delete a timer and detach it from its club.
pub async fn delete_timer(
    state: &SharedState,
    id: Uuid,
    actor: Actor,
) -> Result<TimerEntity, ServiceError> {
    let lock = state.timer_lock(id);

    let timer = {
        let _guard = lock.lock().await;

        let store = state.require_timer_store().await?;
        let timer = load_timer(state, id).await?;
        check_access(actor, &timer)?;

        store.delete_timer(id).await?;
        if !store.detach_timer(timer.club, id).await? {
            return Err(ServiceError::Internal(format!(
                "club `{}` not found while detaching timer `{}`",
                timer.club, id
            )));
        }

        timer
    };

    state.forget_timer(id);
    info!(timer = %id, club = %timer.club, "timer deleted");
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(timer)
}

/// Full timer set of a club, in creation order.
pub async fn timers_by_club(
    state: &SharedState,
    club: Uuid,
) -> Result<Vec<TimerEntity>, ServiceError> {
    let store = state.require_timer_store().await?;

    if store.find_club(club).await?.is_none() {
        return Err(ServiceError::NotFound(format!("club `{club}` not found")));
    }

    Ok(store.timers_by_club(club).await?)
}

/// Reset a finished timer back to idle.
pub async fn clear_timer(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let lock = state.timer_lock(id);
    let _guard = lock.lock().await;

    let store = state.require_timer_store().await?;
    let Some(mut timer) = store.find_timer(id).await? else {
        // Deleted while the clear was pending; nothing to reset.
        return Ok(());
    };

    timer.reset_to_idle();
    timer.updated_at = SystemTime::now();
    store.save_timer(timer.clone()).await?;
    broadcast_service::notify_club_changed(state, timer.club).await;
    Ok(())
}

/// Schedule the automatic reset of a finished timer, replacing any clear
/// already pending for the same id.
pub fn schedule_clear(state: &SharedState, id: Uuid) {
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(task_state.config().clear_delay()).await;
        if let Err(err) = clear_timer(&task_state, id).await {
            warn!(timer = %id, error = %err, "scheduled clear failed");
        }
        task_state.clear_finished(id);
    });

    state.set_pending_clear(id, handle);
}

async fn load_timer(state: &SharedState, id: Uuid) -> Result<TimerEntity, ServiceError> {
    let store = state.require_timer_store().await?;
    store
        .find_timer(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("timer `{id}` not found")))
}
