use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::timer::{
        CreateTimerRequest, MessageResponse, RenameTimerRequest, TimerResponse,
        UpdateTimerRequest,
    },
    error::AppError,
    services::{access::Actor, timer_service},
    state::SharedState,
};

/// Routes handling timer lifecycle commands and club listings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/timers", post(create_timer))
        .route("/timers/{id}", put(reconfigure_timer).delete(delete_timer))
        .route("/timers/{id}/start", put(start_timer))
        .route("/timers/{id}/pause", put(pause_timer))
        .route("/timers/{id}/stop", put(stop_timer))
        .route("/timers/{id}/info", put(rename_timer))
        .route("/clubs/{club_id}/timers", get(club_timers))
}

/// Create a fresh idle timer on a club station.
pub async fn create_timer(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<TimerResponse>), AppError> {
    payload.validate()?;
    let timer = timer_service::create_timer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(TimerResponse::from(timer))))
}

/// Reconfigure a timer's duration, billing mode, and price.
pub async fn reconfigure_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<UpdateTimerRequest>,
) -> Result<Json<TimerResponse>, AppError> {
    payload.validate()?;
    let timer = timer_service::reconfigure_timer(&state, id, payload, actor).await?;
    Ok(Json(TimerResponse::from(timer)))
}

/// Start a configured timer's session.
pub async fn start_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<TimerResponse>, AppError> {
    let timer = timer_service::start_timer(&state, id, actor).await?;
    Ok(Json(TimerResponse::from(timer)))
}

/// Toggle pause on a running session.
pub async fn pause_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<MessageResponse>, AppError> {
    let (_, paused) = timer_service::toggle_pause(&state, id, actor).await?;
    let message = if paused {
        "timer paused"
    } else {
        "timer resumed"
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Manually stop a running session, recording it to history.
pub async fn stop_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<TimerResponse>, AppError> {
    let timer = timer_service::stop_timer(&state, id, actor).await?;
    Ok(Json(TimerResponse::from(timer)))
}

/// Rename a timer's station label.
pub async fn rename_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<RenameTimerRequest>,
) -> Result<Json<TimerResponse>, AppError> {
    payload.validate()?;
    let timer = timer_service::rename_timer(&state, id, payload, actor).await?;
    Ok(Json(TimerResponse::from(timer)))
}

/// Delete a timer and detach it from its club.
pub async fn delete_timer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<TimerResponse>, AppError> {
    let timer = timer_service::delete_timer(&state, id, actor).await?;
    Ok(Json(TimerResponse::from(timer)))
}

/// List every timer of a club, in creation order.
pub async fn club_timers(
    State(state): State<SharedState>,
    Path(club_id): Path<Uuid>,
) -> Result<Json<Vec<TimerResponse>>, AppError> {
    let timers = timer_service::timers_by_club(&state, club_id).await?;
    Ok(Json(timers.iter().map(TimerResponse::from).collect()))
}
