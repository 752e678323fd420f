use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::TimerEntity,
    dto::{format_system_time, validation::validate_duration},
    state::clock::format_hhmm,
};

/// Payload for creating a new idle timer on a club station.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimerRequest {
    /// Station label, unique among timers of the same author.
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    /// Club the timer belongs to.
    pub club: Uuid,
    /// Operator creating the timer.
    pub author: Uuid,
}

/// Payload for reconfiguring a timer's mode, duration, and price.
#[derive(Debug, Deserialize)]
pub struct UpdateTimerRequest {
    /// Open-ended per-minute billing when `true`, fixed countdown otherwise.
    pub is_infinite: bool,
    /// Countdown duration as `HH:MM`; ignored in infinite mode.
    #[serde(default)]
    pub remaining_time: Option<String>,
    /// Price basis: per-hour rate (infinite) or total session price (countdown).
    #[serde(default)]
    pub price: Option<f64>,
}

impl Validate for UpdateTimerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref duration) = self.remaining_time {
            if let Err(e) = validate_duration(duration) {
                errors.add("remaining_time", e);
            }
        }

        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                let mut err = ValidationError::new("price_range");
                err.message = Some("Price must be a finite non-negative number".into());
                errors.add("price", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for renaming a timer's station label.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameTimerRequest {
    /// New station label.
    #[validate(length(min = 1, max = 120))]
    pub title: String,
}

/// Timer as exposed over HTTP and the live feed.
#[derive(Debug, Clone, Serialize)]
pub struct TimerResponse {
    pub id: Uuid,
    pub club: Uuid,
    pub author: Uuid,
    pub title: String,
    pub is_infinite: bool,
    /// Countdown: remaining time. Infinite: elapsed time. `HH:MM`, absent while idle.
    pub remaining_time: Option<String>,
    /// Originally configured countdown duration, `HH:MM`.
    pub defined_time: Option<String>,
    /// RFC 3339 session start instant.
    pub start: Option<String>,
    /// RFC 3339 projected countdown completion instant.
    pub end: Option<String>,
    /// RFC 3339 instant of the last pause, if currently paused.
    pub paused_at: Option<String>,
    pub price: Option<f64>,
    pub accrued_price: f64,
    pub is_active: bool,
    pub paused: bool,
    pub expired: bool,
    pub manually_stopped: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&TimerEntity> for TimerResponse {
    fn from(timer: &TimerEntity) -> Self {
        Self {
            id: timer.id,
            club: timer.club,
            author: timer.author,
            title: timer.title.clone(),
            is_infinite: timer.is_infinite,
            remaining_time: timer.remaining_minutes.map(format_hhmm),
            defined_time: timer.defined_minutes.map(format_hhmm),
            start: timer.start.map(format_system_time),
            end: timer.end.map(format_system_time),
            paused_at: timer.paused_at.map(format_system_time),
            price: timer.price,
            accrued_price: timer.accrued_price,
            is_active: timer.is_active,
            paused: timer.paused,
            expired: timer.expired,
            manually_stopped: timer.manually_stopped,
            created_at: format_system_time(timer.created_at),
            updated_at: format_system_time(timer.updated_at),
        }
    }
}

impl From<TimerEntity> for TimerResponse {
    fn from(timer: TimerEntity) -> Self {
        Self::from(&timer)
    }
}

/// Plain acknowledgement body for toggle-style operations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
