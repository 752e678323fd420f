use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Rental session timer for one station, persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerEntity {
    /// Primary key of the timer.
    pub id: Uuid,
    /// Club that owns this timer.
    pub club: Uuid,
    /// Operator that created the timer; used by the access gate.
    pub author: Uuid,
    /// Station label, unique among timers of the same author.
    pub title: String,
    /// Open-ended session billed per elapsed minute when `true`,
    /// fixed-duration countdown otherwise.
    pub is_infinite: bool,
    /// Countdown mode: minutes left. Infinite mode: elapsed minute accumulator.
    /// `None` while idle.
    pub remaining_minutes: Option<u32>,
    /// Originally configured countdown length, kept so a mid-session
    /// reconfiguration can compute the added-time delta.
    pub defined_minutes: Option<u32>,
    /// Wall-clock instant the session started.
    pub start: Option<SystemTime>,
    /// Projected countdown completion instant. `None` while paused, idle, or
    /// in infinite mode.
    pub end: Option<SystemTime>,
    /// Wall-clock instant of the last pause, if currently paused.
    pub paused_at: Option<SystemTime>,
    /// Price basis: per-hour rate for infinite mode, total session price for
    /// countdown mode.
    pub price: Option<f64>,
    /// Running total accrued so far.
    pub accrued_price: f64,
    /// Session has started and has not been cleared back to idle.
    pub is_active: bool,
    /// Session is active but accrual is frozen.
    pub paused: bool,
    /// Countdown reached zero naturally.
    pub expired: bool,
    /// Operator stopped the session before completion.
    pub manually_stopped: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the timer document was updated.
    pub updated_at: SystemTime,
}

impl TimerEntity {
    /// Build a fresh idle timer with all timing and pricing fields unset.
    pub fn idle(title: String, club: Uuid, author: Uuid) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            club,
            author,
            title,
            is_infinite: false,
            remaining_minutes: None,
            defined_minutes: None,
            start: None,
            end: None,
            paused_at: None,
            price: None,
            accrued_price: 0.0,
            is_active: false,
            paused: false,
            expired: false,
            manually_stopped: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reset every timing, pricing, and status field to its idle default.
    /// Identity fields (id, club, author, title) are untouched.
    pub fn reset_to_idle(&mut self) {
        self.is_infinite = false;
        self.remaining_minutes = None;
        self.defined_minutes = None;
        self.start = None;
        self.end = None;
        self.paused_at = None;
        self.price = None;
        self.accrued_price = 0.0;
        self.is_active = false;
        self.paused = false;
        self.expired = false;
        self.manually_stopped = false;
    }

    /// Whether the periodic tick should advance this timer.
    pub fn is_ticking(&self) -> bool {
        self.is_active && !self.paused && !self.expired && self.remaining_minutes.is_some()
    }
}

/// Immutable record of one completed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerHistoryEntity {
    /// Primary key of the history entry.
    pub id: Uuid,
    /// Timer the session ran on.
    pub timer_id: Uuid,
    /// Station label at the time the session ended.
    pub title: String,
    /// Formatted elapsed-time string (`HH:MM`).
    pub time: String,
    /// Whether the session ran in infinite mode.
    pub is_infinite: bool,
    /// Session start instant.
    pub start: Option<SystemTime>,
    /// Session end instant.
    pub end: Option<SystemTime>,
    /// Configured price basis.
    pub price: Option<f64>,
    /// Final accrued price for the session.
    pub final_price: f64,
    /// Whether an operator stopped the session before completion.
    pub manually_stopped: bool,
    /// Club the session belongs to.
    pub club: Uuid,
    /// When this entry was recorded; retention keeps the newest entries.
    pub recorded_at: SystemTime,
}

/// Club entity, owned by the external club directory; the timer engine only
/// reads it and maintains the denormalized `timers`/`timer_histories` lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClubEntity {
    /// Primary key of the club.
    pub id: Uuid,
    /// Display name of the venue.
    pub name: String,
    /// Operator that owns the club.
    pub author: Uuid,
    /// Ids of the timers attached to this club.
    pub timers: Vec<Uuid>,
    /// Ids of the retained history entries for this club.
    pub timer_histories: Vec<Uuid>,
}
