use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{ClubEntity, TimerEntity, TimerHistoryEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTimerDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    club: Uuid,
    author: Uuid,
    title: String,
    is_infinite: bool,
    remaining_minutes: Option<u32>,
    defined_minutes: Option<u32>,
    start: Option<DateTime>,
    end: Option<DateTime>,
    paused_at: Option<DateTime>,
    price: Option<f64>,
    accrued_price: f64,
    is_active: bool,
    paused: bool,
    expired: bool,
    manually_stopped: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<TimerEntity> for MongoTimerDocument {
    fn from(value: TimerEntity) -> Self {
        Self {
            id: value.id,
            club: value.club,
            author: value.author,
            title: value.title,
            is_infinite: value.is_infinite,
            remaining_minutes: value.remaining_minutes,
            defined_minutes: value.defined_minutes,
            start: value.start.map(DateTime::from_system_time),
            end: value.end.map(DateTime::from_system_time),
            paused_at: value.paused_at.map(DateTime::from_system_time),
            price: value.price,
            accrued_price: value.accrued_price,
            is_active: value.is_active,
            paused: value.paused,
            expired: value.expired,
            manually_stopped: value.manually_stopped,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoTimerDocument> for TimerEntity {
    fn from(value: MongoTimerDocument) -> Self {
        Self {
            id: value.id,
            club: value.club,
            author: value.author,
            title: value.title,
            is_infinite: value.is_infinite,
            remaining_minutes: value.remaining_minutes,
            defined_minutes: value.defined_minutes,
            start: value.start.map(DateTime::to_system_time),
            end: value.end.map(DateTime::to_system_time),
            paused_at: value.paused_at.map(DateTime::to_system_time),
            price: value.price,
            accrued_price: value.accrued_price,
            is_active: value.is_active,
            paused: value.paused,
            expired: value.expired,
            manually_stopped: value.manually_stopped,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHistoryDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    timer_id: Uuid,
    title: String,
    time: String,
    is_infinite: bool,
    start: Option<DateTime>,
    end: Option<DateTime>,
    price: Option<f64>,
    final_price: f64,
    manually_stopped: bool,
    club: Uuid,
    recorded_at: DateTime,
}

impl From<TimerHistoryEntity> for MongoHistoryDocument {
    fn from(value: TimerHistoryEntity) -> Self {
        Self {
            id: value.id,
            timer_id: value.timer_id,
            title: value.title,
            time: value.time,
            is_infinite: value.is_infinite,
            start: value.start.map(DateTime::from_system_time),
            end: value.end.map(DateTime::from_system_time),
            price: value.price,
            final_price: value.final_price,
            manually_stopped: value.manually_stopped,
            club: value.club,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl From<MongoHistoryDocument> for TimerHistoryEntity {
    fn from(value: MongoHistoryDocument) -> Self {
        Self {
            id: value.id,
            timer_id: value.timer_id,
            title: value.title,
            time: value.time,
            is_infinite: value.is_infinite,
            start: value.start.map(DateTime::to_system_time),
            end: value.end.map(DateTime::to_system_time),
            price: value.price,
            final_price: value.final_price,
            manually_stopped: value.manually_stopped,
            club: value.club,
            recorded_at: value.recorded_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoClubDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    author: Uuid,
    #[serde(default)]
    timers: Vec<Uuid>,
    #[serde(default)]
    timer_histories: Vec<Uuid>,
}

impl From<MongoClubDocument> for ClubEntity {
    fn from(value: MongoClubDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            author: value.author,
            timers: value.timers,
            timer_histories: value.timer_histories,
        }
    }
}

/// Uuids are serialized through serde as strings, so filters must match that
/// representation.
pub fn uuid_filter(id: Uuid) -> String {
    id.to_string()
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_filter(id)}
}
