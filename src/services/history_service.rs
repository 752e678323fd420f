//! Append-only log of completed sessions with per-club retention.

use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        models::{TimerEntity, TimerHistoryEntity},
        timer_store::TimerStore,
    },
    error::ServiceError,
    state::clock::format_hhmm,
};

/// Build the history entry for a finished session.
///
/// The recorded time string is the billed duration: the configured countdown
/// length on natural expiry, the elapsed minutes on a manual stop, and the
/// elapsed accumulator for infinite sessions. Final price follows the billing
/// mode: the configured session price for countdowns, the accrued per-minute
/// total for infinite sessions.
pub fn history_entry_for(timer: &TimerEntity, now: SystemTime) -> TimerHistoryEntity {
    let elapsed_minutes = if timer.is_infinite {
        timer.remaining_minutes.unwrap_or(0)
    } else if timer.manually_stopped {
        let defined = timer.defined_minutes.unwrap_or(0);
        defined.saturating_sub(timer.remaining_minutes.unwrap_or(0))
    } else {
        timer.defined_minutes.unwrap_or(0)
    };

    let final_price = if timer.is_infinite {
        timer.accrued_price
    } else {
        timer.price.unwrap_or(timer.accrued_price)
    };

    TimerHistoryEntity {
        id: Uuid::new_v4(),
        timer_id: timer.id,
        title: timer.title.clone(),
        time: format_hhmm(elapsed_minutes),
        is_infinite: timer.is_infinite,
        start: timer.start,
        end: timer.end.or(Some(now)),
        price: timer.price,
        final_price,
        manually_stopped: timer.manually_stopped,
        club: timer.club,
        recorded_at: now,
    }
}

/// Persist a history entry and link it into the owning club.
pub async fn record(
    store: &Arc<dyn TimerStore>,
    entry: TimerHistoryEntity,
) -> Result<TimerHistoryEntity, ServiceError> {
    store.insert_history(entry.clone()).await?;

    if !store.attach_history(entry.club, entry.id).await? {
        return Err(ServiceError::Internal(format!(
            "club `{}` not found while recording history for timer `{}`",
            entry.club, entry.timer_id
        )));
    }

    Ok(entry)
}

/// Trim a club's history down to the `keep` most recent entries.
///
/// Deleting an entry a concurrent prune already removed is a no-op, so
/// duplicate prunes converge on the same final set.
pub async fn prune(
    store: &Arc<dyn TimerStore>,
    club: Uuid,
    keep: usize,
) -> Result<(), ServiceError> {
    let entries = store.history_by_club(club).await?;
    let doomed = ids_to_remove(&entries, keep);
    if doomed.is_empty() {
        return Ok(());
    }

    store.delete_histories(doomed.clone()).await?;
    if !store.detach_histories(club, doomed).await? {
        return Err(ServiceError::Internal(format!(
            "club `{club}` not found while pruning its history"
        )));
    }
    Ok(())
}

/// Ids of the entries that fall outside the retention window.
///
/// `entries` must be ordered oldest first.
fn ids_to_remove(entries: &[TimerHistoryEntity], keep: usize) -> Vec<Uuid> {
    let excess = entries.len().saturating_sub(keep);
    entries[..excess].iter().map(|entry| entry.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::dao::{models::ClubEntity, timer_store::memory::MemoryTimerStore};

    fn entry_recorded_at(club: Uuid, offset_secs: u64) -> TimerHistoryEntity {
        TimerHistoryEntity {
            id: Uuid::new_v4(),
            timer_id: Uuid::new_v4(),
            title: "Station 1".into(),
            time: "01:00".into(),
            is_infinite: false,
            start: None,
            end: None,
            price: Some(600.0),
            final_price: 600.0,
            manually_stopped: false,
            club,
            recorded_at: SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs),
        }
    }

    async fn seeded_club(
        entries: &[TimerHistoryEntity],
    ) -> (MemoryTimerStore, Arc<dyn TimerStore>, Uuid) {
        let club_id = entries.first().map(|e| e.club).unwrap_or_else(Uuid::new_v4);
        let memory = MemoryTimerStore::new();
        memory.add_club(ClubEntity {
            id: club_id,
            name: "Arena".into(),
            author: Uuid::new_v4(),
            timers: Vec::new(),
            timer_histories: Vec::new(),
        });
        let store: Arc<dyn TimerStore> = Arc::new(memory.clone());

        for entry in entries {
            store.insert_history(entry.clone()).await.unwrap();
            store.attach_history(club_id, entry.id).await.unwrap();
        }

        (memory, store, club_id)
    }

    #[test]
    fn retention_removes_only_the_oldest() {
        let club = Uuid::new_v4();
        let entries: Vec<_> = (0..25).map(|i| entry_recorded_at(club, i)).collect();
        let doomed = ids_to_remove(&entries, 20);

        assert_eq!(doomed.len(), 5);
        let expected: Vec<_> = entries[..5].iter().map(|e| e.id).collect();
        assert_eq!(doomed, expected);
    }

    #[test]
    fn retention_keeps_everything_under_the_limit() {
        let club = Uuid::new_v4();
        let entries: Vec<_> = (0..7).map(|i| entry_recorded_at(club, i)).collect();
        assert!(ids_to_remove(&entries, 20).is_empty());
        assert!(ids_to_remove(&[], 20).is_empty());
    }

    #[tokio::test]
    async fn prune_trims_store_and_club_references() {
        let club = Uuid::new_v4();
        let entries: Vec<_> = (0..25).map(|i| entry_recorded_at(club, i)).collect();
        let (memory, store, club_id) = seeded_club(&entries).await;

        prune(&store, club_id, 20).await.unwrap();

        let survivors: Vec<Uuid> = entries[5..].iter().map(|e| e.id).collect();
        let remaining = store.history_by_club(club_id).await.unwrap();
        assert_eq!(remaining.len(), 20);
        let remaining_ids: Vec<Uuid> = remaining.iter().map(|e| e.id).collect();
        assert_eq!(remaining_ids, survivors);
        assert_eq!(memory.club(club_id).unwrap().timer_histories, survivors);
    }

    #[tokio::test]
    async fn prune_reports_a_club_that_vanished() {
        let club = Uuid::new_v4();
        let entries: Vec<_> = (0..25).map(|i| entry_recorded_at(club, i)).collect();
        let (memory, store, club_id) = seeded_club(&entries).await;

        memory.remove_club(club_id);

        let result = prune(&store, club_id, 20).await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }

    #[test]
    fn expiry_records_the_configured_duration() {
        let mut timer = TimerEntity::idle("Station 1".into(), Uuid::new_v4(), Uuid::new_v4());
        timer.defined_minutes = Some(60);
        timer.remaining_minutes = Some(0);
        timer.price = Some(600.0);
        timer.accrued_price = 599.9999;
        timer.expired = true;

        let entry = history_entry_for(&timer, SystemTime::now());
        assert_eq!(entry.time, "01:00");
        assert_eq!(entry.final_price, 600.0);
        assert!(!entry.manually_stopped);
    }

    #[test]
    fn manual_stop_records_elapsed_minutes() {
        let mut timer = TimerEntity::idle("Station 1".into(), Uuid::new_v4(), Uuid::new_v4());
        timer.defined_minutes = Some(90);
        timer.remaining_minutes = Some(30);
        timer.price = Some(600.0);
        timer.expired = true;
        timer.manually_stopped = true;

        let entry = history_entry_for(&timer, SystemTime::now());
        assert_eq!(entry.time, "01:00");
        assert_eq!(entry.final_price, 600.0);
        assert!(entry.manually_stopped);
    }

    #[test]
    fn infinite_records_the_accrued_total() {
        let mut timer = TimerEntity::idle("Station 1".into(), Uuid::new_v4(), Uuid::new_v4());
        timer.is_infinite = true;
        timer.remaining_minutes = Some(75);
        timer.price = Some(120.0);
        timer.accrued_price = 150.0;
        timer.expired = true;
        timer.manually_stopped = true;

        let entry = history_entry_for(&timer, SystemTime::now());
        assert_eq!(entry.time, "01:15");
        assert_eq!(entry.final_price, 150.0);
        assert!(entry.is_infinite);
    }
}
