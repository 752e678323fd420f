//! In-memory [`TimerStore`] used by service-level tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{ClubEntity, TimerEntity, TimerHistoryEntity},
    storage::StorageResult,
    timer_store::TimerStore,
};

#[derive(Default)]
struct MemoryInner {
    timers: HashMap<Uuid, TimerEntity>,
    clubs: HashMap<Uuid, ClubEntity>,
    histories: HashMap<Uuid, TimerHistoryEntity>,
}

/// Hash-map backed store with the same observable behavior as the MongoDB
/// backend.
#[derive(Clone, Default)]
pub struct MemoryTimerStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a club so timers can be attached to it.
    pub fn add_club(&self, club: ClubEntity) {
        let mut inner = self.inner.lock().unwrap();
        inner.clubs.insert(club.id, club);
    }

    /// Drop a club, as happens when a venue is removed externally.
    pub fn remove_club(&self, id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        inner.clubs.remove(&id);
    }

    /// Snapshot of a club's current state.
    pub fn club(&self, id: Uuid) -> Option<ClubEntity> {
        let inner = self.inner.lock().unwrap();
        inner.clubs.get(&id).cloned()
    }

    /// Number of stored history entries across all clubs.
    pub fn history_len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.histories.len()
    }
}

impl TimerStore for MemoryTimerStore {
    fn insert_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut inner = self.inner.lock().unwrap();
        inner.timers.insert(timer.id, timer);
        Box::pin(async { Ok(()) })
    }

    fn save_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut inner = self.inner.lock().unwrap();
        inner.timers.insert(timer.id, timer);
        Box::pin(async { Ok(()) })
    }

    fn find_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>> {
        let inner = self.inner.lock().unwrap();
        let found = inner.timers.get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn find_timer_by_title(
        &self,
        author: Uuid,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>> {
        let inner = self.inner.lock().unwrap();
        let found = inner
            .timers
            .values()
            .find(|timer| timer.author == author && timer.title == title)
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn timers_by_club(&self, club: Uuid) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>> {
        let inner = self.inner.lock().unwrap();
        let mut timers: Vec<_> = inner
            .timers
            .values()
            .filter(|timer| timer.club == club)
            .cloned()
            .collect();
        timers.sort_by_key(|timer| timer.created_at);
        Box::pin(async move { Ok(timers) })
    }

    fn ticking_timers(&self) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>> {
        let inner = self.inner.lock().unwrap();
        let timers: Vec<_> = inner
            .timers
            .values()
            .filter(|timer| timer.is_ticking())
            .cloned()
            .collect();
        Box::pin(async move { Ok(timers) })
    }

    fn delete_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.timers.remove(&id).is_some();
        Box::pin(async move { Ok(removed) })
    }

    fn find_club(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ClubEntity>>> {
        let inner = self.inner.lock().unwrap();
        let found = inner.clubs.get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn attach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut inner = self.inner.lock().unwrap();
        let attached = match inner.clubs.get_mut(&club) {
            Some(club) => {
                if !club.timers.contains(&timer) {
                    club.timers.push(timer);
                }
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(attached) })
    }

    fn detach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut inner = self.inner.lock().unwrap();
        let detached = match inner.clubs.get_mut(&club) {
            Some(club) => {
                club.timers.retain(|id| *id != timer);
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(detached) })
    }

    fn insert_history(&self, entry: TimerHistoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut inner = self.inner.lock().unwrap();
        inner.histories.insert(entry.id, entry);
        Box::pin(async { Ok(()) })
    }

    fn attach_history(&self, club: Uuid, entry: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let mut inner = self.inner.lock().unwrap();
        let attached = match inner.clubs.get_mut(&club) {
            Some(club) => {
                if !club.timer_histories.contains(&entry) {
                    club.timer_histories.push(entry);
                }
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(attached) })
    }

    fn history_by_club(
        &self,
        club: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TimerHistoryEntity>>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .histories
            .values()
            .filter(|entry| entry.club == club)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.recorded_at);
        Box::pin(async move { Ok(entries) })
    }

    fn delete_histories(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        let mut inner = self.inner.lock().unwrap();
        let mut removed = 0;
        for id in ids {
            if inner.histories.remove(&id).is_some() {
                removed += 1;
            }
        }
        Box::pin(async move { Ok(removed) })
    }

    fn detach_histories(
        &self,
        club: Uuid,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let mut inner = self.inner.lock().unwrap();
        let detached = match inner.clubs.get_mut(&club) {
            Some(club) => {
                club.timer_histories.retain(|id| !ids.contains(id));
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(detached) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
